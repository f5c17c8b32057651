//! Inbound event discrimination.
//!
//! Clients send one JSON object per message. An object carrying a `clear`
//! key (any value, `null` included) is a clear command; every other object
//! is a line record kept verbatim.

use serde_json::Value;

use crate::error::{InkcastError, Result};

/// Key whose presence marks a clear command.
pub const CLEAR_MARKER: &str = "clear";

/// A parsed client event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Discard every accumulated line record.
    Clear,
    /// Opaque drawing payload appended to the log.
    Line(Value),
}

impl Event {
    /// Parse raw message text into an event.
    ///
    /// Fails with [`InkcastError::MalformedEvent`] when the text is not JSON
    /// or is JSON but not an object.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| InkcastError::MalformedEvent(e.to_string()))?;
        Self::from_value(value)
    }

    /// Classify an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Object(map) if map.contains_key(CLEAR_MARKER) => Ok(Event::Clear),
            Value::Object(_) => Ok(Event::Line(value)),
            other => Err(InkcastError::MalformedEvent(format!(
                "expected a JSON object, got {}",
                kind_of(other)
            ))),
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Clear => "clear",
            Event::Line(_) => "line",
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
