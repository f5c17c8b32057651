//! The shared event log.

use serde_json::Value;

use crate::error::Result;
use crate::event::Event;

/// Ordered line records received since the last clear.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<Value>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: Value) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Apply a parsed event: clear resets, line appends.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Clear => self.clear(),
            Event::Line(record) => self.append(record),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Serialise the whole log as a JSON array, the server-to-client frame.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.records)?)
    }
}
