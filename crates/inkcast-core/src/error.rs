use thiserror::Error;

#[derive(Debug, Error)]
pub enum InkcastError {
    #[error("Config error: {0}")]
    Config(String),

    /// Inbound message is not a well-formed JSON object.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// A subscriber's outbound queue is closed.
    #[error("Transport send error: {0}")]
    TransportSend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, InkcastError>;
