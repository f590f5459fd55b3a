use thiserror::Error;

/// Errors related to session store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("chat session not found")]
    NotFound,
}

/// Errors from parsing an inbound frame.
///
/// Always recoverable: the connection answers with an error frame and
/// keeps reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    InvalidJson(String),

    #[error("malformed frame: expected a JSON object")]
    NotAnObject,

    #[error("malformed frame: missing string field 'type'")]
    MissingType,

    #[error("unsupported frame type '{0}'")]
    UnknownType(String),

    #[error("invalid '{frame_type}' frame: {reason}")]
    InvalidField { frame_type: String, reason: String },
}

/// Failure surfacing from the client transport itself.
///
/// Terminates the connection; never reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
