//! WebSocket frame types exchanged with relay clients.
//!
//! Both directions use JSON text frames discriminated by a `type` field.
//! Inbound frames are validated strictly: anything that is not a known
//! frame shape resolves to a [`FrameError`] instead of being dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::sentiment::Sentiment;

/// Frame sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// A user message to relay to the completion provider.
    Message {
        #[serde(default)]
        content: String,
        /// Request incremental delivery of the response.
        #[serde(default)]
        stream: bool,
    },
    /// A rating for a previously delivered response.
    Feedback {
        #[serde(default)]
        message_id: serde_json::Value,
        #[serde(default)]
        rating: serde_json::Value,
    },
}

impl InboundFrame {
    /// Frame type names accepted from clients.
    pub const KNOWN_TYPES: &'static [&'static str] = &["message", "feedback"];

    /// Parse a raw text frame.
    ///
    /// The `type` discriminator is checked before the body so that an
    /// unsupported type is reported as such rather than as a field error.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;

        let Some(object) = value.as_object() else {
            return Err(FrameError::NotAnObject);
        };

        let frame_type = match object.get("type") {
            Some(serde_json::Value::String(t)) => t.clone(),
            Some(_) | None => return Err(FrameError::MissingType),
        };

        if !Self::KNOWN_TYPES.contains(&frame_type.as_str()) {
            return Err(FrameError::UnknownType(frame_type));
        }

        serde_json::from_value(value).map_err(|e| FrameError::InvalidField {
            frame_type,
            reason: e.to_string(),
        })
    }
}

/// Timing, size and sentiment attached to a completed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Seconds between receiving the user message and finishing the response.
    pub response_time: f64,
    /// Response length in characters.
    pub length: usize,
    pub sentiment: Sentiment,
}

/// Frame sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// A complete (non-streamed) response.
    Message {
        content: String,
        metadata: ResponseMetadata,
    },
    /// One fragment of a streamed response.
    Stream { content: String },
    /// Terminates a streamed response; always follows its last `Stream` frame.
    StreamComplete { metadata: ResponseMetadata },
    Error { content: String },
    FeedbackReceived,
    /// Operator announcement pushed to every live connection.
    Broadcast { content: String },
}

impl OutboundFrame {
    /// Build an error frame with the `Error: ` prefix clients expect.
    pub fn error(err: impl fmt::Display) -> Self {
        OutboundFrame::Error {
            content: format!("Error: {err}"),
        }
    }

    /// The `type` tag this frame serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundFrame::Message { .. } => "message",
            OutboundFrame::Stream { .. } => "stream",
            OutboundFrame::StreamComplete { .. } => "stream_complete",
            OutboundFrame::Error { .. } => "error",
            OutboundFrame::FeedbackReceived => "feedback_received",
            OutboundFrame::Broadcast { .. } => "broadcast",
        }
    }
}

/// A client's rating of a response. Reported through logging only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub session_id: String,
    pub message_id: serde_json::Value,
    pub rating: serde_json::Value,
}
