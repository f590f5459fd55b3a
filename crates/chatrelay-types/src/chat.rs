//! Chat session and message types for chatrelay.
//!
//! A [`ChatSession`] is the ordered conversation history owned by one
//! client identifier. Messages are only ever appended; their order is the
//! order in which they are replayed to the completion provider.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Role of a message in a relayed conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// The accumulated message history of one client.
///
/// Serializes as `{"id": "...", "messages": [{"role": "...", "content": "..."}]}`,
/// which is also the body of `GET /sessions/{client_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    /// Create an empty session for a client.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    /// Number of messages recorded so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Acknowledgment returned by a history delete.
///
/// Always the same value: deletion is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub status: String,
    pub message: String,
}

impl DeleteAck {
    pub fn session_deleted() -> Self {
        Self {
            status: "success".to_string(),
            message: "Chat session deleted".to_string(),
        }
    }
}
