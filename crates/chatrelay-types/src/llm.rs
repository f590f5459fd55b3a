//! Provider-facing types: what the relay asks a completion provider for
//! and what comes back, atomically or as a stream of events.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use crate::chat::{Message, MessageRole};

/// One completion call: the conversation plus generation limits.
///
/// An empty `model` means "the provider's configured default".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Sent ahead of `messages`, never recorded in a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: bool,
}

/// Result of a non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::EndTurn => "end_turn",
            StopReason::MaxTokens => "max_tokens",
            StopReason::ContentFilter => "content_filter",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Provider stream events, in the order a well-behaved provider emits them:
/// `Connected`, any number of `TextDelta`, then `Usage`/`MessageDelta`, then `Done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Connected,
    TextDelta { text: String },
    MessageDelta { stop_reason: StopReason },
    Usage(Usage),
    Done,
}

/// A failed completion.
///
/// The relay treats every variant alike: the client gets one error frame
/// and the connection stays open.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("unreadable provider response: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited by provider")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider rejected the API key")]
    AuthenticationFailed,

    #[error("provider did not respond within {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_display_matches_serde() {
        for reason in [
            StopReason::EndTurn,
            StopReason::MaxTokens,
            StopReason::ContentFilter,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{reason}\""));
        }
    }

    #[test]
    fn test_stream_event_serde() {
        let event = StreamEvent::TextDelta {
            text: "Hel".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"text_delta","text":"Hel"}"#);
    }

    #[test]
    fn test_completion_request_omits_empty_options() {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![Message::user("hello")],
            system: None,
            max_tokens: 1000,
            temperature: None,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("system").is_none());
        assert!(value.get("temperature").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Provider {
            message: "upstream 502".to_string(),
        };
        assert_eq!(err.to_string(), "provider error: upstream 502");

        let err = LlmError::Timeout(std::time::Duration::from_secs(60));
        assert!(err.to_string().contains("60s"));
    }
}
