//! OpenAI-compatible completion provider.
//!
//! A single [`OpenAiCompatibleProvider`] serves OpenAI, Google Gemini,
//! Mistral, and any self-hosted server exposing `/chat/completions`, via
//! configurable base URLs and factory functions.
//!
//! Uses [`async_openai`] for type-safe request/response handling and
//! built-in SSE streaming.

pub mod config;
pub mod streaming;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionStreamOptions,
    CreateChatCompletionRequest, CreateChatCompletionResponse, FinishReason,
};
use async_openai::error::{ApiError, OpenAIError};
use futures_util::StreamExt;
use secrecy::ExposeSecret;

use chatrelay_core::llm::provider::{EventStream, LlmProvider};
use chatrelay_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_RESPONSE_ID, GEN_AI_RESPONSE_MODEL,
    GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};
use chatrelay_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, StopReason, Usage,
};

use self::config::OpenAiCompatConfig;
use self::streaming::map_openai_stream;

/// Provider for any OpenAI-compatible chat completions API.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_base(&config.base_url)
                .with_api_key(config.api_key.expose_secret()),
        );
        Self {
            client,
            provider_name: config.provider_name,
            model: config.model,
        }
    }

    /// Translate a relay request into the chat completions wire shape.
    ///
    /// The optional system prompt leads; the conversation follows in its
    /// recorded order. An empty model selects the provider default.
    fn build_request(&self, request: &CompletionRequest, stream: bool) -> CreateChatCompletionRequest {
        let messages = request
            .system
            .iter()
            .map(|prompt| system_message(prompt))
            .chain(request.messages.iter().map(chat_message))
            .collect();

        let model = match request.model.as_str() {
            "" => self.model.clone(),
            model => model.to_string(),
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            stream: stream.then_some(true),
            stream_options: stream.then_some(ChatCompletionStreamOptions {
                include_usage: Some(true),
                include_obfuscation: None,
            }),
            ..Default::default()
        }
    }
}

fn system_message(prompt: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(prompt.to_string()),
        name: None,
    })
}

fn chat_message(message: &Message) -> ChatCompletionRequestMessage {
    let text = message.content.clone();
    match message.role {
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        #[allow(deprecated)]
        MessageRole::Assistant => {
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(text)),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .chat()
            .create(self.build_request(request, false))
            .await
            .map_err(map_openai_error)?;

        completion_from_response(response)
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let body = self.build_request(&request, true);
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            let chunks = client
                .chat()
                .create_stream(body)
                .await
                .map_err(map_openai_error)?;

            let mut events = map_openai_stream(chunks);
            while let Some(event) = events.next().await {
                yield event?;
            }
        })
    }
}

/// Take the top choice's text out of a chat completion.
///
/// A response without choices, or whose top choice carries no text, is an
/// error rather than an empty reply.
fn completion_from_response(
    response: CreateChatCompletionResponse,
) -> Result<CompletionResponse, LlmError> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(LlmError::Deserialization(
            "response contained no choices".to_string(),
        ));
    };
    let content = match (choice.message.content, choice.message.refusal) {
        (Some(content), _) => content,
        (None, Some(refusal)) => return Err(LlmError::Provider { message: refusal }),
        (None, None) => {
            return Err(LlmError::Deserialization(
                "top choice contained no text".to_string(),
            ));
        }
    };
    let stop_reason = choice
        .finish_reason
        .as_ref()
        .map_or(StopReason::EndTurn, map_finish_reason);
    let usage = response.usage.map_or_else(Usage::default, |u| Usage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    let span = tracing::Span::current();
    span.record(GEN_AI_RESPONSE_ID, response.id.as_str());
    span.record(GEN_AI_RESPONSE_MODEL, response.model.as_str());
    span.record(GEN_AI_RESPONSE_FINISH_REASONS, tracing::field::display(stop_reason));
    span.record(GEN_AI_USAGE_INPUT_TOKENS, usage.input_tokens);
    span.record(GEN_AI_USAGE_OUTPUT_TOKENS, usage.output_tokens);

    Ok(CompletionResponse {
        id: response.id,
        content,
        model: response.model,
        stop_reason,
        usage,
    })
}

/// Map an OpenAI finish reason onto the relay's stop reasons.
pub(crate) fn map_finish_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ContentFilter => StopReason::ContentFilter,
        FinishReason::Stop | FinishReason::ToolCalls | FinishReason::FunctionCall => {
            StopReason::EndTurn
        }
    }
}

fn is_auth_failure(api_err: &ApiError) -> bool {
    api_err.code.as_deref() == Some("invalid_api_key")
        || api_err.r#type.as_deref() == Some("authentication_error")
        || api_err.message.contains("Incorrect API key")
        || api_err.message.contains("Invalid API key")
}

fn is_rate_limit(api_err: &ApiError) -> bool {
    api_err.code.as_deref() == Some("rate_limit_exceeded")
        || api_err.r#type.as_deref() == Some("rate_limit_error")
}

/// Map an [`OpenAIError`] onto an [`LlmError`]; API messages are kept verbatim.
fn map_openai_error(err: OpenAIError) -> LlmError {
    match err {
        OpenAIError::ApiError(api_err) if is_auth_failure(&api_err) => {
            LlmError::AuthenticationFailed
        }
        OpenAIError::ApiError(api_err) if is_rate_limit(&api_err) => LlmError::RateLimited {
            retry_after_ms: None,
        },
        OpenAIError::ApiError(api_err) => LlmError::Provider {
            message: api_err.message,
        },
        OpenAIError::Reqwest(http_err) => match http_err.status().map(|s| s.as_u16()) {
            Some(401) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            _ => LlmError::Provider {
                message: OpenAIError::Reqwest(http_err).to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, body) => {
            LlmError::Deserialization(format!("failed to parse response: {body}"))
        }
        OpenAIError::StreamError(stream_err) => LlmError::Stream(stream_err.to_string()),
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg),
        other => LlmError::Provider {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_types::config::ProviderSettings;
    use secrecy::SecretString;

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(OpenAiCompatConfig::from_settings(
            &ProviderSettings::default(),
            SecretString::from("sk-test".to_string()),
        ))
    }

    fn request(messages: Vec<Message>, system: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages,
            system: system.map(str::to_string),
            max_tokens: 1000,
            temperature: None,
            stream: false,
        }
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider().name(), "openai");
    }

    #[test]
    fn test_build_request_messages() {
        let request = request(
            vec![Message::user("Hello"), Message::assistant("Hi there!")],
            Some("Be helpful"),
        );

        let oai_req = provider().build_request(&request, false);
        assert_eq!(oai_req.model, "gpt-3.5-turbo");
        // 1 system + 2 conversation = 3 messages
        assert_eq!(oai_req.messages.len(), 3);
        assert!(matches!(oai_req.messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(oai_req.messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(oai_req.messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert_eq!(oai_req.max_completion_tokens, Some(1000));
        assert!(oai_req.stream.is_none());
        assert!(oai_req.stream_options.is_none());
    }

    #[test]
    fn test_build_request_without_system_prompt() {
        let oai_req = provider().build_request(&request(vec![Message::user("Hello")], None), false);
        assert_eq!(oai_req.messages.len(), 1);
    }

    #[test]
    fn test_build_request_streaming() {
        let oai_req = provider().build_request(&request(vec![Message::user("Hello")], None), true);
        assert_eq!(oai_req.stream, Some(true));
        let opts = oai_req.stream_options.unwrap();
        assert_eq!(opts.include_usage, Some(true));
    }

    #[test]
    fn test_build_request_empty_model_uses_default() {
        let mut request = request(vec![], None);
        request.model = String::new();
        let oai_req = provider().build_request(&request, false);
        assert_eq!(oai_req.model, "gpt-3.5-turbo");
    }

    fn chat_response(choices: serde_json::Value) -> CreateChatCompletionResponse {
        serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-3.5-turbo",
            "choices": choices,
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7},
        }))
        .unwrap()
    }

    #[test]
    fn test_completion_takes_top_choice() {
        let response = chat_response(serde_json::json!([
            {"index": 0, "message": {"role": "assistant", "content": "hi there"}, "finish_reason": "stop"},
            {"index": 1, "message": {"role": "assistant", "content": "other"}, "finish_reason": "stop"},
        ]));

        let completion = completion_from_response(response).unwrap();
        assert_eq!(completion.content, "hi there");
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(
            completion.usage,
            Usage {
                input_tokens: 5,
                output_tokens: 2
            }
        );
    }

    #[test]
    fn test_completion_without_choices_is_error() {
        let result = completion_from_response(chat_response(serde_json::json!([])));
        assert!(matches!(result, Err(LlmError::Deserialization(_))));
    }

    #[test]
    fn test_completion_without_content_is_error() {
        let response = chat_response(serde_json::json!([
            {"index": 0, "message": {"role": "assistant", "content": null}, "finish_reason": "stop"},
        ]));
        let result = completion_from_response(response);
        assert!(matches!(result, Err(LlmError::Deserialization(_))));
    }

    #[test]
    fn test_completion_refusal_is_provider_error() {
        let response = chat_response(serde_json::json!([
            {"index": 0, "message": {"role": "assistant", "content": null, "refusal": "I can't help with that"}, "finish_reason": "stop"},
        ]));
        let err = completion_from_response(response).unwrap_err();
        assert_eq!(err.to_string(), "provider error: I can't help with that");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(map_finish_reason(&FinishReason::Stop), StopReason::EndTurn);
        assert_eq!(map_finish_reason(&FinishReason::Length), StopReason::MaxTokens);
        assert_eq!(
            map_finish_reason(&FinishReason::ContentFilter),
            StopReason::ContentFilter
        );
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("invalid_api_key".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        let api_err = ApiError {
            message: "Rate limit exceeded".to_string(),
            r#type: Some("rate_limit_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }

    #[test]
    fn test_map_openai_error_keeps_api_message() {
        let api_err = ApiError {
            message: "The server had an error".to_string(),
            r#type: Some("server_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert_eq!(err.to_string(), "provider error: The server had an error");
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }
}
