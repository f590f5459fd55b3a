//! Completion gateway: the relay's two ways of asking a provider.
//!
//! - [`CompletionGateway::atomic_complete`] issues one request and returns
//!   the whole response text, or fails without partial output.
//! - [`CompletionGateway::stream_complete`] returns a lazy, finite stream
//!   of non-empty text fragments in emission order. A provider failure
//!   mid-stream surfaces as an `Err` item at that point; fragments already
//!   yielded stay valid.
//!
//! Both are bounded by the configured request timeout so that a call
//! abandoned by a disconnected client cannot run forever.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tracing::{Instrument, info_span};

use chatrelay_types::chat::Message;
use chatrelay_types::config::ProviderSettings;
use chatrelay_types::llm::{CompletionRequest, LlmError, StreamEvent};

use super::box_provider::BoxLlmProvider;

/// Lazy sequence of response text fragments. Not restartable.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>>;

/// Request shaping applied to every completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewaySettings {
    /// Model sent with each request; empty lets the provider pick its default.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings::from(&ProviderSettings::default())
    }
}

impl From<&ProviderSettings> for GatewaySettings {
    fn from(settings: &ProviderSettings) -> Self {
        Self {
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            system_prompt: settings.system_prompt.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

/// Wraps a provider with the relay's request shape and timeout.
pub struct CompletionGateway {
    provider: BoxLlmProvider,
    settings: GatewaySettings,
}

impl CompletionGateway {
    pub fn new(provider: BoxLlmProvider, settings: GatewaySettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Map a conversation into a provider request, preserving order.
    fn build_request(&self, history: &[Message], stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: history.to_vec(),
            system: self.settings.system_prompt.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stream,
        }
    }

    /// Complete `history` in one call and return the top choice's text.
    pub async fn atomic_complete(&self, history: &[Message]) -> Result<String, LlmError> {
        let request = self.build_request(history, false);
        let timeout = self.settings.request_timeout;

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = false,
            gen_ai.response.model = tracing::field::Empty,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );

        let response = tokio::time::timeout(timeout, self.provider.complete(&request))
            .instrument(span)
            .await
            .map_err(|_| LlmError::Timeout(timeout))??;

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            stop_reason = %response.stop_reason,
            output_tokens = response.usage.output_tokens,
            "Atomic completion finished"
        );

        Ok(response.content)
    }

    /// Complete `history` incrementally.
    ///
    /// Empty text deltas and non-text events are skipped. The stream ends
    /// at the provider's `Done` event (or when the provider stream ends).
    /// The whole stream shares one deadline. Each pull from the provider
    /// runs inside the `gen_ai.stream` span.
    pub fn stream_complete(&self, history: &[Message]) -> FragmentStream {
        let request = self.build_request(history, true);
        let timeout = self.settings.request_timeout;
        let span = info_span!(
            "gen_ai.stream",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.request.stream = true,
            gen_ai.response.model = tracing::field::Empty,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );
        let mut events = self.provider.stream(request);

        Box::pin(async_stream::try_stream! {
            let deadline = tokio::time::Instant::now() + timeout;

            loop {
                let next = tokio::time::timeout_at(deadline, events.next())
                    .instrument(span.clone())
                    .await
                    .map_err(|_| LlmError::Timeout(timeout))?;

                let Some(event) = next else {
                    break;
                };

                match event? {
                    StreamEvent::TextDelta { text } => {
                        if !text.is_empty() {
                            yield text;
                        }
                    }
                    StreamEvent::Done => break,
                    StreamEvent::MessageDelta { stop_reason } => {
                        tracing::debug!(%stop_reason, "Provider finished streaming");
                    }
                    StreamEvent::Connected | StreamEvent::Usage(_) => {}
                }
            }
        })
    }
}
