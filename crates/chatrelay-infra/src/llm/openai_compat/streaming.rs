//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] chunks to the
//! provider-agnostic [`StreamEvent`] enum defined in `chatrelay-types`.

use futures_util::StreamExt;

use async_openai::types::chat::ChatCompletionResponseStream;

use chatrelay_core::llm::provider::EventStream;
use chatrelay_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_RESPONSE_ID, GEN_AI_RESPONSE_MODEL,
    GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};
use chatrelay_types::llm::{LlmError, StreamEvent, Usage};

use super::map_finish_reason;

/// Map an async-openai [`ChatCompletionResponseStream`] to a stream of [`StreamEvent`]s.
///
/// The returned stream emits events in this order:
/// 1. `Connected` -- immediately on entry
/// 2. `TextDelta` -- for each non-empty text content chunk
/// 3. `MessageDelta` -- with the stop reason when finish_reason appears
/// 4. `Usage` -- token usage (requires `stream_options.include_usage = true` on request)
/// 5. `Done` -- at the end of the stream
///
/// Response id, model, finish reason and usage are also recorded on the
/// caller's current span.
pub fn map_openai_stream(stream: ChatCompletionResponseStream) -> EventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut stream = stream;
        let mut recorded_id = false;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| LlmError::Stream(e.to_string()))?;

            if !recorded_id {
                let span = tracing::Span::current();
                span.record(GEN_AI_RESPONSE_ID, chunk.id.as_str());
                span.record(GEN_AI_RESPONSE_MODEL, chunk.model.as_str());
                recorded_id = true;
            }

            // The final chunk carries usage with an empty choices array.
            if let Some(usage) = chunk.usage.as_ref() {
                let usage = Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                };
                let span = tracing::Span::current();
                span.record(GEN_AI_USAGE_INPUT_TOKENS, usage.input_tokens);
                span.record(GEN_AI_USAGE_OUTPUT_TOKENS, usage.output_tokens);
                yield StreamEvent::Usage(usage);
            }

            for choice in &chunk.choices {
                if let Some(text) = choice.delta.content.as_ref() {
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text: text.clone() };
                    }
                }

                if let Some(finish_reason) = choice.finish_reason.as_ref() {
                    let stop_reason = map_finish_reason(finish_reason);
                    tracing::Span::current().record(
                        GEN_AI_RESPONSE_FINISH_REASONS,
                        tracing::field::display(stop_reason),
                    );
                    yield StreamEvent::MessageDelta { stop_reason };
                }
            }
        }

        yield StreamEvent::Done;
    })
}
