//! Scripted provider shared by the gateway and relay engine tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatrelay_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, StreamEvent, Usage,
};

use super::provider::{EventStream, LlmProvider};

/// One scripted provider call.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Complete successfully with this text (streamed as a single fragment).
    Reply(String),
    /// Stream these deltas verbatim, empty ones included.
    Fragments(Vec<String>),
    /// Stream these deltas, then fail.
    FragmentsThenFail(Vec<String>, String),
    /// Fail before producing anything.
    Fail(String),
    /// Never answer.
    Stall,
}

impl Script {
    pub(crate) fn reply(text: &str) -> Self {
        Script::Reply(text.to_string())
    }

    pub(crate) fn fragments(parts: &[&str]) -> Self {
        Script::Fragments(parts.iter().map(|p| p.to_string()).collect())
    }

    pub(crate) fn fail(message: &str) -> Self {
        Script::Fail(message.to_string())
    }
}

/// Provider that replays a queue of [`Script`]s and records every request.
#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    /// Every request received so far, in call order.
    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_script(&self, request: &CompletionRequest) -> Script {
        self.requests.lock().unwrap().push(request.clone());
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::fail("no scripted response"))
    }
}

fn provider_error(message: String) -> LlmError {
    LlmError::Provider { message }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let script = self.next_script(request);
        let model = request.model.clone();
        async move {
            let content = match script {
                Script::Reply(text) => text,
                Script::Fragments(parts) => parts.concat(),
                Script::FragmentsThenFail(_, message) | Script::Fail(message) => {
                    return Err(provider_error(message));
                }
                Script::Stall => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    return Err(provider_error("stalled".to_string()));
                }
            };
            Ok(CompletionResponse {
                id: "resp-scripted".to_string(),
                content,
                model,
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let script = self.next_script(&request);
        Box::pin(async_stream::stream! {
            yield Ok(StreamEvent::Connected);
            let mut failure = None;
            match script {
                Script::Reply(text) => {
                    yield Ok(StreamEvent::TextDelta { text });
                }
                Script::Fragments(parts) => {
                    for text in parts {
                        yield Ok(StreamEvent::TextDelta { text });
                    }
                }
                Script::FragmentsThenFail(parts, message) => {
                    for text in parts {
                        yield Ok(StreamEvent::TextDelta { text });
                    }
                    failure = Some(LlmError::Stream(message));
                }
                Script::Fail(message) => {
                    failure = Some(provider_error(message));
                }
                Script::Stall => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            }
            match failure {
                Some(err) => {
                    yield Err(err);
                }
                None => {
                    yield Ok(StreamEvent::MessageDelta { stop_reason: StopReason::EndTurn });
                    yield Ok(StreamEvent::Usage(Usage { input_tokens: 1, output_tokens: 1 }));
                    yield Ok(StreamEvent::Done);
                }
            }
        })
    }
}
