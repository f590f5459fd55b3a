//! Type-erased [`LlmProvider`] so the provider can be chosen at runtime.
//!
//! `LlmProvider::complete` returns `impl Future`, which rules out
//! `dyn LlmProvider`. [`ErasedProvider`] boxes that future and is
//! implemented for every provider; [`BoxLlmProvider`] owns one behind a box.

use std::fmt;

use futures_util::future::BoxFuture;

use chatrelay_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::{EventStream, LlmProvider};

trait ErasedProvider: Send + Sync {
    fn erased_name(&self) -> &str;

    fn erased_complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<CompletionResponse, LlmError>>;

    fn erased_stream(&self, request: CompletionRequest) -> EventStream;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn erased_name(&self) -> &str {
        self.name()
    }

    fn erased_complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<CompletionResponse, LlmError>> {
        Box::pin(self.complete(request))
    }

    fn erased_stream(&self, request: CompletionRequest) -> EventStream {
        self.stream(request)
    }
}

/// Owned provider of any concrete type.
pub struct BoxLlmProvider {
    inner: Box<dyn ErasedProvider>,
}

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.erased_name()
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.inner.erased_complete(request).await
    }

    pub fn stream(&self, request: CompletionRequest) -> EventStream {
        self.inner.erased_stream(request)
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxLlmProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
