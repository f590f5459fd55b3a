//! Completion provider abstractions for chatrelay.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `CompletionGateway`: the relay's view of a provider -- atomic text or
//!   a stream of text fragments, both bounded by a timeout

pub mod box_provider;
pub mod gateway;
pub mod provider;

#[cfg(test)]
pub(crate) mod testing;
