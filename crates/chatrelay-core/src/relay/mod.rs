//! Per-connection relay between a client transport and the completion gateway.
//!
//! The transport layer (WebSocket in chatrelay-api) adapts its socket into
//! an inbound text stream plus an outbound frame channel and hands both to
//! [`RelayEngine::run`], which owns the connection until it closes.

pub mod engine;

pub use engine::{CloseReason, ConnectionState, RelayEngine};
