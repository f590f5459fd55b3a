//! Relay logic for chatrelay.
//!
//! This crate owns the concurrent state (session store, connection
//! registry), the completion gateway in front of the `LlmProvider` port,
//! and the per-connection relay engine. It depends only on
//! `chatrelay-types` -- never on `chatrelay-infra` or any HTTP crate.

pub mod connection;
pub mod history;
pub mod llm;
pub mod relay;
pub mod sentiment;
pub mod session;
