//! Shared domain types for chatrelay.
//!
//! This crate contains the core domain types used across the relay:
//! chat messages and sessions, WebSocket frames, LLM request/response
//! shapes, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod frame;
pub mod llm;
pub mod sentiment;
