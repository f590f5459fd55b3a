//! Infrastructure layer for chatrelay.
//!
//! Contains the concrete implementation of the `LlmProvider` port defined
//! in `chatrelay-core` (any OpenAI-compatible chat completions API) and the
//! TOML configuration loader.

pub mod config;
pub mod llm;
