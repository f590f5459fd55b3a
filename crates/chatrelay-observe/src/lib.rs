//! Observability for chatrelay: subscriber setup and the attribute names
//! used on provider call spans.

pub mod genai_attrs;
pub mod tracing_setup;
