//! Observability for Wisp: subscriber setup and GenAI attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
