//! LLM provider abstractions for Wisp.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `BackendRouter`: model identifier to backend lookup table

pub mod box_provider;
pub mod provider;
pub mod router;
