//! Shared domain types for Wisp.
//!
//! This crate contains the types used across the Wisp workspace:
//! conversation entries, session events, LLM request/stream types,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
