//! Business logic and provider trait definitions for Wisp.
//!
//! This crate defines the chat session state machine, the conversation log,
//! and the "ports" (provider traits) that the infrastructure layer
//! implements. It depends only on `wisp-types` -- never on `wisp-infra`
//! or any HTTP crate.

pub mod chat;
pub mod event;
pub mod llm;
