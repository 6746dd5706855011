//! Infrastructure layer for Wisp.
//!
//! Contains the implementations behind the ports defined in `wisp-core`:
//! the OpenAI-compatible streaming provider, router construction from
//! configuration, and the `config.toml` loader.

pub mod config;
pub mod llm;
