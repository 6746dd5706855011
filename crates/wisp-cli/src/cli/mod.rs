//! CLI command definitions for the `wisp` binary.
//!
//! Uses clap derive macros for argument parsing. Running `wisp` with no
//! subcommand starts an interactive chat.

pub mod chat;
pub mod check;
pub mod models;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Streaming chat with OpenAI-compatible model backends.
#[derive(Parser)]
#[command(name = "wisp", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding config.toml (default: ~/.wisp).
    #[arg(long, global = true, env = "WISP_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// API key for every backend, overriding the configured environment variables.
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start an interactive chat session (default).
    Chat {
        /// Model to chat with (default: `default_model` from config).
        #[arg(long, short)]
        model: Option<String>,
    },

    /// List the configured models and the backends that serve them.
    #[command(alias = "ls")]
    Models,

    /// Send a one-word completion to verify a model's backend is reachable.
    Check {
        /// Model to check (default: `default_model` from config).
        #[arg(long, short)]
        model: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// The subcommand to run; plain `wisp` means `wisp chat`.
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat { model: None })
    }
}
