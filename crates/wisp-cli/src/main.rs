//! Wisp CLI entry point.
//!
//! Binary name: `wisp`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then
//! dispatches to the command handler. Plain `wisp` starts a chat.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use wisp_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = verbosity_filter(cli.verbose, cli.quiet);
    if let Err(e) = init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    then_shutdown(run(cli), shutdown_tracing).await
}

/// Await `work`, then run `shutdown` whether it succeeded or not.
async fn then_shutdown<F, S>(work: F, shutdown: S) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
    S: FnOnce(),
{
    let result = work.await;
    shutdown();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.resolved_command();

    // Shell completions don't need configuration
    if let Commands::Completions { shell } = command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(shell, &mut cmd, "wisp", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.data_dir.clone(), cli.api_key.as_deref()).await?;

    match command {
        Commands::Chat { model } => {
            let model = state.model_or_default(model);
            cli::chat::loop_runner::run_chat_loop(&state, &model).await
        }
        Commands::Models => cli::models::list_models(&state, cli.json),
        Commands::Check { model } => {
            let model = state.model_or_default(model);
            cli::check::check_model(&state, &model, cli.json).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}
