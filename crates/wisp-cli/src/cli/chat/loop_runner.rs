//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: welcome banner, input loop,
//! slash commands, and streaming replies. The session does the work; this
//! module only watches its events and draws them.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline_async::SharedWriter;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use wisp_core::chat::ChatSession;
use wisp_types::chat::{MessageRole, SessionEvent, SubmitOutcome};
use wisp_types::error::SessionError;

use crate::cli::models::{model_rows, routing_table};
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{preview, stream_view, ChatRenderer};

/// Longest `/history` line, in characters.
const HISTORY_PREVIEW_CHARS: usize = 100;

/// Run the interactive chat loop on `model`.
pub async fn run_chat_loop(state: &AppState, model: &str) -> anyhow::Result<()> {
    let session = state.new_session(model);

    let route = state.router.route(model);
    let backend = state
        .router
        .resolve(model)
        .map(|r| r.provider.name().to_string())
        .ok();
    print_welcome_banner(
        model,
        route.map(|r| r.label.as_str()),
        backend.as_deref(),
        route.is_some_and(|r| r.reasoning_markers),
    );

    let renderer = ChatRenderer::new();
    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut input, mut out) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match input.read_line().await {
            InputEvent::Eof => {
                writeln!(out, "\n  {}", style("Session ended.").dim())?;
                break;
            }
            InputEvent::Interrupted => {
                writeln!(out, "\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim())?;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    if !run_command(cmd, state, &session, &mut input, &mut out)? {
                        writeln!(out, "\n  {}", style("Session ended.").dim())?;
                        break;
                    }
                    continue;
                }

                input.add_history(&text);
                let exit = stream_reply(&session, &text, &renderer, &mut input, &mut out).await?;
                if exit {
                    writeln!(out, "\n  {}", style("Session ended.").dim())?;
                    break;
                }
            }
        }
    }

    input.flush();
    Ok(())
}

/// Execute a slash command. Returns `false` when the loop should end.
fn run_command(
    cmd: ChatCommand,
    state: &AppState,
    session: &ChatSession,
    input: &mut ChatInput,
    out: &mut SharedWriter,
) -> io::Result<bool> {
    match cmd {
        ChatCommand::Help => commands::print_help(out)?,
        ChatCommand::Exit => return Ok(false),
        ChatCommand::Clear => match session.clear() {
            Ok(()) => {
                input.clear();
                writeln!(out, "  {}", style("Conversation cleared.").dim())?;
            }
            Err(e) => writeln!(out, "\n  {} {e}\n", style("!").yellow().bold())?,
        },
        ChatCommand::Model(None) => {
            let current = session.model();
            let label = session
                .router()
                .route(&current)
                .map(|r| r.label.clone())
                .filter(|l| !l.is_empty());
            match label {
                Some(label) => writeln!(
                    out,
                    "\n  {} {label} {}\n",
                    style("Model:").bold(),
                    style(format!("({current})")).dim()
                )?,
                None => writeln!(out, "\n  {} {current}\n", style("Model:").bold())?,
            }
        }
        ChatCommand::Model(Some(id)) => match session.select_model(id.as_str()) {
            Ok(()) => {
                writeln!(out, "\n  {} Switched to {}", style("*").cyan().bold(), style(&id).cyan())?;
                match session.router().resolve(&id) {
                    Ok(r) if !r.routed => writeln!(
                        out,
                        "  {}",
                        style(format!("Not in the routing table; using fallback backend {}", r.provider.name())).dim()
                    )?,
                    Ok(_) => {}
                    Err(e) => writeln!(out, "  {} {e}", style("!").yellow().bold())?,
                }
                writeln!(out)?;
            }
            Err(e) => writeln!(out, "\n  {} {e}\n", style("!").yellow().bold())?,
        },
        ChatCommand::Models => {
            let rows = model_rows(&state.config);
            writeln!(out)?;
            writeln!(out, "{}", routing_table(&rows))?;
            writeln!(out)?;
        }
        ChatCommand::History => {
            let entries = session.entries();
            writeln!(out)?;
            if entries.is_empty() {
                writeln!(out, "  {}", style("No messages yet.").dim())?;
            }
            for entry in &entries {
                let role = match entry.role {
                    MessageRole::User => style("You").green().bold(),
                    _ => style("Wisp").cyan().bold(),
                };
                writeln!(out, "  {role} {}", preview(&entry.content, HISTORY_PREVIEW_CHARS))?;
            }
            writeln!(out)?;
        }
        ChatCommand::Unknown(name) => writeln!(
            out,
            "\n  {} Unknown command: {}. Type /help for available commands.\n",
            style("?").yellow().bold(),
            style(name).dim()
        )?,
    }
    Ok(true)
}

/// Tracks what of the streaming reply has reached the terminal.
///
/// Display runs one snapshot behind so that a failure, which replaces the
/// placeholder with the error message, is never printed as streamed text.
/// `shown` is the streamed view already printed, not the raw content.
#[derive(Default)]
struct StreamDisplay {
    shown: String,
    pending: Option<String>,
    started: bool,
}

impl StreamDisplay {
    /// Accept a new snapshot and print the previous one.
    fn update(&mut self, content: String, spinner: &ProgressBar, model: &str, out: &mut impl Write) -> io::Result<()> {
        if let Some(previous) = self.pending.replace(content) {
            self.show(&previous, false, spinner, model, out)?;
        }
        Ok(())
    }

    /// Print the held snapshot as final.
    fn flush(&mut self, spinner: &ProgressBar, model: &str, out: &mut impl Write) -> io::Result<()> {
        if let Some(last) = self.pending.take() {
            self.show(&last, true, spinner, model, out)?;
        }
        Ok(())
    }

    fn show(
        &mut self,
        content: &str,
        complete: bool,
        spinner: &ProgressBar,
        model: &str,
        out: &mut impl Write,
    ) -> io::Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        if !self.started {
            spinner.finish_and_clear();
            self.started = true;
            write!(out, "\n  {} ", style(model).cyan().bold())?;
        }
        let view = stream_view(content, complete);
        match view.strip_prefix(self.shown.as_str()) {
            Some(delta) if !delta.is_empty() => write!(out, "{delta}")?,
            Some(_) => {}
            // Snapshot is not an extension; the final render will show it.
            None => debug!("snapshot rewrote streamed text"),
        }
        self.shown = view;
        out.flush()
    }
}

/// Submit `text` and draw the reply as it streams.
///
/// Ctrl+C cancels the reply; Ctrl+D cancels it and ends the chat. Returns
/// whether the user asked to exit.
async fn stream_reply(
    session: &ChatSession,
    text: &str,
    renderer: &ChatRenderer,
    input: &mut ChatInput,
    out: &mut SharedWriter,
) -> anyhow::Result<bool> {
    let model = session.model();
    let cancel = CancellationToken::new();
    let mut events = session.subscribe();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("思考中...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let mut display = StreamDisplay::default();
    let mut exit = false;
    let mut reading = true;
    let mut listening = true;

    let submit = session.submit(text, &cancel);
    tokio::pin!(submit);

    let result = loop {
        tokio::select! {
            biased;
            event = events.recv(), if listening => match event {
                Ok(SessionEvent::AssistantUpdated { content, .. }) => {
                    display.update(content, &spinner, &model, out)?;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => debug!(skipped = n, "display lagged behind session events"),
                Err(RecvError::Closed) => listening = false,
            },
            line = input.read_line(), if reading => match line {
                InputEvent::Interrupted => cancel.cancel(),
                InputEvent::Eof => {
                    cancel.cancel();
                    exit = true;
                    reading = false;
                }
                InputEvent::Message(_) => {
                    writeln!(out, "\n  {}", style("Still answering; press Ctrl+C to stop.").dim())?;
                }
            },
            result = &mut submit => break result,
        }
    };

    loop {
        match events.try_recv() {
            Ok(SessionEvent::AssistantUpdated { content, .. }) => {
                display.update(content, &spinner, &model, out)?;
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    let response_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(SubmitOutcome::Completed) => {
            display.flush(&spinner, &model, out)?;
            spinner.finish_and_clear();
            let content = session
                .entries()
                .last()
                .map(|e| e.content.clone())
                .unwrap_or_default();
            writeln!(out, "\n\n  {}", style("---").dim())?;
            writeln!(out, "{}", renderer.render_final(&content).trim_end())?;
            renderer.write_stats_footer(out, content.chars().count(), response_ms, &model)?;
            writeln!(out)?;
        }
        Ok(SubmitOutcome::Cancelled) => {
            display.flush(&spinner, &model, out)?;
            spinner.finish_and_clear();
            writeln!(out, "\n  {}\n", style("(stopped)").dim())?;
        }
        Ok(SubmitOutcome::Failed) => {
            spinner.finish_and_clear();
            let message = display.pending.take().unwrap_or_default();
            writeln!(out, "\n  {} {}", style("!").red().bold(), style(message).red())?;
            writeln!(out, "  {}\n", style("Type a message to retry, /exit to quit.").dim())?;
        }
        Ok(SubmitOutcome::Ignored) => spinner.finish_and_clear(),
        Err(SessionError::Busy) => {
            spinner.finish_and_clear();
            writeln!(out, "\n  {}\n", style("Still answering the previous message.").yellow())?;
        }
        Err(e) => {
            spinner.finish_and_clear();
            warn!(error = %e, "submission rejected");
            writeln!(out, "\n  {} {e}\n", style("!").red().bold())?;
        }
    }

    Ok(exit)
}
