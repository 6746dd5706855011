//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for the session:
//! help, clearing the conversation, switching models, and history.

use std::io::{self, Write};

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the conversation and the screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Show the conversation so far.
    History,
    /// Show the current model, or switch to the given one.
    Model(Option<String>),
    /// List configured models.
    Models,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/history" => Some(ChatCommand::History),
        "/model" | "/m" => Some(ChatCommand::Model(arg)),
        "/models" => Some(ChatCommand::Models),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Available commands:").bold())?;
    writeln!(out)?;
    writeln!(out, "  {}        {}", style("/help").cyan(), "Show this help message")?;
    writeln!(out, "  {}       {}", style("/clear").cyan(), "Clear the conversation")?;
    writeln!(out, "  {}  {}", style("/model [id]").cyan(), "Show or switch the model")?;
    writeln!(out, "  {}      {}", style("/models").cyan(), "List configured models")?;
    writeln!(out, "  {}     {}", style("/history").cyan(), "Show the conversation so far")?;
    writeln!(out, "  {}        {}", style("/exit").cyan(), "End the chat session")?;
    writeln!(out)?;
    writeln!(
        out,
        "  {}",
        style("Ctrl+C stops a reply in progress, Ctrl+D exits").dim()
    )?;
    writeln!(out)
}
