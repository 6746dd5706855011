//! Welcome banner display for chat sessions.

use console::style;

/// Print the welcome banner at the start of a chat session.
///
/// Shows the model, its label and backend, and whether reasoning blocks
/// are recognized for it.
pub fn print_welcome_banner(model: &str, label: Option<&str>, backend: Option<&str>, reasoning: bool) {
    println!();
    println!("  {} {}", style("~").cyan(), style("Wisp").cyan().bold());
    println!("  {}", style("Streaming chat over OpenAI-compatible backends").dim());
    println!();
    match label.filter(|l| !l.is_empty()) {
        Some(label) => println!(
            "  {}  {} {}",
            style("Model:").bold(),
            label,
            style(format!("({model})")).dim()
        ),
        None => println!("  {}  {}", style("Model:").bold(), model),
    }
    println!(
        "  {}  {}",
        style("Backend:").bold(),
        style(backend.unwrap_or("none (no route or fallback)")).dim()
    );
    if reasoning {
        println!(
            "  {}  {}",
            style("Reasoning:").bold(),
            style("<think> blocks shown as 思考过程").dim()
        );
    }
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+C to stop a reply, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
