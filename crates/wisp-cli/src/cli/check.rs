//! `wisp check`: verify that a model's backend answers.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info_span, Instrument};

use wisp_infra::llm::test_model_connection;
use wisp_observe::genai_attrs::{
    span_name, GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME, GEN_AI_REQUEST_MODEL, OP_CHAT,
};

use crate::state::AppState;

/// Send a minimal completion for `model` and report the result.
pub async fn check_model(state: &AppState, model: &str, json: bool) -> Result<()> {
    let backend = state
        .router
        .resolve(model)
        .map(|r| r.provider.name().to_string())
        .ok();

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Contacting {}...", backend.as_deref().unwrap_or(model)));
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    };

    let span = info_span!(
        "check",
        otel.name = %span_name(OP_CHAT, model),
        { GEN_AI_OPERATION_NAME } = OP_CHAT,
        { GEN_AI_REQUEST_MODEL } = model,
        { GEN_AI_PROVIDER_NAME } = backend.as_deref().unwrap_or("none"),
    );

    let start = Instant::now();
    let result = test_model_connection(&state.router, model)
        .instrument(span)
        .await;
    let latency_ms = start.elapsed().as_millis() as u64;
    spinner.finish_and_clear();

    if json {
        let out = serde_json::json!({
            "model": model,
            "backend": backend,
            "ok": result.is_ok(),
            "latency_ms": latency_ms,
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        match &result {
            Ok(response) => {
                println!(
                    "  {} {} via {} ({:.1}s)",
                    style("✓").green(),
                    style(model).cyan().bold(),
                    backend.as_deref().unwrap_or("?"),
                    latency_ms as f64 / 1000.0
                );
                let reply: String = response.content.chars().take(60).collect();
                if !reply.trim().is_empty() {
                    println!("  {}", style(reply.trim()).dim());
                }
            }
            Err(e) => {
                println!("  {} {}: {e}", style("✗").red(), style(model).cyan().bold());
            }
        }
        println!();
    }

    if result.is_err() {
        bail!("connection check failed for model '{model}'");
    }
    Ok(())
}
