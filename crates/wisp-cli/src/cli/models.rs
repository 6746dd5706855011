//! `wisp models`: show the model routing table.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use wisp_types::config::WispConfig;

use crate::state::AppState;

/// One row of the routing table, as printed and as serialized with `--json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub label: String,
    pub backend: String,
    pub base_url: Option<String>,
    pub reasoning_markers: bool,
    pub default: bool,
}

/// Flatten the configured routes into display rows.
pub fn model_rows(config: &WispConfig) -> Vec<ModelInfo> {
    config
        .models
        .iter()
        .map(|route| ModelInfo {
            id: route.id.clone(),
            label: route.label.clone(),
            backend: route.backend.clone(),
            base_url: config
                .backends
                .iter()
                .find(|b| b.name == route.backend)
                .map(|b| b.base_url.clone()),
            reasoning_markers: route.reasoning_markers,
            default: route.id == config.default_model,
        })
        .collect()
}

/// Build the styled routing table for display.
pub fn routing_table(rows: &[ModelInfo]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Model").fg(Color::White),
        Cell::new("Label").fg(Color::White),
        Cell::new("Backend").fg(Color::White),
        Cell::new("Reasoning").fg(Color::White),
    ]);

    for row in rows {
        let id = if row.default {
            format!("{} *", row.id)
        } else {
            row.id.clone()
        };
        let reasoning = if row.reasoning_markers {
            Cell::new("● <think>").fg(Color::Green)
        } else {
            Cell::new("○").fg(Color::DarkGrey)
        };
        let backend = match &row.base_url {
            Some(url) => format!("{} ({url})", row.backend),
            None => row.backend.clone(),
        };

        table.add_row(vec![
            Cell::new(id).fg(Color::Cyan),
            Cell::new(&row.label),
            Cell::new(backend).fg(Color::White),
            reasoning,
        ]);
    }

    table
}

/// List configured models.
pub fn list_models(state: &AppState, json: bool) -> Result<()> {
    let rows = model_rows(&state.config);

    if json {
        let out = serde_json::json!({
            "default_model": state.config.default_model,
            "fallback_backend": state.config.fallback_backend,
            "models": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!();
        println!(
            "  {} No models configured. Add [[models]] entries to {}",
            style("i").blue().bold(),
            style(state.data_dir.join("config.toml").display()).yellow()
        );
        println!();
        return Ok(());
    }

    let table = routing_table(&rows);

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} model{}  {} default  {} fallback: {}",
        style(rows.len()).bold(),
        if rows.len() == 1 { "" } else { "s" },
        style("*").cyan(),
        style("\u{00b7}").dim(),
        style(state.config.fallback_backend.as_deref().unwrap_or("none")).dim()
    );
    println!();

    Ok(())
}
