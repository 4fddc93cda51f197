//! The `pillarscore show` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use pillarscore_core::record::ShareToken;
use pillarscore_core::report::DiagnosticReport;
use pillarscore_core::scoring::ScoreResult;
use pillarscore_store::config::load_config_from;

use super::{load_form, open_recorder, print_report, OutputFormat};

pub async fn execute(
    config_path: Option<PathBuf>,
    token: String,
    form_path: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let config = load_config_from(config_path.as_deref())?;
    let token: ShareToken = token.parse().map_err(anyhow::Error::msg)?;

    let recorder = open_recorder(&config)?;
    let recorded = recorder
        .find_by_token(&token)
        .await?
        .with_context(|| format!("no diagnostic found for token {token}"))?;

    eprintln!(
        "Response {} to form {} ({})",
        recorded.response.id,
        recorded.response.form_id,
        recorded.response.created_at.format("%Y-%m-%d %H:%M UTC")
    );

    let form = if form_path.is_some() || config.default_form.is_some() {
        Some(load_form(form_path, &config)?)
    } else {
        None
    };

    match form {
        Some(form) => {
            if form.id != recorded.response.form_id {
                tracing::warn!(
                    form = %form.id,
                    recorded = %recorded.response.form_id,
                    "labelling a diagnostic with a different form"
                );
            }
            let report =
                DiagnosticReport::new(&form.name, &form.pillars, &recorded.diagnostic.result);
            print_report(&report, format)
        }
        None => print_unlabelled(&recorded.diagnostic.result, format),
    }
}

/// Print a stored result when no form is available to resolve pillar names.
fn print_unlabelled(result: &ScoreResult, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Pillar", "Score", "%", "Status"]);
    for (pillar_id, pct) in &result.percentages {
        table.add_row(vec![
            Cell::new(pillar_id),
            Cell::new(format!(
                "{}/{}",
                result.raw_scores.get(pillar_id).copied().unwrap_or(0),
                result.max_scores.get(pillar_id).copied().unwrap_or(0)
            )),
            Cell::new(format!("{pct}%")),
            Cell::new(result.levels.get(pillar_id).map(String::as_str).unwrap_or("")),
        ]);
    }
    println!("{table}");
    println!("Bottleneck: {}", result.bottleneck_pillar_id);
    Ok(())
}
