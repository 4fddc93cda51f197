pub mod init;
pub mod responses;
pub mod score;
pub mod show;
pub mod validate;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use pillarscore_core::model::Form;
use pillarscore_core::parser;
use pillarscore_core::recorder::ResponseRecorder;
use pillarscore_core::report::DiagnosticReport;
use pillarscore_store::{create_store, PillarscoreConfig};

/// How a diagnostic is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unknown format: {other} (expected text, markdown or json)"),
        }
    }
}

/// Load the form named on the command line, falling back to the configured default.
pub fn load_form(form: Option<PathBuf>, config: &PillarscoreConfig) -> Result<Form> {
    let path = form.or_else(|| config.default_form.clone()).context(
        "no form given: pass --form or set default_form in pillarscore.toml",
    )?;
    parser::parse_form(&path)
}

pub fn open_recorder(config: &PillarscoreConfig) -> Result<ResponseRecorder> {
    let store = create_store(&config.store)?;
    tracing::debug!(store = store.name(), "opened response store");
    Ok(ResponseRecorder::new(
        Arc::from(store),
        config.recorder_config(),
    ))
}

pub fn print_report(report: &DiagnosticReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Markdown => print!("{}", report.to_markdown()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(report).context("failed to serialize report")?
            );
        }
    }
    Ok(())
}

fn print_text(report: &DiagnosticReport) {
    let mut table = Table::new();
    table.set_header(vec!["Pillar", "Score", "%", "Status"]);

    for row in &report.pillars {
        let name = if row.is_bottleneck {
            format!("{} *", row.name)
        } else {
            row.name.clone()
        };
        table.add_row(vec![
            Cell::new(name),
            Cell::new(format!("{}/{}", row.raw_score, row.max_score)),
            Cell::new(format!("{}%", row.percentage)),
            Cell::new(&row.status),
        ]);
    }

    println!("{}", report.form_name);
    println!("{table}");
    println!("Bottleneck: {}", report.bottleneck_name);
    if let Some(recommendation) = &report.recommendation {
        println!("\n{recommendation}");
    }
}
