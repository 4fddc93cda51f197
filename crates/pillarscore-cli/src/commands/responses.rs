//! The `pillarscore responses` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use pillarscore_core::model::Form;
use pillarscore_core::record::Diagnostic;
use pillarscore_core::recorder::ResponseRecorder;
use pillarscore_core::statistics::summarize;
use pillarscore_store::config::load_config_from;

use super::{load_form, open_recorder};

pub async fn execute(
    config_path: Option<PathBuf>,
    form_path: Option<PathBuf>,
    user: Option<String>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let recorder = open_recorder(&config)?;

    match user {
        Some(user) => list_user(&recorder, &user).await,
        None => {
            let form = load_form(form_path, &config)?;
            list_form(&recorder, &form).await
        }
    }
}

async fn list_form(recorder: &ResponseRecorder, form: &Form) -> Result<()> {
    let responses = recorder.form_responses(&form.id).await?;
    println!("Form: {} ({} responses)", form.name, responses.len());
    if responses.is_empty() {
        return Ok(());
    }

    let pillars: Vec<_> = form.pillars.ordered().collect();

    let mut header = vec!["Created".to_string(), "Token".to_string(), "User".to_string()];
    header.extend(pillars.iter().map(|p| p.name.clone()));
    header.push("Bottleneck".to_string());

    let mut table = Table::new();
    table.set_header(header);

    for entry in &responses {
        let mut row = vec![
            Cell::new(entry.response.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&entry.response.share_token),
            Cell::new(entry.response.user_id.as_deref().unwrap_or("-")),
        ];
        match &entry.diagnostic {
            Some(diagnostic) => {
                row.extend(
                    pillars
                        .iter()
                        .map(|p| Cell::new(format!("{}%", diagnostic.result.percentage(&p.id)))),
                );
                let bottleneck = &diagnostic.result.bottleneck_pillar_id;
                let name = form
                    .pillars
                    .get(bottleneck)
                    .map(|p| p.name.as_str())
                    .unwrap_or(bottleneck.as_str());
                row.push(Cell::new(name));
            }
            None => {
                row.extend(pillars.iter().map(|_| Cell::new("-")));
                row.push(Cell::new("(no diagnostic)"));
            }
        }
        table.add_row(row);
    }
    println!("{table}");

    let diagnostics: Vec<&Diagnostic> = responses
        .iter()
        .filter_map(|entry| entry.diagnostic.as_ref())
        .collect();
    let summary = summarize(&form.pillars, &diagnostics);

    let mut table = Table::new();
    table.set_header(vec!["Pillar", "Average", "Bottleneck", "Levels"]);
    for stats in &summary.pillars {
        let levels = stats
            .level_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(level, count)| format!("{level}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&stats.name),
            Cell::new(format!("{}%", stats.average_percentage)),
            Cell::new(stats.bottleneck_count),
            Cell::new(levels),
        ]);
    }
    println!("\nSummary ({} diagnostics)", summary.response_count);
    println!("{table}");

    if let Some(most_common) = summary.most_common_bottleneck() {
        println!(
            "Most common bottleneck: {} ({} of {})",
            most_common.name, most_common.bottleneck_count, summary.response_count
        );
    }

    Ok(())
}

async fn list_user(recorder: &ResponseRecorder, user: &str) -> Result<()> {
    let responses = recorder.user_responses(user).await?;
    println!("User: {user} ({} responses)", responses.len());
    if responses.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Created", "Form", "Token"]);
    for response in &responses {
        table.add_row(vec![
            Cell::new(response.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&response.form_id),
            Cell::new(&response.share_token),
        ]);
    }
    println!("{table}");
    Ok(())
}
