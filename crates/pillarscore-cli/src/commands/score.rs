//! The `pillarscore score` command.

use std::path::PathBuf;

use anyhow::Result;

use pillarscore_core::parser;
use pillarscore_core::record::share_url;
use pillarscore_core::report::DiagnosticReport;
use pillarscore_core::scoring::compute_result;
use pillarscore_store::config::load_config_from;

use super::{load_form, open_recorder, print_report, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    config_path: Option<PathBuf>,
    form_path: Option<PathBuf>,
    answers_path: PathBuf,
    user: Option<String>,
    no_save: bool,
    output: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let config = load_config_from(config_path.as_deref())?;

    let form = load_form(form_path, &config)?;
    let answers = parser::parse_answers(&answers_path)?;

    let unknown = answers
        .keys()
        .filter(|id| form.question(id).is_none())
        .count();
    if unknown > 0 {
        tracing::debug!(unknown, "answers reference questions not in the form");
    }

    let result = compute_result(&answers, &form.questions, &form.pillars);
    let report = DiagnosticReport::new(&form.name, &form.pillars, &result);

    print_report(&report, format)?;

    if let Some(path) = &output {
        report.save_json(path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    if no_save {
        return Ok(());
    }

    // The result is already shown; a failed save must not turn into an error exit.
    let recorded = match open_recorder(&config) {
        Ok(recorder) => {
            recorder
                .record(&form.id, user.as_deref(), &answers, &result)
                .await
        }
        Err(e) => Err(e),
    };

    match recorded {
        Ok(recorded) => {
            eprintln!("Share token: {}", recorded.share_token());
            eprintln!(
                "Share link: {}",
                share_url(&config.share_base_url, recorded.share_token())
            );
        }
        Err(e) => {
            tracing::warn!("failed to record diagnostic: {e:#}");
            eprintln!("Warning: diagnostic was not saved: {e:#}");
        }
    }

    Ok(())
}
