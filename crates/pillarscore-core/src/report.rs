//! Diagnostic report assembly with JSON persistence and markdown output.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::level::{classify_level, Level};
use crate::registry::PillarRegistry;
use crate::scoring::ScoreResult;

/// A score result resolved against its registry, ready to display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Name of the form that was answered.
    pub form_name: String,
    /// One row per pillar, in registry scan order.
    pub pillars: Vec<PillarRow>,
    /// The bottleneck pillar id.
    pub bottleneck_pillar_id: String,
    /// Display name of the bottleneck pillar.
    pub bottleneck_name: String,
    /// Recommendation attached to the bottleneck pillar.
    #[serde(default)]
    pub recommendation: Option<String>,
    /// The underlying result.
    pub result: ScoreResult,
}

/// One pillar's line in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarRow {
    pub pillar_id: String,
    pub name: String,
    pub raw_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub level: Level,
    pub status: String,
    pub is_bottleneck: bool,
}

impl DiagnosticReport {
    pub fn new(form_name: &str, pillars: &PillarRegistry, result: &ScoreResult) -> Self {
        let rows = pillars
            .ordered()
            .map(|pillar| {
                let percentage = result.percentage(&pillar.id);
                let level = classify_level(percentage);
                PillarRow {
                    pillar_id: pillar.id.clone(),
                    name: pillar.name.clone(),
                    raw_score: result.raw_scores.get(&pillar.id).copied().unwrap_or(0),
                    max_score: result.max_scores.get(&pillar.id).copied().unwrap_or(0),
                    percentage,
                    level,
                    status: result
                        .levels
                        .get(&pillar.id)
                        .cloned()
                        .unwrap_or_else(|| pillar.status_label(level)),
                    is_bottleneck: pillar.id == result.bottleneck_pillar_id,
                }
            })
            .collect();

        // A stored result may name a pillar that has since been removed.
        let bottleneck_name = pillars
            .get(&result.bottleneck_pillar_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| result.bottleneck_pillar_id.clone());

        Self {
            form_name: form_name.to_string(),
            pillars: rows,
            bottleneck_pillar_id: result.bottleneck_pillar_id.clone(),
            bottleneck_name,
            recommendation: pillars
                .feedback(&result.bottleneck_pillar_id)
                .map(str::to_string),
            result: result.clone(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: DiagnosticReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.form_name));
        md.push_str("| Pillar | Score | % | Status |\n");
        md.push_str("|--------|-------|---|--------|\n");
        for row in &self.pillars {
            let marker = if row.is_bottleneck { " **(bottleneck)**" } else { "" };
            md.push_str(&format!(
                "| {}{} | {}/{} | {}% | {} |\n",
                row.name, marker, row.raw_score, row.max_score, row.percentage, row.status
            ));
        }
        md.push('\n');

        md.push_str(&format!("**Bottleneck:** {}\n", self.bottleneck_name));
        if let Some(recommendation) = &self.recommendation {
            md.push_str(&format!("\n> {recommendation}\n"));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerSet, Question, QuestionOption};
    use crate::presets::three_pillar_registry;
    use crate::scoring::compute_result;

    fn three_pillar_result() -> (PillarRegistry, ScoreResult) {
        let registry = three_pillar_registry();
        let questions: Vec<Question> = ["posicionamento", "produto", "vendas"]
            .iter()
            .map(|pillar| Question {
                id: format!("{pillar}-1"),
                text: String::new(),
                pillar_id: pillar.to_string(),
                order_index: 0,
                options: (1..=4)
                    .map(|p| QuestionOption::new(format!("{p}"), p, p as i32))
                    .collect(),
            })
            .collect();
        let answers: AnswerSet = [
            ("posicionamento-1".to_string(), 4),
            ("produto-1".to_string(), 1),
            ("vendas-1".to_string(), 3),
        ]
        .into();
        let result = compute_result(&answers, &questions, &registry);
        (registry, result)
    }

    #[test]
    fn rows_follow_scan_order() {
        let (registry, result) = three_pillar_result();
        let report = DiagnosticReport::new("3F", &registry, &result);
        let ids: Vec<&str> = report.pillars.iter().map(|r| r.pillar_id.as_str()).collect();
        assert_eq!(ids, vec!["vendas", "produto", "posicionamento"]);
        assert_eq!(report.bottleneck_pillar_id, "produto");
        assert!(report.pillars[1].is_bottleneck);
        assert_eq!(report.pillars[1].status, "Produto Implícito");
        assert!(report.recommendation.as_deref().unwrap().contains("oferta"));
    }

    #[test]
    fn markdown_output() {
        let (registry, result) = three_pillar_result();
        let md = DiagnosticReport::new("3F", &registry, &result).to_markdown();
        assert!(md.contains("| Produto **(bottleneck)** | 1/4 | 25% | Produto Implícito |"));
        assert!(md.contains("**Bottleneck:** Produto"));
    }

    #[test]
    fn json_roundtrip() {
        let (registry, result) = three_pillar_result();
        let report = DiagnosticReport::new("3F", &registry, &result);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = DiagnosticReport::load_json(&path).unwrap();

        assert_eq!(loaded.result, result);
        assert_eq!(loaded.pillars.len(), 3);
    }
}
