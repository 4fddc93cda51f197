//! Aggregate statistics across the diagnostics recorded for a form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::level::{classify_level, Level};
use crate::record::Diagnostic;
use crate::registry::PillarRegistry;

/// Summary of every diagnostic recorded for one form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSummary {
    /// Number of diagnostics summarized.
    pub response_count: usize,
    /// Per-pillar statistics, in registry scan order.
    pub pillars: Vec<PillarStats>,
}

/// Statistics for a single pillar across all diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarStats {
    pub pillar_id: String,
    pub name: String,
    /// Mean percentage, rounded; 0 when there are no diagnostics.
    pub average_percentage: u32,
    /// How many diagnostics named this pillar the bottleneck.
    pub bottleneck_count: usize,
    /// Diagnostics per level band.
    pub level_counts: BTreeMap<Level, usize>,
}

impl FormSummary {
    /// The pillar most often identified as the bottleneck; scan order breaks ties.
    pub fn most_common_bottleneck(&self) -> Option<&PillarStats> {
        let mut best: Option<&PillarStats> = None;
        for stats in self.pillars.iter().filter(|s| s.bottleneck_count > 0) {
            match best {
                Some(b) if stats.bottleneck_count <= b.bottleneck_count => {}
                _ => best = Some(stats),
            }
        }
        best
    }
}

/// Summarize diagnostics against the form's current registry.
///
/// Pillars missing from a stored diagnostic count as 0%.
pub fn summarize(pillars: &PillarRegistry, diagnostics: &[&Diagnostic]) -> FormSummary {
    let n = diagnostics.len();

    let stats = pillars
        .ordered()
        .map(|pillar| {
            let percentages: Vec<u32> = diagnostics
                .iter()
                .map(|d| d.result.percentage(&pillar.id))
                .collect();

            let average_percentage = if n == 0 {
                0
            } else {
                (percentages.iter().map(|&p| p as f64).sum::<f64>() / n as f64).round() as u32
            };

            let mut level_counts: BTreeMap<Level, usize> =
                Level::ALL.iter().map(|&l| (l, 0)).collect();
            for &pct in &percentages {
                *level_counts.entry(classify_level(pct)).or_default() += 1;
            }

            let bottleneck_count = diagnostics
                .iter()
                .filter(|d| d.result.bottleneck_pillar_id == pillar.id)
                .count();

            PillarStats {
                pillar_id: pillar.id.clone(),
                name: pillar.name.clone(),
                average_percentage,
                bottleneck_count,
                level_counts,
            }
        })
        .collect();

    FormSummary {
        response_count: n,
        pillars: stats,
    }
}
