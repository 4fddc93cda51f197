//! Core data model types for pillarscore.
//!
//! Pillars are the dimensions a form evaluates; questions belong to exactly
//! one pillar and offer scored options; an answer set maps question ids to
//! the points of the selected option.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::registry::PillarRegistry;

/// Question id → points of the selected option. May be partial.
pub type AnswerSet = BTreeMap<String, u32>;

/// Pillar id → score (raw, max, or percentage depending on context).
pub type PillarScores = BTreeMap<String, u32>;

/// Highest number of points a single option may be worth.
pub const MAX_OPTION_POINTS: u32 = 10;

/// Fewest options a question needs to be answerable.
pub const MIN_OPTIONS_PER_QUESTION: usize = 2;

/// A named dimension of evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    /// Unique identifier within a registry.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display and tie-break order (ascending).
    #[serde(default)]
    pub order_index: i32,
    /// Recommendation shown when this pillar is the bottleneck.
    #[serde(default)]
    pub feedback: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional per-level status phrases replacing the generic label.
    #[serde(default)]
    pub status_labels: Option<StatusLabels>,
}

impl Pillar {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order_index: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order_index,
            feedback: String::new(),
            description: None,
            status_labels: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = feedback.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status_labels(mut self, labels: StatusLabels) -> Self {
        self.status_labels = Some(labels);
        self
    }

    /// Human-readable status for this pillar at the given level.
    ///
    /// Uses the pillar's own phrase when one is configured, otherwise
    /// `"{name} - {level}"`.
    pub fn status_label(&self, level: Level) -> String {
        match &self.status_labels {
            Some(labels) => labels.get(level).to_string(),
            None => format!("{} - {}", self.name, level),
        }
    }
}

/// One status phrase per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabels {
    pub initial: String,
    pub developing: String,
    pub structured: String,
    pub advanced: String,
}

impl StatusLabels {
    pub fn get(&self, level: Level) -> &str {
        match level {
            Level::Initial => &self.initial,
            Level::Developing => &self.developing,
            Level::Structured => &self.structured,
            Level::Advanced => &self.advanced,
        }
    }
}

/// A scored answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    pub points: u32,
    #[serde(default)]
    pub order_index: i32,
}

impl QuestionOption {
    pub fn new(text: impl Into<String>, points: u32, order_index: i32) -> Self {
        Self {
            text: text.into(),
            points,
            order_index,
        }
    }
}

/// A question bound to exactly one pillar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within a form.
    pub id: String,
    /// Question text.
    #[serde(default)]
    pub text: String,
    /// The pillar this question scores towards.
    pub pillar_id: String,
    /// Display order within the form.
    #[serde(default)]
    pub order_index: i32,
    /// Answer choices.
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Points of the best option, or 0 for a question with no options.
    pub fn max_points(&self) -> u32 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }

    /// Options sorted by `order_index`, ties kept in declaration order.
    pub fn ordered_options(&self) -> Vec<&QuestionOption> {
        let mut options: Vec<&QuestionOption> = self.options.iter().collect();
        options.sort_by_key(|o| o.order_index);
        options
    }
}

/// A diagnostic form: the pillar registry plus its question catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    /// Unique identifier for this form.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of this form.
    #[serde(default)]
    pub description: String,
    /// The pillars this form evaluates.
    pub pillars: PillarRegistry,
    /// The questions in this form.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Form {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Questions sorted by `order_index`, ties kept in declaration order.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.order_index);
        questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(points: &[u32]) -> Question {
        Question {
            id: "q1".into(),
            text: "How?".into(),
            pillar_id: "p1".into(),
            order_index: 0,
            options: points
                .iter()
                .enumerate()
                .map(|(i, &p)| QuestionOption::new(format!("option {i}"), p, i as i32))
                .collect(),
        }
    }

    #[test]
    fn max_points_picks_best_option() {
        assert_eq!(question(&[1, 4, 2, 3]).max_points(), 4);
        assert_eq!(question(&[]).max_points(), 0);
    }

    #[test]
    fn generic_status_label() {
        let pillar = Pillar::new("p1", "Marketing", 0);
        assert_eq!(
            pillar.status_label(Level::Developing),
            "Marketing - Em Desenvolvimento"
        );
    }

    #[test]
    fn custom_status_label() {
        let pillar = Pillar::new("p1", "Vendas", 0).with_status_labels(StatusLabels {
            initial: "Vendas Reativas".into(),
            developing: "Vendas Inconsistentes".into(),
            structured: "Vendas Estruturadas".into(),
            advanced: "Vendas Escaláveis".into(),
        });
        assert_eq!(pillar.status_label(Level::Initial), "Vendas Reativas");
        assert_eq!(pillar.status_label(Level::Advanced), "Vendas Escaláveis");
    }

    #[test]
    fn ordered_options_is_stable() {
        let mut q = question(&[1, 2, 3]);
        q.options[0].order_index = 5;
        q.options[1].order_index = 0;
        q.options[2].order_index = 0;
        let texts: Vec<&str> = q.ordered_options().iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["option 1", "option 2", "option 0"]);
    }
}
