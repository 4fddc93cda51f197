//! TOML form parser and answer-set loader.
//!
//! Loads forms from TOML files and directories, validates them for
//! authoring mistakes, and reads answer sets from JSON or TOML.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    AnswerSet, Form, Pillar, Question, QuestionOption, StatusLabels, MAX_OPTION_POINTS,
    MIN_OPTIONS_PER_QUESTION,
};
use crate::presets::three_pillar_registry;
use crate::registry::PillarRegistry;

/// Intermediate TOML structure for parsing form files.
#[derive(Debug, Deserialize)]
struct TomlFormFile {
    form: TomlFormHeader,
    #[serde(default)]
    pillars: Vec<TomlPillar>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlFormHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    /// Use a built-in registry instead of `[[pillars]]`.
    #[serde(default)]
    preset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlPillar {
    id: String,
    name: String,
    #[serde(default)]
    order_index: Option<i32>,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status_labels: Option<StatusLabels>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    text: String,
    pillar: String,
    #[serde(default)]
    order_index: Option<i32>,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    text: String,
    points: u32,
    #[serde(default)]
    order_index: Option<i32>,
}

/// Parse a single TOML file into a `Form`.
pub fn parse_form(path: &Path) -> Result<Form> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read form file: {}", path.display()))?;

    parse_form_str(&content, path)
}

/// Parse a TOML string into a `Form` (useful for testing).
pub fn parse_form_str(content: &str, source_path: &Path) -> Result<Form> {
    let parsed: TomlFormFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let pillars = if parsed.pillars.is_empty() {
        match parsed.form.preset.as_deref() {
            Some("three-pillar") | Some("3f") => three_pillar_registry(),
            Some(other) => anyhow::bail!("unknown pillar preset: {other}"),
            None => PillarRegistry::new(vec![])
                .with_context(|| format!("form {} declares no pillars", parsed.form.id))?,
        }
    } else {
        let pillars = parsed
            .pillars
            .into_iter()
            .enumerate()
            .map(|(i, p)| Pillar {
                id: p.id,
                name: p.name,
                order_index: p.order_index.unwrap_or(i as i32),
                feedback: p.feedback,
                description: p.description,
                status_labels: p.status_labels,
            })
            .collect();
        PillarRegistry::new(pillars)?
    };

    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| Question {
            id: q.id,
            text: q.text,
            pillar_id: q.pillar,
            order_index: q.order_index.unwrap_or(i as i32),
            options: q
                .options
                .into_iter()
                .enumerate()
                .map(|(j, o)| QuestionOption {
                    text: o.text,
                    points: o.points,
                    order_index: o.order_index.unwrap_or(j as i32),
                })
                .collect(),
        })
        .collect();

    Ok(Form {
        id: parsed.form.id,
        name: parsed.form.name,
        description: parsed.form.description,
        pillars,
        questions,
    })
}

/// Recursively load all `.toml` form files from a directory.
pub fn load_form_directory(dir: &Path) -> Result<Vec<Form>> {
    let mut forms = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            forms.extend(load_form_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_form(&path) {
                Ok(form) => forms.push(form),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    forms.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(forms)
}

/// Load an answer set from a `.json` file or a TOML table of `id = points`.
pub fn parse_answers(path: &Path) -> Result<AnswerSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse answers JSON: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("failed to parse answers TOML: {}", path.display()))
    }
}

/// A warning from form validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn form(message: String) -> Self {
        Self {
            question_id: None,
            message,
        }
    }

    fn question(question: &Question, message: String) -> Self {
        Self {
            question_id: Some(question.id.clone()),
            message,
        }
    }
}

/// Validate a form for authoring mistakes.
///
/// None of these stop a form from being scored; they flag answers that would
/// be ignored or pillars that can never score above 0.
pub fn validate_form(form: &Form) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_pillars = HashSet::new();
    for pillar in form.pillars.pillars() {
        if !seen_pillars.insert(pillar.id.as_str()) {
            warnings.push(ValidationWarning::form(format!(
                "duplicate pillar ID: {}",
                pillar.id
            )));
        }
    }

    let mut seen_questions = HashSet::new();
    for question in &form.questions {
        if !seen_questions.insert(question.id.as_str()) {
            warnings.push(ValidationWarning::question(
                question,
                format!("duplicate question ID: {}", question.id),
            ));
        }
    }

    for question in &form.questions {
        if !form.pillars.contains(&question.pillar_id) {
            warnings.push(ValidationWarning::question(
                question,
                format!("references unknown pillar: {}", question.pillar_id),
            ));
        }
        if question.text.trim().is_empty() {
            warnings.push(ValidationWarning::question(
                question,
                "question text is empty".into(),
            ));
        }
        if question.options.len() < MIN_OPTIONS_PER_QUESTION {
            warnings.push(ValidationWarning::question(
                question,
                format!(
                    "has {} option(s), at least {MIN_OPTIONS_PER_QUESTION} required",
                    question.options.len()
                ),
            ));
        }
        for option in &question.options {
            if option.points > MAX_OPTION_POINTS {
                warnings.push(ValidationWarning::question(
                    question,
                    format!(
                        "option \"{}\" is worth {} points, maximum is {MAX_OPTION_POINTS}",
                        option.text, option.points
                    ),
                ));
            }
            if option.text.trim().is_empty() {
                warnings.push(ValidationWarning::question(
                    question,
                    "option text is empty".into(),
                ));
            }
        }
    }

    for pillar in form.pillars.pillars() {
        if !form.questions.iter().any(|q| q.pillar_id == pillar.id) {
            warnings.push(ValidationWarning::form(format!(
                "pillar {} has no questions and will always score 0%",
                pillar.id
            )));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[form]
id = "marketing-check"
name = "Marketing Check"
description = "A two-pillar form"

[[pillars]]
id = "reach"
name = "Reach"
order_index = 0
feedback = "Grow your audience first."

[[pillars]]
id = "retention"
name = "Retention"
order_index = 1
feedback = "Keep the customers you have."

[pillars.status_labels]
initial = "Leaky"
developing = "Patchy"
structured = "Sticky"
advanced = "Loyal"

[[questions]]
id = "r1"
text = "How many people see your content?"
pillar = "reach"

[[questions.options]]
text = "Almost nobody"
points = 0

[[questions.options]]
text = "Thousands"
points = 4

[[questions]]
id = "t1"
text = "How often do customers come back?"
pillar = "retention"

[[questions.options]]
text = "Never"
points = 1

[[questions.options]]
text = "Always"
points = 3
"#;

    #[test]
    fn parse_valid_toml() {
        let form = parse_form_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(form.id, "marketing-check");
        assert_eq!(form.pillars.len(), 2);
        assert_eq!(form.questions.len(), 2);
        assert_eq!(form.questions[1].pillar_id, "retention");
        assert_eq!(form.questions[1].order_index, 1);
        assert_eq!(form.questions[0].options[1].order_index, 1);
        assert!(form.pillars.get("retention").unwrap().status_labels.is_some());
        assert!(validate_form(&form).is_empty());
    }

    #[test]
    fn parse_preset_form() {
        let toml = r#"
[form]
id = "legacy"
name = "Legacy"
preset = "three-pillar"
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(form.pillars.len(), 3);
        assert_eq!(form.pillars.ordered().next().unwrap().id, "vendas");
    }

    #[test]
    fn form_without_pillars_is_an_error() {
        let toml = r#"
[form]
id = "empty"
name = "Empty"
"#;
        let err = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("pillar registry is empty"));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let toml = r#"
[form]
id = "odd"
name = "Odd"
preset = "seven-pillar"
"#;
        assert!(parse_form_str(toml, &PathBuf::from("test.toml")).is_err());
    }

    #[test]
    fn validate_catches_authoring_mistakes() {
        let toml = r#"
[form]
id = "broken"
name = "Broken"

[[pillars]]
id = "a"
name = "A"

[[pillars]]
id = "lonely"
name = "Lonely"

[[questions]]
id = "q1"
text = "Only one option"
pillar = "a"

[[questions.options]]
text = "Yes"
points = 11

[[questions]]
id = "q1"
text = "Same id, unknown pillar"
pillar = "ghost"

[[questions.options]]
text = "No"
points = 0

[[questions.options]]
text = "Yes"
points = 1
"#;
        let form = parse_form_str(toml, &PathBuf::from("test.toml")).unwrap();
        let warnings = validate_form(&form);
        let has = |needle: &str| warnings.iter().any(|w| w.message.contains(needle));
        assert!(has("duplicate question ID"));
        assert!(has("unknown pillar: ghost"));
        assert!(has("at least 2 required"));
        assert!(has("maximum is 10"));
        assert!(has("lonely has no questions"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_form_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("form.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml {").unwrap();

        let forms = load_form_directory(dir.path()).unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, "marketing-check");
    }

    #[test]
    fn answers_from_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("answers.json");
        std::fs::write(&json, r#"{"r1": 4, "t1": 1}"#).unwrap();
        let toml_path = dir.path().join("answers.toml");
        std::fs::write(&toml_path, "r1 = 4\nt1 = 1\n").unwrap();

        let from_json = parse_answers(&json).unwrap();
        let from_toml = parse_answers(&toml_path).unwrap();
        assert_eq!(from_json, from_toml);
        assert_eq!(from_json["r1"], 4);
    }

    #[test]
    fn negative_points_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("answers.json");
        std::fs::write(&json, r#"{"r1": -1}"#).unwrap();
        assert!(parse_answers(&json).is_err());
    }
}
