//! Pillar scoring and bottleneck identification.
//!
//! Every function here is pure: the result depends only on the answer set,
//! the question catalog and the pillar registry passed in.
//!
//! Unanswered questions contribute 0 points but still count towards their
//! pillar's maximum, so incomplete answer sets score lower.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::level::classify_level;
use crate::model::{AnswerSet, PillarScores, Question};
use crate::registry::PillarRegistry;

/// The outcome of scoring one completed diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Points earned per pillar.
    pub raw_scores: PillarScores,
    /// Points attainable per pillar.
    pub max_scores: PillarScores,
    /// `raw / max` as a rounded integer percentage per pillar.
    pub percentages: PillarScores,
    /// Status label per pillar.
    pub levels: BTreeMap<String, String>,
    /// The weakest pillar.
    pub bottleneck_pillar_id: String,
}

impl ScoreResult {
    pub fn percentage(&self, pillar_id: &str) -> u32 {
        self.percentages.get(pillar_id).copied().unwrap_or(0)
    }
}

/// Maximum attainable points per pillar.
///
/// Every registry pillar is present in the output, 0 when no question
/// targets it.
pub fn compute_max_scores(questions: &[Question], pillars: &PillarRegistry) -> PillarScores {
    let mut max_scores = zeroed(pillars);
    for question in questions {
        match max_scores.get_mut(&question.pillar_id) {
            Some(total) => *total = total.saturating_add(question.max_points()),
            None => tracing::debug!(
                question = %question.id,
                pillar = %question.pillar_id,
                "question targets a pillar outside the registry, ignoring"
            ),
        }
    }
    max_scores
}

/// Points earned per pillar.
///
/// Answers for questions missing from the catalog, or whose pillar is not in
/// the registry, are ignored.
pub fn compute_raw_scores(
    answers: &AnswerSet,
    questions: &[Question],
    pillars: &PillarRegistry,
) -> PillarScores {
    let by_id: HashMap<&str, &Question> = questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut raw_scores = zeroed(pillars);
    for (question_id, &points) in answers {
        let Some(question) = by_id.get(question_id.as_str()) else {
            tracing::debug!(question = %question_id, "answer for unknown question, ignoring");
            continue;
        };
        if let Some(total) = raw_scores.get_mut(&question.pillar_id) {
            *total = total.saturating_add(points);
        }
    }
    raw_scores
}

/// Rounded percentage per pillar; 0 for pillars with nothing to score.
pub fn compute_percentages(
    raw_scores: &PillarScores,
    max_scores: &PillarScores,
    pillars: &PillarRegistry,
) -> PillarScores {
    pillars
        .pillars()
        .iter()
        .map(|pillar| {
            let raw = raw_scores.get(&pillar.id).copied().unwrap_or(0);
            let max = max_scores.get(&pillar.id).copied().unwrap_or(0);
            (pillar.id.clone(), percentage(raw, max))
        })
        .collect()
}

/// `round(raw / max * 100)`, half away from zero, capped at 100.
pub fn percentage(raw: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    let pct = (raw as f64 / max as f64 * 100.0).round() as u32;
    if pct > 100 {
        tracing::warn!(raw, max, "raw score exceeds maximum, clamping to 100%");
        return 100;
    }
    pct
}

/// Status label per pillar.
pub fn compute_levels(
    percentages: &PillarScores,
    pillars: &PillarRegistry,
) -> BTreeMap<String, String> {
    pillars
        .pillars()
        .iter()
        .map(|pillar| {
            let pct = percentages.get(&pillar.id).copied().unwrap_or(0);
            (pillar.id.clone(), pillar.status_label(classify_level(pct)))
        })
        .collect()
}

/// The first pillar, in scan order, holding the lowest percentage.
///
/// Ties go to the lowest `order_index` (then declaration order), never to
/// any notion of severity.
pub fn identify_bottleneck<'a>(
    percentages: &PillarScores,
    pillars: &'a PillarRegistry,
) -> &'a str {
    let mut ordered = pillars.ordered();
    // A registry is never empty.
    let first = ordered.next().map(|p| p.id.as_str()).unwrap_or_default();
    let mut bottleneck = first;
    let mut min = percentages.get(first).copied().unwrap_or(0);

    for pillar in ordered {
        let pct = percentages.get(&pillar.id).copied().unwrap_or(0);
        if pct < min {
            min = pct;
            bottleneck = pillar.id.as_str();
        }
    }
    bottleneck
}

/// Score an answer set against a form's catalog and registry.
pub fn compute_result(
    answers: &AnswerSet,
    questions: &[Question],
    pillars: &PillarRegistry,
) -> ScoreResult {
    let max_scores = compute_max_scores(questions, pillars);
    let raw_scores = compute_raw_scores(answers, questions, pillars);
    let percentages = compute_percentages(&raw_scores, &max_scores, pillars);
    let levels = compute_levels(&percentages, pillars);
    let bottleneck_pillar_id = identify_bottleneck(&percentages, pillars).to_string();

    ScoreResult {
        raw_scores,
        max_scores,
        percentages,
        levels,
        bottleneck_pillar_id,
    }
}

fn zeroed(pillars: &PillarRegistry) -> PillarScores {
    pillars.pillars().iter().map(|p| (p.id.clone(), 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pillar, QuestionOption};
    use crate::presets::three_pillar_registry;

    fn question(id: &str, pillar: &str, points: &[u32]) -> Question {
        Question {
            id: id.into(),
            text: format!("question {id}"),
            pillar_id: pillar.into(),
            order_index: 0,
            options: points
                .iter()
                .enumerate()
                .map(|(i, &p)| QuestionOption::new(format!("{p} points"), p, i as i32))
                .collect(),
        }
    }

    fn xyz() -> (PillarRegistry, Vec<Question>) {
        let registry = PillarRegistry::new(vec![
            Pillar::new("x", "X", 0),
            Pillar::new("y", "Y", 1),
            Pillar::new("z", "Z", 2),
        ])
        .unwrap();
        let questions = vec![
            question("a", "x", &[1, 2, 3, 4]),
            question("b", "y", &[1, 2, 3, 4]),
            question("c", "z", &[1, 2, 3, 4]),
        ];
        (registry, questions)
    }

    fn answers(pairs: &[(&str, u32)]) -> AnswerSet {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn scores(pairs: &[(&str, u32)]) -> PillarScores {
        answers(pairs)
    }

    #[test]
    fn concrete_three_pillar_scenario() {
        let (registry, questions) = xyz();
        let result = compute_result(
            &answers(&[("a", 4), ("b", 1), ("c", 2)]),
            &questions,
            &registry,
        );

        assert_eq!(result.max_scores, scores(&[("x", 4), ("y", 4), ("z", 4)]));
        assert_eq!(result.raw_scores, scores(&[("x", 4), ("y", 1), ("z", 2)]));
        assert_eq!(
            result.percentages,
            scores(&[("x", 100), ("y", 25), ("z", 50)])
        );
        assert_eq!(result.levels["x"], "X - Avançado");
        assert_eq!(result.levels["y"], "Y - Inicial");
        assert_eq!(result.levels["z"], "Z - Em Desenvolvimento");
        assert_eq!(result.bottleneck_pillar_id, "y");
    }

    #[test]
    fn all_max_answers_score_100() {
        let (registry, questions) = xyz();
        let all_max: AnswerSet = questions
            .iter()
            .map(|q| (q.id.clone(), q.max_points()))
            .collect();
        let result = compute_result(&all_max, &questions, &registry);
        assert!(result.percentages.values().all(|&p| p == 100));
        assert_eq!(result.bottleneck_pillar_id, "x");
    }

    #[test]
    fn empty_answers_score_zero_and_pick_first_pillar() {
        let (registry, questions) = xyz();
        let result = compute_result(&AnswerSet::new(), &questions, &registry);
        assert!(result.percentages.values().all(|&p| p == 0));
        assert_eq!(result.bottleneck_pillar_id, "x");
    }

    #[test]
    fn unanswered_questions_still_count_towards_max() {
        let registry = PillarRegistry::new(vec![Pillar::new("p", "P", 0)]).unwrap();
        let questions = vec![question("q1", "p", &[0, 4]), question("q2", "p", &[0, 4])];
        let result = compute_result(&answers(&[("q1", 4)]), &questions, &registry);
        assert_eq!(result.max_scores["p"], 8);
        assert_eq!(result.percentages["p"], 50);
    }

    #[test]
    fn pillar_without_questions_scores_zero() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("full", "Full", 0),
            Pillar::new("empty", "Empty", 1),
        ])
        .unwrap();
        let questions = vec![question("q", "full", &[1, 2])];
        let result = compute_result(&answers(&[("q", 2)]), &questions, &registry);
        assert_eq!(result.max_scores["empty"], 0);
        assert_eq!(result.percentages["empty"], 0);
        assert_eq!(result.bottleneck_pillar_id, "empty");
    }

    #[test]
    fn stale_answers_are_ignored() {
        let (registry, questions) = xyz();
        let result = compute_result(
            &answers(&[("a", 4), ("removed-question", 9)]),
            &questions,
            &registry,
        );
        assert_eq!(result.raw_scores, scores(&[("x", 4), ("y", 0), ("z", 0)]));
    }

    #[test]
    fn questions_for_unknown_pillars_are_ignored() {
        let (registry, mut questions) = xyz();
        questions.push(question("orphan", "w", &[1, 10]));
        let result = compute_result(&answers(&[("orphan", 10)]), &questions, &registry);
        assert!(!result.max_scores.contains_key("w"));
        assert!(!result.raw_scores.contains_key("w"));
        assert_eq!(result.max_scores["x"], 4);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 3), 33); // 33.33
        assert_eq!(percentage(2, 3), 67); // 66.67
        assert_eq!(percentage(7, 20), 35);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn percentage_is_capped() {
        assert_eq!(percentage(12, 4), 100);
    }

    #[test]
    fn oversized_answers_saturate_instead_of_overflowing() {
        let registry = PillarRegistry::new(vec![Pillar::new("x", "X", 0)]).unwrap();
        let questions = vec![question("q1", "x", &[0, 4]), question("q2", "x", &[0, 4])];

        let result = compute_result(
            &answers(&[("q1", u32::MAX), ("q2", 1)]),
            &questions,
            &registry,
        );
        assert_eq!(result.raw_scores["x"], u32::MAX);
        assert_eq!(result.max_scores["x"], 8);
        assert_eq!(result.percentages["x"], 100);
        assert_eq!(result.bottleneck_pillar_id, "x");
    }

    #[test]
    fn oversized_option_points_saturate_max() {
        let registry = PillarRegistry::new(vec![Pillar::new("x", "X", 0)]).unwrap();
        let questions = vec![
            question("q1", "x", &[0, u32::MAX]),
            question("q2", "x", &[0, u32::MAX]),
        ];

        let result = compute_result(&answers(&[("q1", 1)]), &questions, &registry);
        assert_eq!(result.max_scores["x"], u32::MAX);
        assert_eq!(result.percentages["x"], 0);
    }

    #[test]
    fn tie_goes_to_lowest_order_index() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("p2", "P2", 1),
            Pillar::new("p1", "P1", 0),
        ])
        .unwrap();
        let pct = scores(&[("p1", 40), ("p2", 40)]);
        assert_eq!(identify_bottleneck(&pct, &registry), "p1");
    }

    #[test]
    fn tie_with_equal_order_index_goes_to_declaration_order() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("first", "First", 0),
            Pillar::new("second", "Second", 0),
        ])
        .unwrap();
        let pct = scores(&[("first", 10), ("second", 10)]);
        assert_eq!(identify_bottleneck(&pct, &registry), "first");
    }

    #[test]
    fn strict_minimum_beats_earlier_pillar() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("p1", "P1", 0),
            Pillar::new("p2", "P2", 1),
            Pillar::new("p3", "P3", 2),
        ])
        .unwrap();
        let pct = scores(&[("p1", 30), ("p2", 60), ("p3", 29)]);
        assert_eq!(identify_bottleneck(&pct, &registry), "p3");
    }

    #[test]
    fn three_pillar_tie_goes_to_vendas() {
        let registry = three_pillar_registry();
        let pct = scores(&[("posicionamento", 50), ("produto", 50), ("vendas", 50)]);
        assert_eq!(identify_bottleneck(&pct, &registry), "vendas");

        let pct = scores(&[("posicionamento", 20), ("produto", 20), ("vendas", 90)]);
        assert_eq!(identify_bottleneck(&pct, &registry), "produto");
    }

    #[test]
    fn three_pillar_levels_use_status_phrases() {
        let registry = three_pillar_registry();
        let pct = scores(&[("posicionamento", 10), ("produto", 60), ("vendas", 80)]);
        let levels = compute_levels(&pct, &registry);
        assert_eq!(levels["posicionamento"], "Posicionamento Difuso");
        assert_eq!(levels["produto"], "Produto Validado");
        assert_eq!(levels["vendas"], "Vendas Escaláveis");
    }

    #[test]
    fn result_is_deterministic() {
        let (registry, questions) = xyz();
        let a = answers(&[("a", 3), ("b", 3), ("c", 1)]);
        assert_eq!(
            compute_result(&a, &questions, &registry),
            compute_result(&a, &questions, &registry)
        );
    }
}
