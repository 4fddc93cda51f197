//! The ordered set of pillars a form evaluates against.

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::model::Pillar;

/// A non-empty list of pillars with a total scan order.
///
/// The scan order sorts by `order_index` ascending; equal indices keep their
/// declaration order. Construction fails on an empty list, so every scoring
/// call receives a registry that can produce a bottleneck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Pillar>", into = "Vec<Pillar>")]
pub struct PillarRegistry {
    pillars: Vec<Pillar>,
    scan_order: Vec<usize>,
}

impl PillarRegistry {
    pub fn new(pillars: Vec<Pillar>) -> Result<Self, ScoringError> {
        if pillars.is_empty() {
            return Err(ScoringError::EmptyPillarRegistry);
        }
        let mut scan_order: Vec<usize> = (0..pillars.len()).collect();
        scan_order.sort_by_key(|&i| pillars[i].order_index);
        Ok(Self {
            pillars,
            scan_order,
        })
    }

    /// Pillars in declaration order.
    pub fn pillars(&self) -> &[Pillar] {
        &self.pillars
    }

    /// Pillars in ascending `order_index`, declaration order breaking ties.
    pub fn ordered(&self) -> impl Iterator<Item = &Pillar> + '_ {
        self.scan_order.iter().map(move |&i| &self.pillars[i])
    }

    pub fn get(&self, id: &str) -> Option<&Pillar> {
        self.pillars.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.pillars.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.pillars.is_empty()
    }

    /// Recommendation text for the given pillar, if it exists and has any.
    pub fn feedback(&self, pillar_id: &str) -> Option<&str> {
        self.get(pillar_id)
            .map(|p| p.feedback.as_str())
            .filter(|f| !f.is_empty())
    }
}

impl TryFrom<Vec<Pillar>> for PillarRegistry {
    type Error = ScoringError;

    fn try_from(pillars: Vec<Pillar>) -> Result<Self, Self::Error> {
        Self::new(pillars)
    }
}

impl From<PillarRegistry> for Vec<Pillar> {
    fn from(registry: PillarRegistry) -> Self {
        registry.pillars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_is_rejected() {
        assert_eq!(
            PillarRegistry::new(vec![]).unwrap_err(),
            ScoringError::EmptyPillarRegistry
        );
    }

    #[test]
    fn scan_order_sorts_by_index_then_declaration() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("c", "C", 2),
            Pillar::new("a", "A", 0),
            Pillar::new("b1", "B1", 1),
            Pillar::new("b2", "B2", 1),
        ])
        .unwrap();
        let ids: Vec<&str> = registry.ordered().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn non_contiguous_indices() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("late", "Late", 40),
            Pillar::new("early", "Early", -3),
        ])
        .unwrap();
        assert_eq!(registry.ordered().next().unwrap().id, "early");
    }

    #[test]
    fn feedback_lookup() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("a", "A", 0).with_feedback("Fix A first"),
            Pillar::new("b", "B", 1),
        ])
        .unwrap();
        assert_eq!(registry.feedback("a"), Some("Fix A first"));
        assert_eq!(registry.feedback("b"), None);
        assert_eq!(registry.feedback("missing"), None);
    }

    #[test]
    fn deserializing_empty_list_fails() {
        let result: Result<PillarRegistry, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }

    #[test]
    fn serde_roundtrip_keeps_declaration_order() {
        let registry = PillarRegistry::new(vec![
            Pillar::new("z", "Z", 1),
            Pillar::new("y", "Y", 0),
        ])
        .unwrap();
        let json = serde_json::to_string(&registry).unwrap();
        let back: PillarRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, registry);
        assert_eq!(back.pillars()[0].id, "z");
    }
}
