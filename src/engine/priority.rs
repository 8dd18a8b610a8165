//! Priority resolution between competing matches of one frame.
//!
//! Ranking order:
//! 1. Most overdue rule relative to its own cooldown
//! 2. Higher recognition confidence
//! 3. Earlier rule in the configured list
//! 4. Earlier detection in the batch

use std::cmp::Ordering;
use tracing::trace;

use crate::rules::MatchCandidate;

/// Compares two candidates; `Less` means `a` ranks first.
pub fn compare(a: &MatchCandidate<'_>, b: &MatchCandidate<'_>) -> Ordering {
    b.overdue
        .total_cmp(&a.overdue)
        .then(b.detection.confidence.total_cmp(&a.detection.confidence))
        .then(a.rule.order().cmp(&b.rule.order()))
        .then(a.detection.index.cmp(&b.detection.index))
}

/// Sorts `candidates` best first.
pub fn rank(candidates: &mut [MatchCandidate<'_>]) {
    candidates.sort_by(compare);
}

/// Picks the single best candidate, ignoring cooldowns.
pub fn resolve<'a>(mut candidates: Vec<MatchCandidate<'a>>) -> Option<MatchCandidate<'a>> {
    rank(&mut candidates);
    candidates.into_iter().next()
}

/// Picks the best candidate accepted by `eligible`, walking down the ranking
/// until one passes or none remain.
pub fn resolve_eligible<'a, F>(
    mut candidates: Vec<MatchCandidate<'a>>,
    mut eligible: F,
) -> Option<MatchCandidate<'a>>
where
    F: FnMut(&MatchCandidate<'a>) -> bool,
{
    rank(&mut candidates);
    candidates.into_iter().find(|candidate| {
        let pass = eligible(candidate);
        trace!(
            "Candidate rule='{}' detection={} overdue={:.2} conf={:.2} eligible={}",
            candidate.rule.id(),
            candidate.detection.index,
            candidate.overdue,
            candidate.detection.confidence,
            pass
        );
        pass
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, NormalizedDetection};
    use crate::rules::{Rule, RuleConfig};
    use crate::text::DictionaryNormalizer;

    fn detection(index: usize, confidence: f32) -> NormalizedDetection {
        NormalizedDetection {
            index,
            corrected_text: "epic".to_string(),
            parsed_price: None,
            full_frame_box: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            confidence,
        }
    }

    fn rules() -> Vec<Rule> {
        ["first", "second", "third"]
            .iter()
            .enumerate()
            .map(|(i, id)| Rule::compile(&RuleConfig::new(*id), i, &DictionaryNormalizer::new()))
            .collect()
    }

    fn candidate<'a>(
        rule: &'a Rule,
        detection: &'a NormalizedDetection,
        overdue: f64,
    ) -> MatchCandidate<'a> {
        MatchCandidate {
            rule,
            detection,
            price: None,
            overdue,
        }
    }

    #[test]
    fn test_most_overdue_wins() {
        let rules = rules();
        let (low, high) = (detection(0, 0.99), detection(1, 0.5));
        let winner = resolve(vec![
            candidate(&rules[0], &low, 1.5),
            candidate(&rules[1], &high, 4.0),
        ])
        .unwrap();
        assert_eq!(winner.rule.id(), "second");
    }

    #[test]
    fn test_never_fired_beats_finite_overdue() {
        let rules = rules();
        let det = detection(0, 0.9);
        let winner = resolve(vec![
            candidate(&rules[0], &det, 1000.0),
            candidate(&rules[2], &det, f64::INFINITY),
        ])
        .unwrap();
        assert_eq!(winner.rule.id(), "third");
    }

    #[test]
    fn test_confidence_breaks_overdue_tie() {
        let rules = rules();
        let (low, high) = (detection(0, 0.6), detection(1, 0.95));
        let winner = resolve(vec![
            candidate(&rules[0], &low, f64::INFINITY),
            candidate(&rules[1], &high, f64::INFINITY),
        ])
        .unwrap();
        assert_eq!(winner.rule.id(), "second");
    }

    #[test]
    fn test_insertion_order_breaks_remaining_ties() {
        let rules = rules();
        let det = detection(0, 0.9);
        let winner = resolve(vec![
            candidate(&rules[2], &det, 2.0),
            candidate(&rules[1], &det, 2.0),
        ])
        .unwrap();
        assert_eq!(winner.rule.id(), "second");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(resolve(Vec::new()).is_none());
        assert!(resolve_eligible(Vec::new(), |_| true).is_none());
    }

    #[test]
    fn test_gated_top_pick_falls_through() {
        let rules = rules();
        let det = detection(0, 0.9);
        let candidates = vec![
            candidate(&rules[0], &det, 5.0),
            candidate(&rules[1], &det, 3.0),
            candidate(&rules[2], &det, 1.0),
        ];
        let winner = resolve_eligible(candidates, |c| c.rule.id() != "first").unwrap();
        assert_eq!(winner.rule.id(), "second");
    }

    #[test]
    fn test_all_gated_yields_none() {
        let rules = rules();
        let det = detection(0, 0.9);
        let candidates = vec![candidate(&rules[0], &det, 5.0)];
        assert!(resolve_eligible(candidates, |_| false).is_none());
    }
}
