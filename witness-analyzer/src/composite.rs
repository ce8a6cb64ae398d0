//! Co-occurrence classifier
//!
//! Groups base anomalies by turn and synthesizes one composite anomaly per
//! (turn, composite rule) whose left and right sides are both present. The
//! input list is never modified.

use crate::quote::quote_exact;
use std::collections::BTreeMap;
use witness_core::{Anomaly, CompositeRule, ScoringConfig, Severity, Turn};

/// Composite anomalies for `anomalies`, ordered by turn then rule order.
pub fn detect_composites(
    turns: &[Turn],
    anomalies: &[Anomaly],
    composites: &[CompositeRule],
    scoring: &ScoringConfig,
) -> Vec<Anomaly> {
    if composites.is_empty() {
        return Vec::new();
    }

    let mut by_turn: BTreeMap<usize, Vec<&Anomaly>> = BTreeMap::new();
    for anomaly in anomalies.iter().filter(|a| !a.is_composite()) {
        by_turn.entry(anomaly.turn_index).or_default().push(anomaly);
    }

    let mut found = Vec::new();
    for (turn_index, group) in &by_turn {
        for rule in composites {
            if let Some(anomaly) = classify(turns, *turn_index, group, rule, scoring) {
                found.push(anomaly);
            }
        }
    }

    tracing::debug!(
        turns_with_anomalies = by_turn.len(),
        composites = found.len(),
        "Composite pass complete"
    );
    found
}

fn classify(
    turns: &[Turn],
    turn_index: usize,
    group: &[&Anomaly],
    rule: &CompositeRule,
    scoring: &ScoringConfig,
) -> Option<Anomaly> {
    let left = group.iter().find(|a| rule.left.contains(&a.code))?;
    let right = group.iter().find(|a| rule.right.contains(&a.code))?;

    let span = left.span.cover(right.span);
    let quoted_span = turns
        .iter()
        .find(|t| t.index == turn_index)
        .map(|t| quote_exact(&t.text, span))
        .unwrap_or_default();

    let mut related_turns: Vec<usize> = group
        .iter()
        .filter(|a| rule.left.contains(&a.code) || rule.right.contains(&a.code))
        .map(|a| a.turn_index)
        .collect();
    related_turns.sort_unstable();
    related_turns.dedup();

    Some(Anomaly {
        turn_index,
        code: rule.code.clone(),
        severity: Severity::Critical,
        confidence: scoring.composite_confidence,
        quoted_span,
        span,
        pattern: None,
        related_turns: Some(related_turns),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_core::{TextSpan, TurnRole};

    fn base(turn_index: usize, code: &str, start: usize, end: usize) -> Anomaly {
        Anomaly {
            turn_index,
            code: code.to_string(),
            severity: Severity::High,
            confidence: 0.75,
            quoted_span: String::new(),
            span: TextSpan::new(start, end),
            pattern: Some("p".to_string()),
            related_turns: None,
        }
    }

    fn composite(left: &[&str], right: &[&str]) -> CompositeRule {
        CompositeRule {
            code: "split_brain".to_string(),
            name: String::new(),
            description: String::new(),
            left: left.iter().map(|s| s.to_string()).collect(),
            right: right.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_pair_on_same_turn_yields_one_composite() {
        let turns = vec![Turn::new(2, TurnRole::Assistant, "claim then leak://x")];
        let anomalies = vec![base(2, "a", 0, 5), base(2, "b", 11, 18)];

        let found = detect_composites(
            &turns,
            &anomalies,
            &[composite(&["a"], &["b"])],
            &ScoringConfig::default(),
        );

        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!(c.turn_index, 2);
        assert_eq!(c.severity, Severity::Critical);
        assert_eq!(c.confidence, 0.95);
        assert_eq!(c.span, TextSpan::new(0, 18));
        assert_eq!(c.quoted_span, "claim then leak://");
        assert_eq!(c.related_turns, Some(vec![2]));
        assert!(c.pattern.is_none());
    }

    #[test]
    fn test_three_qualifying_codes_still_one_composite() {
        let turns = vec![Turn::new(1, TurnRole::Assistant, "xxxxxxxxxxxxxxxxxxxx")];
        let anomalies = vec![base(1, "a", 0, 2), base(1, "b", 4, 6), base(1, "c", 8, 10)];

        let found = detect_composites(
            &turns,
            &anomalies,
            &[composite(&["a", "c"], &["b"])],
            &ScoringConfig::default(),
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_sides_on_different_turns_do_not_combine() {
        let turns = vec![
            Turn::new(1, TurnRole::Assistant, "aaaa"),
            Turn::new(2, TurnRole::Assistant, "bbbb"),
        ];
        let anomalies = vec![base(1, "a", 0, 2), base(2, "b", 0, 2)];
        let found = detect_composites(
            &turns,
            &anomalies,
            &[composite(&["a"], &["b"])],
            &ScoringConfig::default(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_composites_ordered_by_turn() {
        let turns = vec![
            Turn::new(1, TurnRole::Assistant, "aaaa bbbb"),
            Turn::new(3, TurnRole::Assistant, "aaaa bbbb"),
        ];
        let anomalies = vec![
            base(3, "a", 0, 4),
            base(3, "b", 5, 9),
            base(1, "b", 5, 9),
            base(1, "a", 0, 4),
        ];
        let found = detect_composites(
            &turns,
            &anomalies,
            &[composite(&["a"], &["b"])],
            &ScoringConfig::default(),
        );
        let order: Vec<usize> = found.iter().map(|a| a.turn_index).collect();
        assert_eq!(order, vec![1, 3]);
    }

    #[test]
    fn test_input_is_untouched_and_composites_are_not_inputs() {
        let turns = vec![Turn::new(1, TurnRole::Assistant, "aaaa bbbb")];
        let mut existing = base(1, "a", 0, 4);
        existing.related_turns = Some(vec![1]);
        let anomalies = vec![existing, base(1, "b", 5, 9)];
        let before = anomalies.clone();

        let found = detect_composites(
            &turns,
            &anomalies,
            &[composite(&["a"], &["b"])],
            &ScoringConfig::default(),
        );
        assert!(found.is_empty());
        assert_eq!(anomalies, before);
    }
}
