//! Anomaly scanner
//!
//! Tests every selected rule against every assistant turn. Each pattern
//! contributes at most one candidate per turn (its first match). No cutoff is
//! applied here; the composite pass must see the full candidate set.

use crate::quote::quote_with_context;
use crate::rules::CompiledRule;
use witness_core::{Anomaly, ScoringConfig, TextSpan, Turn};

/// Scan `turns` with `rules`, returning unfiltered candidates ordered by
/// turn, then rule, then pattern.
pub fn scan(turns: &[Turn], rules: &[&CompiledRule], scoring: &ScoringConfig) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for turn in turns.iter().filter(|t| t.is_assistant()) {
        let lowered = turn.text.to_lowercase();
        for rule in rules {
            scan_turn(turn, &lowered, rule, scoring, &mut anomalies);
        }
    }

    tracing::debug!(
        turns = turns.len(),
        rules = rules.len(),
        candidates = anomalies.len(),
        "Scan complete"
    );
    anomalies
}

fn scan_turn(
    turn: &Turn,
    lowered: &str,
    rule: &CompiledRule,
    scoring: &ScoringConfig,
    out: &mut Vec<Anomaly>,
) {
    let mut amplified: Option<bool> = None;

    for pattern in rule.patterns() {
        let Some((start, end)) = pattern.find(&turn.text) else {
            continue;
        };

        let amplified = *amplified.get_or_insert_with(|| rule.is_amplified(lowered));
        let confidence = scoring.confidence_for(amplified);
        let (quoted_span, span) = quote_with_context(
            &turn.text,
            TextSpan::new(start, end),
            scoring.quote_context_chars,
        );

        out.push(Anomaly {
            turn_index: turn.index,
            code: rule.code.clone(),
            severity: scoring.severity_for(confidence, rule.critical_threshold),
            confidence,
            quoted_span,
            span,
            pattern: Some(pattern.source().to_string()),
            related_turns: None,
        });
    }
}
