//! Summary and verdict reduction
//!
//! Pure functions over the final, post-cutoff anomaly list. The verdict is a
//! priority-ordered decision table over the summary; the first matching row
//! wins.

use witness_core::{
    check_unit_interval, Anomaly, AnalysisSummary, ForensicResult, Severity, Verdict,
    VerdictOutcome, VerdictPolicy,
};

/// Keep anomalies whose confidence is at least `min_confidence`.
///
/// Applied uniformly to base and composite anomalies, after the composite
/// pass.
pub fn apply_cutoff(anomalies: Vec<Anomaly>, min_confidence: f64) -> ForensicResult<Vec<Anomaly>> {
    check_unit_interval("min_confidence", min_confidence)?;
    Ok(anomalies
        .into_iter()
        .filter(|a| a.confidence >= min_confidence)
        .collect())
}

/// Count anomalies by code and severity.
///
/// Every code in `candidate_codes` and every tier appears in the maps, with
/// zero when nothing matched.
pub fn summarize(anomalies: &[Anomaly], candidate_codes: &[&str]) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        total: anomalies.len(),
        ..Default::default()
    };

    for code in candidate_codes {
        summary.by_code.insert((*code).to_string(), 0);
    }
    for severity in Severity::ALL {
        summary.by_severity.insert(severity, 0);
    }

    for anomaly in anomalies {
        *summary.by_code.entry(anomaly.code.clone()).or_insert(0) += 1;
        *summary.by_severity.entry(anomaly.severity).or_insert(0) += 1;
        if anomaly.is_composite() {
            summary.composites += 1;
        }
        if anomaly.severity == Severity::Critical {
            summary.critical_turns.push(anomaly.turn_index);
        }
    }

    summary.critical_turns.sort_unstable();
    summary.critical_turns.dedup();
    summary
}

/// Pick a verdict from the summary.
pub fn decide_verdict(summary: &AnalysisSummary, policy: &VerdictPolicy) -> VerdictOutcome {
    let critical = summary.count_for(Severity::Critical);
    let high = summary.count_for(Severity::High);

    let (verdict, confidence, rationale) = if summary.composites > 0 {
        (
            Verdict::Compromised,
            policy.composite_confidence,
            format!("{} composite anomaly(ies) present", summary.composites),
        )
    } else if critical >= policy.critical_count_for_top {
        (
            Verdict::Compromised,
            policy.critical_mass_confidence,
            format!(
                "{} critical anomalies (threshold {})",
                critical, policy.critical_count_for_top
            ),
        )
    } else if critical >= 1 || high >= policy.high_count_for_second {
        (
            Verdict::Degraded,
            policy.elevated_confidence,
            format!(
                "{} critical and {} high anomalies (high threshold {})",
                critical, high, policy.high_count_for_second
            ),
        )
    } else if summary.total > 0 {
        (
            Verdict::Anomalous,
            policy.anomalous_confidence,
            format!("{} anomalies below the degraded thresholds", summary.total),
        )
    } else {
        (
            Verdict::Clean,
            policy.clean_confidence,
            "no anomalies".to_string(),
        )
    };

    VerdictOutcome {
        verdict,
        confidence,
        rationale,
    }
}

/// Summarize and decide in one step.
pub fn reduce(
    anomalies: &[Anomaly],
    candidate_codes: &[&str],
    policy: &VerdictPolicy,
) -> (AnalysisSummary, VerdictOutcome) {
    let summary = summarize(anomalies, candidate_codes);
    let verdict = decide_verdict(&summary, policy);
    (summary, verdict)
}
