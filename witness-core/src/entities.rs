//! Entity types produced by one analysis run

use crate::{Severity, TranscriptFormat, TurnRole, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One utterance in a parsed transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based position in encounter order
    pub index: usize,
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn new(index: usize, role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            index,
            role,
            text: text.into(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == TurnRole::Assistant
    }
}

/// Byte range into a turn's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: TextSpan) -> TextSpan {
        TextSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One detected occurrence of a rule (or composite) on a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Index of the turn that produced this anomaly
    pub turn_index: usize,
    /// Rule code, or composite code for synthesized anomalies
    pub code: String,
    pub severity: Severity,
    /// Always within [0, 1]
    pub confidence: f64,
    /// Owned copy of the quoted region of the turn text
    pub quoted_span: String,
    /// Location of `quoted_span` within the turn text
    pub span: TextSpan,
    /// Source pattern that matched (absent for composites)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Contributing turn indices, set only on composite anomalies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_turns: Option<Vec<usize>>,
}

impl Anomaly {
    pub fn is_composite(&self) -> bool {
        self.related_turns.is_some()
    }
}

/// Counts derived purely from the final anomaly list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub by_code: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    /// Number of composite anomalies
    pub composites: usize,
    /// Sorted, deduplicated turn indices carrying a critical anomaly
    pub critical_turns: Vec<usize>,
}

impl AnalysisSummary {
    pub fn count_for(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Output of the verdict decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictOutcome {
    pub verdict: Verdict,
    pub confidence: f64,
    /// Which row of the decision table fired
    pub rationale: String,
}

/// Free-form labelling data passed through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvidenceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specimen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_family: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Complete output for one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Format actually used to parse the transcript (never `auto`)
    pub format: TranscriptFormat,
    /// Lowercase hex SHA-256 of the raw transcript content
    pub transcript_digest: String,
    pub turns: Vec<Turn>,
    pub anomalies: Vec<Anomaly>,
    pub summary: AnalysisSummary,
    pub verdict: VerdictOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_context: Option<EvidenceContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_span_cover() {
        let a = TextSpan::new(4, 10);
        let b = TextSpan::new(20, 31);
        assert_eq!(a.cover(b), TextSpan::new(4, 31));
        assert_eq!(b.cover(a), TextSpan::new(4, 31));
        assert_eq!(a.cover(b).len(), 27);
    }

    #[test]
    fn test_anomaly_serialization_skips_empty_optionals() {
        let anomaly = Anomaly {
            turn_index: 2,
            code: "metadata_leakage".to_string(),
            severity: Severity::High,
            confidence: 0.75,
            quoted_span: "sediment://file_abc".to_string(),
            span: TextSpan::new(0, 19),
            pattern: None,
            related_turns: None,
        };
        let value = serde_json::to_value(&anomaly).unwrap();
        assert!(value.get("pattern").is_none());
        assert!(value.get("related_turns").is_none());
        assert_eq!(value["severity"], "high");
        assert!(!anomaly.is_composite());
    }

    #[test]
    fn test_summary_severity_keys_serialize_as_strings() {
        let mut summary = AnalysisSummary::default();
        summary.by_severity.insert(Severity::Critical, 2);
        summary.by_severity.insert(Severity::Low, 0);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["by_severity"]["critical"], 2);
        assert_eq!(value["by_severity"]["low"], 0);
        assert_eq!(summary.count_for(Severity::Critical), 2);
        assert_eq!(summary.count_for(Severity::High), 0);
    }

    #[test]
    fn test_evidence_context_keeps_extra_fields() {
        let ctx: EvidenceContext = serde_json::from_value(serde_json::json!({
            "specimen_name": "specimen-7",
            "model_family": "frontier",
            "case_number": 42
        }))
        .unwrap();
        assert_eq!(ctx.specimen_name.as_deref(), Some("specimen-7"));
        assert_eq!(ctx.extra["case_number"], 42);

        let back = serde_json::to_value(&ctx).unwrap();
        assert_eq!(back["case_number"], 42);
    }
}
