//! Analysis request types

use serde::{Deserialize, Serialize};
use witness_core::{EvidenceContext, TranscriptFormat};

/// Where the transcript content comes from. Only inline content is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptSource {
    #[default]
    Inline,
}

/// Transcript payload of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptInput {
    #[serde(default)]
    pub source: TranscriptSource,
    pub content: String,
    #[serde(default)]
    pub format: TranscriptFormat,
}

/// Per-request analysis options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Rule codes to apply. Absent or empty means all rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detectors: Option<Vec<String>>,
    /// Cutoff in [0, 1]. Absent means the analyzer default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

/// A complete analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicRequest {
    pub transcript: TranscriptInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_config: Option<AnalysisOptions>,
    /// Labelling data echoed into the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_context: Option<EvidenceContext>,
}

impl ForensicRequest {
    /// Request for inline content with auto-detected format.
    pub fn inline(content: impl Into<String>) -> Self {
        Self {
            transcript: TranscriptInput {
                source: TranscriptSource::Inline,
                content: content.into(),
                format: TranscriptFormat::Auto,
            },
            analysis_config: None,
            evidence_context: None,
        }
    }

    pub fn with_format(mut self, format: TranscriptFormat) -> Self {
        self.transcript.format = format;
        self
    }

    pub fn with_detectors<I, S>(mut self, detectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.analysis_config
            .get_or_insert_with(AnalysisOptions::default)
            .detectors = Some(detectors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.analysis_config
            .get_or_insert_with(AnalysisOptions::default)
            .min_confidence = Some(min_confidence);
        self
    }

    pub fn with_evidence_context(mut self, context: EvidenceContext) -> Self {
        self.evidence_context = Some(context);
        self
    }

    pub fn options(&self) -> AnalysisOptions {
        self.analysis_config.clone().unwrap_or_default()
    }
}
