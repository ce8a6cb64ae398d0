//! Analysis pipeline facade
//!
//! [`ForensicAnalyzer`] owns an injected [`RuleSet`] and an
//! [`AnalyzerConfig`] and runs one transcript end to end:
//! options → parse → scan → composites → cutoff → reduce.
//!
//! The analyzer holds no mutable state. One instance can serve any number
//! of concurrent requests.

use crate::composite;
use crate::parser::{self, ParsedTranscript};
use crate::reducer;
use crate::request::{AnalysisOptions, ForensicRequest};
use crate::rules::RuleSet;
use crate::scanner;
use std::sync::Arc;
use witness_core::{
    check_unit_interval, compute_transcript_digest, AnalysisResult, AnalysisSummary,
    AnalyzerConfig, Anomaly, ForensicResult, TranscriptFormat, Turn, VerdictOutcome,
};

/// Request options after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Rule codes to apply, in rule-table order
    pub detectors: Vec<String>,
    pub min_confidence: f64,
}

/// Transcript analyzer.
#[derive(Debug, Clone)]
pub struct ForensicAnalyzer {
    rules: Arc<RuleSet>,
    config: AnalyzerConfig,
}

impl ForensicAnalyzer {
    /// Create an analyzer over an explicit rule set.
    pub fn new(rules: Arc<RuleSet>, config: AnalyzerConfig) -> ForensicResult<Self> {
        config.validate()?;
        Ok(Self { rules, config })
    }

    /// Create an analyzer over the built-in rule table.
    pub fn with_builtin_rules(config: AnalyzerConfig) -> ForensicResult<Self> {
        Self::new(RuleSet::builtin()?, config)
    }

    /// Create an analyzer from configuration, loading `rules_path` if set.
    pub fn from_config(config: AnalyzerConfig) -> ForensicResult<Self> {
        let rules = match &config.rules_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading rule table");
                Arc::new(RuleSet::from_path(path)?)
            }
            None => RuleSet::builtin()?,
        };
        Self::new(rules, config)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Validate request options against the rule table and cutoff range.
    pub fn resolve_options(&self, options: &AnalysisOptions) -> ForensicResult<ScanOptions> {
        let min_confidence = options
            .min_confidence
            .unwrap_or(self.config.default_min_confidence);
        check_unit_interval("min_confidence", min_confidence)?;

        let detectors = self
            .rules
            .select(options.detectors.as_deref())?
            .into_iter()
            .map(|rule| rule.code.clone())
            .collect();

        Ok(ScanOptions {
            detectors,
            min_confidence,
        })
    }

    pub fn parse_transcript(
        &self,
        content: &str,
        format: TranscriptFormat,
    ) -> ForensicResult<ParsedTranscript> {
        parser::parse_transcript(content, format)
    }

    /// Unfiltered candidates from the selected rules.
    pub fn scan(&self, turns: &[Turn], options: &ScanOptions) -> Vec<Anomaly> {
        let selected: Vec<_> = self
            .rules
            .rules()
            .iter()
            .filter(|rule| options.detectors.contains(&rule.code))
            .collect();
        scanner::scan(turns, &selected, &self.config.scoring)
    }

    pub fn detect_composites(&self, turns: &[Turn], anomalies: &[Anomaly]) -> Vec<Anomaly> {
        composite::detect_composites(
            turns,
            anomalies,
            self.rules.composites(),
            &self.config.scoring,
        )
    }

    pub fn reduce(
        &self,
        anomalies: &[Anomaly],
        options: &ScanOptions,
    ) -> (AnalysisSummary, VerdictOutcome) {
        let candidate_codes: Vec<&str> = options
            .detectors
            .iter()
            .map(String::as_str)
            .chain(self.rules.composite_codes())
            .collect();
        reducer::reduce(anomalies, &candidate_codes, &self.config.verdict)
    }

    /// Run the whole pipeline for one request.
    ///
    /// Options are validated before parsing. Any error aborts the run.
    pub fn analyze(&self, request: &ForensicRequest) -> ForensicResult<AnalysisResult> {
        let options = self.resolve_options(&request.options())?;
        let content = &request.transcript.content;

        let parsed = self.parse_transcript(content, request.transcript.format)?;

        let mut anomalies = self.scan(&parsed.turns, &options);
        let composites = self.detect_composites(&parsed.turns, &anomalies);
        let candidates = anomalies.len();
        let composite_count = composites.len();
        anomalies.extend(composites);

        let anomalies = reducer::apply_cutoff(anomalies, options.min_confidence)?;
        tracing::debug!(
            candidates,
            composites = composite_count,
            kept = anomalies.len(),
            min_confidence = options.min_confidence,
            "Cutoff applied"
        );

        let (summary, verdict) = self.reduce(&anomalies, &options);

        tracing::info!(
            format = %parsed.format,
            turns = parsed.turns.len(),
            anomalies = summary.total,
            verdict = %verdict.verdict,
            "Transcript analyzed"
        );

        Ok(AnalysisResult {
            format: parsed.format,
            transcript_digest: compute_transcript_digest(content),
            turns: parsed.turns,
            anomalies,
            summary,
            verdict,
            evidence_context: request.evidence_context.clone(),
        })
    }

    /// Analyze inline content with auto-detected format and default options.
    pub fn analyze_text(&self, content: &str) -> ForensicResult<AnalysisResult> {
        self.analyze(&ForensicRequest::inline(content))
    }
}
