//! Configuration types
//!
//! The scoring ladder and verdict thresholds are hand-tuned constants. They
//! live here as data so tests and deployments can override them without
//! touching the pipeline.

use crate::{ConfigError, ForensicResult, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Confidence and severity constants used by the scanner and composite pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Confidence when an amplifier word appears in the turn
    pub amplified_confidence: f64,
    /// Confidence for a bare pattern match
    pub base_confidence: f64,
    /// Below the critical threshold, confidence >= this is `high`
    pub high_floor: f64,
    /// Below `high_floor`, confidence >= this is `medium`
    pub medium_floor: f64,
    /// Fixed confidence of synthesized composite anomalies
    pub composite_confidence: f64,
    /// Characters of context kept on each side of a quoted match
    pub quote_context_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            amplified_confidence: 0.95,
            base_confidence: 0.75,
            high_floor: 0.75,
            medium_floor: 0.6,
            composite_confidence: 0.95,
            quote_context_chars: 40,
        }
    }
}

impl ScoringConfig {
    /// Two-tier confidence: amplified if any amplifier was seen.
    pub fn confidence_for(&self, amplified: bool) -> f64 {
        if amplified {
            self.amplified_confidence
        } else {
            self.base_confidence
        }
    }

    /// Map a confidence onto a severity tier.
    ///
    /// Monotonic in `confidence` for a fixed `critical_threshold`.
    pub fn severity_for(&self, confidence: f64, critical_threshold: f64) -> Severity {
        if confidence >= critical_threshold {
            Severity::Critical
        } else if confidence >= self.high_floor {
            Severity::High
        } else if confidence >= self.medium_floor {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn validate(&self) -> ForensicResult<()> {
        for (field, value) in [
            ("scoring.amplified_confidence", self.amplified_confidence),
            ("scoring.base_confidence", self.base_confidence),
            ("scoring.high_floor", self.high_floor),
            ("scoring.medium_floor", self.medium_floor),
            ("scoring.composite_confidence", self.composite_confidence),
        ] {
            check_unit_interval(field, value)?;
        }

        if self.medium_floor > self.high_floor {
            return Err(ConfigError::InvalidValue {
                field: "scoring.medium_floor".to_string(),
                value: self.medium_floor.to_string(),
                reason: "medium_floor must not exceed high_floor".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Constants of the priority-ordered verdict decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerdictPolicy {
    /// Critical anomalies needed for the top tier without a composite
    pub critical_count_for_top: usize,
    /// High anomalies needed for the second tier without a critical one
    pub high_count_for_second: usize,
    pub composite_confidence: f64,
    pub critical_mass_confidence: f64,
    pub elevated_confidence: f64,
    pub anomalous_confidence: f64,
    pub clean_confidence: f64,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self {
            critical_count_for_top: 3,
            high_count_for_second: 5,
            composite_confidence: 0.95,
            critical_mass_confidence: 0.90,
            elevated_confidence: 0.80,
            anomalous_confidence: 0.65,
            clean_confidence: 0.85,
        }
    }
}

impl VerdictPolicy {
    pub fn validate(&self) -> ForensicResult<()> {
        if self.critical_count_for_top == 0 {
            return Err(ConfigError::InvalidValue {
                field: "verdict.critical_count_for_top".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.high_count_for_second == 0 {
            return Err(ConfigError::InvalidValue {
                field: "verdict.high_count_for_second".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for (field, value) in [
            ("verdict.composite_confidence", self.composite_confidence),
            ("verdict.critical_mass_confidence", self.critical_mass_confidence),
            ("verdict.elevated_confidence", self.elevated_confidence),
            ("verdict.anomalous_confidence", self.anomalous_confidence),
            ("verdict.clean_confidence", self.clean_confidence),
        ] {
            check_unit_interval(field, value)?;
        }
        Ok(())
    }
}

/// Master analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub scoring: ScoringConfig,
    pub verdict: VerdictPolicy,
    /// Cutoff used when a request does not specify one
    pub default_min_confidence: f64,
    /// Rule table to load instead of the built-in one
    pub rules_path: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            verdict: VerdictPolicy::default(),
            default_min_confidence: 0.5,
            rules_path: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load from a TOML file. Missing sections fall back to defaults.
    pub fn from_toml_path(path: &Path) -> ForensicResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: AnalyzerConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::Deserialize {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `WITNESS_CONFIG`: TOML file to start from (default: built-in defaults)
    /// - `WITNESS_RULES_PATH`: rule table file overriding the built-in table
    /// - `WITNESS_MIN_CONFIDENCE`: default cutoff (default: 0.5)
    pub fn from_env() -> ForensicResult<Self> {
        let mut config = match std::env::var("WITNESS_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_path(Path::new(&path))?,
            _ => Self::default(),
        };

        if let Ok(path) = std::env::var("WITNESS_RULES_PATH") {
            if !path.trim().is_empty() {
                config.rules_path = Some(PathBuf::from(path));
            }
        }

        config.default_min_confidence = std::env::var("WITNESS_MIN_CONFIDENCE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(config.default_min_confidence);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ForensicResult<()> {
        check_unit_interval("default_min_confidence", self.default_min_confidence)?;
        self.scoring.validate()?;
        self.verdict.validate()?;
        Ok(())
    }
}

/// Reject NaN and values outside [0, 1].
pub fn check_unit_interval(field: &str, value: f64) -> ForensicResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("{} must be between 0.0 and 1.0", field),
        }
        .into());
    }
    Ok(())
}
