//! Detector rule table definitions
//!
//! Rules are plain data: they deserialize from TOML, YAML or JSON and are
//! compiled into matchers by the analyzer. Adding a category means adding a
//! table entry, not touching the scanner.

use crate::{check_unit_interval, ConfigError, ForensicResult, RuleTableError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One pattern of a detector rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSpec {
    /// Regular expression, used as written
    Regex(String),
    /// Literal substring, matched case-insensitively
    Keyword(String),
}

impl PatternSpec {
    pub fn source(&self) -> &str {
        match self {
            PatternSpec::Regex(s) | PatternSpec::Keyword(s) => s,
        }
    }
}

/// Static description of one anomaly category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorRule {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub patterns: Vec<PatternSpec>,
    /// Words whose presence anywhere in the turn raises confidence
    #[serde(default)]
    pub amplifiers: Vec<String>,
    /// Confidence at or above which a match is critical
    pub critical_threshold: f64,
}

/// Co-occurrence rule: fires once per turn carrying a `left` and a `right` code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeRule {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

/// Serializable rule table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectorTable {
    #[serde(default)]
    pub rules: Vec<DetectorRule>,
    #[serde(default)]
    pub composites: Vec<CompositeRule>,
}

impl DetectorTable {
    pub fn from_toml_str(input: &str) -> ForensicResult<Self> {
        let table: DetectorTable =
            toml::from_str(input).map_err(|e| RuleTableError::Deserialize {
                reason: e.to_string(),
            })?;
        table.validate()?;
        Ok(table)
    }

    /// Patterns use the same single-key map form as TOML and JSON
    /// (`- keyword: "..."`), not YAML tags.
    pub fn from_yaml_str(input: &str) -> ForensicResult<Self> {
        let table: DetectorTable = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(input),
        )
        .map_err(|e| RuleTableError::Deserialize {
            reason: e.to_string(),
        })?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_json_str(input: &str) -> ForensicResult<Self> {
        let table: DetectorTable =
            serde_json::from_str(input).map_err(|e| RuleTableError::Deserialize {
                reason: e.to_string(),
            })?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from disk, picking the format from the file extension.
    /// Unknown extensions are read as TOML.
    pub fn from_path(path: &Path) -> ForensicResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    pub fn rule(&self, code: &str) -> Option<&DetectorRule> {
        self.rules.iter().find(|r| r.code == code)
    }

    pub fn rule_codes(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.code.as_str())
    }

    /// Structural checks. Pattern syntax is checked when compiling.
    pub fn validate(&self) -> ForensicResult<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for rule in &self.rules {
            if !seen.insert(rule.code.as_str()) {
                return Err(RuleTableError::DuplicateCode {
                    code: rule.code.clone(),
                }
                .into());
            }
            if rule.patterns.is_empty() {
                return Err(RuleTableError::EmptyPatterns {
                    code: rule.code.clone(),
                }
                .into());
            }
            if check_unit_interval("critical_threshold", rule.critical_threshold).is_err() {
                return Err(RuleTableError::InvalidThreshold {
                    code: rule.code.clone(),
                    value: rule.critical_threshold.to_string(),
                }
                .into());
            }
        }

        let rule_codes: HashSet<&str> = self.rule_codes().collect();
        for composite in &self.composites {
            if !seen.insert(composite.code.as_str()) {
                return Err(RuleTableError::DuplicateCode {
                    code: composite.code.clone(),
                }
                .into());
            }
            if composite.left.is_empty() || composite.right.is_empty() {
                return Err(RuleTableError::EmptyCompositeSide {
                    composite: composite.code.clone(),
                }
                .into());
            }
            for code in composite.left.iter().chain(composite.right.iter()) {
                if !rule_codes.contains(code.as_str()) {
                    return Err(RuleTableError::UnknownCompositeInput {
                        composite: composite.code.clone(),
                        code: code.clone(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}
