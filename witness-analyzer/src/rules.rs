//! Compiled detector rules
//!
//! [`RuleSet`] is the immutable, compiled form of a [`DetectorTable`]. It is
//! built once and shared behind an `Arc`; nothing mutates it afterwards.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::path::Path;
use std::sync::Arc;
use witness_core::{
    CompositeRule, ConfigError, DetectorRule, DetectorTable, ForensicResult, PatternSpec,
    RuleTableError,
};

/// The built-in rule table, embedded at compile time.
pub const BUILTIN_RULES_TOML: &str = include_str!("../rules/default_rules.toml");

static BUILTIN_RULES: Lazy<ForensicResult<Arc<RuleSet>>> = Lazy::new(|| {
    DetectorTable::from_toml_str(BUILTIN_RULES_TOML)
        .and_then(RuleSet::compile)
        .map(Arc::new)
});

/// One pattern together with its compiled matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    spec: PatternSpec,
    regex: Regex,
}

impl CompiledPattern {
    fn compile(code: &str, spec: &PatternSpec) -> ForensicResult<Self> {
        let built = match spec {
            PatternSpec::Regex(source) => Regex::new(source),
            PatternSpec::Keyword(word) => RegexBuilder::new(&regex::escape(word))
                .case_insensitive(true)
                .build(),
        };

        let regex = built.map_err(|e| RuleTableError::InvalidPattern {
            code: code.to_string(),
            pattern: spec.source().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            spec: spec.clone(),
            regex,
        })
    }

    pub fn spec(&self) -> &PatternSpec {
        &self.spec
    }

    pub fn source(&self) -> &str {
        self.spec.source()
    }

    /// First match in `text`, as a byte range.
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        self.regex.find(text).map(|m| (m.start(), m.end()))
    }
}

/// A detector rule ready for scanning.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub code: String,
    pub name: String,
    pub description: String,
    pub critical_threshold: f64,
    patterns: Vec<CompiledPattern>,
    /// Lowercased for case-insensitive substring checks
    amplifiers: Vec<String>,
}

impl CompiledRule {
    pub fn compile(rule: &DetectorRule) -> ForensicResult<Self> {
        let patterns = rule
            .patterns
            .iter()
            .map(|spec| CompiledPattern::compile(&rule.code, spec))
            .collect::<ForensicResult<Vec<_>>>()?;

        Ok(Self {
            code: rule.code.clone(),
            name: rule.name.clone(),
            description: rule.description.clone(),
            critical_threshold: rule.critical_threshold,
            patterns,
            amplifiers: rule.amplifiers.iter().map(|a| a.to_lowercase()).collect(),
        })
    }

    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Whether any amplifier occurs in the (already lowercased) turn text.
    pub fn is_amplified(&self, lowered_text: &str) -> bool {
        self.amplifiers
            .iter()
            .any(|a| !a.is_empty() && lowered_text.contains(a.as_str()))
    }
}

/// Compiled, immutable rule table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    composites: Vec<CompositeRule>,
}

impl RuleSet {
    /// Validate and compile a table.
    pub fn compile(table: DetectorTable) -> ForensicResult<Self> {
        table.validate()?;

        let rules = table
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<ForensicResult<Vec<_>>>()?;

        tracing::debug!(
            rules = rules.len(),
            composites = table.composites.len(),
            "Rule set compiled"
        );

        Ok(Self {
            rules,
            composites: table.composites,
        })
    }

    /// Load and compile a table file (TOML, YAML or JSON).
    pub fn from_path(path: &Path) -> ForensicResult<Self> {
        Self::compile(DetectorTable::from_path(path)?)
    }

    /// Shared handle to the built-in rule set, compiled on first use.
    pub fn builtin() -> ForensicResult<Arc<RuleSet>> {
        BUILTIN_RULES
            .as_ref()
            .map(Arc::clone)
            .map_err(Clone::clone)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn composites(&self) -> &[CompositeRule] {
        &self.composites
    }

    pub fn rule(&self, code: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.code == code)
    }

    pub fn rule_codes(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.code.as_str())
    }

    pub fn composite_codes(&self) -> impl Iterator<Item = &str> {
        self.composites.iter().map(|c| c.code.as_str())
    }

    /// Pick the rules a request asked for, in table order.
    ///
    /// `None` or an empty list selects every rule. Unknown codes are an error.
    pub fn select(&self, requested: Option<&[String]>) -> ForensicResult<Vec<&CompiledRule>> {
        let requested = match requested {
            Some(codes) if !codes.is_empty() => codes,
            _ => return Ok(self.rules.iter().collect()),
        };

        if let Some(unknown) = requested.iter().find(|code| self.rule(code).is_none()) {
            return Err(ConfigError::UnknownDetector {
                code: unknown.clone(),
            }
            .into());
        }

        Ok(self
            .rules
            .iter()
            .filter(|rule| requested.iter().any(|code| *code == rule.code))
            .collect())
    }
}
