//! Enum types and their string conversions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speaker role of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

/// Severity tier of an anomaly, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All tiers, least severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
}

/// Verdict tier for a whole transcript, ordered from clean to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// No anomalies survived the cutoff
    Clean,
    /// Some anomalies, none critical and fewer than the high-count threshold
    Anomalous,
    /// At least one critical anomaly, or many high ones
    Degraded,
    /// Composite anomaly present, or critical mass of critical anomalies
    Compromised,
}

/// Input format hint for the transcript parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptFormat {
    Json,
    Structured,
    Plain,
    #[default]
    Auto,
}

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "user" | "human" => Ok(TurnRole::User),
            "assistant" | "ai" | "model" | "bot" => Ok(TurnRole::Assistant),
            "system" | "developer" => Ok(TurnRole::System),
            _ => Err(format!("Invalid TurnRole: {}", s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "low" => Ok(Severity::Low),
            "medium" | "med" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" | "crit" => Ok(Severity::Critical),
            _ => Err(format!("Invalid Severity: {}", s)),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Verdict::Clean => "clean",
            Verdict::Anomalous => "anomalous",
            Verdict::Degraded => "degraded",
            Verdict::Compromised => "compromised",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "clean" => Ok(Verdict::Clean),
            "anomalous" => Ok(Verdict::Anomalous),
            "degraded" => Ok(Verdict::Degraded),
            "compromised" => Ok(Verdict::Compromised),
            _ => Err(format!("Invalid Verdict: {}", s)),
        }
    }
}

impl fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TranscriptFormat::Json => "json",
            TranscriptFormat::Structured => "structured",
            TranscriptFormat::Plain => "plain",
            TranscriptFormat::Auto => "auto",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for TranscriptFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "json" => Ok(TranscriptFormat::Json),
            "structured" => Ok(TranscriptFormat::Structured),
            "plain" | "text" => Ok(TranscriptFormat::Plain),
            "auto" => Ok(TranscriptFormat::Auto),
            _ => Err(format!("Invalid TranscriptFormat: {}", s)),
        }
    }
}
