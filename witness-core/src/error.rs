//! Error types for witness operations

use thiserror::Error;

/// Transcript parsing errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid JSON transcript: {reason}")]
    InvalidJson { reason: String },

    #[error("Unexpected JSON transcript shape: {reason}")]
    UnexpectedShape { reason: String },

    #[error("Invalid message at position {position}: {reason}")]
    InvalidMessage { position: usize, reason: String },
}

/// Configuration errors, including invalid per-request analysis options.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown detector code: {code}")]
    UnknownDetector { code: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to deserialize {path}: {reason}")]
    Deserialize { path: String, reason: String },
}

/// Detector rule table errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("Invalid pattern {pattern:?} in rule {code}: {reason}")]
    InvalidPattern {
        code: String,
        pattern: String,
        reason: String,
    },

    #[error("Duplicate rule code: {code}")]
    DuplicateCode { code: String },

    #[error("Rule {code} has no patterns")]
    EmptyPatterns { code: String },

    #[error("Rule {code} has critical_threshold {value} outside [0, 1]")]
    InvalidThreshold { code: String, value: String },

    #[error("Composite {composite} references unknown rule code {code}")]
    UnknownCompositeInput { composite: String, code: String },

    #[error("Composite {composite} needs at least one code on each side")]
    EmptyCompositeSide { composite: String },

    #[error("Failed to deserialize rule table: {reason}")]
    Deserialize { reason: String },
}

/// Tool-call request errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Failed to serialize response: {reason}")]
    SerializeFailed { reason: String },
}

/// Master error type for all witness errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForensicError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rule table error: {0}")]
    RuleTable(#[from] RuleTableError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),
}

/// Result type alias for witness operations.
pub type ForensicResult<T> = Result<T, ForensicError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_invalid_json() {
        let err = ParseError::InvalidJson {
            reason: "expected value at line 1 column 2".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid JSON transcript"));
        assert!(msg.contains("line 1 column 2"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "min_confidence".to_string(),
            value: "1.5".to_string(),
            reason: "must be between 0.0 and 1.0".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("min_confidence"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("between 0.0 and 1.0"));
    }

    #[test]
    fn test_config_error_display_unknown_detector() {
        let err = ConfigError::UnknownDetector {
            code: "telepathy".to_string(),
        };
        assert_eq!(format!("{}", err), "Unknown detector code: telepathy");
    }

    #[test]
    fn test_rule_table_error_display_invalid_pattern() {
        let err = RuleTableError::InvalidPattern {
            code: "metadata_leakage".to_string(),
            pattern: "(unclosed".to_string(),
            reason: "unclosed group".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("metadata_leakage"));
        assert!(msg.contains("(unclosed"));
    }

    #[test]
    fn test_forensic_error_from_variants() {
        let parse = ForensicError::from(ParseError::InvalidJson {
            reason: "eof".to_string(),
        });
        assert!(matches!(parse, ForensicError::Parse(_)));

        let config = ForensicError::from(ConfigError::UnknownDetector {
            code: "x".to_string(),
        });
        assert!(matches!(config, ForensicError::Config(_)));

        let rules = ForensicError::from(RuleTableError::DuplicateCode {
            code: "x".to_string(),
        });
        assert!(matches!(rules, ForensicError::RuleTable(_)));

        let request = ForensicError::from(RequestError::InvalidRequest {
            reason: "missing field `transcript`".to_string(),
        });
        assert!(matches!(request, ForensicError::Request(_)));
    }
}
