//! Witness Test Utilities
//!
//! Shared test infrastructure for the witness workspace:
//! - Proptest generators for turns, transcripts and anomalies
//! - Fixtures: sample transcripts, small rule tables, ready analyzers
//! - Assertions for error variants and anomaly invariants

pub use witness_analyzer::{ForensicAnalyzer, ForensicRequest, RuleSet};
pub use witness_core::{
    AnalysisResult, AnalyzerConfig, Anomaly, CompositeRule, ConfigError, DetectorRule,
    DetectorTable, ForensicError, ForensicResult, ParseError, PatternSpec, RequestError,
    RuleTableError, Severity, TextSpan, Turn, TurnRole,
};

use std::sync::Arc;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for transcript and anomaly values.

    use super::*;
    use proptest::prelude::*;

    /// Phrases that trip at least one built-in detector.
    pub const TRIGGER_PHRASES: &[&str] = &[
        "I executed Python code",
        "I ran the script",
        "sediment://file_abc",
        "<|im_end|>",
        "The output shows",
        "All tests passed",
        "as of today",
        "I am a human",
        "and confirmed it",
    ];

    /// Generate a TurnRole variant.
    pub fn arb_turn_role() -> impl Strategy<Value = TurnRole> {
        prop_oneof![
            Just(TurnRole::User),
            Just(TurnRole::Assistant),
            Just(TurnRole::System),
        ]
    }

    /// Generate a role that is never scanned.
    pub fn arb_non_assistant_role() -> impl Strategy<Value = TurnRole> {
        prop_oneof![Just(TurnRole::User), Just(TurnRole::System)]
    }

    /// Generate a Severity variant.
    pub fn arb_severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Low),
            Just(Severity::Medium),
            Just(Severity::High),
            Just(Severity::Critical),
        ]
    }

    /// Single-line text with no surrounding whitespace and no role marker.
    pub fn arb_line_text() -> impl Strategy<Value = String> {
        "[a-z0-9]([a-z0-9 ,.]{0,40}[a-z0-9])?"
    }

    /// Single-line text embedding a trigger phrase.
    pub fn arb_suspicious_text() -> impl Strategy<Value = String> {
        (
            arb_line_text(),
            prop::sample::select(TRIGGER_PHRASES),
            arb_line_text(),
        )
            .prop_map(|(before, phrase, after)| format!("{} {} {}", before, phrase, after))
    }

    /// Benign or suspicious single-line text.
    pub fn arb_turn_text() -> impl Strategy<Value = String> {
        prop_oneof![arb_line_text(), arb_suspicious_text()]
    }

    /// Role/text pairs for a transcript of up to `max_turns` turns.
    pub fn arb_turn_specs(max_turns: usize) -> impl Strategy<Value = Vec<(TurnRole, String)>> {
        prop::collection::vec((arb_turn_role(), arb_turn_text()), 0..=max_turns)
    }

    /// Render role/text pairs as a role-tagged transcript.
    pub fn render_structured(specs: &[(TurnRole, String)]) -> String {
        specs
            .iter()
            .map(|(role, text)| {
                let label = match role {
                    TurnRole::User => "User",
                    TurnRole::Assistant => "Assistant",
                    TurnRole::System => "System",
                };
                format!("{}: {}", label, text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A structured transcript together with the turns it should parse into.
    pub fn arb_structured_transcript() -> impl Strategy<Value = (String, Vec<(TurnRole, String)>)>
    {
        arb_turn_specs(8).prop_map(|specs| (render_structured(&specs), specs))
    }

    /// A structured transcript whose turns are all user or system turns.
    pub fn arb_non_assistant_transcript() -> impl Strategy<Value = String> {
        prop::collection::vec((arb_non_assistant_role(), arb_turn_text()), 0..8)
            .prop_map(|specs| render_structured(&specs))
    }

    /// A base (non-composite) anomaly on a turn in `1..=max_turn`.
    pub fn arb_anomaly(max_turn: usize) -> impl Strategy<Value = Anomaly> {
        (
            1..=max_turn.max(1),
            prop::sample::select(vec!["alpha", "beta", "gamma"]),
            arb_severity(),
            prop::sample::select(vec![0.6, 0.75, 0.95]),
        )
            .prop_map(|(turn_index, code, severity, confidence)| {
                fixtures::anomaly(turn_index, code, severity, confidence)
            })
    }

    /// A list of base anomalies.
    pub fn arb_anomalies(max_len: usize) -> impl Strategy<Value = Vec<Anomaly>> {
        prop::collection::vec(arb_anomaly(6), 0..=max_len)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// The canonical split-brain transcript.
    pub const SPLIT_BRAIN_TRANSCRIPT: &str = "User: What happened?\nAssistant: I executed Python code to generate sediment://file_abc and confirmed it.";

    /// A transcript no built-in detector fires on.
    pub const CLEAN_TRANSCRIPT: &str =
        "System: Be concise.\nUser: What is the capital of France?\nAssistant: Paris.";

    /// A JSON transcript using content blocks and role aliases.
    pub const JSON_TRANSCRIPT: &str = r#"{"messages": [
        {"role": "human", "content": "Did the deploy work?"},
        {"role": "assistant", "content": [
            {"type": "text", "text": "I deployed the build."},
            {"type": "text", "text": "Everything works."}
        ]}
    ]}"#;

    fn keyword_rule(code: &str, keyword: &str) -> DetectorRule {
        DetectorRule {
            code: code.to_string(),
            name: code.to_string(),
            description: format!("Fires on the keyword {:?}", keyword),
            patterns: vec![PatternSpec::Keyword(keyword.to_string())],
            amplifiers: vec!["surely".to_string()],
            critical_threshold: 0.9,
        }
    }

    /// Three keyword rules (`alpha`, `beta`, `gamma`) and one composite
    /// `combo` with `left = [alpha, gamma]`, `right = [beta]`.
    pub fn minimal_rule_table() -> DetectorTable {
        DetectorTable {
            rules: vec![
                keyword_rule("alpha", "alpha"),
                keyword_rule("beta", "beta"),
                keyword_rule("gamma", "gamma"),
            ],
            composites: vec![CompositeRule {
                code: "combo".to_string(),
                name: "Combo".to_string(),
                description: "alpha or gamma together with beta".to_string(),
                left: vec!["alpha".to_string(), "gamma".to_string()],
                right: vec!["beta".to_string()],
            }],
        }
    }

    /// Compiled [`minimal_rule_table`].
    pub fn minimal_rule_set() -> Arc<RuleSet> {
        Arc::new(RuleSet::compile(minimal_rule_table()).expect("minimal rule table compiles"))
    }

    /// Analyzer over the built-in rules with default configuration.
    pub fn builtin_analyzer() -> ForensicAnalyzer {
        ForensicAnalyzer::with_builtin_rules(AnalyzerConfig::default())
            .expect("built-in rules compile")
    }

    /// Analyzer over the minimal rule table with default configuration.
    pub fn minimal_analyzer() -> ForensicAnalyzer {
        ForensicAnalyzer::new(minimal_rule_set(), AnalyzerConfig::default())
            .expect("default config is valid")
    }

    /// A base anomaly with an empty quote.
    pub fn anomaly(turn_index: usize, code: &str, severity: Severity, confidence: f64) -> Anomaly {
        Anomaly {
            turn_index,
            code: code.to_string(),
            severity,
            confidence,
            quoted_span: String::new(),
            span: TextSpan::new(0, 0),
            pattern: None,
            related_turns: None,
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for witness-specific validation.

    use super::*;

    /// Assert that a ForensicResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &ForensicResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a ForensicResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &ForensicResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    #[track_caller]
    pub fn assert_parse_error<T: std::fmt::Debug>(result: &ForensicResult<T>) {
        match result {
            Err(ForensicError::Parse(_)) => {}
            other => panic!("Expected Parse error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &ForensicResult<T>) {
        match result {
            Err(ForensicError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert an UnknownDetector error naming `code`.
    #[track_caller]
    pub fn assert_unknown_detector<T: std::fmt::Debug>(result: &ForensicResult<T>, code: &str) {
        match result {
            Err(ForensicError::Config(ConfigError::UnknownDetector { code: c })) => {
                assert_eq!(c, code, "Wrong code in UnknownDetector error");
            }
            other => panic!("Expected UnknownDetector({}), got: {:?}", code, other),
        }
    }

    #[track_caller]
    pub fn assert_rule_table_error<T: std::fmt::Debug>(result: &ForensicResult<T>) {
        match result {
            Err(ForensicError::RuleTable(_)) => {}
            other => panic!("Expected RuleTable error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_request_error<T: std::fmt::Debug>(result: &ForensicResult<T>) {
        match result {
            Err(ForensicError::Request(_)) => {}
            other => panic!("Expected Request error, got: {:?}", other),
        }
    }

    /// Assert turn indices run 1, 2, 3, ... without gaps.
    #[track_caller]
    pub fn assert_dense_turn_indices(turns: &[Turn]) {
        for (position, turn) in turns.iter().enumerate() {
            assert_eq!(
                turn.index,
                position + 1,
                "Turn at position {} has index {}",
                position,
                turn.index
            );
        }
    }

    /// Assert the structural invariants every analysis result must hold.
    ///
    /// - anomalies point at existing assistant turns
    /// - confidences lie in [0, 1]
    /// - base quotes are exact substrings of the turn text at `span`
    /// - composites carry `related_turns` including their own turn
    /// - the summary total matches the anomaly list
    #[track_caller]
    pub fn assert_result_invariants(result: &AnalysisResult) {
        assert_dense_turn_indices(&result.turns);

        for anomaly in &result.anomalies {
            let turn = result
                .turns
                .iter()
                .find(|t| t.index == anomaly.turn_index)
                .unwrap_or_else(|| panic!("Anomaly on missing turn: {:?}", anomaly));

            assert!(
                turn.is_assistant(),
                "Anomaly on non-assistant turn: {:?}",
                anomaly
            );
            assert!(
                (0.0..=1.0).contains(&anomaly.confidence),
                "Confidence out of range: {:?}",
                anomaly
            );
            assert_eq!(
                turn.text.get(anomaly.span.start..anomaly.span.end),
                Some(anomaly.quoted_span.as_str()),
                "Quote does not match span: {:?}",
                anomaly
            );

            match &anomaly.related_turns {
                Some(related) => {
                    assert_eq!(anomaly.severity, Severity::Critical);
                    assert!(related.contains(&anomaly.turn_index));
                }
                None => assert!(anomaly.pattern.is_some()),
            }
        }

        assert_eq!(result.summary.total, result.anomalies.len());
        let by_code_total: usize = result.summary.by_code.values().sum();
        assert_eq!(by_code_total, result.anomalies.len());
    }
}
