//! Fuzz target for the full analysis pipeline over the built-in rules
//!
//! Run with: cargo +nightly fuzz run pipeline_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use witness_analyzer::ForensicAnalyzer;
use witness_core::AnalyzerConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(analyzer) = ForensicAnalyzer::with_builtin_rules(AnalyzerConfig::default()) else {
        return;
    };

    if let Ok(result) = analyzer.analyze_text(input) {
        assert_eq!(result.summary.total, result.anomalies.len());
        for anomaly in &result.anomalies {
            assert!((0.0..=1.0).contains(&anomaly.confidence));
            let turn = result
                .turns
                .iter()
                .find(|t| t.index == anomaly.turn_index)
                .expect("anomaly turn exists");
            assert!(turn.is_assistant());
            assert_eq!(
                turn.text.get(anomaly.span.start..anomaly.span.end),
                Some(anomaly.quoted_span.as_str())
            );
        }
    }
});
