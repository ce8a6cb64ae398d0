//! Fuzz target for the transcript parser
//!
//! Every format must accept arbitrary UTF-8 without panicking. Successful
//! parses must number turns densely from 1.
//!
//! Run with: cargo +nightly fuzz run transcript_parser_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use witness_analyzer::parser::{parse_transcript, resolve_format};
use witness_core::{ForensicError, TranscriptFormat};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for format in [
        TranscriptFormat::Auto,
        TranscriptFormat::Json,
        TranscriptFormat::Structured,
        TranscriptFormat::Plain,
    ] {
        match parse_transcript(input, format) {
            Ok(parsed) => {
                assert_ne!(parsed.format, TranscriptFormat::Auto);
                for (position, turn) in parsed.turns.iter().enumerate() {
                    assert_eq!(turn.index, position + 1, "turn indices must be dense");
                }
            }
            Err(err) => {
                // Only JSON input can fail to parse
                assert_eq!(resolve_format(input, format), TranscriptFormat::Json);
                assert!(matches!(err, ForensicError::Parse(_)));
                assert!(!err.to_string().is_empty());
            }
        }
    }
});
