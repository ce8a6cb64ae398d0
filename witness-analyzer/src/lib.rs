//! Witness Analyzer - Transcript Forensics Pipeline
//!
//! Parses an AI conversation transcript into turns, scans assistant turns
//! against a table of detector rules, synthesizes co-occurrence composites,
//! and reduces the surviving anomalies to a summary and a verdict.
//!
//! ```no_run
//! use witness_analyzer::{ForensicAnalyzer, ForensicRequest};
//! use witness_core::AnalyzerConfig;
//!
//! let analyzer = ForensicAnalyzer::with_builtin_rules(AnalyzerConfig::default())?;
//! let result = analyzer.analyze(&ForensicRequest::inline(
//!     "User: What happened?\nAssistant: I executed Python code and confirmed it.",
//! ))?;
//! println!("{}", result.verdict.verdict);
//! # Ok::<(), witness_core::ForensicError>(())
//! ```

pub mod analyzer;
pub mod composite;
pub mod parser;
pub mod quote;
pub mod reducer;
pub mod request;
pub mod rules;
pub mod scanner;
pub mod tool;

pub use analyzer::{ForensicAnalyzer, ScanOptions};
pub use parser::{detect_format, parse_transcript, ParsedTranscript};
pub use reducer::{apply_cutoff, decide_verdict, reduce, summarize};
pub use request::{AnalysisOptions, ForensicRequest, TranscriptInput, TranscriptSource};
pub use rules::{CompiledPattern, CompiledRule, RuleSet, BUILTIN_RULES_TOML};
pub use tool::{call_tool, tool_definition, ToolDefinition, TOOL_NAME};
