//! witness command-line entry point.
//!
//! Reads a transcript (or a full JSON request) from a file or stdin, runs the
//! analyzer and prints the result as JSON on stdout. Logs go to stderr.

use clap::Parser;
use serde_json::json;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use witness_analyzer::{tool_definition, ForensicAnalyzer, ForensicRequest};
use witness_core::{AnalyzerConfig, ForensicError, RequestError, TranscriptFormat};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Forensic(#[from] ForensicError),
    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Failed to init logging: {0}")]
    Logging(String),
}

/// Scan an AI conversation transcript for behavioral anomalies.
#[derive(Parser, Debug)]
#[command(name = "witness", version)]
struct Cli {
    /// Transcript file; `-` or absent reads stdin
    path: Option<PathBuf>,

    /// Transcript format: auto, json, structured or plain
    #[arg(long, default_value = "auto")]
    format: TranscriptFormat,

    /// Comma-separated detector codes (default: all)
    #[arg(long, value_delimiter = ',')]
    detectors: Vec<String>,

    /// Drop anomalies below this confidence
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Rule table file (TOML, YAML or JSON)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Analyzer config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat input as a full JSON analysis request
    #[arg(long)]
    request: bool,

    /// Print the loaded detector table and exit
    #[arg(long)]
    list_detectors: bool,

    /// Print the tool definition and exit
    #[arg(long)]
    tool_schema: bool,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging() {
        eprintln!("warning: {}", err);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = %err, "Run failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr subscriber. `WITNESS_LOG_FORMAT=json` switches to JSON lines.
fn init_logging() -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("witness=info"));
    let json_output = wants_json_logs(std::env::var("WITNESS_LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    let result = if json_output {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| CliError::Logging(e.to_string()))
}

fn wants_json_logs(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let out = execute(cli)?;
    println!("{}", out);
    Ok(())
}

/// Produce the JSON document for stdout.
fn execute(cli: &Cli) -> Result<String, CliError> {
    let analyzer = ForensicAnalyzer::from_config(load_config(cli)?)?;

    if cli.list_detectors {
        return to_json(&detector_listing(&analyzer), cli.compact);
    }
    if cli.tool_schema {
        return to_json(&tool_definition(analyzer.rules()), cli.compact);
    }

    let content = read_input(cli.path.as_deref())?;
    let request = build_request(cli, content)?;
    let result = analyzer.analyze(&request)?;
    to_json(&result, cli.compact)
}

fn load_config(cli: &Cli) -> Result<AnalyzerConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => AnalyzerConfig::from_toml_path(path)?,
        None => AnalyzerConfig::from_env()?,
    };
    if let Some(rules) = &cli.rules {
        config.rules_path = Some(rules.clone());
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Build the request. Command-line options override a JSON request's own.
fn build_request(cli: &Cli, content: String) -> Result<ForensicRequest, CliError> {
    let mut request = if cli.request {
        serde_json::from_str(&content).map_err(|e| {
            ForensicError::from(RequestError::InvalidRequest {
                reason: e.to_string(),
            })
        })?
    } else {
        ForensicRequest::inline(content).with_format(cli.format)
    };

    if !cli.detectors.is_empty() {
        request = request.with_detectors(cli.detectors.iter().cloned());
    }
    if let Some(min_confidence) = cli.min_confidence {
        request = request.with_min_confidence(min_confidence);
    }
    Ok(request)
}

fn detector_listing(analyzer: &ForensicAnalyzer) -> serde_json::Value {
    let rules: Vec<_> = analyzer
        .rules()
        .rules()
        .iter()
        .map(|rule| {
            json!({
                "code": rule.code,
                "name": rule.name,
                "description": rule.description,
                "critical_threshold": rule.critical_threshold,
                "patterns": rule.patterns().len(),
            })
        })
        .collect();

    json!({
        "rules": rules,
        "composites": analyzer.rules().composites(),
    })
}

fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["witness"]).unwrap();
        assert!(cli.path.is_none());
        assert_eq!(cli.format, TranscriptFormat::Auto);
        assert!(cli.detectors.is_empty());
        assert!(!cli.request);
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::try_parse_from([
            "witness",
            "--format",
            "structured",
            "--detectors",
            "metadata_leakage,identity_drift",
            "--min-confidence",
            "0.8",
            "--compact",
            "transcript.txt",
        ])
        .unwrap();
        assert_eq!(cli.format, TranscriptFormat::Structured);
        assert_eq!(cli.detectors, vec!["metadata_leakage", "identity_drift"]);
        assert_eq!(cli.min_confidence, Some(0.8));
        assert!(cli.compact);
        assert_eq!(cli.path, Some(PathBuf::from("transcript.txt")));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["witness", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "User: hi").unwrap();
        assert_eq!(read_input(Some(file.path())).unwrap(), "User: hi");
    }

    #[test]
    fn test_build_request_overrides() {
        let cli = Cli::try_parse_from([
            "witness",
            "--request",
            "--detectors",
            "metadata_leakage",
            "--min-confidence",
            "0.9",
        ])
        .unwrap();
        let request = build_request(
            &cli,
            r#"{"transcript":{"content":"x","format":"plain"},"analysis_config":{"min_confidence":0.1}}"#
                .to_string(),
        )
        .unwrap();

        assert_eq!(request.transcript.format, TranscriptFormat::Plain);
        let options = request.options();
        assert_eq!(options.min_confidence, Some(0.9));
        assert_eq!(options.detectors, Some(vec!["metadata_leakage".to_string()]));
    }

    #[test]
    fn test_build_request_rejects_bad_json() {
        let cli = Cli::try_parse_from(["witness", "--request"]).unwrap();
        assert!(matches!(
            build_request(&cli, "not json".to_string()),
            Err(CliError::Forensic(ForensicError::Request(_)))
        ));
    }

    fn default_config_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_min_confidence = 0.5").unwrap();
        file
    }

    #[test]
    fn test_tool_schema_output() {
        let config = default_config_file();
        let path = config.path().display().to_string();
        let cli =
            Cli::try_parse_from(["witness", "--config", &path, "--tool-schema", "--compact"])
                .unwrap();

        let out = execute(&cli).unwrap();
        assert!(!out.contains('\n'));
        let schema: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(schema["name"], "forensic_analyst");
        assert_eq!(schema["input_schema"]["required"], json!(["transcript"]));
        let detectors = &schema["input_schema"]["properties"]["analysis_config"]["properties"]
            ["detectors"]["items"]["enum"];
        assert!(detectors
            .as_array()
            .unwrap()
            .contains(&json!("metadata_leakage")));
    }

    #[test]
    fn test_execute_analyzes_transcript_file() {
        let config = default_config_file();
        let config_path = config.path().display().to_string();
        let mut transcript = tempfile::NamedTempFile::new().unwrap();
        write!(transcript, "User: hi\nAssistant: Hello there.").unwrap();
        let transcript_path = transcript.path().display().to_string();

        let cli = Cli::try_parse_from(["witness", "--config", &config_path, &transcript_path])
            .unwrap();
        let result: serde_json::Value = serde_json::from_str(&execute(&cli).unwrap()).unwrap();
        assert_eq!(result["summary"]["total"], 0);
    }

    #[test]
    fn test_wants_json_logs() {
        assert!(wants_json_logs(Some("json")));
        assert!(wants_json_logs(Some("JSON")));
        assert!(!wants_json_logs(Some("pretty")));
        assert!(!wants_json_logs(None));
    }

    #[test]
    fn test_detector_listing() {
        let analyzer = ForensicAnalyzer::with_builtin_rules(AnalyzerConfig::default()).unwrap();
        let listing = detector_listing(&analyzer);
        assert_eq!(listing["composites"][0]["code"], "split_brain");
        assert!(listing["rules"].as_array().unwrap().len() >= 6);
    }
}
