//! Tool descriptor and tool-call adapter
//!
//! Lets a host MCP server register the analyzer as a tool. The transport and
//! registration live in the host.

use crate::analyzer::ForensicAnalyzer;
use crate::request::ForensicRequest;
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use witness_core::{ForensicResult, RequestError};

/// Name under which the analyzer is registered.
pub const TOOL_NAME: &str = "forensic_analyst";

/// Tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: JsonValue,
}

/// Describe the tool, listing the detector codes of `rules`.
pub fn tool_definition(rules: &RuleSet) -> ToolDefinition {
    let detector_codes: Vec<&str> = rules.rule_codes().collect();

    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: "Scan an AI conversation transcript for behavioral anomalies \
                      (confabulated actions, leaked internal metadata, identity drift) \
                      and return per-turn findings with an overall verdict"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "transcript": {
                    "type": "object",
                    "properties": {
                        "source": {
                            "type": "string",
                            "enum": ["inline"],
                            "description": "Where the content comes from"
                        },
                        "content": {
                            "type": "string",
                            "description": "Raw transcript text"
                        },
                        "format": {
                            "type": "string",
                            "enum": ["json", "structured", "plain", "auto"],
                            "description": "Transcript format (default: auto)"
                        }
                    },
                    "required": ["content"]
                },
                "analysis_config": {
                    "type": "object",
                    "properties": {
                        "detectors": {
                            "type": "array",
                            "items": { "type": "string", "enum": detector_codes },
                            "description": "Detector codes to apply (default: all)"
                        },
                        "min_confidence": {
                            "type": "number",
                            "minimum": 0.0,
                            "maximum": 1.0,
                            "description": "Drop anomalies below this confidence (default: 0.5)"
                        }
                    }
                },
                "evidence_context": {
                    "type": "object",
                    "properties": {
                        "specimen_name": { "type": "string" },
                        "model_family": { "type": "string" }
                    },
                    "additionalProperties": true,
                    "description": "Labelling data echoed into the result"
                }
            },
            "required": ["transcript"]
        }),
    }
}

/// Run one tool call: deserialize the arguments, analyze, serialize the result.
pub fn call_tool(analyzer: &ForensicAnalyzer, arguments: JsonValue) -> ForensicResult<JsonValue> {
    let request: ForensicRequest =
        serde_json::from_value(arguments).map_err(|e| RequestError::InvalidRequest {
            reason: e.to_string(),
        })?;

    let result = analyzer.analyze(&request)?;

    serde_json::to_value(&result).map_err(|e| {
        RequestError::SerializeFailed {
            reason: e.to_string(),
        }
        .into()
    })
}
