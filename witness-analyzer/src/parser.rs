//! Transcript parser
//!
//! Turns raw transcript text into an ordered list of [`Turn`]s. Three input
//! shapes are understood:
//!
//! - `json`: an array of message objects, or an object with a `messages` array
//! - `structured`: lines prefixed with `User:`, `Assistant:` or `System:`
//! - `plain`: the whole input is a single assistant turn
//!
//! `auto` picks one of the three from the content itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use witness_core::{ForensicResult, ParseError, TranscriptFormat, Turn, TurnRole};

static ROLE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(user|assistant|system):").expect("Invalid role marker regex"));

/// Parsed turns plus the format that was actually used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTranscript {
    /// Never `Auto`
    pub format: TranscriptFormat,
    pub turns: Vec<Turn>,
}

/// Resolve `auto` against the content. Other hints are returned unchanged.
pub fn resolve_format(content: &str, hint: TranscriptFormat) -> TranscriptFormat {
    match hint {
        TranscriptFormat::Auto => detect_format(content),
        other => other,
    }
}

/// Detect the format of a transcript.
///
/// JSON if the trimmed input opens with `{` or `[`, structured if any line
/// carries a role marker, plain otherwise.
pub fn detect_format(content: &str) -> TranscriptFormat {
    let trimmed = content.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        TranscriptFormat::Json
    } else if content.lines().any(|line| ROLE_MARKER.is_match(line)) {
        TranscriptFormat::Structured
    } else {
        TranscriptFormat::Plain
    }
}

/// Parse a transcript using the given format hint.
pub fn parse_transcript(content: &str, hint: TranscriptFormat) -> ForensicResult<ParsedTranscript> {
    let format = resolve_format(content, hint);
    let turns = match format {
        TranscriptFormat::Json => parse_json(content)?,
        TranscriptFormat::Structured => parse_structured(content),
        // resolve_format never yields Auto
        TranscriptFormat::Plain | TranscriptFormat::Auto => parse_plain(content),
    };

    tracing::debug!(format = %format, turns = turns.len(), "Transcript parsed");
    Ok(ParsedTranscript { format, turns })
}

/// Parse a JSON transcript.
pub fn parse_json(content: &str) -> ForensicResult<Vec<Turn>> {
    let value: Value = serde_json::from_str(content).map_err(|e| ParseError::InvalidJson {
        reason: e.to_string(),
    })?;

    let messages = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("messages") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ParseError::UnexpectedShape {
                    reason: "object transcript must carry a `messages` array".to_string(),
                }
                .into())
            }
        },
        _ => {
            return Err(ParseError::UnexpectedShape {
                reason: "expected an array of messages".to_string(),
            }
            .into())
        }
    };

    let mut turns = Vec::with_capacity(messages.len());
    for (position, item) in messages.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| ParseError::InvalidMessage {
            position,
            reason: "expected an object".to_string(),
        })?;

        let role = message_role(object, position)?;
        let text = message_text(object)
            .map_err(|reason| ParseError::InvalidMessage { position, reason })?;

        turns.push(Turn::new(position + 1, role, text));
    }

    Ok(turns)
}

fn message_role(object: &Map<String, Value>, position: usize) -> ForensicResult<TurnRole> {
    match object.get("role") {
        None | Some(Value::Null) => Ok(TurnRole::Assistant),
        Some(Value::String(raw)) => Ok(raw.parse().unwrap_or_else(|_| {
            tracing::warn!(position, role = %raw, "Unknown message role, treating as assistant");
            TurnRole::Assistant
        })),
        Some(_) => Err(ParseError::InvalidMessage {
            position,
            reason: "`role` must be a string".to_string(),
        }
        .into()),
    }
}

/// Text of a message: `content` (string or text blocks), else `text`.
fn message_text(object: &Map<String, Value>) -> Result<String, String> {
    match object.get("content") {
        Some(Value::String(text)) => return Ok(text.clone()),
        Some(Value::Array(blocks)) => return Ok(join_text_blocks(blocks)),
        Some(Value::Null) | None => {}
        Some(_) => return Err("`content` must be a string or an array of blocks".to_string()),
    }

    match object.get("text") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Ok(String::new()),
        Some(_) => Err("`text` must be a string".to_string()),
    }
}

fn join_text_blocks(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block {
            Value::String(text) => Some(text.as_str()),
            Value::Object(map) => {
                let is_text = map
                    .get("type")
                    .and_then(Value::as_str)
                    .map_or(true, |kind| kind == "text");
                if is_text {
                    map.get("text").and_then(Value::as_str)
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a role-tagged transcript.
///
/// A marker line opens a new turn; following unmarked lines belong to it.
/// Lines before the first marker are dropped.
pub fn parse_structured(content: &str) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut current: Option<(TurnRole, Vec<&str>)> = None;
    let mut dropped = 0usize;

    for line in content.lines() {
        if let Some(marker) = ROLE_MARKER.captures(line) {
            if let Some((role, lines)) = current.take() {
                push_turn(&mut turns, role, &lines);
            }
            let role = marker_role(&marker[1]);
            let rest = &line[marker.get(0).map_or(0, |m| m.end())..];
            current = Some((role, vec![rest]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        } else if !line.trim().is_empty() {
            dropped += 1;
        }
    }

    if let Some((role, lines)) = current.take() {
        push_turn(&mut turns, role, &lines);
    }

    if dropped > 0 {
        tracing::warn!(dropped, "Dropped lines before the first role marker");
    }

    turns
}

fn marker_role(marker: &str) -> TurnRole {
    match marker.to_ascii_lowercase().as_str() {
        "user" => TurnRole::User,
        "system" => TurnRole::System,
        _ => TurnRole::Assistant,
    }
}

fn push_turn(turns: &mut Vec<Turn>, role: TurnRole, lines: &[&str]) {
    let text = lines.join("\n").trim().to_string();
    turns.push(Turn::new(turns.len() + 1, role, text));
}

/// Parse plain text as one assistant turn. Blank input yields no turns.
pub fn parse_plain(content: &str) -> Vec<Turn> {
    let text = content.trim();
    if text.is_empty() {
        return Vec::new();
    }
    vec![Turn::new(1, TurnRole::Assistant, text)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use witness_core::ForensicError;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("  [{\"role\":\"user\"}]"), TranscriptFormat::Json);
        assert_eq!(detect_format("{\"messages\":[]}"), TranscriptFormat::Json);
        assert_eq!(detect_format("intro\nassistant: hi"), TranscriptFormat::Structured);
        assert_eq!(detect_format("just some words"), TranscriptFormat::Plain);
        // Marker must open the line
        assert_eq!(detect_format("he said User: hi"), TranscriptFormat::Plain);
    }

    #[test]
    fn test_structured_turn_numbering() {
        let turns = parse_structured("User: hi\nAssistant: ok\n");
        assert_eq!(
            turns,
            vec![
                Turn::new(1, TurnRole::User, "hi"),
                Turn::new(2, TurnRole::Assistant, "ok"),
            ]
        );
    }

    #[test]
    fn test_structured_multiline_and_case_insensitive_markers() {
        let input = "SYSTEM: be brief\nuser: first line\nsecond line\n\nASSISTANT:   answer  \n";
        let turns = parse_structured(input);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, TurnRole::System);
        assert_eq!(turns[1].text, "first line\nsecond line");
        assert_eq!(turns[2].text, "answer");
        assert_eq!(turns[2].index, 3);
    }

    #[test]
    fn test_structured_drops_preamble() {
        let turns = parse_structured("transcript export v2\nAssistant: hello");
        assert_eq!(turns, vec![Turn::new(1, TurnRole::Assistant, "hello")]);
    }

    #[test]
    fn test_structured_empty_input() {
        assert!(parse_structured("").is_empty());
    }

    #[test]
    fn test_plain() {
        assert_eq!(
            parse_plain("  all done  \n"),
            vec![Turn::new(1, TurnRole::Assistant, "all done")]
        );
        assert!(parse_plain("   \n\t").is_empty());
    }

    #[test]
    fn test_json_array_with_defaults() {
        let turns = parse_json(r#"[{"role":"user","content":"hi"},{"text":"ok"}]"#).unwrap();
        assert_eq!(
            turns,
            vec![
                Turn::new(1, TurnRole::User, "hi"),
                Turn::new(2, TurnRole::Assistant, "ok"),
            ]
        );
    }

    #[test]
    fn test_json_messages_object_and_blocks() {
        let input = r#"{"messages":[
            {"role":"human","content":"q"},
            {"role":"assistant","content":[
                {"type":"text","text":"part one"},
                {"type":"tool_use","name":"x"},
                {"type":"text","text":"part two"}
            ]}
        ]}"#;
        let turns = parse_json(input).unwrap();
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].text, "part one\npart two");
    }

    #[test]
    fn test_json_unknown_role_is_assistant() {
        let turns = parse_json(r#"[{"role":"narrator","content":"x"}]"#).unwrap();
        assert_eq!(turns[0].role, TurnRole::Assistant);
    }

    #[test]
    fn test_json_missing_content_is_empty_turn() {
        let turns = parse_json(r#"[{"role":"user"}]"#).unwrap();
        assert_eq!(turns, vec![Turn::new(1, TurnRole::User, "")]);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            parse_json("[{\"role\":"),
            Err(ForensicError::Parse(ParseError::InvalidJson { .. }))
        ));
        assert!(matches!(
            parse_json("{\"turns\":[]}"),
            Err(ForensicError::Parse(ParseError::UnexpectedShape { .. }))
        ));
        assert!(matches!(
            parse_json("42"),
            Err(ForensicError::Parse(ParseError::UnexpectedShape { .. }))
        ));
        assert!(matches!(
            parse_json("[\"hi\"]"),
            Err(ForensicError::Parse(ParseError::InvalidMessage { position: 0, .. }))
        ));
        assert!(matches!(
            parse_json(r#"[{"role":"user","content":"a"},{"role":7}]"#),
            Err(ForensicError::Parse(ParseError::InvalidMessage { position: 1, .. }))
        ));
    }

    #[test]
    fn test_auto_json_parse_error_surfaces() {
        assert!(matches!(
            parse_transcript("{not json", TranscriptFormat::Auto),
            Err(ForensicError::Parse(ParseError::InvalidJson { .. }))
        ));
    }

    #[test]
    fn test_explicit_hint_overrides_detection() {
        let parsed = parse_transcript("User: hi", TranscriptFormat::Plain).unwrap();
        assert_eq!(parsed.format, TranscriptFormat::Plain);
        assert_eq!(parsed.turns, vec![Turn::new(1, TurnRole::Assistant, "User: hi")]);
    }
}
