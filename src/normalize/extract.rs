// src/normalize/extract.rs
//! Hard-fail stage: find the report object in free-form oracle text and parse it.
//!
//! No partial recovery. Anything that does not yield one JSON object is
//! `MalformedOracleResponse`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// Opening fence (optional language tag) at the very start of the text.
static RE_OPEN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\A```[ \t]*(?:json)?").expect("open fence regex"));
/// Closing fence at the very end of the text.
static RE_CLOSE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```\z").expect("close fence regex"));

/// Remove a leading opening fence and a trailing closing fence. Backticks inside
/// the payload are left alone; fences around commentary fall outside the braces
/// and are cut off by [`slice_object`].
pub fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let opened = RE_OPEN_FENCE.replace(trimmed, "");
    let closed = RE_CLOSE_FENCE.replace(opened.trim_end(), "");
    closed.trim().to_string()
}

/// Slice from the first `{` to the last `}` inclusive.
pub fn slice_object(text: &str) -> Result<&str, PipelineError> {
    let start = text.find('{').ok_or_else(|| {
        PipelineError::MalformedOracleResponse("no opening brace in oracle text".into())
    })?;
    let end = text.rfind('}').ok_or_else(|| {
        PipelineError::MalformedOracleResponse("no closing brace in oracle text".into())
    })?;
    if end < start {
        return Err(PipelineError::MalformedOracleResponse(
            "closing brace precedes opening brace".into(),
        ));
    }
    Ok(&text[start..=end])
}

/// Parse the sliced text; it must be a JSON object.
pub fn parse_object(slice: &str) -> Result<Map<String, Value>, PipelineError> {
    match serde_json::from_str::<Value>(slice) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(PipelineError::MalformedOracleResponse(
            "payload is not a JSON object".into(),
        )),
        Err(e) => Err(PipelineError::MalformedOracleResponse(format!(
            "invalid JSON: {e}"
        ))),
    }
}

/// Full hard-fail stage: strip fences → slice braces → parse.
pub fn extract_document(raw: &str) -> Result<Map<String, Value>, PipelineError> {
    let cleaned = strip_fences(raw);
    let slice = slice_object(&cleaned)?;
    parse_object(slice)
}
