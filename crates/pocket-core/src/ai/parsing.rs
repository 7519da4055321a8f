//! Strict JSON parsing for generated payloads
//!
//! Both generation call sites ask for "strictly JSON, no extra text". The
//! contract is enforced here rather than by slicing between braces: the
//! trimmed text must be exactly one JSON object.

use serde_json::{Map, Value};

use crate::error::ExtractionError;

/// Longest raw excerpt echoed in error details
const MAX_EXCERPT: usize = 200;

/// Parse generated text that must be a single JSON object
///
/// Leading and trailing whitespace is allowed. Anything else around the
/// object (prose, code fences, a second value) is a contract violation.
pub fn parse_strict_json(text: &str) -> Result<Map<String, Value>, ExtractionError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ExtractionError::MalformedJson {
            detail: "empty response".into(),
            raw: text.to_string(),
        });
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractionError::MalformedJson {
            detail: format!("expected a JSON object, got {}", kind(&other)),
            raw: text.to_string(),
        }),
        Err(e) => Err(ExtractionError::MalformedJson {
            detail: format!("{} | Raw: {}", e, excerpt(trimmed)),
            raw: text.to_string(),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > MAX_EXCERPT {
        let cut: String = text.chars().take(MAX_EXCERPT).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
