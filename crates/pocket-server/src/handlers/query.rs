//! Expense query handler

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{AppError, AppState};
use pocket_core::Report;

const INVALID_JSON: &str = "Invalid JSON format in request";
const NO_QUERY: &str = "No query provided";

/// POST /api/query - Record an expense described in free text
///
/// Accepts `{"query": "..."}` directly, or wrapped in a gateway envelope
/// whose `body` is either that object or its JSON-encoded string.
pub async fn query(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Report>, AppError> {
    let query = parse_query_body(&body)?;

    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("AI backend not configured"))?;

    debug!(query = %query, "Handling query");
    let outcome = assistant.handle_query(&query, state.today()).await?;

    Ok(Json(outcome.report))
}

/// Pull the query text out of a raw request body
pub(crate) fn parse_query_body(body: &[u8]) -> Result<String, AppError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        parse_object(body)?
    };

    let request = match request.get("body").cloned() {
        Some(_) if request.contains_key("query") => request,
        Some(Value::String(inner)) => parse_object(inner.as_bytes())?,
        Some(Value::Object(inner)) => inner,
        Some(Value::Null) => Map::new(),
        Some(_) => return Err(AppError::bad_request(INVALID_JSON)),
        None => request,
    };

    match request.get("query") {
        Some(Value::String(q)) if !q.trim().is_empty() => Ok(q.trim().to_string()),
        _ => Err(AppError::bad_request(NO_QUERY)),
    }
}

fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AppError::bad_request(INVALID_JSON)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<String, AppError>) -> String {
        result.unwrap_err().message().to_string()
    }

    #[test]
    fn test_plain_body() {
        let q = parse_query_body(br#"{"query": "coffee for 150"}"#).unwrap();
        assert_eq!(q, "coffee for 150");
    }

    #[test]
    fn test_envelope_with_string_body() {
        let raw = br#"{"body": "{\"query\": \"bus fare 40\"}"}"#;
        assert_eq!(parse_query_body(raw).unwrap(), "bus fare 40");
    }

    #[test]
    fn test_envelope_with_object_body() {
        let raw = br#"{"body": {"query": "rent 20000"}, "headers": {}}"#;
        assert_eq!(parse_query_body(raw).unwrap(), "rent 20000");
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(message(parse_query_body(b"not-json")), INVALID_JSON);
        assert_eq!(message(parse_query_body(br#"{"body": "not-json"}"#)), INVALID_JSON);
        assert_eq!(message(parse_query_body(b"[1, 2]")), INVALID_JSON);
    }

    #[test]
    fn test_missing_or_empty_query() {
        assert_eq!(message(parse_query_body(b"")), NO_QUERY);
        assert_eq!(message(parse_query_body(b"{}")), NO_QUERY);
        assert_eq!(message(parse_query_body(br#"{"query": "  "}"#)), NO_QUERY);
        assert_eq!(message(parse_query_body(br#"{"query": 42}"#)), NO_QUERY);
        assert_eq!(message(parse_query_body(br#"{"body": null}"#)), NO_QUERY);
    }
}
