//! Helpers for building tool-call log payloads.
//!
//! Payloads carry the request arguments and the response envelope. Secret-looking keys are
//! masked and oversized response text is truncated before anything reaches the log.

use chrono::Utc;
use serde_json::{Map, Value, json};

use crate::tools::ToolResult;

const MAX_RESPONSE_TEXT_PARSE_BYTES: usize = 256 * 1024;
const MAX_LOGGED_TEXT_BYTES: usize = 4 * 1024;
const REDACTED: &str = "[REDACTED]";
const SECRET_KEY_MARKERS: &[&str] = &["apikey", "api_key", "password", "token", "secret", "authorization"];

/// Builds the log payload for one tool call.
pub(crate) fn build_log_payload(tool: &str, request: &Map<String, Value>, result: &ToolResult) -> Value {
    json!({
        "tool": tool,
        "timestamp": Utc::now().to_rfc3339(),
        "request": redact(Value::Object(request.clone())),
        "response": {
            "isError": result.is_error(),
            "body": response_body(&result.text()),
        },
    })
}

/// Redacted response JSON when the text is an object or array, otherwise the (possibly
/// truncated) text itself. Oversized JSON is truncated after redaction, never before.
fn response_body(text: &str) -> Value {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Value::String(truncate(text, MAX_LOGGED_TEXT_BYTES));
    }
    if text.len() > MAX_RESPONSE_TEXT_PARSE_BYTES {
        return Value::String(format!("[response omitted: {} bytes]", text.len()));
    }

    match serde_json::from_str::<Value>(text) {
        Ok(parsed) if parsed.is_object() || parsed.is_array() => {
            let redacted = redact(parsed);
            match serde_json::to_string(&redacted) {
                Ok(serialized) if serialized.len() <= MAX_LOGGED_TEXT_BYTES => redacted,
                Ok(serialized) => Value::String(truncate(&serialized, MAX_LOGGED_TEXT_BYTES)),
                Err(_) => Value::String(format!("[response omitted: {} bytes]", text.len())),
            }
        }
        _ => Value::String(truncate(text, MAX_LOGGED_TEXT_BYTES)),
    }
}

/// Mask the values of secret-looking keys at any depth.
pub(crate) fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    if is_secret_key(&key) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact(value))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}

fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes truncated)", &text[..end], text.len() - end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secret_keys_at_any_depth() {
        let redacted = redact(json!({
            "name": "wf",
            "credentials": { "apiKey": "k", "nested": [{ "accessToken": "t" }] },
            "Authorization": "Bearer x"
        }));

        assert_eq!(redacted["name"], "wf");
        assert_eq!(redacted["credentials"]["apiKey"], REDACTED);
        assert_eq!(redacted["credentials"]["nested"][0]["accessToken"], REDACTED);
        assert_eq!(redacted["Authorization"], REDACTED);
    }

    #[test]
    fn parses_json_response_text() {
        let request = Map::new();
        let payload = build_log_payload("t", &request, &ToolResult::Success(json!({ "ok": true })));

        assert_eq!(payload["tool"], "t");
        assert_eq!(payload["response"]["isError"], false);
        assert_eq!(payload["response"]["body"]["ok"], true);
    }

    #[test]
    fn plain_error_text_is_kept_verbatim() {
        let payload = build_log_payload("t", &Map::new(), &ToolResult::Error("Unknown tool: t".to_string()));
        assert_eq!(payload["response"]["body"], "Unknown tool: t");
    }

    #[test]
    fn oversized_text_is_truncated() {
        let long = "é".repeat(MAX_LOGGED_TEXT_BYTES);
        let body = response_body(&long);
        let text = body.as_str().expect("text body");

        assert!(text.len() < long.len());
        assert!(text.ends_with("bytes truncated)"));
    }

    #[test]
    fn oversized_json_is_redacted_before_truncation() {
        let result = ToolResult::Success(json!({
            "apiKey": "sk-live-SECRET",
            "nodes": [{ "parameters": { "headers": { "Authorization": "Bearer live-token" } } }],
            "filler": "x".repeat(MAX_LOGGED_TEXT_BYTES + 1000)
        }));
        let payload = build_log_payload("n8n_get_workflow", &Map::new(), &result);
        let logged = payload.to_string();

        assert!(!logged.contains("sk-live-SECRET"));
        assert!(!logged.contains("live-token"));
        let body = payload["response"]["body"].as_str().expect("truncated text body");
        assert!(body.ends_with("bytes truncated)"));
    }

    #[test]
    fn json_beyond_parse_limit_is_omitted() {
        let text = format!(r#"{{"token":"hidden","filler":"{}"}}"#, "x".repeat(MAX_RESPONSE_TEXT_PARSE_BYTES));
        let body = response_body(&text);

        assert!(!body.to_string().contains("hidden"));
        assert!(body.as_str().expect("text body").starts_with("[response omitted"));
    }
}
