//! Turning vendor error responses into safe, bounded error messages

use crate::error::{ParleyError, ParleyResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_ERROR_BODY_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";

const SENSITIVE_KEY_FRAGMENTS: &[&str] = &[
    "api_key",
    "apikey",
    "token",
    "secret",
    "password",
    "authorization",
    "cookie",
    "private_key",
];

static SECRET_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}", "Bearer [REDACTED]"),
        (
            r#"(?i)\b(api[_-]?key|x-api-key|x-goog-api-key|access[_-]?token|token|secret|password|authorization)\b\s*[:=]\s*["']?[^"',\s}&]+"#,
            "$1=[REDACTED]",
        ),
        (r"\bsk-(ant-)?[A-Za-z0-9_\-]{8,}", "[REDACTED]"),
        (r"([?&]key=)[^&\s]+", "${1}[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Redact secrets from a vendor error body and cap its length
pub fn sanitize_error_body(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty response body>".to_string();
    }

    let text = match serde_json::from_str::<Value>(trimmed) {
        Ok(mut json) => {
            redact_value(&mut json);
            json.to_string()
        }
        Err(_) => redact_text(trimmed),
    };
    truncate(text)
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_value(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        Value::String(s) => *s = redact_text(s),
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace(['-', ' '], "_");
    SENSITIVE_KEY_FRAGMENTS
        .iter()
        .any(|fragment| normalized.contains(fragment))
}

fn redact_text(input: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(input.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

fn truncate(input: String) -> String {
    let count = input.chars().count();
    if count <= MAX_ERROR_BODY_CHARS {
        return input;
    }
    let head: String = input.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{}... [truncated {} chars]", head, count - MAX_ERROR_BODY_CHARS)
}

/// Pass a successful response through; turn any other status into an HTTP error
/// carrying the sanitized body.
pub async fn ensure_success(
    response: reqwest::Response,
    provider: &str,
) -> ParleyResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(provider, %status, "provider returned non-success status");
    Err(ParleyError::Http {
        message: format!(
            "{} API error (status {}): {}",
            provider,
            status,
            sanitize_error_body(&body)
        ),
        url: Some(url),
        status_code: Some(status.as_u16()),
        context: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_sensitive_json_fields() {
        let raw = r#"{"error":{"message":"bad request","api_key":"sk-secret","token":"abc123"}}"#;
        let sanitized = sanitize_error_body(raw);
        assert!(!sanitized.contains("sk-secret"));
        assert!(!sanitized.contains("abc123"));
        assert!(sanitized.contains("bad request"));
    }

    #[test]
    fn test_redacts_inline_secrets() {
        let sanitized =
            sanitize_error_body("Authorization: Bearer abcdefghijklmnop and url ?key=AIzaSecret");
        assert!(!sanitized.contains("abcdefghijklmnop"));
        assert!(!sanitized.contains("AIzaSecret"));
    }

    #[test]
    fn test_truncates_large_bodies() {
        let sanitized = sanitize_error_body(&"x".repeat(5_000));
        assert!(sanitized.ends_with("[truncated 3976 chars]"));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(sanitize_error_body("  "), "<empty response body>");
    }
}
