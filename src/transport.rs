//! Shared HTTP plumbing for the external service clients
//!
//! Both the agent client and the knowledge-base backend talk to JSON
//! endpoints that report failures either through the HTTP status or through
//! an application-level field in the body. The helpers here turn both into
//! [`KbError`] values with the most specific message available.

use crate::error::KbError;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

/// Header carrying the optional static API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Attach the API key header when one is configured
pub fn with_api_key(builder: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => builder.header(API_KEY_HEADER, key),
        _ => builder,
    }
}

/// Pull a human-readable message out of an error payload
///
/// Looks at `error`, then `message`, then `detail`, accepting either a
/// string or an object with its own `message` field.
pub fn message_from_value(value: &Value) -> Option<String> {
    for key in ["error", "message", "detail"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    if !s.trim().is_empty() {
                        return Some(s.trim().to_string());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Build a server error for a non-success HTTP status
///
/// Uses the server-supplied message when the body is JSON with a known
/// error field, else a generic message naming the status.
pub fn error_from_status(status: StatusCode, body: &str) -> KbError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| message_from_value(&v))
        .unwrap_or_else(|| {
            format!(
                "Request failed with status {}",
                status.canonical_reason().map_or_else(
                    || status.as_u16().to_string(),
                    |reason| format!("{} {}", status.as_u16(), reason)
                )
            )
        });
    KbError::server(Some(status.as_u16()), message)
}

/// Read a response body as JSON, mapping HTTP and decode failures
///
/// Non-2xx statuses become [`KbError::Server`]; bodies that are not JSON
/// become [`KbError::MalformedResponse`]. An empty 2xx body reads as
/// `Value::Null`.
pub async fn read_json(response: Response, what: &str) -> Result<Value, KbError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        tracing::warn!("Failed to read {} response body: {}", what, e);
        KbError::Transport(format!("Failed to read {} response: {}", what, e))
    })?;

    if !status.is_success() {
        tracing::error!("{} returned error {}: {}", what, status, body);
        return Err(error_from_status(status, &body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!("Failed to parse {} response: {}", what, e);
        KbError::MalformedResponse(format!("{} returned invalid JSON: {}", what, e))
    })
}

/// Check an application-level `success` flag in a 2xx body
///
/// Bodies without a `success` field are accepted as-is.
pub fn ensure_success(value: &Value, fallback: &str) -> Result<(), KbError> {
    match value.get("success") {
        Some(Value::Bool(false)) => Err(KbError::server(
            None,
            message_from_value(value).unwrap_or_else(|| fallback.to_string()),
        )),
        _ => Ok(()),
    }
}
