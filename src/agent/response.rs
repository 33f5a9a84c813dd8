//! Agent response types and shape normalization
//!
//! The agent endpoint has answered with several payload shapes over time.
//! [`normalize_response`] folds all of them into one [`NormalizedAnswer`].
//!
//! # Accepted shapes
//!
//! 1. Envelope: `{ "status": "success", "result": { "answer": ..., ... } }`
//! 2. Envelope with a text result: `{ "status": "success", "result": "..." }`
//! 3. Wrapped: `{ "success": true, "response": <any other shape> }`
//! 4. Flat: `{ "answer": ..., "sources": [...], ... }`
//!
//! # Field states
//!
//! | field                   | absent / null | present, empty | present, wrong type        |
//! |-------------------------|---------------|----------------|----------------------------|
//! | `answer`                | malformed     | empty answer   | malformed                  |
//! | `sources`               | no sources    | no sources     | no sources (logged)        |
//! | `confidence`            | `Unknown`     | n/a            | numeric string parsed, else `Unknown` |
//! | `follow_up_suggestions` | no follow-ups | no follow-ups  | non-string entries dropped |
//!
//! A missing confidence is never reported as zero.

use crate::error::{ClientResult, KbError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How sure the agent is about an answer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Confidence {
    /// The service did not report a confidence
    #[default]
    Unknown,
    /// Reported confidence in `[0, 1]`
    Score(f64),
}

impl Confidence {
    /// Build a confidence from a raw score, clamping into `[0, 1]`
    pub fn from_score(score: f64) -> Self {
        if score.is_finite() {
            Confidence::Score(score.clamp(0.0, 1.0))
        } else {
            Confidence::Unknown
        }
    }

    /// The score, if known
    pub fn score(&self) -> Option<f64> {
        match self {
            Confidence::Unknown => None,
            Confidence::Score(s) => Some(*s),
        }
    }

    /// Whether a score was reported
    pub fn is_known(&self) -> bool {
        matches!(self, Confidence::Score(_))
    }

    /// Score as a rounded percentage, if known
    ///
    /// # Examples
    ///
    /// ```
    /// use kbsearch::agent::Confidence;
    ///
    /// assert_eq!(Confidence::from_score(0.924).percent(), Some(92));
    /// assert_eq!(Confidence::Unknown.percent(), None);
    /// ```
    pub fn percent(&self) -> Option<u8> {
        self.score().map(|s| (s * 100.0).round() as u8)
    }
}

impl From<Option<f64>> for Confidence {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Confidence::Unknown, Confidence::from_score)
    }
}

impl From<Confidence> for Option<f64> {
    fn from(value: Confidence) -> Self {
        value.score()
    }
}

/// A citation attached to an agent answer
///
/// Fields the client does not understand are kept in `extra` so they
/// survive serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Name of the cited document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Title of the cited section or document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Page number within the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Excerpt of the cited passage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Any additional fields supplied by the service
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Source {
    /// Create a source citing a document page
    pub fn document(name: impl Into<String>, page: Option<u64>) -> Self {
        Self {
            document: Some(name.into()),
            page,
            ..Self::default()
        }
    }

    /// Build a source from a raw citation object
    ///
    /// Known keys with an unexpected type stay in `extra` instead of being
    /// dropped. Pages may arrive as integers, whole floats or numeric strings.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let mut take_string = |key: &str| match object.remove(key) {
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                object.insert(key.to_string(), other);
                None
            }
            None => None,
        };
        let document = take_string("document");
        let title = take_string("title");
        let content = take_string("content");

        let page = match object.remove("page") {
            Some(Value::Null) | None => None,
            Some(raw) => {
                let parsed = match &raw {
                    Value::Number(n) => whole_page(n),
                    Value::String(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                };
                if parsed.is_none() {
                    object.insert("page".to_string(), raw);
                }
                parsed
            }
        };

        Self {
            document,
            title,
            page,
            content,
            extra: object,
        }
    }

    /// Best label for display: document name, then title
    pub fn label(&self) -> Option<&str> {
        self.document.as_deref().or(self.title.as_deref())
    }
}

/// Page number from a JSON number, accepting whole floats such as `2.0`
fn whole_page(n: &serde_json::Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// The agent's answer after shape normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAnswer {
    /// Answer text
    pub answer: String,
    /// Citations, in the order the service gave them
    pub sources: Vec<Source>,
    /// Reported confidence
    pub confidence: Confidence,
    /// Suggested next questions
    pub follow_ups: Vec<String>,
}

impl NormalizedAnswer {
    /// Create an answer with no citations, follow-ups or confidence
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            confidence: Confidence::Unknown,
            follow_ups: Vec::new(),
        }
    }

    /// Whether a sources section should be shown
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

const GENERIC_AGENT_ERROR: &str = "Failed to get response from agent";

/// Normalize any supported agent payload into a [`NormalizedAnswer`]
///
/// # Errors
///
/// - [`KbError::Server`] when the payload reports a non-success status
/// - [`KbError::MalformedResponse`] when no supported shape matches
///
/// # Examples
///
/// ```
/// use kbsearch::agent::{normalize_response, Confidence};
/// use serde_json::json;
///
/// let answer = normalize_response(json!({
///     "status": "success",
///     "result": { "answer": "Yes.", "sources": [] }
/// }))
/// .unwrap();
/// assert_eq!(answer.answer, "Yes.");
/// assert!(!answer.has_sources());
/// assert_eq!(answer.confidence, Confidence::Unknown);
/// ```
pub fn normalize_response(value: Value) -> ClientResult<NormalizedAnswer> {
    let value = unwrap_client_envelope(value)?;

    match value {
        Value::String(text) => Ok(NormalizedAnswer::text(text)),
        Value::Object(map) => normalize_object(map),
        Value::Null => Err(KbError::MalformedResponse(
            "Agent returned an empty response".to_string(),
        )),
        other => Err(KbError::MalformedResponse(format!(
            "Agent returned an unexpected payload type: {}",
            json_type(&other)
        ))),
    }
}

/// Reject `{ success: false }` bodies and strip a `{ success, response }`
/// wrapper, if present
fn unwrap_client_envelope(value: Value) -> ClientResult<Value> {
    crate::transport::ensure_success(&value, GENERIC_AGENT_ERROR)?;
    let mut map = match value {
        Value::Object(map) => map,
        other => return Ok(other),
    };

    let is_wrapper =
        map.contains_key("response") && !map.contains_key("result") && !map.contains_key("answer");
    if !is_wrapper {
        return Ok(Value::Object(map));
    }

    Ok(map.remove("response").unwrap_or(Value::Null))
}

fn normalize_object(mut map: Map<String, Value>) -> ClientResult<NormalizedAnswer> {
    if let Some(status) = map.get("status") {
        let succeeded = status
            .as_str()
            .map(|s| s.trim().eq_ignore_ascii_case("success"))
            .ok_or_else(|| {
                KbError::MalformedResponse(format!(
                    "Agent status field is a {}, expected a string",
                    json_type(status)
                ))
            })?;
        if !succeeded {
            return Err(KbError::server(None, status_error_message(&map)));
        }
    }

    match map.remove("result") {
        Some(Value::Object(result)) => normalize_fields(result),
        Some(Value::String(text)) => Ok(NormalizedAnswer::text(text)),
        Some(other) if map.contains_key("answer") => {
            tracing::debug!("Ignoring non-object result field: {}", json_type(&other));
            normalize_fields(map)
        }
        Some(other) => Err(KbError::MalformedResponse(format!(
            "Agent result is a {}, expected an object",
            json_type(&other)
        ))),
        None => normalize_fields(map),
    }
}

fn status_error_message(map: &Map<String, Value>) -> String {
    if let Some(result) = map.get("result") {
        if let Some(message) = crate::transport::message_from_value(result) {
            return message;
        }
        if let Some(Value::String(answer)) = result.get("answer") {
            if !answer.trim().is_empty() {
                return answer.clone();
            }
        }
    }
    crate::transport::message_from_value(&Value::Object(map.clone()))
        .unwrap_or_else(|| GENERIC_AGENT_ERROR.to_string())
}

fn normalize_fields(mut fields: Map<String, Value>) -> ClientResult<NormalizedAnswer> {
    let answer = match fields.remove("answer") {
        Some(Value::String(answer)) => answer,
        Some(Value::Null) | None => {
            return Err(KbError::MalformedResponse(
                "Agent response is missing an answer".to_string(),
            ))
        }
        Some(other) => {
            return Err(KbError::MalformedResponse(format!(
                "Agent answer is a {}, expected a string",
                json_type(&other)
            )))
        }
    };

    Ok(NormalizedAnswer {
        answer,
        sources: normalize_sources(fields.remove("sources")),
        confidence: normalize_confidence(fields.remove("confidence")),
        follow_ups: normalize_follow_ups(fields.remove("follow_up_suggestions")),
    })
}

fn normalize_sources(raw: Option<Value>) -> Vec<Source> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(object) => Some(Source::from_object(object)),
                other => {
                    tracing::debug!("Skipping non-object source entry: {}", json_type(&other));
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!("Agent sources field is a {}, ignoring", json_type(&other));
            Vec::new()
        }
    }
}

fn normalize_confidence(raw: Option<Value>) -> Confidence {
    match raw {
        Some(Value::Number(n)) => n.as_f64().map_or(Confidence::Unknown, Confidence::from_score),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_or(Confidence::Unknown, Confidence::from_score),
        _ => Confidence::Unknown,
    }
}

fn normalize_follow_ups(raw: Option<Value>) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
