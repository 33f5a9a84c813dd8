use crate::agent::{Confidence, NormalizedAnswer, Source};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One turn in the conversation log
///
/// Messages are created once and never mutated after they are appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Time-ordered unique identifier
    pub id: String,
    pub role: Role,
    /// Display text
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Cited passages, agent turns only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub confidence: Confidence,
    /// Suggested next questions, agent turns only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<String>,
    /// Marks a turn explaining a failed query
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            confidence: Confidence::Unknown,
            follow_ups: Vec::new(),
            is_error: false,
        }
    }

    /// Create a user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use kbsearch::conversation::{Message, Role};
    ///
    /// let msg = Message::user("What is the refund policy?");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.sources.is_empty());
    /// assert!(!msg.is_error);
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an agent turn from a normalized answer
    pub fn agent(answer: NormalizedAnswer) -> Self {
        let mut msg = Self::new(Role::Agent, answer.answer);
        msg.sources = answer.sources;
        msg.confidence = answer.confidence;
        msg.follow_ups = answer.follow_ups;
        msg
    }

    /// Create an agent turn explaining a failure
    pub fn agent_error(content: impl Into<String>) -> Self {
        let mut msg = Self::new(Role::Agent, content);
        msg.is_error = true;
        msg
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Whether the sources section should be shown
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}
