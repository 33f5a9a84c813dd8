//! Error types for kbsearch
//!
//! This module defines the error taxonomy used throughout the client,
//! using `thiserror` for ergonomic error handling.
//!
//! Core components (agent client, knowledge store, controllers) return
//! [`ClientResult`] so callers can match on the failure class. Application
//! code (configuration loading, commands) uses the `anyhow`-backed [`Result`].

use thiserror::Error;

/// Main error type for kbsearch operations
///
/// The first five variants form the taxonomy surfaced by the core
/// components; the remaining ones come from local configuration and I/O.
#[derive(Error, Debug)]
pub enum KbError {
    /// Input rejected before any network I/O (bad file type, oversize file)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network unreachable, connection reset, client-side timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status or application-level error status
    #[error("Server error: {message}")]
    Server {
        /// HTTP status code, when the failure came from the HTTP layer
        status: Option<u16>,
        /// Server-supplied message, or a generic one
        message: String,
    },

    /// Payload did not have any of the expected shapes
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A single-flight operation is already running
    #[error("Operation in progress: {0}")]
    Busy(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl KbError {
    /// Build a server error from an HTTP status and an optional message
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Text suitable for showing to an end user in a banner or error turn
    ///
    /// Transport failures use a fixed wording because the underlying
    /// message (socket errors, DNS failures) is not meaningful to users.
    ///
    /// # Examples
    ///
    /// ```
    /// use kbsearch::error::KbError;
    ///
    /// let err = KbError::server(Some(500), "index offline");
    /// assert_eq!(err.user_message(), "index offline");
    ///
    /// let err = KbError::Transport("connection refused".to_string());
    /// assert!(err.user_message().contains("network error"));
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            KbError::Validation(msg) | KbError::Busy(msg) | KbError::MalformedResponse(msg) => {
                msg.clone()
            }
            KbError::Server { message, .. } => message.clone(),
            KbError::Transport(_) => {
                "A network error occurred. Please check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for KbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            KbError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            KbError::server(Some(status.as_u16()), err.to_string())
        } else {
            KbError::Transport(err.to_string())
        }
    }
}

/// Result type for core client operations with a matchable error
pub type ClientResult<T> = std::result::Result<T, KbError>;

/// Result type alias for application-level operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
