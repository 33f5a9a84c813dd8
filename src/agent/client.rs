//! Agent client trait and HTTP implementation
//!
//! The [`AgentClient`] trait is the seam between the conversation
//! controller and the external agent endpoint. [`HttpAgentClient`] is the
//! production implementation; tests substitute mocks or scripted fakes.

use crate::agent::response::{normalize_response, NormalizedAnswer};
use crate::config::AgentEndpointConfig;
use crate::error::{ClientResult, KbError};
use crate::transport;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Request/response adapter to the external AI agent
///
/// Implementations issue exactly one request per call and never retry.
/// Every failure is returned as a [`KbError`]; nothing panics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Ask `agent_id` a free-text question
    ///
    /// # Errors
    ///
    /// - [`KbError::Transport`] when the request could not be sent
    /// - [`KbError::Server`] for non-2xx statuses and error payloads
    /// - [`KbError::MalformedResponse`] for unrecognized payloads
    async fn query(&self, text: &str, agent_id: &str) -> ClientResult<NormalizedAnswer>;
}

/// Request body sent to the agent endpoint
#[derive(Debug, Serialize)]
struct AgentRequest<'a> {
    message: &'a str,
    agent_id: &'a str,
}

/// Agent client speaking JSON over HTTP
///
/// # Examples
///
/// ```
/// use kbsearch::agent::HttpAgentClient;
/// use kbsearch::config::AgentEndpointConfig;
///
/// let client = HttpAgentClient::new(&AgentEndpointConfig::default(), reqwest::Client::new());
/// assert!(client.endpoint().ends_with("/api/agent"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAgentClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &AgentEndpointConfig, client: Client) -> Self {
        tracing::debug!("Initialized agent client: endpoint={}", config.query_url());
        Self {
            client,
            endpoint: config.query_url(),
            api_key: config.api_key.clone(),
        }
    }

    /// Full URL queries are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn query(&self, text: &str, agent_id: &str) -> ClientResult<NormalizedAnswer> {
        tracing::debug!(
            agent_id = %agent_id,
            query_len = text.len(),
            "Sending agent query"
        );

        let request = transport::with_api_key(
            self.client.post(&self.endpoint).json(&AgentRequest {
                message: text,
                agent_id,
            }),
            self.api_key.as_deref(),
        );

        let response = request.send().await.map_err(|e| {
            tracing::error!("Agent request failed: {}", e);
            KbError::from(e)
        })?;

        let payload = transport::read_json(response, "Agent").await?;
        let answer = normalize_response(payload)?;

        tracing::debug!(
            sources = answer.sources.len(),
            follow_ups = answer.follow_ups.len(),
            confidence = ?answer.confidence.score(),
            "Agent answered"
        );

        Ok(answer)
    }
}
