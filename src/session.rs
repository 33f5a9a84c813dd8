//! Session wiring
//!
//! A [`Session`] owns one instance of each component, built from
//! [`Config`] and sharing a single HTTP connection pool.

use crate::agent::{AgentClient, HttpAgentClient};
use crate::config::Config;
use crate::conversation::ConversationController;
use crate::error::ClientResult;
use crate::knowledge::{HttpRagBackend, KnowledgeStore, RagBackend};
use crate::upload::UploadCoordinator;

use std::sync::Arc;

/// The wired-up client components for one agent and knowledge base
#[derive(Debug)]
pub struct Session {
    pub kb_id: String,
    pub store: Arc<KnowledgeStore>,
    pub conversation: ConversationController,
    pub uploads: UploadCoordinator,
}

impl Session {
    /// Build HTTP-backed components from configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::KbError::Config`] if the HTTP client cannot
    /// be constructed.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let http = config.http.build_client()?;
        let agent = Arc::new(HttpAgentClient::new(&config.agent, http.clone()));
        let backend = Arc::new(HttpRagBackend::new(&config.knowledge_base, http));
        Ok(Self::with_parts(config, agent, backend))
    }

    /// Build a session over arbitrary agent and backend implementations
    pub fn with_parts(
        config: &Config,
        agent: Arc<dyn AgentClient>,
        backend: Arc<dyn RagBackend>,
    ) -> Self {
        let kb_id = config.knowledge_base.rag_id.clone();
        let store = Arc::new(KnowledgeStore::new(backend));
        tracing::debug!(
            agent_id = %config.agent.agent_id,
            kb_id = %kb_id,
            "Session created"
        );
        Self {
            conversation: ConversationController::new(agent, config.agent.agent_id.clone()),
            uploads: UploadCoordinator::new(
                store.clone(),
                kb_id.clone(),
                config.upload.max_file_size_bytes,
            ),
            store,
            kb_id,
        }
    }

    /// Fetch the document list for the session's knowledge base
    pub async fn refresh_documents(&self) -> ClientResult<Vec<crate::knowledge::Document>> {
        self.store.fetch(&self.kb_id).await
    }

    /// Delete documents, re-fetching to reconcile if the delete fails
    ///
    /// The delete error is returned and stays surfaced as the banner; the
    /// refresh result is only logged.
    pub async fn remove_documents(&self, file_names: &[String]) -> ClientResult<()> {
        match self.store.remove(&self.kb_id, file_names).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Err(refresh) = self.store.fetch(&self.kb_id).await {
                    tracing::warn!("Reconciling refresh failed: {}", refresh);
                }
                self.store.set_error(&self.kb_id, e.user_message());
                Err(e)
            }
        }
    }

    /// Most recent banner text from either the store or the uploader
    pub fn banner(&self) -> Option<String> {
        self.uploads
            .last_error()
            .or_else(|| self.store.last_error(&self.kb_id))
    }

    /// Clear every document-side banner
    pub fn dismiss_banner(&self) {
        self.uploads.dismiss_error();
        self.store.dismiss_error(&self.kb_id);
    }
}
