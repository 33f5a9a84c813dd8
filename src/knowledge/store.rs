//! Knowledge store: the local mirror of each knowledge base's document list
//!
//! The store owns one [`Library`] per knowledge-base identifier and is the
//! only place those lists change. Every operation takes the identifier
//! explicitly, so several knowledge bases can be mirrored side by side.
//!
//! # Sequencing
//!
//! Each fetch takes a ticket from a per-library counter when it starts.
//! When it completes, its result is applied only if its ticket is newer
//! than the last applied one; otherwise it is stale and discarded. A
//! successful delete advances the applied ticket to the newest one issued
//! before the delete was sent, so fetches that started earlier cannot
//! resurrect the deleted documents while fetches started later still apply.

use crate::error::ClientResult;
use crate::knowledge::backend::RagBackend;
use crate::knowledge::types::{Document, UploadFile};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Library {
    documents: Vec<Document>,
    loaded: bool,
    issued: u64,
    applied: u64,
    in_flight: usize,
    last_error: Option<String>,
}

/// Stateful client mirroring the document lists of knowledge bases
pub struct KnowledgeStore {
    backend: Arc<dyn RagBackend>,
    libraries: Mutex<HashMap<String, Library>>,
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter however the fetch future ends
struct InFlight<'a> {
    store: &'a KnowledgeStore,
    kb_id: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut libraries = self.store.libraries();
        if let Some(library) = libraries.get_mut(self.kb_id) {
            library.in_flight = library.in_flight.saturating_sub(1);
        }
    }
}

impl KnowledgeStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn RagBackend>) -> Self {
        Self {
            backend,
            libraries: Mutex::new(HashMap::new()),
        }
    }

    fn libraries(&self) -> MutexGuard<'_, HashMap<String, Library>> {
        self.libraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the local list for `kb_id` with the server's current view
    ///
    /// Safe to call repeatedly and concurrently. Returns the mirrored list
    /// as it stands once this fetch has completed, which is the newer list
    /// when this response turned out to be stale.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the error is also surfaced through
    /// [`KnowledgeStore::last_error`] unless a newer result already landed.
    pub async fn fetch(&self, kb_id: &str) -> ClientResult<Vec<Document>> {
        let ticket = {
            let mut libraries = self.libraries();
            let library = libraries.entry(kb_id.to_string()).or_default();
            library.issued += 1;
            library.in_flight += 1;
            library.issued
        };
        let _in_flight = InFlight {
            store: self,
            kb_id,
        };

        let result = self.backend.list_documents(kb_id).await;

        let mut libraries = self.libraries();
        let library = libraries.entry(kb_id.to_string()).or_default();
        let fresh = ticket > library.applied;

        match result {
            Ok(documents) if fresh => {
                tracing::debug!(
                    kb_id = %kb_id,
                    ticket,
                    count = documents.len(),
                    "Applied document list"
                );
                library.documents = documents;
                library.applied = ticket;
                library.loaded = true;
                library.last_error = None;
                Ok(library.documents.clone())
            }
            Ok(_) => {
                tracing::debug!(
                    kb_id = %kb_id,
                    ticket,
                    applied = library.applied,
                    "Discarded stale document list"
                );
                Ok(library.documents.clone())
            }
            Err(e) => {
                tracing::warn!(kb_id = %kb_id, "Failed to fetch documents: {}", e);
                if fresh {
                    library.last_error = Some(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Send a file to the ingestion endpoint
    ///
    /// The caller validates the file first. Success only means the upload
    /// was accepted; call [`KnowledgeStore::fetch`] to see the result of
    /// indexing.
    ///
    /// # Errors
    ///
    /// Returns the backend error, also surfaced through `last_error`.
    pub async fn upload(&self, kb_id: &str, file: &UploadFile) -> ClientResult<()> {
        match self.backend.upload_document(kb_id, file).await {
            Ok(()) => {
                tracing::info!(
                    kb_id = %kb_id,
                    file_name = %file.file_name,
                    "Upload accepted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(file_name = %file.file_name, "Upload failed: {}", e);
                self.set_error(kb_id, e.user_message());
                Err(e)
            }
        }
    }

    /// Delete documents by name
    ///
    /// On success the names are dropped from the local list. On failure the
    /// local list is left alone and the server state is unknown; callers
    /// should [`fetch`](KnowledgeStore::fetch) to reconcile.
    ///
    /// # Errors
    ///
    /// Returns the backend error, also surfaced through `last_error`.
    pub async fn remove(&self, kb_id: &str, file_names: &[String]) -> ClientResult<()> {
        if file_names.is_empty() {
            return Ok(());
        }

        let issued_before = self
            .libraries()
            .entry(kb_id.to_string())
            .or_default()
            .issued;

        match self.backend.delete_documents(kb_id, file_names).await {
            Ok(()) => {
                let mut libraries = self.libraries();
                let library = libraries.entry(kb_id.to_string()).or_default();
                library
                    .documents
                    .retain(|doc| !file_names.contains(&doc.file_name));
                library.applied = library.applied.max(issued_before);
                library.last_error = None;
                tracing::info!(
                    kb_id = %kb_id,
                    removed = file_names.len(),
                    remaining = library.documents.len(),
                    "Documents deleted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kb_id = %kb_id, "Delete failed: {}", e);
                self.set_error(kb_id, e.user_message());
                Err(e)
            }
        }
    }

    /// Snapshot of the mirrored list for `kb_id`
    pub fn documents(&self, kb_id: &str) -> Vec<Document> {
        self.libraries()
            .get(kb_id)
            .map(|library| library.documents.clone())
            .unwrap_or_default()
    }

    /// Whether at least one fetch has been applied for `kb_id`
    pub fn is_loaded(&self, kb_id: &str) -> bool {
        self.libraries()
            .get(kb_id)
            .map_or(false, |library| library.loaded)
    }

    /// Whether a fetch for `kb_id` is in flight
    pub fn is_loading(&self, kb_id: &str) -> bool {
        self.libraries()
            .get(kb_id)
            .map_or(false, |library| library.in_flight > 0)
    }

    /// Most recent surfaced error for `kb_id`
    pub fn last_error(&self, kb_id: &str) -> Option<String> {
        self.libraries()
            .get(kb_id)
            .and_then(|library| library.last_error.clone())
    }

    /// Clear the surfaced error for `kb_id`
    pub fn dismiss_error(&self, kb_id: &str) {
        if let Some(library) = self.libraries().get_mut(kb_id) {
            library.last_error = None;
        }
    }

    /// Surface `message` as the banner for `kb_id`
    pub(crate) fn set_error(&self, kb_id: &str, message: String) {
        self.libraries()
            .entry(kb_id.to_string())
            .or_default()
            .last_error = Some(message);
    }
}
