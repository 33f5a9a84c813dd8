//! Upload coordinator: one validated upload at a time, then a refresh
//!
//! A submission moves the slot through `Validating`, `Uploading` and then
//! `Succeeded` or `Failed`. On success the coordinator runs exactly one
//! [`KnowledgeStore::fetch`] while still `Uploading`, so the document list
//! is current by the time the indicator clears.

use crate::error::{ClientResult, KbError};
use crate::knowledge::{Document, KnowledgeStore, UploadFile};
use crate::upload::drag::DragTracker;
use crate::upload::{validate, UploadState};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of an accepted upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub file_name: String,
    /// Whether the follow-up document refresh succeeded
    pub refreshed: bool,
    /// Mirrored document list after the refresh
    pub documents: Vec<Document>,
}

#[derive(Debug, Default)]
struct Slot {
    state: UploadState,
    drag: DragTracker,
    last_error: Option<String>,
}

/// Runs the ingestion pipeline for one knowledge base
#[derive(Debug)]
pub struct UploadCoordinator {
    store: Arc<KnowledgeStore>,
    kb_id: String,
    max_file_size: u64,
    slot: Mutex<Slot>,
}

/// Frees the slot if the upload future is dropped mid-flight
struct ActiveUpload<'a> {
    coordinator: &'a UploadCoordinator,
}

impl Drop for ActiveUpload<'_> {
    fn drop(&mut self) {
        let mut slot = self.coordinator.slot();
        if slot.state.is_active() {
            tracing::debug!("Upload abandoned, releasing slot");
            slot.state = UploadState::Idle;
        }
    }
}

impl UploadCoordinator {
    /// Create a coordinator uploading into `kb_id`
    pub fn new(store: Arc<KnowledgeStore>, kb_id: impl Into<String>, max_file_size: u64) -> Self {
        Self {
            store,
            kb_id: kb_id.into(),
            max_file_size,
            slot: Mutex::new(Slot::default()),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kb_id(&self) -> &str {
        &self.kb_id
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate and upload `file`, then refresh the document list
    ///
    /// # Errors
    ///
    /// - [`KbError::Busy`] if another upload occupies the slot
    /// - [`KbError::Validation`] for a non-PDF or oversize file; nothing is sent
    /// - the store's error if the upload itself fails; no refresh runs
    ///
    /// A failed refresh after an accepted upload is not an error; it is
    /// reported through [`UploadOutcome::refreshed`].
    pub async fn submit(&self, file: UploadFile) -> ClientResult<UploadOutcome> {
        self.claim()?;
        self.check(&file)?;
        self.run(file).await
    }

    /// Validate and upload the file at `path`
    ///
    /// Type and size are checked from file metadata before the contents are
    /// read, so an oversize file is never loaded into memory. Rejections and
    /// unreadable files land in the slot state like any other failure.
    ///
    /// # Errors
    ///
    /// As [`UploadCoordinator::submit`], plus [`KbError::Io`] when the file
    /// cannot be inspected or read.
    pub async fn submit_path(&self, path: &Path) -> ClientResult<UploadOutcome> {
        self.claim()?;
        let _active = ActiveUpload { coordinator: self };

        let header = UploadFile::from_path(path, false)
            .await
            .map_err(|e| self.fail(e))?;
        self.check(&header)?;
        let file = UploadFile::from_path(path, true)
            .await
            .map_err(|e| self.fail(e))?;
        self.run(file).await
    }

    /// Take the slot, moving it to `Validating`
    fn claim(&self) -> ClientResult<()> {
        let mut slot = self.slot();
        if let Some(current) = slot.state.uploading_file() {
            return Err(KbError::Busy(format!("Already uploading {}", current)));
        }
        if slot.state.is_active() {
            return Err(KbError::Busy("An upload is already in progress".to_string()));
        }
        slot.state = UploadState::Validating;
        Ok(())
    }

    /// Validate a claimed file and move the slot to `Uploading`
    fn check(&self, file: &UploadFile) -> ClientResult<()> {
        if let Err(e) = validate(file, self.max_file_size) {
            tracing::info!(file_name = %file.file_name, "Upload rejected: {}", e);
            return Err(self.fail(e));
        }
        let mut slot = self.slot();
        slot.state = UploadState::Uploading(file.file_name.clone());
        slot.last_error = None;
        Ok(())
    }

    /// Record `error` as the slot's failure and hand it back
    fn fail(&self, error: KbError) -> KbError {
        let reason = error.user_message();
        let mut slot = self.slot();
        slot.state = UploadState::Failed(reason.clone());
        slot.last_error = Some(reason);
        error
    }

    async fn run(&self, file: UploadFile) -> ClientResult<UploadOutcome> {
        let _active = ActiveUpload { coordinator: self };

        if let Err(e) = self.store.upload(&self.kb_id, &file).await {
            return Err(self.fail(e));
        }

        let refreshed = match self.store.fetch(&self.kb_id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Refresh after upload failed: {}", e);
                false
            }
        };

        self.slot().state = UploadState::Succeeded;
        tracing::info!(file_name = %file.file_name, refreshed, "Upload complete");

        Ok(UploadOutcome {
            file_name: file.file_name,
            refreshed,
            documents: self.store.documents(&self.kb_id),
        })
    }

    /// Handle dropped files: reset the drag state and upload the first one
    ///
    /// Returns `None` when nothing was dropped.
    pub async fn drop_files(&self, files: Vec<UploadFile>) -> Option<ClientResult<UploadOutcome>> {
        self.slot().drag.on_drop();
        let file = files.into_iter().next()?;
        Some(self.submit(file).await)
    }

    pub fn drag_enter(&self, has_items: bool) {
        self.slot().drag.on_enter(has_items);
    }

    pub fn drag_leave(&self) {
        self.slot().drag.on_leave();
    }

    pub fn is_dragging(&self) -> bool {
        self.slot().drag.is_dragging()
    }

    pub fn drag_depth(&self) -> u32 {
        self.slot().drag.depth()
    }

    /// Current state of the upload slot
    pub fn state(&self) -> UploadState {
        self.slot().state.clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.slot().state.is_active()
    }

    pub fn last_error(&self) -> Option<String> {
        self.slot().last_error.clone()
    }

    /// Clear the banner; a finished upload's state returns to idle
    pub fn dismiss_error(&self) {
        let mut slot = self.slot();
        slot.last_error = None;
        if let UploadState::Failed(_) = slot.state {
            slot.state = UploadState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_error_contains, pdf_file, FakeRagBackend};
    use crate::upload::MAX_UPLOAD_BYTES;

    fn coordinator(backend: &Arc<FakeRagBackend>) -> UploadCoordinator {
        let store = Arc::new(KnowledgeStore::new(backend.clone()));
        UploadCoordinator::new(store, "kb", MAX_UPLOAD_BYTES)
    }

    #[tokio::test]
    async fn test_non_pdf_never_reaches_ingestion() {
        let backend = Arc::new(FakeRagBackend::default());
        let coordinator = coordinator(&backend);

        let file = UploadFile::new("notes.txt", "text/plain", b"hello".to_vec());
        let err = coordinator.submit(file).await.unwrap_err();
        assert!(matches!(err, KbError::Validation(_)));
        assert_eq!(backend.upload_calls(), 0);
        assert_eq!(backend.list_calls(), 0);
        assert_eq!(
            coordinator.last_error().as_deref(),
            Some("Only PDF files are supported")
        );
    }

    #[tokio::test]
    async fn test_oversize_never_reaches_ingestion() {
        let backend = Arc::new(FakeRagBackend::default());
        let coordinator = coordinator(&backend);

        let mut file = pdf_file("huge.pdf", 16);
        file.size = MAX_UPLOAD_BYTES + 1;
        let err = coordinator.submit(file).await.unwrap_err();
        assert!(matches!(err, KbError::Validation(_)));
        assert_eq!(backend.upload_calls(), 0);
        assert_eq!(
            coordinator.state(),
            UploadState::Failed("File size must be under 50MB".to_string())
        );
    }

    #[tokio::test]
    async fn test_success_refreshes_once_before_clearing() {
        let backend = Arc::new(FakeRagBackend::default());
        let release_list = backend.hold_next_list();
        let coordinator = coordinator(&backend);

        let mut submit = Box::pin(coordinator.submit(pdf_file("contract.pdf", 2 * 1024 * 1024)));
        assert!(futures::poll!(&mut submit).is_pending());
        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(backend.list_calls(), 1);
        assert_eq!(
            coordinator.state(),
            UploadState::Uploading("contract.pdf".to_string())
        );

        release_list.send(()).unwrap();
        let outcome = submit.await.unwrap();
        assert!(outcome.refreshed);
        assert_eq!(outcome.documents, vec![Document::new("contract.pdf")]);
        assert_eq!(backend.list_calls(), 1);
        assert_eq!(coordinator.state(), UploadState::Succeeded);
    }

    #[tokio::test]
    async fn test_second_upload_while_active_is_busy() {
        let backend = Arc::new(FakeRagBackend::default());
        let release = backend.hold_next_upload();
        let coordinator = coordinator(&backend);

        let mut first = Box::pin(coordinator.submit(pdf_file("a.pdf", 32)));
        assert!(futures::poll!(&mut first).is_pending());

        let err = coordinator.submit(pdf_file("b.pdf", 32)).await.unwrap_err();
        assert!(matches!(err, KbError::Busy(_)));
        assert_eq!(backend.upload_calls(), 1);

        release.send(()).unwrap();
        first.await.unwrap();
        assert!(coordinator.submit(pdf_file("b.pdf", 32)).await.is_ok());
        assert_eq!(backend.upload_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_upload_skips_refresh() {
        let backend = Arc::new(FakeRagBackend::default());
        backend.fail_next_upload(KbError::server(Some(500), "Upload failed"));
        let coordinator = coordinator(&backend);

        assert!(coordinator.submit(pdf_file("a.pdf", 32)).await.is_err());
        assert_eq!(backend.list_calls(), 0);
        assert_eq!(coordinator.last_error().as_deref(), Some("Upload failed"));

        coordinator.dismiss_error();
        assert!(coordinator.last_error().is_none());
        assert_eq!(coordinator.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn test_refresh_failure_still_succeeds() {
        let backend = Arc::new(FakeRagBackend::default());
        backend.fail_next_list(KbError::Transport("reset".to_string()));
        let coordinator = coordinator(&backend);

        let outcome = coordinator.submit(pdf_file("a.pdf", 32)).await.unwrap();
        assert!(!outcome.refreshed);
        assert_eq!(coordinator.state(), UploadState::Succeeded);
    }

    #[tokio::test]
    async fn test_cancelled_upload_releases_slot() {
        let backend = Arc::new(FakeRagBackend::default());
        let _release = backend.hold_next_upload();
        let coordinator = coordinator(&backend);

        {
            let mut submit = Box::pin(coordinator.submit(pdf_file("a.pdf", 32)));
            assert!(futures::poll!(&mut submit).is_pending());
            assert!(coordinator.is_uploading());
        }
        assert_eq!(coordinator.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn test_drop_resets_drag_and_uploads_first_file() {
        let backend = Arc::new(FakeRagBackend::default());
        let coordinator = coordinator(&backend);

        coordinator.drag_enter(true);
        coordinator.drag_enter(true);
        coordinator.drag_leave();
        assert!(coordinator.is_dragging());

        let result = coordinator
            .drop_files(vec![pdf_file("a.pdf", 32), pdf_file("b.pdf", 32)])
            .await;
        assert!(result.unwrap().is_ok());
        assert!(!coordinator.is_dragging());
        assert_eq!(coordinator.drag_depth(), 0);
        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(backend.server_documents("kb"), vec![Document::new("a.pdf")]);

        assert!(coordinator.drop_files(Vec::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_submit_path_rejection_updates_slot() {
        let backend = Arc::new(FakeRagBackend::default());
        let coordinator = coordinator(&backend);
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "hello").unwrap();

        coordinator.submit(pdf_file("a.pdf", 32)).await.unwrap();
        assert_eq!(coordinator.state(), UploadState::Succeeded);

        let err = coordinator.submit_path(&notes).await.unwrap_err();
        assert!(matches!(err, KbError::Validation(_)));
        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(
            coordinator.state(),
            UploadState::Failed("Only PDF files are supported".to_string())
        );
        assert_eq!(
            coordinator.last_error().as_deref(),
            Some("Only PDF files are supported")
        );
    }

    #[tokio::test]
    async fn test_submit_path_missing_file_fails_slot() {
        let backend = Arc::new(FakeRagBackend::default());
        let coordinator = coordinator(&backend);
        let dir = tempfile::tempdir().unwrap();

        let result = coordinator
            .submit_path(&dir.path().join("missing.pdf"))
            .await;
        assert_error_contains(result, "IO error");
        assert!(matches!(coordinator.state(), UploadState::Failed(_)));
        assert_eq!(backend.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_path_while_active_is_busy() {
        let backend = Arc::new(FakeRagBackend::default());
        let release = backend.hold_next_upload();
        let coordinator = coordinator(&backend);
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "hello").unwrap();

        let mut first = Box::pin(coordinator.submit(pdf_file("a.pdf", 32)));
        assert!(futures::poll!(&mut first).is_pending());

        let result = coordinator.submit_path(&notes).await;
        assert_error_contains(result, "Operation in progress");
        assert_eq!(
            coordinator.state(),
            UploadState::Uploading("a.pdf".to_string())
        );
        assert!(coordinator.last_error().is_none());

        release.send(()).unwrap();
        first.await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_path_uploads_pdf_contents() {
        let backend = Arc::new(FakeRagBackend::default());
        let coordinator = coordinator(&backend);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();

        let outcome = coordinator.submit_path(&path).await.unwrap();
        assert_eq!(outcome.file_name, "contract.pdf");
        assert_eq!(outcome.documents, vec![Document::new("contract.pdf")]);
        assert_eq!(coordinator.state(), UploadState::Succeeded);
    }
}
