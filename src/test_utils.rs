//! Test utilities for kbsearch
//!
//! In-process fakes for the agent and document store seams, plus small
//! assertion helpers. Fakes record call counts and can hold a call open
//! until the test releases it, which is how single-flight and ordering
//! behavior is exercised without a network.

use crate::agent::{AgentClient, NormalizedAnswer};
use crate::error::{ClientResult, KbError};
use crate::knowledge::{Document, RagBackend, UploadFile};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T, KbError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A PDF upload candidate of the given size
pub fn pdf_file(name: &str, size: usize) -> UploadFile {
    let mut content = b"%PDF-1.4\n".to_vec();
    content.resize(size.max(content.len()), b' ');
    UploadFile::new(name, "application/pdf", content)
}

/// Document store fake backed by in-memory lists
///
/// Uploads add a document server-side, deletes remove them, and each
/// operation can be made to fail once or to wait for a release signal.
#[derive(Default)]
pub struct FakeRagBackend {
    libraries: Mutex<HashMap<String, Vec<Document>>>,
    list_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    list_failures: Mutex<VecDeque<KbError>>,
    upload_failures: Mutex<VecDeque<KbError>>,
    delete_failures: Mutex<VecDeque<KbError>>,
    list_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
    upload_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl FakeRagBackend {
    /// Create a fake whose `kb_id` already holds `documents`
    pub fn with_documents(kb_id: &str, documents: Vec<Document>) -> Self {
        let fake = Self::default();
        fake.set_documents(kb_id, documents);
        fake
    }

    /// Replace the server-side list for `kb_id`
    pub fn set_documents(&self, kb_id: &str, documents: Vec<Document>) {
        self.libraries
            .lock()
            .unwrap()
            .insert(kb_id.to_string(), documents);
    }

    /// Server-side list for `kb_id`
    pub fn server_documents(&self, kb_id: &str) -> Vec<Document> {
        self.libraries
            .lock()
            .unwrap()
            .get(kb_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_list(&self, error: KbError) {
        self.list_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_next_upload(&self, error: KbError) {
        self.upload_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_next_delete(&self, error: KbError) {
        self.delete_failures.lock().unwrap().push_back(error);
    }

    /// Make the next list call wait until the returned sender fires
    pub fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.list_holds.lock().unwrap().push_back(rx);
        tx
    }

    /// Make the next upload call wait until the returned sender fires
    pub fn hold_next_upload(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.upload_holds.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl RagBackend for FakeRagBackend {
    async fn list_documents(&self, kb_id: &str) -> ClientResult<Vec<Document>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.list_holds.lock().unwrap().pop_front();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        if let Some(error) = self.list_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self.server_documents(kb_id))
    }

    async fn upload_document(&self, kb_id: &str, file: &UploadFile) -> ClientResult<()> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.upload_holds.lock().unwrap().pop_front();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        if let Some(error) = self.upload_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        let mut libraries = self.libraries.lock().unwrap();
        let documents = libraries.entry(kb_id.to_string()).or_default();
        documents.retain(|doc| doc.file_name != file.file_name);
        documents.push(Document::new(file.file_name.clone()));
        Ok(())
    }

    async fn delete_documents(&self, kb_id: &str, file_names: &[String]) -> ClientResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.delete_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        if let Some(documents) = self.libraries.lock().unwrap().get_mut(kb_id) {
            documents.retain(|doc| !file_names.contains(&doc.file_name));
        }
        Ok(())
    }
}

/// Backend whose list responses are supplied one by one by the test
///
/// Each list call takes the next queued receiver in call order, so a test
/// can complete overlapping fetches in any order it likes.
#[derive(Default)]
pub struct ScriptedListBackend {
    responses: Mutex<VecDeque<oneshot::Receiver<ClientResult<Vec<Document>>>>>,
    delete_holds: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl ScriptedListBackend {
    /// Queue a response slot for the next list call
    pub fn push_response(&self) -> oneshot::Sender<ClientResult<Vec<Document>>> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().unwrap().push_back(rx);
        tx
    }

    /// Make the next delete call wait until the returned sender fires
    pub fn hold_next_delete(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.delete_holds.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl RagBackend for ScriptedListBackend {
    async fn list_documents(&self, _kb_id: &str) -> ClientResult<Vec<Document>> {
        let slot = self.responses.lock().unwrap().pop_front();
        match slot {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(KbError::Transport("response dropped".to_string()))),
            None => Err(KbError::Transport("no scripted response".to_string())),
        }
    }

    async fn upload_document(&self, _kb_id: &str, _file: &UploadFile) -> ClientResult<()> {
        Ok(())
    }

    async fn delete_documents(&self, _kb_id: &str, _file_names: &[String]) -> ClientResult<()> {
        let hold = self.delete_holds.lock().unwrap().pop_front();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        Ok(())
    }
}

/// Agent fake whose answers are supplied one by one by the test
#[derive(Default)]
pub struct ScriptedAgent {
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<oneshot::Receiver<ClientResult<NormalizedAnswer>>>>,
}

impl ScriptedAgent {
    /// Queue a response slot for the next query
    pub fn push_response(&self) -> oneshot::Sender<ClientResult<NormalizedAnswer>> {
        let (tx, rx) = oneshot::channel();
        self.responses.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Query texts received so far
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn query(&self, text: &str, _agent_id: &str) -> ClientResult<NormalizedAnswer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(text.to_string());
        let slot = self.responses.lock().unwrap().pop_front();
        match slot {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(KbError::Transport("response dropped".to_string()))),
            None => Err(KbError::Transport("no scripted response".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<(), KbError> = Err(KbError::Config("test error message".to_string()));
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<(), KbError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_pdf_file_size() {
        let file = pdf_file("a.pdf", 2 * 1024 * 1024);
        assert_eq!(file.size, 2 * 1024 * 1024);
        assert!(file.is_pdf());
    }

    #[tokio::test]
    async fn test_fake_backend_upload_then_list() {
        let backend = FakeRagBackend::default();
        backend
            .upload_document("kb", &pdf_file("a.pdf", 16))
            .await
            .unwrap();
        assert_eq!(
            backend.list_documents("kb").await.unwrap(),
            vec![Document::new("a.pdf")]
        );
        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(backend.list_calls(), 1);
    }
}
