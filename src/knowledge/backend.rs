//! Document store backend trait and HTTP implementation
//!
//! [`RagBackend`] is the transport seam under the knowledge store. It is
//! stateless: mirroring, sequencing and error surfacing live in
//! [`crate::knowledge::KnowledgeStore`].

use crate::config::KnowledgeBaseConfig;
use crate::error::{ClientResult, KbError};
use crate::knowledge::types::{Document, UploadFile};
use crate::transport;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Serialize;
use serde_json::Value;

/// Raw access to the external document endpoints
#[async_trait]
pub trait RagBackend: Send + Sync {
    /// List every document in `kb_id`
    async fn list_documents(&self, kb_id: &str) -> ClientResult<Vec<Document>>;

    /// Send a file for ingestion into `kb_id`
    ///
    /// Success means the upload was accepted; indexing finishes later.
    async fn upload_document(&self, kb_id: &str, file: &UploadFile) -> ClientResult<()>;

    /// Delete documents by file name
    ///
    /// A failure says nothing about which names were deleted.
    async fn delete_documents(&self, kb_id: &str, file_names: &[String]) -> ClientResult<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    rag_id: &'a str,
    document_names: &'a [String],
}

/// Document store backend speaking JSON and multipart over HTTP
#[derive(Debug, Clone)]
pub struct HttpRagBackend {
    client: Client,
    documents_url: String,
    upload_url: String,
    api_key: Option<String>,
}

impl HttpRagBackend {
    /// Create a backend for the configured endpoints
    pub fn new(config: &KnowledgeBaseConfig, client: Client) -> Self {
        tracing::debug!(
            "Initialized RAG backend: documents={}, upload={}",
            config.documents_url(),
            config.upload_url()
        );
        Self {
            client,
            documents_url: config.documents_url(),
            upload_url: config.upload_url(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl RagBackend for HttpRagBackend {
    async fn list_documents(&self, kb_id: &str) -> ClientResult<Vec<Document>> {
        tracing::debug!(kb_id = %kb_id, "Listing documents");

        let request = transport::with_api_key(
            self.client
                .get(&self.documents_url)
                .query(&[("ragId", kb_id)]),
            self.api_key.as_deref(),
        );
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Document listing request failed: {}", e);
            KbError::from(e)
        })?;

        let payload = transport::read_json(response, "Document listing").await?;
        transport::ensure_success(&payload, "Failed to fetch documents")?;
        parse_document_list(payload)
    }

    async fn upload_document(&self, kb_id: &str, file: &UploadFile) -> ClientResult<()> {
        tracing::debug!(
            kb_id = %kb_id,
            file_name = %file.file_name,
            size = file.size,
            "Uploading document"
        );

        let body = Body::from(file.content.clone());
        let part = Part::stream_with_length(body, file.content.len() as u64)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                KbError::Validation(format!("Invalid MIME type {}: {}", file.mime_type, e))
            })?;
        let form = Form::new().text("ragId", kb_id.to_string()).part("file", part);

        let request = transport::with_api_key(
            self.client.post(&self.upload_url).multipart(form),
            self.api_key.as_deref(),
        );
        let response = request.send().await.map_err(|e| {
            tracing::error!("Upload request failed: {}", e);
            KbError::from(e)
        })?;

        let payload = transport::read_json(response, "Upload").await?;
        transport::ensure_success(&payload, "Upload failed")
    }

    async fn delete_documents(&self, kb_id: &str, file_names: &[String]) -> ClientResult<()> {
        tracing::debug!(kb_id = %kb_id, count = file_names.len(), "Deleting documents");

        let request = transport::with_api_key(
            self.client.delete(&self.documents_url).json(&DeleteRequest {
                rag_id: kb_id,
                document_names: file_names,
            }),
            self.api_key.as_deref(),
        );
        let response = request.send().await.map_err(|e| {
            tracing::error!("Delete request failed: {}", e);
            KbError::from(e)
        })?;

        let payload = transport::read_json(response, "Delete").await?;
        transport::ensure_success(&payload, "Delete failed")
    }
}

/// Parse a listing payload: a bare array or an envelope holding one
fn parse_document_list(payload: Value) -> ClientResult<Vec<Document>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("documents").or_else(|| map.remove("data")) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) => Vec::new(),
            _ => {
                return Err(KbError::MalformedResponse(
                    "Document listing has no documents array".to_string(),
                ))
            }
        },
        _ => {
            return Err(KbError::MalformedResponse(
                "Document listing is not an array".to_string(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Document>(item) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Skipping unreadable document entry: {}", e);
                None
            }
        })
        .collect())
}
