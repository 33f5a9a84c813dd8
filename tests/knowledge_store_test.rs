//! Knowledge store integration tests
//!
//! Runs `HttpRagBackend` and `KnowledgeStore` against a `wiremock` server
//! covering the listing shapes, multipart upload, JSON delete and the
//! `{ success: false }` error envelope.

use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{
    body_json, body_string_contains, header, header_exists, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kbsearch::config::KnowledgeBaseConfig;
use kbsearch::knowledge::{Document, HttpRagBackend, KnowledgeStore, RagBackend, UploadFile};
use kbsearch::KbError;

mod common;

fn store_for(base_url: &str) -> KnowledgeStore {
    let config = KnowledgeBaseConfig {
        base_url: base_url.to_string(),
        ..KnowledgeBaseConfig::default()
    };
    KnowledgeStore::new(Arc::new(HttpRagBackend::new(
        &config,
        reqwest::Client::new(),
    )))
}

#[tokio::test]
async fn test_list_bare_array() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/rag"))
        .and(query_param("ragId", "kb-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"fileName": "a.pdf", "chunkCount": 12},
            {"fileName": "b.pdf"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server.uri());
    let documents = store.fetch("kb-1").await.unwrap();
    assert_eq!(
        documents,
        vec![Document::new("a.pdf").with_chunks(12), Document::new("b.pdf")]
    );
    assert!(store.is_loaded("kb-1"));
}

#[tokio::test]
async fn test_list_envelope_with_document_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "documents": [{"fileName": "a.pdf", "documentCount": 3}]
        })))
        .mount(&server)
        .await;

    let documents = store_for(&server.uri()).fetch("kb-1").await.unwrap();
    assert_eq!(documents, vec![Document::new("a.pdf").with_chunks(3)]);
}

#[tokio::test]
async fn test_success_false_is_server_error_even_on_200() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "Unknown ragId"})),
        )
        .mount(&server)
        .await;

    let store = store_for(&server.uri());
    let err = store.fetch("kb-1").await.unwrap_err();
    assert!(matches!(err, KbError::Server { .. }));
    assert_eq!(store.last_error("kb-1").as_deref(), Some("Unknown ragId"));
}

#[tokio::test]
async fn test_upload_sends_multipart_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/rag/upload"))
        .and(header("x-api-key", "secret"))
        .and(body_string_contains("name=\"ragId\""))
        .and(body_string_contains("kb-1"))
        .and(body_string_contains("filename=\"contract.pdf\""))
        .and(body_string_contains("application/pdf"))
        .and(body_string_contains("%PDF-1.4"))
        .and(header_exists("content-length"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = KnowledgeBaseConfig {
        base_url: server.uri(),
        api_key: Some("secret".to_string()),
        ..KnowledgeBaseConfig::default()
    };
    let backend = HttpRagBackend::new(&config, reqwest::Client::new());
    let file = UploadFile::new("contract.pdf", "application/pdf", common::pdf_bytes(64));
    backend.upload_document("kb-1", &file).await.unwrap();
}

#[tokio::test]
async fn test_upload_rejection_message_surfaces() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/rag/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "Duplicate document"})),
        )
        .mount(&server)
        .await;

    let store = store_for(&server.uri());
    let file = UploadFile::new("a.pdf", "application/pdf", common::pdf_bytes(16));
    let err = store.upload("kb-1", &file).await.unwrap_err();
    assert_eq!(err.user_message(), "Duplicate document");
    assert_eq!(store.last_error("kb-1").as_deref(), Some("Duplicate document"));
}

#[tokio::test]
async fn test_delete_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/rag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"fileName": "a.pdf"}, {"fileName": "b.pdf"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/rag"))
        .and(body_json(json!({"ragId": "kb-1", "documentNames": ["a.pdf"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server.uri());
    store.fetch("kb-1").await.unwrap();
    store.remove("kb-1", &["a.pdf".to_string()]).await.unwrap();
    assert_eq!(store.documents("kb-1"), vec![Document::new("b.pdf")]);
}

#[tokio::test]
async fn test_delete_http_failure_keeps_local_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"fileName": "a.pdf"}])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_for(&server.uri());
    store.fetch("kb-1").await.unwrap();
    let err = store
        .remove("kb-1", &["a.pdf".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, KbError::Server { status: Some(500), .. }));
    assert_eq!(store.documents("kb-1"), vec![Document::new("a.pdf")]);
    assert!(store.last_error("kb-1").is_some());
}
