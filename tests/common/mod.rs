use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config pointing both services at one mock server
#[allow(dead_code)]
pub fn config_yaml(base_url: &str) -> String {
    format!(
        r#"
agent:
  base_url: {base_url}
  agent_id: agent-test
knowledge_base:
  base_url: {base_url}
  rag_id: kb-test
"#
    )
}

/// Agent envelope answering the refund question
#[allow(dead_code)]
pub fn refund_response() -> Value {
    json!({
        "status": "success",
        "result": {
            "answer": "Refunds are allowed within 30 days.",
            "sources": [
                {"document": "policy.pdf", "page": 2, "content": "Refunds within 30 days of purchase."}
            ],
            "confidence": 0.92,
            "follow_up_suggestions": ["How do I request a refund?"]
        }
    })
}

/// A PDF-looking payload of `size` bytes
#[allow(dead_code)]
pub fn pdf_bytes(size: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(size, b' ');
    bytes
}
