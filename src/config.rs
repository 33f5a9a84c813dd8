//! Configuration management for kbsearch
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Agent and knowledge-base identifiers live here rather than in the
//! controllers so one process can talk to several independent knowledge
//! bases.

use crate::error::{KbError, Result};
use crate::upload::MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for kbsearch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External AI agent endpoint settings
    #[serde(default)]
    pub agent: AgentEndpointConfig,
    /// External RAG document store settings
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    /// Upload validation policy
    #[serde(default)]
    pub upload: UploadConfig,
    /// Shared HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Demo script runner settings
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Agent query endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEndpointConfig {
    /// Base URL of the service hosting the agent endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the query endpoint, appended to `base_url`
    #[serde(default = "default_query_path")]
    pub query_path: String,

    /// Identifier of the agent that answers queries
    #[serde(default = "default_agent_id")]
    pub agent_id: String,

    /// Optional API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_query_path() -> String {
    "/api/agent".to_string()
}

fn default_agent_id() -> String {
    "default-agent".to_string()
}

impl Default for AgentEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            query_path: default_query_path(),
            agent_id: default_agent_id(),
            api_key: None,
        }
    }
}

impl AgentEndpointConfig {
    /// Full URL of the query endpoint
    pub fn query_url(&self) -> String {
        join_url(&self.base_url, &self.query_path)
    }
}

/// Knowledge base (document store) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Base URL of the service hosting the document endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path used for listing (GET) and deleting (DELETE) documents
    #[serde(default = "default_documents_path")]
    pub documents_path: String,

    /// Path used for uploading documents
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Identifier of the knowledge base the session works against
    #[serde(default = "default_rag_id")]
    pub rag_id: String,

    /// Optional API key sent as `x-api-key`
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_documents_path() -> String {
    "/api/rag".to_string()
}

fn default_upload_path() -> String {
    "/api/rag/upload".to_string()
}

fn default_rag_id() -> String {
    "default-kb".to_string()
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            documents_path: default_documents_path(),
            upload_path: default_upload_path(),
            rag_id: default_rag_id(),
            api_key: None,
        }
    }
}

impl KnowledgeBaseConfig {
    /// Full URL of the list/delete endpoint
    pub fn documents_url(&self) -> String {
        join_url(&self.base_url, &self.documents_path)
    }

    /// Full URL of the upload endpoint
    pub fn upload_url(&self) -> String {
        join_url(&self.base_url, &self.upload_path)
    }
}

/// Upload validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

fn default_max_file_size() -> u64 {
    MAX_UPLOAD_BYTES
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
        }
    }
}

/// HTTP client configuration shared by all endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; `None` leaves timing to the remote service
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,

    /// User agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    concat!("kbsearch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client from these settings
    pub fn build_client(&self) -> std::result::Result<reqwest::Client, KbError> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.clone());
        if let Some(secs) = self.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder
            .build()
            .map_err(|e| KbError::Config(format!("Failed to create HTTP client: {}", e)))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,

    /// Optional file that receives a copy of the log output
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "kbsearch=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

/// Demo script runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Interpreter used to run the script
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Script path, relative to the working directory
    #[serde(default = "default_script")]
    pub script: String,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_script() -> String {
    "hello_world.py".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            script: default_script(),
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| KbError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| KbError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("KBSEARCH_AGENT_URL") {
            self.agent.base_url = url;
        }

        if let Ok(agent_id) = std::env::var("KBSEARCH_AGENT_ID") {
            self.agent.agent_id = agent_id;
        }

        if let Ok(url) = std::env::var("KBSEARCH_KB_URL") {
            self.knowledge_base.base_url = url;
        }

        if let Ok(rag_id) = std::env::var("KBSEARCH_KB_ID") {
            self.knowledge_base.rag_id = rag_id;
        }

        if let Ok(key) = std::env::var("KBSEARCH_API_KEY") {
            self.agent.api_key = Some(key.clone());
            self.knowledge_base.api_key = Some(key);
        }

        if let Ok(max) = std::env::var("KBSEARCH_MAX_UPLOAD_BYTES") {
            if let Ok(value) = max.parse() {
                self.upload.max_file_size_bytes = value;
            } else {
                tracing::warn!("Invalid KBSEARCH_MAX_UPLOAD_BYTES: {}", max);
            }
        }

        if let Ok(level) = std::env::var("KBSEARCH_LOG_LEVEL") {
            tracing::debug!(level = %level, "Env override: KBSEARCH_LOG_LEVEL");
            self.logging.level = level;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(agent_id) = &cli.agent_id {
            self.agent.agent_id = agent_id.clone();
        }
        if let Some(kb_id) = &cli.kb_id {
            self.knowledge_base.rag_id = kb_id.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.agent.agent_id.trim().is_empty() {
            return Err(KbError::Config("agent.agent_id cannot be empty".to_string()).into());
        }

        if self.knowledge_base.rag_id.trim().is_empty() {
            return Err(
                KbError::Config("knowledge_base.rag_id cannot be empty".to_string()).into(),
            );
        }

        for (name, value) in [
            ("agent.base_url", &self.agent.base_url),
            ("knowledge_base.base_url", &self.knowledge_base.base_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                KbError::Config(format!("{} is not a valid URL ({}): {}", name, value, e))
            })?;
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(KbError::Config(
                "upload.max_file_size_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.upload.max_file_size_bytes > MAX_UPLOAD_BYTES {
            return Err(KbError::Config(format!(
                "upload.max_file_size_bytes must be less than or equal to {}",
                MAX_UPLOAD_BYTES
            ))
            .into());
        }

        if self.http.request_timeout_seconds == Some(0) {
            return Err(KbError::Config(
                "http.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
