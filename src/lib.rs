//! kbsearch - Conversational search over a document knowledge base
//!
//! This library provides the client-side orchestration for a
//! retrieval-augmented question answering service: asking an external
//! agent, mirroring the knowledge base's document list, and uploading and
//! deleting documents while keeping state consistent under failure.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Agent client trait, HTTP implementation and response normalization
//! - `knowledge`: Document store backend and the sequenced `KnowledgeStore`
//! - `conversation`: Message log and the single-query `ConversationController`
//! - `upload`: Validation, drag tracking and the `UploadCoordinator`
//! - `session`: Wires the components together from configuration
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` and `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use kbsearch::{Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let session = Session::from_config(&config)?;
//!     session.refresh_documents().await?;
//!     session
//!         .conversation
//!         .submit_text("What is the refund policy?")
//!         .await;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod session;
pub mod transport;
pub mod upload;

// Re-export commonly used types
pub use agent::{AgentClient, Confidence, HttpAgentClient, NormalizedAnswer, Source};
pub use config::Config;
pub use conversation::{ConversationController, Message, Role};
pub use error::{ClientResult, KbError, Result};
pub use knowledge::{Document, KnowledgeStore, UploadFile};
pub use session::Session;
pub use upload::{UploadCoordinator, UploadState};

#[cfg(test)]
pub mod test_utils;
