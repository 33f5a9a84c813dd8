//! Knowledge base document management
//!
//! - [`types`]: documents and upload candidates
//! - [`backend`]: the raw document endpoints behind [`RagBackend`]
//! - [`store`]: [`KnowledgeStore`], the sequenced local mirror

pub mod backend;
pub mod store;
pub mod types;

pub use backend::{HttpRagBackend, RagBackend};
pub use store::KnowledgeStore;
pub use types::{mime_from_path, Document, UploadFile, PDF_MIME};
