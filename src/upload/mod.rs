//! Upload module for kbsearch
//!
//! Validation rules, the drag-and-drop depth tracker and the coordinator
//! that runs one upload at a time against a [`crate::knowledge::KnowledgeStore`].

pub mod coordinator;
pub mod drag;

pub use coordinator::{UploadCoordinator, UploadOutcome};
pub use drag::DragTracker;

use crate::error::{ClientResult, KbError};
use crate::knowledge::UploadFile;

/// Largest file the ingestion endpoint accepts (50 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Progress of the coordinator's single upload slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    /// Checking type and size; no I/O yet
    Validating,
    /// Bytes are being sent for the named file
    Uploading(String),
    /// Accepted, and the document list has been refreshed
    Succeeded,
    /// Rejected or failed, with the user-facing reason
    Failed(String),
}

impl UploadState {
    /// Whether an upload currently occupies the slot
    pub fn is_active(&self) -> bool {
        matches!(self, UploadState::Validating | UploadState::Uploading(_))
    }

    /// Name of the file being uploaded, if any
    pub fn uploading_file(&self) -> Option<&str> {
        match self {
            UploadState::Uploading(name) => Some(name),
            _ => None,
        }
    }
}

/// Check a candidate file before any network I/O
///
/// Only the declared MIME type and size are inspected, so a file read with
/// metadata only can be validated before its contents are loaded.
///
/// # Errors
///
/// Returns [`KbError::Validation`] with the user-facing reason.
///
/// # Examples
///
/// ```
/// use kbsearch::knowledge::UploadFile;
/// use kbsearch::upload::{validate, MAX_UPLOAD_BYTES};
///
/// let pdf = UploadFile::new("a.pdf", "application/pdf", b"%PDF".to_vec());
/// assert!(validate(&pdf, MAX_UPLOAD_BYTES).is_ok());
///
/// let text = UploadFile::new("a.txt", "text/plain", b"hi".to_vec());
/// assert!(validate(&text, MAX_UPLOAD_BYTES).is_err());
/// ```
pub fn validate(file: &UploadFile, max_bytes: u64) -> ClientResult<()> {
    if !file.is_pdf() {
        return Err(KbError::Validation(
            "Only PDF files are supported".to_string(),
        ));
    }
    if file.size > max_bytes {
        return Err(KbError::Validation(format!(
            "File size must be under {}",
            describe_limit(max_bytes)
        )));
    }
    Ok(())
}

/// Human-readable size limit, in MB when it is a whole number of MiB
pub fn describe_limit(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}
