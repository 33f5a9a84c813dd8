use crate::error::{ClientResult, KbError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// MIME type accepted by the ingestion pipeline
pub const PDF_MIME: &str = "application/pdf";

/// One ingested file in a knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// File name, unique within a knowledge base
    #[serde(alias = "file_name")]
    pub file_name: String,
    /// Number of indexed chunks, once the service reports it
    #[serde(
        default,
        alias = "documentCount",
        alias = "chunk_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub chunk_count: Option<u64>,
}

impl Document {
    /// Create a document entry
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            chunk_count: None,
        }
    }

    /// Attach a chunk count
    pub fn with_chunks(mut self, chunks: u64) -> Self {
        self.chunk_count = Some(chunks);
        self
    }
}

/// A candidate file for upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Name the document will be stored under
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Size in bytes, as reported by the file source
    pub size: u64,
    /// File contents
    pub content: Bytes,
}

impl UploadFile {
    /// Create an upload candidate from in-memory bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use kbsearch::knowledge::UploadFile;
    ///
    /// let file = UploadFile::new("contract.pdf", "application/pdf", b"%PDF-1.7".to_vec());
    /// assert_eq!(file.size, 8);
    /// assert!(file.is_pdf());
    /// ```
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// Read a local file, inferring the MIME type from its extension
    ///
    /// The size is taken from file metadata before the contents are read,
    /// so oversize files can be rejected by validation without reading them
    /// when `read_contents` is false.
    ///
    /// # Errors
    ///
    /// Returns [`KbError::Io`] if the file cannot be inspected or read, and
    /// [`KbError::Validation`] if the path has no file name.
    pub async fn from_path(path: impl AsRef<Path>, read_contents: bool) -> ClientResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                KbError::Validation(format!("{} does not name a file", path.display()))
            })?;

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(KbError::Validation(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let content = if read_contents {
            Bytes::from(tokio::fs::read(path).await?)
        } else {
            Bytes::new()
        };

        Ok(Self {
            mime_type: mime_from_path(path).to_string(),
            file_name,
            size: metadata.len(),
            content,
        })
    }

    /// Whether the declared MIME type is PDF
    pub fn is_pdf(&self) -> bool {
        self.mime_type
            .split(';')
            .next()
            .map(|m| m.trim().eq_ignore_ascii_case(PDF_MIME))
            .unwrap_or(false)
    }
}

/// Guess a MIME type from a file extension
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_document_deserialize_aliases() {
        let doc: Document =
            serde_json::from_str(r#"{"fileName":"a.pdf","documentCount":3}"#).unwrap();
        assert_eq!(doc, Document::new("a.pdf").with_chunks(3));

        let doc: Document = serde_json::from_str(r#"{"fileName":"b.pdf","chunkCount":9}"#).unwrap();
        assert_eq!(doc.chunk_count, Some(9));

        let doc: Document = serde_json::from_str(r#"{"file_name":"c.pdf"}"#).unwrap();
        assert_eq!(doc.chunk_count, None);
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let json = serde_json::to_value(Document::new("a.pdf").with_chunks(2)).unwrap();
        assert_eq!(json["fileName"], "a.pdf");
        assert_eq!(json["chunkCount"], 2);
    }

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(&PathBuf::from("Report.PDF")), PDF_MIME);
        assert_eq!(mime_from_path(&PathBuf::from("notes.txt")), "text/plain");
        assert_eq!(
            mime_from_path(&PathBuf::from("archive")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_is_pdf_ignores_parameters_and_case() {
        let file = UploadFile::new("a.pdf", "Application/PDF; charset=binary", Vec::new());
        assert!(file.is_pdf());
        let file = UploadFile::new("a.txt", "text/plain", Vec::new());
        assert!(!file.is_pdf());
    }

    #[tokio::test]
    async fn test_from_path_reads_metadata_and_contents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("contract.pdf");
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();

        let file = UploadFile::from_path(&path, true).await.unwrap();
        assert_eq!(file.file_name, "contract.pdf");
        assert_eq!(file.mime_type, PDF_MIME);
        assert_eq!(file.size, 13);
        assert_eq!(&file.content[..], b"%PDF-1.4 test");

        let header_only = UploadFile::from_path(&path, false).await.unwrap();
        assert_eq!(header_only.size, 13);
        assert!(header_only.content.is_empty());
    }

    #[tokio::test]
    async fn test_from_path_missing_file_is_io_error() {
        let err = UploadFile::from_path("/nonexistent/file.pdf", true)
            .await
            .unwrap_err();
        assert!(matches!(err, KbError::Io(_)));
    }

    #[tokio::test]
    async fn test_from_path_directory_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = UploadFile::from_path(dir.path(), true).await.unwrap_err();
        assert!(matches!(err, KbError::Validation(_)));
    }
}
