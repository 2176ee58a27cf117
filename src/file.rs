//! The uploaded file: declared metadata plus a lazily-read byte source.
//!
//! Validation only looks at the declared MIME type and size. The bytes are
//! read at extraction time, so a file that disappears between selection and
//! extraction surfaces as an `io-error` rather than a validation failure.

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_DOC: &str = "application/msword";

/// Extraction handler selected from a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
    /// Word 97-2003. Accepted for upload in some deployments but never read.
    LegacyDoc,
    Other,
}

impl DocumentFormat {
    /// Classify a MIME type. Case and parameters (`; charset=...`) are ignored.
    pub fn from_mime(mime: &str) -> DocumentFormat {
        match essence(mime).as_str() {
            MIME_PDF => DocumentFormat::Pdf,
            MIME_DOCX => DocumentFormat::Docx,
            MIME_TEXT => DocumentFormat::PlainText,
            MIME_DOC => DocumentFormat::LegacyDoc,
            _ => DocumentFormat::Other,
        }
    }
}

/// Lower-cased MIME type without parameters.
pub(crate) fn essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Best-effort MIME type for a file extension.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "txt" | "text" => Some(MIME_TEXT),
        "doc" => Some(MIME_DOC),
        _ => None,
    }
}

/// Name of the text artifact sent to the profile API: the original name
/// with its extension replaced by `.txt`.
pub fn text_artifact_name(original: &str) -> String {
    let stem = match original.rfind('.') {
        Some(idx) if idx > 0 => &original[..idx],
        _ => original,
    };
    let stem = if stem.trim().is_empty() { "cv" } else { stem };
    format!("{stem}.txt")
}

/// Where the file bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Bytes already in memory (browser blob, test fixture).
    Memory(Arc<[u8]>),
    /// A file on disk, read when extraction starts.
    Disk(PathBuf),
}

/// Serialisable metadata kept by the upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

/// A file selected by the user.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    /// Declared MIME type. Drives both validation and extractor dispatch.
    pub mime_type: String,
    /// Declared size in bytes.
    pub size: u64,
    pub source: FileSource,
}

impl UploadFile {
    /// A file whose bytes are already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(Arc::from(bytes)),
        }
    }

    /// A file on disk. The MIME type is inferred from the extension and
    /// falls back to `application/octet-stream`.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let meta = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cv".to_string());
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .unwrap_or("application/octet-stream")
            .to_string();

        debug!(file = %name, mime = %mime_type, size = meta.len(), "Selected file from disk");

        Ok(Self {
            name,
            mime_type,
            size: meta.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    /// Override the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_mime(&self.mime_type)
    }

    pub fn meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
        }
    }

    /// Read the file content.
    pub async fn read_bytes(&self) -> Result<Arc<[u8]>, ExtractionError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(Arc::clone(bytes)),
            FileSource::Disk(path) => tokio::fs::read(path)
                .await
                .map(Arc::from)
                .map_err(|e| ExtractionError::Io(format!("{}: {e}", path.display()))),
        }
    }
}
