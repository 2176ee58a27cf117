//! File validation: the gate in front of extraction.
//!
//! Rules run in a fixed order (type, then size) so the rejection reason is
//! deterministic when a file breaks both. Only declared metadata is
//! inspected; the bytes are never touched here.

use crate::config::{AcceptedTypes, UploadConfig, MAX_UPLOAD_BYTES};
use crate::error::ValidationError;
use crate::file::UploadFile;
use tracing::debug;

/// Checks MIME type and size before a file is accepted.
#[derive(Debug, Clone)]
pub struct FileValidator {
    accepted: AcceptedTypes,
    max_bytes: u64,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(AcceptedTypes::default(), MAX_UPLOAD_BYTES)
    }
}

impl FileValidator {
    pub fn new(accepted: AcceptedTypes, max_bytes: u64) -> Self {
        Self {
            accepted,
            max_bytes: max_bytes.min(MAX_UPLOAD_BYTES),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.accepted_types.clone(), config.max_upload_bytes)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate a file, returning it unchanged on success.
    pub fn validate<'a>(&self, file: &'a UploadFile) -> Result<&'a UploadFile, ValidationError> {
        if !self.accepted.contains(&file.mime_type) {
            debug!(file = %file.name, mime = %file.mime_type, "Rejected: unsupported type");
            return Err(ValidationError::UnsupportedType {
                mime: file.mime_type.clone(),
            });
        }
        if file.size > self.max_bytes {
            debug!(file = %file.name, size = file.size, "Rejected: too large");
            return Err(ValidationError::TooLarge {
                size: file.size,
                limit: self.max_bytes,
            });
        }
        Ok(file)
    }
}
