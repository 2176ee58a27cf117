//! Error types for the jobmagnetic-cv library.
//!
//! Each pipeline stage owns its error type, because each stage fails in a
//! different way and the widget reacts differently to each:
//!
//! * [`ValidationError`]: the file was rejected before any I/O. The session
//!   is never created.
//! * [`ExtractionError`]: text extraction broke. Recoverable: the user keeps
//!   the file and sees a categorised notice.
//! * [`SubmitError`]: profile creation failed. Puts the session into the
//!   `error` state until the user retries or resets.
//! * [`ConfigError`]: builder or environment validation.
//! * [`TransitionError`]: an event the current state does not accept.
//!
//! Every user-facing error maps to one [`ErrorCategory`], which is what the
//! message templates in [`crate::messages`] are keyed on.

use crate::machine::UploadStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The error taxonomy shown to users. Each category has its own message
/// template per locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    /// Bad MIME type or size; no I/O attempted.
    ValidationError,
    /// The PDF engine could not be loaded.
    EngineUnavailable,
    /// The document is corrupt or unreadable.
    ParseError,
    /// The file could not be read from storage.
    IoError,
    /// Nothing to submit: extraction produced no text.
    EmptyExtraction,
    /// A required endpoint or URL is not configured.
    ConfigurationError,
    /// The profile API answered with a non-2xx status.
    ApiError,
    /// Transport-level failure (DNS, connection reset, timeout).
    NetworkError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ValidationError => "validation-error",
            ErrorCategory::EngineUnavailable => "engine-unavailable",
            ErrorCategory::ParseError => "parse-error",
            ErrorCategory::IoError => "io-error",
            ErrorCategory::EmptyExtraction => "empty-extraction",
            ErrorCategory::ConfigurationError => "configuration-error",
            ErrorCategory::ApiError => "api-error",
            ErrorCategory::NetworkError => "network-error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Validation ───────────────────────────────────────────────────────────

/// Why the file validator rejected a file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// MIME type is not in the configured allow-list.
    #[error("Unsupported file type '{mime}'")]
    UnsupportedType { mime: String },

    /// File is larger than the upload limit.
    #[error("File is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

impl ValidationError {
    /// Short machine-readable reason: `unsupported-type` or `too-large`.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedType { .. } => "unsupported-type",
            ValidationError::TooLarge { .. } => "too-large",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::ValidationError
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// A failed extraction. Never fatal for the session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExtractionError {
    /// The pdfium library could not be located or bound.
    #[error(
        "PDF engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EngineUnavailable(String),

    /// The document is corrupt, encrypted, or otherwise unreadable.
    #[error("Could not parse document: {0}")]
    Parse(String),

    /// The file bytes could not be read.
    #[error("Could not read file: {0}")]
    Io(String),
}

impl ExtractionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExtractionError::EngineUnavailable(_) => ErrorCategory::EngineUnavailable,
            ExtractionError::Parse(_) => ErrorCategory::ParseError,
            ExtractionError::Io(_) => ErrorCategory::IoError,
        }
    }
}

// ── Submission ───────────────────────────────────────────────────────────

/// A failed profile creation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SubmitError {
    /// Extracted text was empty or whitespace; nothing was sent.
    #[error("No text could be extracted from the CV")]
    EmptyExtraction,

    /// A required URL is missing from the configuration; nothing was sent.
    #[error("Missing configuration: {0}")]
    Configuration(String),

    /// The API answered with a non-2xx status.
    ///
    /// `message` is the server's `message` or `error` field, or a generic
    /// "malformed error response" when the body could not be parsed.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never completed (DNS, refused, reset, timeout).
    #[error("Network error: {0}")]
    Network(String),
}

impl SubmitError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SubmitError::EmptyExtraction => ErrorCategory::EmptyExtraction,
            SubmitError::Configuration(_) => ErrorCategory::ConfigurationError,
            SubmitError::Api { .. } => ErrorCategory::ApiError,
            SubmitError::Network(_) => ErrorCategory::NetworkError,
        }
    }
}

// ── Configuration ────────────────────────────────────────────────────────

/// Builder and environment validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown locale '{0}' (expected one of: es, en)")]
    UnknownLocale(String),
}

// ── State machine ────────────────────────────────────────────────────────

/// An event was dispatched in a state that does not accept it.
///
/// The UI normally disables the control, so seeing this means a caller
/// raced the interaction layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Event '{event}' is not allowed while {state}")]
pub struct TransitionError {
    pub state: UploadStatus,
    pub event: &'static str,
}
