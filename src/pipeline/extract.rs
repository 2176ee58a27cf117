//! Text extraction: dispatch by document format, padded to a minimum duration.
//!
//! ## The floor
//!
//! The upload card shows an "analysing" animation while the CV is read.
//! Every extraction takes at least `extraction_floor`, whatever its outcome.
//! The real work and the timer run concurrently, so a document that is slower
//! than the floor is not delayed further.

use crate::config::UploadConfig;
use crate::error::ExtractionError;
use crate::file::{DocumentFormat, UploadFile};
use crate::pipeline::docx::extract_docx_text;
use crate::pipeline::pdf::PdfEngine;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// Text was read. May be empty for documents without a text layer.
    Success(String),
    /// The format is accepted for upload but cannot be read. Not an error.
    Unavailable,
    /// Reading broke.
    Failure(ExtractionError),
}

impl ExtractionResult {
    pub fn text(&self) -> Option<&str> {
        match self {
            ExtractionResult::Success(text) => Some(text),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ExtractionResult::Success(_) => "success",
            ExtractionResult::Unavailable => "unavailable",
            ExtractionResult::Failure(_) => "failure",
        }
    }
}

/// Anything that can turn an uploaded file into text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, file: &UploadFile) -> ExtractionResult;
}

/// The production extractor: PDF via pdfium, DOCX via `docx-rs`, plain text
/// via UTF-8 decoding.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    pdf: Arc<PdfEngine>,
    floor: Duration,
}

impl DocumentExtractor {
    pub fn new(pdf: Arc<PdfEngine>, floor: Duration) -> Self {
        Self { pdf, floor }
    }

    /// Uses the process-wide PDF engine.
    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            PdfEngine::global(config.pdfium_library_path.clone()),
            config.extraction_floor,
        )
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    async fn extract_unpadded(&self, file: &UploadFile) -> ExtractionResult {
        let format = file.format();
        match format {
            DocumentFormat::LegacyDoc | DocumentFormat::Other => {
                debug!(file = %file.name, mime = %file.mime_type, "No extractor for format");
                return ExtractionResult::Unavailable;
            }
            DocumentFormat::Pdf | DocumentFormat::Docx | DocumentFormat::PlainText => {}
        }

        let bytes = match file.read_bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return ExtractionResult::Failure(e),
        };

        let text = match format {
            DocumentFormat::Pdf => self.pdf.extract_text(bytes).await,
            DocumentFormat::Docx => tokio::task::spawn_blocking(move || extract_docx_text(&bytes))
                .await
                .map_err(|e| ExtractionError::Parse(format!("DOCX task panicked: {e}")))
                .and_then(|r| r),
            DocumentFormat::PlainText => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            DocumentFormat::LegacyDoc | DocumentFormat::Other => return ExtractionResult::Unavailable,
        };

        match text {
            Ok(text) => ExtractionResult::Success(text),
            Err(e) => ExtractionResult::Failure(e),
        }
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, file: &UploadFile) -> ExtractionResult {
        let start = Instant::now();
        let (result, ()) = tokio::join!(
            self.extract_unpadded(file),
            tokio::time::sleep(self.floor)
        );

        match &result {
            ExtractionResult::Failure(e) => {
                warn!(file = %file.name, category = %e.category(), "Extraction failed: {e}")
            }
            other => info!(
                file = %file.name,
                outcome = other.label(),
                chars = other.text().map(str::len).unwrap_or(0),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Extraction finished"
            ),
        }
        result
    }
}
