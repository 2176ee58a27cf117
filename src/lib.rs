//! # jobmagnetic-cv
//!
//! The CV upload workflow behind the Job Magnetic landing page: accept a CV,
//! read its text, and turn it into a public profile through the profile API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CV file
//!  │
//!  ├─ 1. Validate  MIME allow-list + 5 MiB limit, no I/O
//!  ├─ 2. Extract   PDF (pdfium, spawn_blocking) | DOCX (docx-rs) | TXT
//!  │               held to a minimum duration (5 s by default)
//!  ├─ 3. Submit    multipart POST {apiBase}/v1/profile/create-from-cv
//!  └─ 4. Link      {viewerBase}/{locale}/{profileUrl}
//! ```
//!
//! [`UploadMachine`] is the pure state machine; [`CvUploadWidget`] runs it
//! on tokio and publishes [`UploadSnapshot`]s to subscribers and
//! [`UploadObserver`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jobmagnetic_cv::{CvUploadWidget, Locale, UploadConfig, UploadEvent, UploadFile, UploadStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = UploadConfig::builder()
//!         .locale(Locale::En)
//!         .api_base_url("https://api.jobmagnetic.dev")
//!         .viewer_base_url("https://jobmagnetic.dev")
//!         .sample_profile_url("https://jobmagnetic.dev/en/demo")
//!         .build()?;
//!     let widget = CvUploadWidget::new(config);
//!
//!     widget.dispatch(UploadEvent::SelectFile(UploadFile::from_path("cv.pdf").await?))?;
//!     if widget.settled().await.can_submit {
//!         widget.dispatch(UploadEvent::Submit)?;
//!     }
//!     let snapshot = widget.settled().await;
//!     if snapshot.status == UploadStatus::Success {
//!         println!("{}", snapshot.generated_site_url.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cv-upload` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! jobmagnetic-cv = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod file;
pub mod machine;
pub mod messages;
pub mod observer;
pub mod pipeline;
pub mod widget;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AcceptedTypes, ResolvedSite, SiteConfig, UploadConfig, UploadConfigBuilder,
    DEFAULT_EXTRACTION_FLOOR, ENV_API_BASE_URL, ENV_SAMPLE_PROFILE_URL, ENV_VIEWER_BASE_URL,
    MAX_UPLOAD_BYTES,
};
pub use error::{
    ConfigError, ErrorCategory, ExtractionError, SubmitError, TransitionError, ValidationError,
};
pub use file::{
    mime_for_extension, text_artifact_name, DocumentFormat, FileMeta, FileSource, UploadFile,
    MIME_DOC, MIME_DOCX, MIME_PDF, MIME_TEXT,
};
pub use machine::{
    Command, ExtractionState, UploadEvent, UploadMachine, UploadSession, UploadSnapshot,
    UploadStatus,
};
pub use messages::{
    analyzing_label, creating_profile_label, extraction_unavailable_label, message,
    profile_ready_label, upload_hint, Locale, Notice,
};
pub use observer::{NoopObserver, SharedObserver, UploadObserver};
pub use pipeline::extract::{DocumentExtractor, ExtractionResult, TextExtractor};
pub use pipeline::pdf::{LibrarySource, PdfEngine};
pub use pipeline::simulated::SimulatedProfileService;
pub use pipeline::submit::{
    viewer_url, HttpProfileClient, ProfileId, ProfileSubmitter, SubmissionOutcome,
};
pub use pipeline::validate::FileValidator;
pub use widget::CvUploadWidget;
