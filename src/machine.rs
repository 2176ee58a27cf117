//! The upload workflow as a pure finite-state machine.
//!
//! [`UploadMachine`] does no I/O. Feeding it an [`UploadEvent`] mutates the
//! state and may return a [`Command`] (extract a file, submit some text) for
//! the caller to execute. The caller reports the command's outcome back as
//! another event. [`crate::widget::CvUploadWidget`] is the async driver that
//! does exactly that on tokio.
//!
//! ```text
//!            select ok                    extraction finished
//!   idle ─────────────▶ analyzing ─────────────────────────────▶ fileSelected
//!    ▲  ╲ select rejected ▲   (a new select supersedes)              │ submit
//!    │   ╰─────▶ idle     │                                          ▼
//!    │                  select                                creatingProfile
//!    │                                                          │          │
//!    │ upload another                                        ok │          │ err
//!    ├──────────────────────── success ◀─────────────────────────╯          ▼
//!    │                                                                    error
//!    ╰───────────────────────────── select another ◀──────────────────────╯ │
//!                                         retry (same text) ▶ creatingProfile
//! ```
//!
//! ## Generations
//!
//! Running work cannot be cancelled. Each file selection and each reset
//! bumps a generation counter, commands carry the generation they were issued
//! under, and completions from an older generation are dropped. A replaced
//! session therefore never receives a late result.

use crate::error::{ErrorCategory, SubmitError, TransitionError};
use crate::file::{FileMeta, UploadFile};
use crate::messages::Notice;
use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::validate::FileValidator;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Workflow status visible to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UploadStatus {
    /// No file held.
    #[default]
    Idle,
    /// A file was accepted and its text is being read.
    Analyzing,
    /// Extraction finished (with text, without, or with a failure).
    FileSelected,
    /// The profile API call is in flight.
    CreatingProfile,
    Success,
    /// Profile creation failed; waiting for retry or reset.
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Analyzing => "analyzing",
            UploadStatus::FileSelected => "fileSelected",
            UploadStatus::CreatingProfile => "creatingProfile",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }

    /// `true` while a command issued by the machine is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadStatus::Analyzing | UploadStatus::CreatingProfile)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How extraction went for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionState {
    Pending,
    Extracted,
    /// Format accepted but not readable. Submission stays disabled.
    Unavailable,
    Failed,
}

/// The one live session of a widget.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub file: UploadFile,
    pub extraction: ExtractionState,
    pub extracted_text: Option<String>,
    pub generated_url: Option<String>,
    pub error_detail: Option<String>,
}

impl UploadSession {
    fn new(file: UploadFile) -> Self {
        Self {
            file,
            extraction: ExtractionState::Pending,
            extracted_text: None,
            generated_url: None,
            error_detail: None,
        }
    }

    /// Extracted text, if it is non-blank.
    pub fn submittable_text(&self) -> Option<&str> {
        self.extracted_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// The user picked a file.
    SelectFile(UploadFile),
    /// The user confirmed profile creation.
    Submit,
    /// "Try again" after a failed submission.
    Retry,
    /// "Select another file": drop the session.
    SelectAnother,
    /// "Upload another" after a success.
    UploadAnother,
    /// Completion of a [`Command::Extract`].
    ExtractionFinished {
        generation: u64,
        result: ExtractionResult,
    },
    /// Completion of a [`Command::Submit`]. `Ok` carries the shareable URL.
    SubmissionFinished {
        generation: u64,
        result: Result<String, SubmitError>,
    },
}

impl UploadEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UploadEvent::SelectFile(_) => "select-file",
            UploadEvent::Submit => "submit",
            UploadEvent::Retry => "retry",
            UploadEvent::SelectAnother => "select-another",
            UploadEvent::UploadAnother => "upload-another",
            UploadEvent::ExtractionFinished { .. } => "extraction-finished",
            UploadEvent::SubmissionFinished { .. } => "submission-finished",
        }
    }
}

/// Work the machine asks its driver to perform.
#[derive(Debug, Clone)]
pub enum Command {
    Extract {
        generation: u64,
        file: UploadFile,
    },
    Submit {
        generation: u64,
        text: String,
        file_name: String,
    },
}

impl Command {
    pub fn generation(&self) -> u64 {
        match self {
            Command::Extract { generation, .. } | Command::Submit { generation, .. } => *generation,
        }
    }
}

/// Serialisable view of the machine, for renderers and `--json` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapshot {
    pub status: UploadStatus,
    pub file: Option<FileMeta>,
    pub extraction: Option<ExtractionState>,
    pub extracted_text: Option<String>,
    pub generated_site_url: Option<String>,
    pub error_detail: Option<String>,
    pub notice: Option<Notice>,
    /// Whether the submit control should be enabled.
    pub can_submit: bool,
}

/// The upload workflow state machine.
#[derive(Debug, Clone)]
pub struct UploadMachine {
    validator: FileValidator,
    status: UploadStatus,
    session: Option<UploadSession>,
    notice: Option<Notice>,
    notices_raised: u64,
    generation: u64,
}

impl Default for UploadMachine {
    fn default() -> Self {
        Self::new(FileValidator::default())
    }
}

impl UploadMachine {
    pub fn new(validator: FileValidator) -> Self {
        Self {
            validator,
            status: UploadStatus::Idle,
            session: None,
            notice: None,
            notices_raised: 0,
            generation: 0,
        }
    }

    pub fn current_state(&self) -> UploadStatus {
        self.status
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    /// The notice currently on display, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Number of notices raised so far. Lets a driver detect a repeated
    /// notice that compares equal to the previous one.
    pub fn notices_raised(&self) -> u64 {
        self.notices_raised
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let session = self.session.as_ref();
        UploadSnapshot {
            status: self.status,
            file: session.map(|s| s.file.meta()),
            extraction: session.map(|s| s.extraction),
            extracted_text: session.and_then(|s| s.extracted_text.clone()),
            generated_site_url: session.and_then(|s| s.generated_url.clone()),
            error_detail: session.and_then(|s| s.error_detail.clone()),
            notice: self.notice.clone(),
            can_submit: self.status == UploadStatus::FileSelected
                && session.and_then(UploadSession::submittable_text).is_some(),
        }
    }

    /// Apply one event.
    ///
    /// Returns the command to run next, if any. User events that the current
    /// state does not accept are rejected with [`TransitionError`] and leave
    /// the machine untouched. Stale completions are ignored and return
    /// `Ok(None)`.
    pub fn apply(&mut self, event: UploadEvent) -> Result<Option<Command>, TransitionError> {
        let name = event.name();
        match event {
            UploadEvent::SelectFile(file) => self.select_file(file),
            UploadEvent::Submit => {
                self.require(&[UploadStatus::FileSelected], name)?;
                Ok(self.start_submission())
            }
            UploadEvent::Retry => {
                self.require(&[UploadStatus::Error], name)?;
                Ok(self.start_submission())
            }
            UploadEvent::SelectAnother => {
                self.require(&[UploadStatus::FileSelected, UploadStatus::Error], name)?;
                self.reset();
                Ok(None)
            }
            UploadEvent::UploadAnother => {
                self.require(&[UploadStatus::Success], name)?;
                self.reset();
                Ok(None)
            }
            UploadEvent::ExtractionFinished { generation, result } => {
                if self.is_stale(generation, UploadStatus::Analyzing, name) {
                    return Ok(None);
                }
                self.finish_extraction(result);
                Ok(None)
            }
            UploadEvent::SubmissionFinished { generation, result } => {
                if self.is_stale(generation, UploadStatus::CreatingProfile, name) {
                    return Ok(None);
                }
                self.finish_submission(result);
                Ok(None)
            }
        }
    }

    fn require(&self, allowed: &[UploadStatus], event: &'static str) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError {
                state: self.status,
                event,
            })
        }
    }

    fn is_stale(&self, generation: u64, expected: UploadStatus, event: &str) -> bool {
        let stale = generation != self.generation || self.status != expected;
        if stale {
            debug!(
                event,
                generation,
                current = self.generation,
                status = %self.status,
                "Ignoring stale completion"
            );
        }
        stale
    }

    fn raise(&mut self, notice: Notice) {
        self.notices_raised += 1;
        self.notice = Some(notice);
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.session = None;
        self.notice = None;
        self.status = UploadStatus::Idle;
    }

    fn select_file(&mut self, file: UploadFile) -> Result<Option<Command>, TransitionError> {
        if self.status == UploadStatus::CreatingProfile {
            return Err(TransitionError {
                state: self.status,
                event: "select-file",
            });
        }

        // The previous session is gone before the new file is even looked at.
        self.reset();

        if let Err(e) = self.validator.validate(&file) {
            info!(file = %file.name, reason = e.reason(), "File rejected");
            self.raise(Notice::with_detail(e.category(), e.to_string()));
            return Ok(None);
        }

        info!(
            file = %file.name,
            mime = %file.mime_type,
            size = file.size,
            generation = self.generation,
            "File accepted, extracting"
        );
        self.session = Some(UploadSession::new(file.clone()));
        self.status = UploadStatus::Analyzing;
        Ok(Some(Command::Extract {
            generation: self.generation,
            file,
        }))
    }

    fn finish_extraction(&mut self, result: ExtractionResult) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut notice = None;
        match result {
            ExtractionResult::Success(text) => {
                session.extraction = ExtractionState::Extracted;
                session.extracted_text = Some(text);
            }
            ExtractionResult::Unavailable => {
                session.extraction = ExtractionState::Unavailable;
            }
            ExtractionResult::Failure(e) => {
                session.extraction = ExtractionState::Failed;
                notice = Some(Notice::with_detail(e.category(), e.to_string()));
            }
        }
        self.status = UploadStatus::FileSelected;
        if let Some(notice) = notice {
            self.raise(notice);
        }
    }

    /// Shared by `Submit` and `Retry`: the same text and file name every time.
    fn start_submission(&mut self) -> Option<Command> {
        let session = self.session.as_mut()?;
        let Some(text) = session.submittable_text().map(str::to_string) else {
            debug!(file = %session.file.name, "Nothing to submit");
            self.raise(Notice::new(ErrorCategory::EmptyExtraction));
            return None;
        };

        session.error_detail = None;
        let file_name = session.file.name.clone();
        self.notice = None;
        self.status = UploadStatus::CreatingProfile;
        Some(Command::Submit {
            generation: self.generation,
            text,
            file_name,
        })
    }

    fn finish_submission(&mut self, result: Result<String, SubmitError>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match result {
            Ok(url) => {
                info!(url = %url, "Profile ready");
                session.generated_url = Some(url);
                self.status = UploadStatus::Success;
            }
            Err(e) => {
                let detail = e.to_string();
                let category = e.category();
                session.error_detail = Some(detail.clone());
                self.status = UploadStatus::Error;
                let notice = match e {
                    SubmitError::EmptyExtraction => Notice::new(category),
                    SubmitError::Api { message, .. } => Notice::with_detail(category, message),
                    _ => Notice::with_detail(category, detail),
                };
                self.raise(notice);
            }
        }
    }
}
