//! Pipeline stages for turning an uploaded CV into a profile.
//!
//! Each submodule implements one step, so each can be tested alone and the
//! state machine can run against stand-ins.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ extract ──────────────▶ submit
//! (type/size)  (pdf | docx | text)     (multipart POST, or simulated)
//! ```
//!
//! 1. [`validate`]: MIME allow-list and size gate; no I/O
//! 2. [`extract`]: dispatch by [`crate::file::DocumentFormat`], padded
//!    to a minimum duration. PDF parsing lives in [`pdf`] and runs on the
//!    blocking pool; DOCX decoding lives in [`docx`]
//! 3. [`submit`]: the profile API client; the only stage with network I/O
//! 4. [`simulated`]: an in-process replacement for [`submit`]

pub mod docx;
pub mod extract;
pub mod pdf;
pub mod simulated;
pub mod submit;
pub mod validate;
