//! In-process stand-in for the profile API.
//!
//! Useful for demos and development without a backend. It honours the same
//! local precondition as the real client (blank text is refused) and then
//! answers after an artificial delay, either with a profile id derived from
//! the file name or with a configured failure.

use crate::error::SubmitError;
use crate::pipeline::submit::{ProfileId, ProfileSubmitter, SubmissionOutcome};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Default artificial latency.
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct SimulatedProfileService {
    delay: Duration,
    failure: Option<String>,
}

impl Default for SimulatedProfileService {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

impl SimulatedProfileService {
    /// A service that always succeeds after `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    /// Make every submission fail with an `api-error` carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl ProfileSubmitter for SimulatedProfileService {
    async fn submit(&self, extracted_text: &str, original_file_name: &str) -> SubmissionOutcome {
        if extracted_text.trim().is_empty() {
            return Err(SubmitError::EmptyExtraction);
        }
        tokio::time::sleep(self.delay).await;

        if let Some(message) = &self.failure {
            return Err(SubmitError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let id = format!("profile/{}", slug(original_file_name));
        info!(profile = %id, "Simulated profile created");
        Ok(ProfileId::new(id))
    }
}

/// Lower-case ASCII slug of the file stem: `"Jane Doe CV.pdf"` → `"jane-doe-cv"`.
fn slug(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };
    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let out = out.trim_end_matches('-');
    if out.is_empty() {
        "cv".to_string()
    } else {
        out.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn slugs() {
        assert_eq!(slug("Jane Doe CV.pdf"), "jane-doe-cv");
        assert_eq!(slug("__résumé__.docx"), "r-sum");
        assert_eq!(slug(".pdf"), "pdf");
        assert_eq!(slug("???"), "cv");
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_the_delay() {
        let service = SimulatedProfileService::new(Duration::from_secs(2));
        let start = Instant::now();
        let id = service.submit("Jane Doe", "Jane Doe.pdf").await.unwrap();
        assert_eq!(id.as_str(), "profile/jane-doe");
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn configured_failure() {
        let service = SimulatedProfileService::new(Duration::ZERO).failing("server busy");
        let err = service.submit("Jane Doe", "cv.pdf").await.unwrap_err();
        assert_eq!(err.to_string(), "server busy");
    }

    #[tokio::test]
    async fn blank_text_is_refused() {
        let service = SimulatedProfileService::new(Duration::ZERO);
        assert_eq!(
            service.submit(" ", "cv.pdf").await,
            Err(SubmitError::EmptyExtraction)
        );
    }
}
