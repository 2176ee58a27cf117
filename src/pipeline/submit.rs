//! Profile creation: ship the extracted text to the profile API.
//!
//! The text is wrapped in a `text/plain` file part named after the original
//! upload (`cv.pdf` → `cv.txt`) and POSTed as multipart form data to
//! `{apiBase}/v1/profile/create-from-cv`. The API answers with a
//! `profileUrl`, which [`viewer_url`] turns into the shareable address.

use crate::config::SiteConfig;
use crate::error::SubmitError;
use crate::file::text_artifact_name;
use crate::messages::Locale;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// Path of the profile-creation endpoint, relative to the API base.
pub const CREATE_FROM_CV_PATH: &str = "/v1/profile/create-from-cv";

/// Multipart field carrying the text artifact.
pub const CV_FILE_FIELD: &str = "cvFile";

/// Identifier (or relative path) of a generated profile, as returned by
/// the API. Not necessarily a full URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one submission.
pub type SubmissionOutcome = Result<ProfileId, SubmitError>;

/// Anything that can create a profile from extracted CV text.
#[async_trait]
pub trait ProfileSubmitter: Send + Sync {
    async fn submit(&self, extracted_text: &str, original_file_name: &str) -> SubmissionOutcome;
}

/// Headers of the `cvFile` part.
fn text_part_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers
}

/// Shareable URL of a profile: `{viewer_base}/{locale}/{profile_url}`,
/// with exactly one slash at each join.
pub fn viewer_url(viewer_base: &str, locale: Locale, profile_url: &str) -> String {
    format!(
        "{}/{}/{}",
        viewer_base.trim().trim_end_matches('/'),
        locale.code(),
        profile_url.trim().trim_start_matches('/')
    )
}

/// The production submitter.
#[derive(Debug, Clone)]
pub struct HttpProfileClient {
    client: reqwest::Client,
    api_base: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateProfileResponse {
    #[serde(rename = "profileUrl")]
    profile_url: Option<String>,
}

impl HttpProfileClient {
    /// A client for `api_base`. A missing base is reported at submit time.
    pub fn new(api_base: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
        }
    }

    pub fn from_site(site: &SiteConfig) -> Self {
        Self::new(site.api_base_url.clone())
    }

    /// Reuse an existing `reqwest::Client` (connection pool, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self) -> Result<String, SubmitError> {
        match self.api_base.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => Ok(format!(
                "{}{CREATE_FROM_CV_PATH}",
                base.trim_end_matches('/')
            )),
            _ => Err(SubmitError::Configuration(
                "profile API base URL is not set".into(),
            )),
        }
    }
}

#[async_trait]
impl ProfileSubmitter for HttpProfileClient {
    async fn submit(&self, extracted_text: &str, original_file_name: &str) -> SubmissionOutcome {
        if extracted_text.trim().is_empty() {
            return Err(SubmitError::EmptyExtraction);
        }
        let url = self.endpoint()?;
        let artifact = text_artifact_name(original_file_name);

        let part = multipart::Part::text(extracted_text.to_string())
            .file_name(artifact.clone())
            .headers(text_part_headers());
        let form = multipart::Form::new().part(CV_FILE_FIELD, part);

        debug!(%url, file = %artifact, chars = extracted_text.len(), "Submitting CV text");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Network(format!("request timed out: {e}"))
                } else {
                    SubmitError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Network(format!("reading response body: {e}")))?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(status = status.as_u16(), %message, "Profile API rejected the CV");
            return Err(SubmitError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let profile_url = serde_json::from_str::<CreateProfileResponse>(&body)
            .ok()
            .and_then(|r| r.profile_url)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| SubmitError::Api {
                status: status.as_u16(),
                message: "malformed success response".into(),
            })?;

        info!(status = status.as_u16(), profile = %profile_url, "Profile created");
        Ok(ProfileId::new(profile_url))
    }
}

/// Server message from an error body: `message`, then `error`.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return "malformed error response".into();
    };
    ["message", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "malformed error response".into())
}
