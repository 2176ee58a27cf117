//! Configuration for the CV upload workflow.
//!
//! All behaviour is controlled through [`UploadConfig`], built via
//! [`UploadConfigBuilder`]. Endpoint URLs live in [`SiteConfig`] and are
//! only checked when a submission is about to happen, so a widget can still
//! validate and extract files on a deployment without a profile backend.

use crate::error::{ConfigError, SubmitError};
use crate::file::{essence, MIME_DOC, MIME_DOCX, MIME_PDF, MIME_TEXT};
use crate::messages::Locale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Hard upload limit: 5 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Default minimum observable extraction time.
pub const DEFAULT_EXTRACTION_FLOOR: Duration = Duration::from_millis(5000);

pub const ENV_API_BASE_URL: &str = "JOBMAGNETIC_API_BASE_URL";
pub const ENV_VIEWER_BASE_URL: &str = "JOBMAGNETIC_VIEWER_BASE_URL";
pub const ENV_SAMPLE_PROFILE_URL: &str = "JOBMAGNETIC_SAMPLE_PROFILE_URL";

/// Configuration for one upload widget.
///
/// # Example
/// ```rust
/// use jobmagnetic_cv::{AcceptedTypes, Locale, UploadConfig};
///
/// let config = UploadConfig::builder()
///     .accepted_types(AcceptedTypes::pdf_only())
///     .locale(Locale::En)
///     .build()
///     .unwrap();
/// assert!(config.accepted_types.contains("application/pdf"));
/// ```
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// MIME allow-list. Default: PDF, DOCX, plain text and legacy DOC.
    pub accepted_types: AcceptedTypes,

    /// Upload size limit in bytes. Default and maximum: [`MAX_UPLOAD_BYTES`].
    pub max_upload_bytes: u64,

    /// Minimum time an extraction takes from the user's point of view.
    /// Default: 5000 ms.
    ///
    /// Applies whether the extraction succeeds or fails.
    pub extraction_floor: Duration,

    /// UI language and profile URL segment. Default: `es`.
    pub locale: Locale,

    /// Profile API and viewer endpoints.
    pub site: SiteConfig,

    /// Explicit location of the pdfium shared library. If `None`, the engine
    /// tries `PDFIUM_LIB_PATH` and then the system library.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_types: AcceptedTypes::default(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            extraction_floor: DEFAULT_EXTRACTION_FLOOR,
            locale: Locale::default(),
            site: SiteConfig::default(),
            pdfium_library_path: None,
        }
    }
}

impl UploadConfig {
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`UploadConfig`].
#[derive(Debug)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn accepted_types(mut self, types: AcceptedTypes) -> Self {
        self.config.accepted_types = types;
        self
    }

    /// Lower the size limit. Values above 5 MiB are clamped.
    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes.min(MAX_UPLOAD_BYTES);
        self
    }

    pub fn extraction_floor(mut self, floor: Duration) -> Self {
        self.config.extraction_floor = floor;
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn site(mut self, site: SiteConfig) -> Self {
        self.config.site = site;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.site.api_base_url = Some(url.into());
        self
    }

    pub fn viewer_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.site.viewer_base_url = Some(url.into());
        self
    }

    pub fn sample_profile_url(mut self, url: impl Into<String>) -> Self {
        self.config.site.sample_profile_url = Some(url.into());
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploadConfig, ConfigError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "Upload limit must be at least 1 byte".into(),
            ));
        }
        for (key, value) in c.site.entries() {
            if let Some(url) = value {
                if !url.trim().is_empty() && !is_http_url(url) {
                    return Err(ConfigError::InvalidConfig(format!(
                        "{key} must be an http(s) URL, got '{url}'"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

fn is_http_url(s: &str) -> bool {
    let s = s.trim();
    s.starts_with("http://") || s.starts_with("https://")
}

// ── Accepted types ───────────────────────────────────────────────────────

/// MIME allow-list for uploads. PDF is always a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedTypes(BTreeSet<String>);

impl AcceptedTypes {
    /// Only PDF.
    pub fn pdf_only() -> Self {
        Self(BTreeSet::from([MIME_PDF.to_string()]))
    }

    /// PDF, DOCX, plain text and legacy DOC.
    pub fn documents() -> Self {
        Self::pdf_only()
            .with(MIME_DOCX)
            .with(MIME_TEXT)
            .with(MIME_DOC)
    }

    pub fn with(mut self, mime: &str) -> Self {
        self.0.insert(essence(mime));
        self
    }

    /// Remove a type. Removing PDF has no effect.
    pub fn without(mut self, mime: &str) -> Self {
        let mime = essence(mime);
        if mime != MIME_PDF {
            self.0.remove(&mime);
        }
        self
    }

    pub fn contains(&self, mime: &str) -> bool {
        self.0.contains(&essence(mime))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for AcceptedTypes {
    fn default() -> Self {
        Self::documents()
    }
}

// ── Site endpoints ───────────────────────────────────────────────────────

/// Endpoints consumed by the submission step. All three must be present
/// before a submission is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root of the profile API, e.g. `https://api.jobmagnetic.dev`.
    pub api_base_url: Option<String>,
    /// Root where generated profiles are served.
    pub viewer_base_url: Option<String>,
    /// A demo profile linked from the upload card.
    pub sample_profile_url: Option<String>,
}

impl SiteConfig {
    /// Read the endpoints from `JOBMAGNETIC_*` environment variables.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_base_url: var(ENV_API_BASE_URL),
            viewer_base_url: var(ENV_VIEWER_BASE_URL),
            sample_profile_url: var(ENV_SAMPLE_PROFILE_URL),
        }
    }

    fn entries(&self) -> [(&'static str, Option<&String>); 3] {
        [
            (ENV_API_BASE_URL, self.api_base_url.as_ref()),
            (ENV_VIEWER_BASE_URL, self.viewer_base_url.as_ref()),
            (ENV_SAMPLE_PROFILE_URL, self.sample_profile_url.as_ref()),
        ]
    }

    /// Check that every endpoint is configured.
    ///
    /// Empty or whitespace-only values count as missing. The error names the
    /// first missing key.
    pub fn resolve(&self) -> Result<ResolvedSite, SubmitError> {
        let mut values = Vec::with_capacity(3);
        for (key, value) in self.entries() {
            match value.map(|v| v.trim()) {
                Some(v) if !v.is_empty() => values.push(v.to_string()),
                _ => return Err(SubmitError::Configuration(format!("{key} is not set"))),
            }
        }
        let mut values = values.into_iter();
        Ok(ResolvedSite {
            api_base_url: values.next().unwrap_or_default(),
            viewer_base_url: values.next().unwrap_or_default(),
            sample_profile_url: values.next().unwrap_or_default(),
        })
    }
}

/// A [`SiteConfig`] with every endpoint present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSite {
    pub api_base_url: String,
    pub viewer_base_url: String,
    pub sample_profile_url: String,
}

impl ResolvedSite {
    /// Shareable URL of a created profile.
    pub fn profile_url(&self, locale: Locale, profile_url: &str) -> String {
        crate::pipeline::submit::viewer_url(&self.viewer_base_url, locale, profile_url)
    }
}
