//! PDF text extraction via pdfium.
//!
//! ## The engine
//!
//! pdfium is a C++ library loaded at runtime. Locating and binding it is
//! slow and can fail (missing library, wrong architecture). Each
//! [`PdfEngine`] binds at most once and keeps the resulting [`Pdfium`]
//! handle for its whole lifetime: concurrent first callers all await the
//! same bind, and every later extraction reuses the handle. A failed bind
//! is not cached, so the next extraction tries again.
//!
//! Dropping a `Pdfium` tears the library down for the whole process, so a
//! process should only ever bind through one engine. [`PdfEngine::global`]
//! is that engine; the widget and the CLI use it.
//!
//! ## Why spawn_blocking?
//!
//! pdfium calls block and must not run on the async workers. Binding and
//! parsing run on the blocking pool with a shared `Arc` of the handle.

use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Environment override for the pdfium shared library location.
pub const ENV_PDFIUM_LIB_PATH: &str = "PDFIUM_LIB_PATH";

/// pdfium accepts a header anywhere in this many leading bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Where the pdfium library was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    /// A specific shared library file.
    Path(PathBuf),
    /// The platform's default search path.
    System,
}

impl fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibrarySource::Path(p) => write!(f, "{}", p.display()),
            LibrarySource::System => f.write_str("system library"),
        }
    }
}

/// A value built once on the blocking pool and shared afterwards.
///
/// Callers racing on an empty slot all await the one in-flight build. An
/// `Err` leaves the slot empty.
struct SharedBinding<T> {
    slot: OnceCell<Arc<T>>,
}

impl<T: Send + Sync + 'static> SharedBinding<T> {
    fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    fn get(&self) -> Option<&Arc<T>> {
        self.slot.get()
    }

    async fn get_or_bind<F>(&self, bind: F) -> Result<Arc<T>, ExtractionError>
    where
        F: FnOnce() -> Result<T, ExtractionError> + Send + 'static,
    {
        self.slot
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(bind)
                    .await
                    .map_err(|e| {
                        ExtractionError::EngineUnavailable(format!("engine bind panicked: {e}"))
                    })?
                    .map(Arc::new)
            })
            .await
            .cloned()
    }
}

/// The one live pdfium handle of an engine.
struct BoundPdfium {
    source: LibrarySource,
    pdfium: Pdfium,
}

static GLOBAL_ENGINE: OnceLock<Arc<PdfEngine>> = OnceLock::new();

/// Lazily-bound pdfium engine.
pub struct PdfEngine {
    explicit_path: Option<PathBuf>,
    binding: SharedBinding<BoundPdfium>,
}

impl fmt::Debug for PdfEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfEngine")
            .field("explicit_path", &self.explicit_path)
            .field("library", &self.binding.get().map(|b| &b.source))
            .finish()
    }
}

impl PdfEngine {
    /// An engine that binds `explicit_path` if given, otherwise
    /// `PDFIUM_LIB_PATH`, otherwise the system library.
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self {
            explicit_path,
            binding: SharedBinding::new(),
        }
    }

    /// The shared engine. The first caller's `explicit_path` wins; later
    /// callers get the already-created instance.
    pub fn global(explicit_path: Option<PathBuf>) -> Arc<PdfEngine> {
        Arc::clone(GLOBAL_ENGINE.get_or_init(|| Arc::new(PdfEngine::new(explicit_path))))
    }

    /// `true` once the library is bound.
    pub fn is_ready(&self) -> bool {
        self.binding.get().is_some()
    }

    /// Bind the library if that has not happened yet.
    pub async fn ensure_ready(&self) -> Result<LibrarySource, ExtractionError> {
        Ok(self.bound().await?.source.clone())
    }

    async fn bound(&self) -> Result<Arc<BoundPdfium>, ExtractionError> {
        let explicit = self.explicit_path.clone();
        self.binding.get_or_bind(move || bind(explicit.as_deref())).await
    }

    /// Extract the text layer of a PDF.
    ///
    /// Pages are read in order. Within a page, text segments are joined with
    /// a single space; pages are joined with `\n`; the result is trimmed.
    pub async fn extract_text(&self, bytes: Arc<[u8]>) -> Result<String, ExtractionError> {
        // Cheap rejection of non-PDF bytes before the engine is even bound.
        if !has_pdf_header(&bytes) {
            let magic: Vec<u8> = bytes.iter().take(4).copied().collect();
            return Err(ExtractionError::Parse(format!(
                "not a PDF (first bytes: {magic:?})"
            )));
        }

        let bound = self.bound().await?;

        tokio::task::spawn_blocking(move || extract_blocking(&bound.pdfium, &bytes))
            .await
            .map_err(|e| ExtractionError::Parse(format!("PDF task panicked: {e}")))?
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)]
        .windows(4)
        .any(|w| w == b"%PDF")
}

/// Pick the library to bind.
fn locate(explicit: Option<&Path>) -> Result<LibrarySource, ExtractionError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ExtractionError::EngineUnavailable(format!(
                "pdfium library not found at '{}'",
                path.display()
            )));
        }
        return Ok(LibrarySource::Path(path.to_path_buf()));
    }

    if let Ok(env_path) = std::env::var(ENV_PDFIUM_LIB_PATH) {
        let p = PathBuf::from(env_path);
        if p.exists() {
            return Ok(LibrarySource::Path(p));
        }
        warn!(
            "{} '{}' not found; falling back to system library",
            ENV_PDFIUM_LIB_PATH,
            p.display()
        );
    }

    Ok(LibrarySource::System)
}

fn bind(explicit: Option<&Path>) -> Result<BoundPdfium, ExtractionError> {
    let source = locate(explicit)?;
    let bindings = match &source {
        LibrarySource::Path(path) => Pdfium::bind_to_library(path),
        LibrarySource::System => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractionError::EngineUnavailable(format!("failed to bind {source}: {e}")))?;
    info!(library = %source, "PDF engine ready");
    Ok(BoundPdfium {
        source,
        pdfium: Pdfium::new(bindings),
    })
}

fn extract_blocking(pdfium: &Pdfium, bytes: &[u8]) -> Result<String, ExtractionError> {
    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let detail = format!("{e:?}");
        if detail.contains("Password") || detail.contains("password") {
            ExtractionError::Parse("document is password protected".into())
        } else {
            ExtractionError::Parse(detail)
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let mut page_texts = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| ExtractionError::Parse(format!("page {}: {e:?}", idx + 1)))?;
        let joined = text
            .segments()
            .iter()
            .map(|segment| segment.text())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("Extracted page {}/{} → {} chars", idx + 1, total_pages, joined.len());
        page_texts.push(joined);
    }

    Ok(page_texts.join("\n").trim().to_string())
}
