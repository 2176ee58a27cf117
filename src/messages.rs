//! Locales and user-facing message templates.
//!
//! Every string the widget shows lives here so that changing copy touches
//! exactly one place, and tests can check that each error category has its
//! own wording in every locale.

use crate::error::{ConfigError, ErrorCategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Site locale. Selects both UI text and the profile URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Es, Locale::En];

    /// Two-letter code used in routes and profile URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    /// Parse a locale code, case-insensitively.
    pub fn parse(code: &str) -> Result<Locale, ConfigError> {
        match code.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            other => Err(ConfigError::UnknownLocale(other.to_string())),
        }
    }

    /// Parse a locale code, falling back to the default locale for anything
    /// unknown or absent.
    pub fn from_code_or_default(code: Option<&str>) -> Locale {
        code.and_then(|c| Locale::parse(c).ok()).unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s)
    }
}

/// Message template for an error category.
pub fn message(category: ErrorCategory, locale: Locale) -> &'static str {
    match locale {
        Locale::Es => match category {
            ErrorCategory::ValidationError => {
                "Archivo no válido. Revisa el formato y el tamaño máximo permitidos."
            }
            ErrorCategory::EngineUnavailable => {
                "No pudimos iniciar el lector de PDF. Recarga la página e inténtalo de nuevo."
            }
            ErrorCategory::ParseError => {
                "No pudimos leer tu documento. Puede estar dañado o protegido con contraseña."
            }
            ErrorCategory::IoError => "No pudimos abrir el archivo seleccionado.",
            ErrorCategory::EmptyExtraction => {
                "No se pudo extraer texto de tu CV. Prueba con otro archivo."
            }
            ErrorCategory::ConfigurationError => {
                "El servicio no está configurado correctamente. Inténtalo más tarde."
            }
            ErrorCategory::ApiError => "No pudimos crear tu perfil.",
            ErrorCategory::NetworkError => {
                "No hay conexión con el servidor. Revisa tu conexión a internet."
            }
        },
        Locale::En => match category {
            ErrorCategory::ValidationError => {
                "Invalid file. Check the accepted formats and the maximum size."
            }
            ErrorCategory::EngineUnavailable => {
                "The PDF reader could not be started. Reload the page and try again."
            }
            ErrorCategory::ParseError => {
                "We could not read your document. It may be damaged or password protected."
            }
            ErrorCategory::IoError => "We could not open the selected file.",
            ErrorCategory::EmptyExtraction => {
                "No text could be extracted from your CV. Try another file."
            }
            ErrorCategory::ConfigurationError => {
                "The service is not configured correctly. Please try again later."
            }
            ErrorCategory::ApiError => "We could not create your profile.",
            ErrorCategory::NetworkError => {
                "Could not reach the server. Check your internet connection."
            }
        },
    }
}

/// Formats and size hint shown under the drop zone.
pub fn upload_hint(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "(Formatos: PDF, DOCX, TXT - Máx. 5MB)",
        Locale::En => "(Formats: PDF, DOCX, TXT - Max. 5MB)",
    }
}

/// Status line while a file is being analysed.
pub fn analyzing_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "Analizando tu CV…",
        Locale::En => "Analysing your CV…",
    }
}

/// Status line while the profile is being created.
pub fn creating_profile_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "Creando tu perfil profesional…",
        Locale::En => "Creating your professional profile…",
    }
}

/// Headline once the profile exists.
pub fn profile_ready_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "¡Tu perfil está listo!",
        Locale::En => "Your profile is ready!",
    }
}

/// Shown when the format cannot be read but the file was accepted.
pub fn extraction_unavailable_label(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => "No podemos leer este formato; selecciona un PDF, DOCX o TXT para continuar.",
        Locale::En => "This format cannot be read; select a PDF, DOCX or TXT to continue.",
    }
}

/// A categorised message raised by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub category: ErrorCategory,
    /// Technical detail (server message, parser error). Optional.
    pub detail: Option<String>,
}

impl Notice {
    pub fn new(category: ErrorCategory) -> Self {
        Self {
            category,
            detail: None,
        }
    }

    pub fn with_detail(category: ErrorCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: Some(detail.into()),
        }
    }

    /// Localised text: the category template, followed by the detail if any.
    pub fn render(&self, locale: Locale) -> String {
        let template = message(self.category, locale);
        match self.detail.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => format!("{template} ({d})"),
            _ => template.to_string(),
        }
    }
}
