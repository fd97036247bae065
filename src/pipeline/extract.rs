//! Text extraction: concatenate the text layer of every page via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and blocks while parsing. `tokio::task::spawn_blocking` keeps the
//! Tokio worker threads free while a large document is read.
//!
//! ## Library discovery
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to the library file or its directory
//! 2. Alongside the running executable
//! 3. System library search paths

use crate::error::ExtractionError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Produces the full text of a PDF file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Concatenate the text of every page in page order.
    ///
    /// Pages without a text layer contribute an empty string.
    async fn extract(&self, path: &Path, password: Option<&str>) -> Result<String, ExtractionError>;
}

/// [`TextExtractor`] reading the embedded text layer with pdfium.
///
/// Stateless; the `Pdfium` handle is bound per call because the upstream type
/// is not `Send`. The OS caches the library load, so rebinding is cheap.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumExtractor;

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Verify that a pdfium library can be bound, without opening a document.
    pub fn check_available() -> Result<(), ExtractionError> {
        bind_pdfium().map(|_| ())
    }
}

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, path: &Path, password: Option<&str>) -> Result<String, ExtractionError> {
        let path = path.to_path_buf();
        let password = password.map(str::to_string);

        tokio::task::spawn_blocking(move || extract_blocking(&path, password.as_deref()))
            .await
            .map_err(|e| ExtractionError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

/// Blocking implementation of text extraction.
fn extract_blocking(pdf_path: &Path, password: Option<&str>) -> Result<String, ExtractionError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(pdf_path, password, e))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page.text().map(|t| t.all()).unwrap_or_default();
        debug!("Page {}: {} chars of text", idx + 1, page_text.len());
        text.push_str(&page_text);
    }

    Ok(text)
}

/// Bind to a pdfium library following the discovery order above.
fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
        let candidate = PathBuf::from(&env_path);
        let lib_path = if candidate.is_dir() {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
                candidate.to_string_lossy().as_ref(),
            ))
        } else {
            candidate
        };
        debug!("Loading pdfium from PDFIUM_LIB_PATH: {}", lib_path.display());
        return Pdfium::bind_to_library(&lib_path)
            .map(Pdfium::new)
            .map_err(|e| {
                ExtractionError::PdfiumUnavailable(format!("{}: {}", lib_path.display(), e))
            });
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let lib_path = PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
            exe_dir.to_string_lossy().as_ref(),
        ));
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!("Loaded pdfium next to executable: {}", lib_path.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ExtractionError::PdfiumUnavailable(e.to_string()))
}

/// Map a pdfium load error, telling password problems apart from corruption.
fn map_load_error(path: &Path, password: Option<&str>, e: PdfiumError) -> ExtractionError {
    let detail = format!("{:?}", e);
    if detail.to_lowercase().contains("password") {
        if password.is_some() {
            ExtractionError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ExtractionError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ExtractionError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}
