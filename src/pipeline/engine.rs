//! pdfium binding and in-memory document opening.
//!
//! pdfium is loaded dynamically at runtime. Resolution order for the shared
//! library:
//!
//! 1. `ExtractionConfig::pdfium_library_path` (file or directory)
//! 2. `PDFIUM_LIB_PATH` environment variable (file or directory)
//! 3. the working directory (`./libpdfium.so` etc.)
//! 4. the system library search path
//!
//! Documents are always opened from a byte slice; nothing is written to
//! disk. The returned `PdfDocument` closes itself when dropped, so every
//! exit path of the caller releases it.

use crate::error::SmartDocsError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library, returning a fresh `Pdfium` handle.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, SmartDocsError> {
    let configured = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

    let bindings = match configured {
        Some(path) => {
            let library = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", library.display());
            Pdfium::bind_to_library(&library)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| SmartDocsError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Open a PDF held entirely in memory.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&str>,
) -> Result<PdfDocument<'a>, SmartDocsError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| map_open_error(format!("{:?}", e), password.is_some()))
}

/// Translate a pdfium load error into the matching open failure.
fn map_open_error(detail: String, had_password: bool) -> SmartDocsError {
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            SmartDocsError::WrongPassword
        } else {
            SmartDocsError::PasswordRequired
        }
    } else {
        SmartDocsError::CorruptPdf { detail }
    }
}
