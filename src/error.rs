//! Error types for the smartdocs library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SmartDocsError`] is **fatal**: the document cannot be processed at all
//!   (buffer is not a PDF, pdfium refused to open it, provider not
//!   configured). Returned as `Err(SmartDocsError)` from the top-level
//!   `extract*` / `analyze*` functions.
//!
//! * [`BlockError`] is **non-fatal**: a single content block failed (an image
//!   placement whose bounds cannot be resolved, an image that does not
//!   decode, an OCR run that errored). The block contributes nothing, the
//!   failure is logged and counted in [`crate::record::ExtractionStats`], and
//!   the rest of the document is still extracted.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the smartdocs library.
///
/// Per-block failures use [`BlockError`] and never reach this type.
#[derive(Debug, Error)]
pub enum SmartDocsError {
    // ── Open errors ───────────────────────────────────────────────────────
    /// The supplied buffer has no bytes at all.
    #[error("Cannot open PDF: the input buffer is empty")]
    EmptyInput,

    /// The buffer does not start with the `%PDF` signature.
    #[error("Input is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt and cannot be opened: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after all retries (and the fallback model).
    #[error("LLM API error after {attempts} attempts: {message}")]
    LlmApiError { attempts: u32, message: String },

    /// The LLM answered, but not with a JSON object matching the record schema.
    #[error("LLM response is not a valid document record: {detail}")]
    InvalidLlmResponse { detail: String },

    /// The LLM call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialising records to CSV or JSON failed.
    #[error("Failed to serialise records: {0}")]
    ExportFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SmartDocsError {
    /// True for the errors raised while opening the document buffer.
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            SmartDocsError::EmptyInput
                | SmartDocsError::NotAPdf { .. }
                | SmartDocsError::CorruptPdf { .. }
                | SmartDocsError::PasswordRequired
                | SmartDocsError::WrongPassword
                | SmartDocsError::PdfiumBindingFailed(_)
        )
    }
}

/// A non-fatal error for a single content block.
///
/// Logged and counted, never propagated: the block simply contributes no
/// text to its page.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BlockError {
    /// The display rectangle of an image placement could not be computed.
    #[error("Page {page}: image placement {object} has no resolvable bounds: {detail}")]
    PlacementUnresolved {
        page: usize,
        object: usize,
        detail: String,
    },

    /// The image data behind a placement could not be decoded to pixels.
    #[error("Page {page}: image {object} could not be decoded: {detail}")]
    ImageDecodeFailed {
        page: usize,
        object: usize,
        detail: String,
    },

    /// The OCR engine failed on a decoded image.
    #[error("Page {page}: OCR failed on image {object}: {detail}")]
    OcrFailed {
        page: usize,
        object: usize,
        detail: String,
    },
}
