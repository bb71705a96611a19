//! Input validation: reject buffers that cannot possibly be a PDF.
//!
//! Documents arrive as complete in-memory buffers (an upload, a database
//! blob, a file read by the caller). Checking the `%PDF` signature before
//! binding pdfium gives callers a precise error for the common mistakes
//! (empty upload, wrong file type) and avoids loading the engine at all.

use crate::error::SmartDocsError;
use tracing::debug;

/// Readers accept a header preceded by junk as long as it starts within
/// the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Validate that `bytes` looks like a PDF document.
///
/// Returns the offset of the `%PDF` header on success.
pub fn validate_pdf_bytes(bytes: &[u8]) -> Result<usize, SmartDocsError> {
    if bytes.is_empty() {
        return Err(SmartDocsError::EmptyInput);
    }

    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    match window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
    {
        Some(offset) => {
            debug!("PDF header found at offset {} ({} bytes)", offset, bytes.len());
            Ok(offset)
        }
        None => Err(SmartDocsError::NotAPdf {
            magic: bytes[..bytes.len().min(4)].to_vec(),
        }),
    }
}
