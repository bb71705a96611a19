//! Document-level extraction entry points.
//!
//! One forward pass per document:
//!
//! ```text
//! bytes ──▶ validate ──▶ open (pdfium) ──▶ per page: scan ──▶ sequence ──▶ materialise
//!                                                                            │
//!                                               normalise ◀── join all pages ┘
//! ```
//!
//! Only a failure to open the buffer aborts a document. Everything that
//! goes wrong inside a page is contained at the block level and shows up in
//! [`ExtractionStats`] and the `tracing` log instead.
//!
//! The functions here hold no process-wide state: each call binds its own
//! pdfium handle and owns its document, which is closed when the call
//! returns on any path.

use crate::config::ExtractionConfig;
use crate::error::SmartDocsError;
use crate::pipeline::layout::{self, PageLayout};
use crate::pipeline::materialize::{self, ImageSource, PdfiumImageSource};
use crate::pipeline::ocr::{self, OcrEngine};
use crate::pipeline::{engine, input, normalize, sequence};
use crate::record::{ExtractionOutput, ExtractionStats};
use std::time::Instant;
use tracing::{debug, info};

/// Extract the reading-order text of a PDF held in memory.
///
/// # Errors
/// Returns `Err` only when the document cannot be opened: empty buffer,
/// non-PDF bytes, corrupt structure, missing/wrong password, or pdfium not
/// available.
pub fn extract_text(bytes: &[u8], config: &ExtractionConfig) -> Result<String, SmartDocsError> {
    extract_document(bytes, config).map(|output| output.text)
}

/// Extract text plus per-document statistics, using the OCR engine chosen
/// by `config.ocr_backend`.
pub fn extract_document(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, SmartDocsError> {
    let engine = config.ocr_enabled.then(|| ocr::engine_from_config(config));
    run(bytes, config, engine.as_deref())
}

/// Like [`extract_document`], with a caller-supplied OCR engine.
///
/// `config.ocr_enabled = false` still disables OCR.
pub fn extract_document_with(
    bytes: &[u8],
    config: &ExtractionConfig,
    ocr: &dyn OcrEngine,
) -> Result<ExtractionOutput, SmartDocsError> {
    run(bytes, config, config.ocr_enabled.then_some(ocr))
}

/// Run [`extract_document`] on the blocking thread pool.
///
/// pdfium and tesseract are blocking; this keeps them off async worker
/// threads.
pub async fn extract_document_async(
    bytes: Vec<u8>,
    config: ExtractionConfig,
) -> Result<ExtractionOutput, SmartDocsError> {
    tokio::task::spawn_blocking(move || extract_document(&bytes, &config))
        .await
        .map_err(|e| SmartDocsError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Sequence, materialise and normalise already-scanned pages.
///
/// Every page's image blocks are decoded through `images`. This is the
/// pdfium-independent half of the pipeline.
pub fn extract_from_layouts(
    layouts: impl IntoIterator<Item = PageLayout>,
    images: &dyn ImageSource,
    ocr: Option<&dyn OcrEngine>,
) -> ExtractionOutput {
    let start = Instant::now();
    let mut doc = DocumentText::default();
    for layout in layouts {
        doc.add_page(layout, images, ocr);
    }
    doc.finish(start)
}

fn run(
    bytes: &[u8],
    config: &ExtractionConfig,
    ocr: Option<&dyn OcrEngine>,
) -> Result<ExtractionOutput, SmartDocsError> {
    let start = Instant::now();

    input::validate_pdf_bytes(bytes)?;
    let pdfium = engine::bind_pdfium(config.pdfium_library_path.as_deref())?;
    let document = engine::open_document(&pdfium, bytes, config.password.as_deref())?;

    let pages = document.pages();
    info!("PDF opened: {} pages, {} bytes", pages.len(), bytes.len());

    let mut doc = DocumentText::default();
    for (index, page) in pages.iter().enumerate() {
        let layout = layout::scan_page(&page, index);
        doc.add_page(layout, &PdfiumImageSource::new(&page), ocr);
    }

    let output = doc.finish(start);
    info!(
        "Extraction complete: {} pages, {} chars, {} OCR contributions, {} failed blocks, {}ms",
        output.stats.page_count,
        output.text.chars().count(),
        output.stats.ocr_contributions,
        output.stats.failed_blocks,
        output.stats.duration_ms
    );
    Ok(output)
}

/// Accumulates page contributions in document order.
#[derive(Default)]
struct DocumentText {
    parts: Vec<String>,
    stats: ExtractionStats,
}

impl DocumentText {
    fn add_page(
        &mut self,
        layout: PageLayout,
        images: &dyn ImageSource,
        ocr: Option<&dyn OcrEngine>,
    ) {
        self.stats.page_count += 1;
        self.stats.text_blocks += layout.text_block_count();
        self.stats.image_blocks += layout.image_block_count();
        self.stats.skipped_placements += layout.skipped_placements;

        let index = layout.index;
        let ordered = sequence::sequence_blocks(layout.blocks);
        let content = materialize::materialize_page(index, &ordered, images, ocr);

        self.stats.ocr_contributions += content.ocr_contributions;
        self.stats.empty_recognitions += content.empty_recognitions;
        self.stats.failed_blocks += content.failed_blocks;
        self.stats.skipped_images += content.skipped_images;

        debug!(
            "Page {}: {} contributions",
            index + 1,
            content.contributions.len()
        );
        self.parts.extend(content.contributions);
    }

    fn finish(self, start: Instant) -> ExtractionOutput {
        let mut stats = self.stats;
        stats.duration_ms = start.elapsed().as_millis() as u64;
        ExtractionOutput {
            text: normalize::join_contributions(&self.parts),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_fails_before_binding_pdfium() {
        let err = extract_text(&[], &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, SmartDocsError::EmptyInput));
    }

    #[test]
    fn non_pdf_bytes_fail() {
        let err = extract_text(b"<html>not a pdf</html>", &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, SmartDocsError::NotAPdf { .. }));
        assert!(err.is_open_failure());
    }

    #[test]
    fn truncated_pdf_fails_to_open() {
        // Either pdfium is missing (binding failure) or it rejects the
        // buffer; both are open failures, never an empty success.
        let config = ExtractionConfig::builder()
            .pdfium_library_path("/nonexistent/libpdfium.so")
            .build()
            .unwrap();
        let err = extract_text(b"%PDF-1.7\n%garbage", &config).unwrap_err();
        assert!(err.is_open_failure(), "got {err:?}");
    }

    #[tokio::test]
    async fn async_wrapper_propagates_open_failure() {
        let err = extract_document_async(Vec::new(), ExtractionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SmartDocsError::EmptyInput));
    }
}
