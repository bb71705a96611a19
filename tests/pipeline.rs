//! Pipeline integration tests driven through the public API.
//!
//! Pages are built as `PageLayout`s directly and images are served by stub
//! `ImageSource`/`OcrEngine` implementations, so neither pdfium nor
//! tesseract has to be installed.

use image::{DynamicImage, Rgba, RgbaImage};
use smartdocs::{
    extract_document, extract_from_layouts, extract_text, BlockError, BoundingBox, ContentBlock,
    ExtractionConfig, ImageRef, ImageSource, OcrEngine, OcrError, PageLayout, SmartDocsError,
};
use std::collections::HashMap;

// ── Stubs ────────────────────────────────────────────────────────────────────

/// Serves object N as an N-pixel-wide image; `broken` objects fail to decode.
#[derive(Default)]
struct StubImages {
    broken: Vec<usize>,
}

impl ImageSource for StubImages {
    fn decode(&self, image: ImageRef) -> Result<DynamicImage, BlockError> {
        if self.broken.contains(&image.object) {
            return Err(BlockError::ImageDecodeFailed {
                page: image.page + 1,
                object: image.object,
                detail: "unsupported filter".to_string(),
            });
        }
        let width = image.object.max(1) as u32;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            1,
            Rgba([255, 255, 255, 255]),
        )))
    }
}

/// Recognises an image by its width.
struct StubOcr {
    by_width: HashMap<u32, Result<String, String>>,
}

impl StubOcr {
    fn new(entries: &[(u32, Result<&str, &str>)]) -> Self {
        Self {
            by_width: entries
                .iter()
                .map(|&(w, r)| (w, r.map(str::to_string).map_err(str::to_string)))
                .collect(),
        }
    }
}

impl OcrEngine for StubOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        match self.by_width.get(&image.width()) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(detail)) => Err(OcrError::RecognitionFailed(detail.clone())),
            None => Ok(String::new()),
        }
    }

    fn language(&self) -> &str {
        "spa"
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn text(x0: f32, y0: f32, s: &str) -> ContentBlock {
    ContentBlock::Text {
        bbox: BoundingBox::new(x0, y0, x0 + 200.0, y0 + 12.0),
        text: s.to_string(),
    }
}

fn image(page: usize, object: usize, x0: f32, y0: f32) -> ContentBlock {
    ContentBlock::Image {
        bbox: BoundingBox::new(x0, y0, x0 + 300.0, y0 + 40.0),
        image: ImageRef { page, object },
    }
}

fn page(index: usize, blocks: Vec<ContentBlock>) -> PageLayout {
    PageLayout {
        index,
        blocks,
        skipped_placements: 0,
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn pure_text_page() {
    let layout = page(
        0,
        vec![
            text(5.0, 50.0, "Lima, 10 de enero de 2024"),
            text(5.0, 10.0, "Oficio N. 001"),
        ],
    );
    let output = extract_from_layouts([layout], &StubImages::default(), None);
    assert_eq!(output.text, "Oficio N. 001\nLima, 10 de enero de 2024");
    assert_eq!(output.stats.page_count, 1);
    assert_eq!(output.stats.text_blocks, 2);
    assert_eq!(output.stats.image_blocks, 0);
}

#[test]
fn mixed_page_image_above_text() {
    let ocr = StubOcr::new(&[(3, Ok("MEMORANDO No 12"))]);
    let layout = page(0, vec![text(5.0, 100.0, "Firma:"), image(0, 3, 5.0, 50.0)]);
    let output = extract_from_layouts([layout], &StubImages::default(), Some(&ocr));
    assert_eq!(output.text, "MEMORANDO No 12\nFirma:");
    assert_eq!(output.stats.ocr_contributions, 1);
}

#[test]
fn broken_image_does_not_abort_page() {
    let ocr = StubOcr::new(&[(4, Ok("SELLO"))]);
    let images = StubImages { broken: vec![2] };
    let layout = page(
        0,
        vec![
            image(0, 2, 5.0, 5.0),
            text(5.0, 30.0, "Asunto: licencia"),
            image(0, 4, 5.0, 60.0),
        ],
    );
    let output = extract_from_layouts([layout], &images, Some(&ocr));
    assert_eq!(output.text, "Asunto: licencia\nSELLO");
    assert_eq!(output.stats.failed_blocks, 1);
    assert_eq!(output.stats.ocr_contributions, 1);
}

#[test]
fn ocr_failure_and_blank_image_are_contained() {
    let ocr = StubOcr::new(&[(5, Err("tesseract exited 1")), (6, Ok("  \n "))]);
    let layout = page(
        0,
        vec![
            text(5.0, 10.0, "Resolución N. 496"),
            image(0, 5, 5.0, 20.0),
            image(0, 6, 5.0, 30.0),
        ],
    );
    let output = extract_from_layouts([layout], &StubImages::default(), Some(&ocr));
    assert_eq!(output.text, "Resolución N. 496");
    assert_eq!(output.stats.failed_blocks, 1);
    assert_eq!(output.stats.empty_recognitions, 1);
}

#[test]
fn pages_keep_document_order() {
    let ocr = StubOcr::new(&[(7, Ok("Página dos"))]);
    let layouts = vec![
        page(0, vec![text(5.0, 700.0, "Página uno, pie")]),
        page(1, vec![image(1, 7, 5.0, 10.0)]),
    ];
    let output = extract_from_layouts(layouts, &StubImages::default(), Some(&ocr));
    assert_eq!(output.text, "Página uno, pie\nPágina dos");
    assert_eq!(output.stats.page_count, 2);
}

#[test]
fn ocr_disabled_skips_images() {
    let layout = page(0, vec![image(0, 3, 5.0, 5.0), text(5.0, 30.0, "Cuerpo")]);
    let output = extract_from_layouts([layout], &StubImages::default(), None);
    assert_eq!(output.text, "Cuerpo");
    assert_eq!(output.stats.image_blocks, 1);
    assert_eq!(output.stats.skipped_images, 1);
    assert_eq!(output.stats.skipped_placements, 0);
}

#[test]
fn whitespace_is_normalized_across_contributions() {
    let ocr = StubOcr::new(&[(8, Ok("Línea2   con   espacios\n\n"))]);
    let layout = page(
        0,
        vec![text(5.0, 10.0, "Línea1\n\n\n"), image(0, 8, 5.0, 20.0)],
    );
    let output = extract_from_layouts([layout], &StubImages::default(), Some(&ocr));
    assert_eq!(output.text, "Línea1\nLínea2 con espacios");
}

#[test]
fn page_without_blocks_is_empty() {
    let output = extract_from_layouts([page(0, vec![])], &StubImages::default(), None);
    assert_eq!(output.text, "");
    assert_eq!(output.stats.page_count, 1);
}

// ── Invalid buffers ──────────────────────────────────────────────────────────

#[test]
fn empty_buffer_is_rejected() {
    let err = extract_text(&[], &ExtractionConfig::default()).unwrap_err();
    assert!(matches!(err, SmartDocsError::EmptyInput));
    assert!(err.is_open_failure());
}

#[test]
fn arbitrary_bytes_are_rejected() {
    let err = extract_document(b"PK\x03\x04 zip archive", &ExtractionConfig::default())
        .unwrap_err();
    match err {
        SmartDocsError::NotAPdf { magic } => assert_eq!(magic, b"PK\x03\x04".to_vec()),
        other => panic!("expected NotAPdf, got {other:?}"),
    }
}
