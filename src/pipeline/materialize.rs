//! Content materialisation: turn an ordered block sequence into text.
//!
//! Text blocks contribute their string verbatim. Image blocks are decoded
//! and passed to the OCR engine. Every image is handled in isolation: a
//! decode error, an OCR error or a blank recognition result makes that one
//! block contribute nothing, is logged, and the walk continues.

use crate::error::BlockError;
use crate::pipeline::layout::{for_each_object, ContentBlock, ImageRef};
use crate::pipeline::ocr::OcrEngine;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Resolves an [`ImageRef`] to pixels.
pub trait ImageSource {
    fn decode(&self, image: ImageRef) -> Result<DynamicImage, BlockError>;
}

/// Decodes image objects from one open pdfium page.
pub struct PdfiumImageSource<'p, 'a> {
    page: &'p PdfPage<'a>,
}

impl<'p, 'a> PdfiumImageSource<'p, 'a> {
    pub fn new(page: &'p PdfPage<'a>) -> Self {
        Self { page }
    }
}

impl ImageSource for PdfiumImageSource<'_, '_> {
    fn decode(&self, image: ImageRef) -> Result<DynamicImage, BlockError> {
        let failed = |detail: String| BlockError::ImageDecodeFailed {
            page: image.page + 1,
            object: image.object,
            detail,
        };

        let mut decoded = None;
        for_each_object(self.page, |position, object, _| {
            if position != image.object {
                return ControlFlow::Continue(());
            }
            decoded = Some(match object.as_image_object() {
                Some(image_object) => image_object
                    .get_raw_image()
                    .map_err(|e| failed(format!("{:?}", e))),
                None => Err(failed("object is not an image".to_string())),
            });
            ControlFlow::Break(())
        });

        decoded.unwrap_or_else(|| Err(failed("object not found on page".to_string())))
    }
}

/// Text contributed by one page, plus per-block bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// 0-based page index.
    pub index: usize,
    /// Contributions in reading order.
    pub contributions: Vec<String>,
    /// Images whose OCR produced non-blank text.
    pub ocr_contributions: usize,
    /// Images whose OCR succeeded but produced only whitespace.
    pub empty_recognitions: usize,
    /// Images dropped because decoding or OCR failed.
    pub failed_blocks: usize,
    /// Images not processed because OCR is disabled.
    pub skipped_images: usize,
}

/// Walk an ordered block sequence and collect its text.
///
/// `ocr` is `None` when OCR is disabled; image blocks are then skipped.
pub fn materialize_page(
    index: usize,
    blocks: &[ContentBlock],
    images: &dyn ImageSource,
    ocr: Option<&dyn OcrEngine>,
) -> PageContent {
    let mut content = PageContent {
        index,
        ..Default::default()
    };

    for block in blocks {
        match block {
            ContentBlock::Text { text, .. } => content.contributions.push(text.clone()),
            ContentBlock::Image { image, .. } => {
                let Some(engine) = ocr else {
                    content.skipped_images += 1;
                    continue;
                };
                match recognize_image(*image, images, engine) {
                    Ok(text) if text.trim().is_empty() => {
                        debug!(
                            "Page {}: image {} recognised as blank",
                            image.page + 1,
                            image.object
                        );
                        content.empty_recognitions += 1;
                    }
                    Ok(text) => {
                        debug!(
                            "Page {}: image {} → {} chars via OCR ({})",
                            image.page + 1,
                            image.object,
                            text.len(),
                            engine.language()
                        );
                        content.ocr_contributions += 1;
                        content.contributions.push(text);
                    }
                    Err(e) => {
                        warn!("{}", e);
                        content.failed_blocks += 1;
                    }
                }
            }
        }
    }

    content
}

/// Decode one image and run OCR on it.
fn recognize_image(
    image: ImageRef,
    images: &dyn ImageSource,
    engine: &dyn OcrEngine,
) -> Result<String, BlockError> {
    let pixels = images.decode(image)?;
    engine
        .recognize(&pixels)
        .map_err(|e| BlockError::OcrFailed {
            page: image.page + 1,
            object: image.object,
            detail: e.to_string(),
        })
}
