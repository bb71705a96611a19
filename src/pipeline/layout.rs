//! Layout scanning: enumerate the content blocks of each page.
//!
//! Two kinds of block share one coordinate system:
//!
//! * **Text blocks** are visual lines. pdfium's text segmentation
//!   (`PdfPageText::segments`) splits a line wherever the font or size
//!   changes, so segments that sit on the same line are merged back into
//!   one block by [`group_into_lines`].
//! * **Image blocks** come from the page's image objects, including those
//!   nested inside form XObjects. Each object is one placement, so an image
//!   resource drawn twice yields two blocks with two bounding boxes.
//!
//! pdfium reports rectangles with the origin at the bottom-left and y
//! growing upwards. Blocks are converted here to a top-left origin with y
//! growing downwards so that "smaller y0" means "higher on the page".

use crate::error::BlockError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Rectangle `(x0, y0, x1, y1)` in page points, y increasing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Convert a bottom-left-origin rectangle to page-top coordinates.
    ///
    /// Returns `None` when any edge is not a finite number, which is what a
    /// degenerate transform matrix produces.
    pub fn from_pdf_rect(
        left: f32,
        bottom: f32,
        right: f32,
        top: f32,
        page_height: f32,
    ) -> Option<Self> {
        // f32::min/max ignore NaN, so check the raw edges first.
        let raw = Self::new(left, page_height - top, right, page_height - bottom);
        if !raw.is_finite() {
            return None;
        }
        Some(Self {
            x0: left.min(right),
            y0: page_height - top.max(bottom),
            x1: left.max(right),
            y1: page_height - top.min(bottom),
        })
    }

    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    fn mid_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Opaque handle to an image placement inside the open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// 0-based page index.
    pub page: usize,
    /// Depth-first position of the image object among the page's objects,
    /// counting the objects nested inside form XObjects.
    pub object: usize,
}

/// One text run as pdfium segments it, before line grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub bbox: BoundingBox,
    pub text: String,
}

/// A discrete unit of page content with a known bounding box.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { bbox: BoundingBox, text: String },
    Image { bbox: BoundingBox, image: ImageRef },
}

impl ContentBlock {
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            ContentBlock::Text { bbox, .. } | ContentBlock::Image { bbox, .. } => bbox,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }
}

/// The blocks found on one page, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// 0-based page index.
    pub index: usize,
    pub blocks: Vec<ContentBlock>,
    /// Image placements dropped because their bounds could not be resolved.
    pub skipped_placements: usize,
}

impl PageLayout {
    pub fn text_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_image()).count()
    }

    pub fn image_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_image()).count()
    }
}

/// Two runs share a line when they overlap vertically by at least this
/// fraction of the shorter one.
const MIN_LINE_OVERLAP: f32 = 0.5;

/// Mid-line distance, in points, under which zero-height runs share a line.
const LINE_TOLERANCE: f32 = 3.0;

/// Widest horizontal gap inside a line, in multiples of the line height.
/// Anything wider is treated as a separate column.
const MAX_WORD_GAP: f32 = 3.0;

/// Enumerate the text and image blocks of a single page.
///
/// Failures are contained: a page whose text layer cannot be loaded yields
/// only its image blocks, and an image placement without resolvable bounds
/// is dropped on its own.
pub fn scan_page(page: &PdfPage<'_>, index: usize) -> PageLayout {
    let page_height = page.height().value;
    let mut layout = PageLayout {
        index,
        ..Default::default()
    };

    match page.text() {
        Ok(text) => {
            let mut fragments = Vec::new();
            for segment in text.segments().iter() {
                let bounds = segment.bounds();
                let Some(bbox) = BoundingBox::from_pdf_rect(
                    bounds.left().value,
                    bounds.bottom().value,
                    bounds.right().value,
                    bounds.top().value,
                    page_height,
                ) else {
                    debug!("Page {}: text segment with non-finite bounds skipped", index + 1);
                    continue;
                };
                fragments.push(TextFragment {
                    bbox,
                    text: segment.text(),
                });
            }
            layout.blocks.extend(group_into_lines(fragments));
        }
        Err(e) => warn!("Page {}: text layer unavailable: {:?}", index + 1, e),
    }

    for_each_object(page, |position, object, forms| {
        if object.as_image_object().is_none() {
            return ControlFlow::Continue(());
        }

        match resolve_placement(object, forms, index, position, page_height) {
            Ok(bbox) => layout.blocks.push(ContentBlock::Image {
                bbox,
                image: ImageRef {
                    page: index,
                    object: position,
                },
            }),
            Err(e) => {
                warn!("{}", e);
                layout.skipped_placements += 1;
            }
        }
        ControlFlow::Continue(())
    });

    debug!(
        "Page {}: {} text blocks, {} image blocks, {} placements skipped",
        index + 1,
        layout.text_block_count(),
        layout.image_block_count(),
        layout.skipped_placements
    );

    layout
}

/// Merge text runs that sit on the same visual line.
///
/// Each output block holds one line: its runs sorted left to right and
/// joined by single spaces, with the union of their boxes. Lines keep the
/// order in which their first run was seen. Whitespace-only runs are
/// dropped.
pub fn group_into_lines(fragments: Vec<TextFragment>) -> Vec<ContentBlock> {
    let mut lines: Vec<(BoundingBox, Vec<TextFragment>)> = Vec::new();

    for fragment in fragments {
        if fragment.text.trim().is_empty() {
            continue;
        }
        match lines
            .iter_mut()
            .find(|(bbox, _)| shares_line(bbox, &fragment.bbox))
        {
            Some((bbox, parts)) => {
                *bbox = bbox.union(&fragment.bbox);
                parts.push(fragment);
            }
            None => lines.push((fragment.bbox, vec![fragment])),
        }
    }

    lines
        .into_iter()
        .map(|(bbox, mut parts)| {
            parts.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            let text = parts
                .iter()
                .map(|p| p.text.trim())
                .collect::<Vec<_>>()
                .join(" ");
            ContentBlock::Text { bbox, text }
        })
        .collect()
}

fn shares_line(line: &BoundingBox, run: &BoundingBox) -> bool {
    let overlap = line.y1.min(run.y1) - line.y0.max(run.y0);
    let shorter = line.height().min(run.height());
    let same_band = if shorter > 0.0 {
        overlap >= MIN_LINE_OVERLAP * shorter
    } else {
        (line.mid_y() - run.mid_y()).abs() <= LINE_TOLERANCE
    };
    if !same_band {
        return false;
    }

    let gap = (run.x0 - line.x1).max(line.x0 - run.x1);
    gap <= MAX_WORD_GAP * line.height().max(run.height()).max(1.0)
}

/// Visit every object on the page depth-first, descending into form
/// XObjects. `visit` gets the object's position in that walk and the
/// matrices of its enclosing forms, outermost first.
///
/// The walk is deterministic, so a position recorded while scanning
/// finds the same object again when the page is decoded.
pub(crate) fn for_each_object<F>(page: &PdfPage<'_>, mut visit: F)
where
    F: FnMut(usize, &PdfPageObject<'_>, &[PdfMatrix]) -> ControlFlow<()>,
{
    let objects = page.objects();
    let mut forms = Vec::new();
    let mut position = 0;

    for i in 0..objects.len() {
        match objects.get(i) {
            Ok(object) => {
                if walk(&object, &mut forms, &mut position, &mut visit).is_break() {
                    return;
                }
            }
            Err(e) => debug!("Page object {} unavailable: {:?}", i, e),
        }
    }
}

fn walk<F>(
    object: &PdfPageObject<'_>,
    forms: &mut Vec<PdfMatrix>,
    position: &mut usize,
    visit: &mut F,
) -> ControlFlow<()>
where
    F: FnMut(usize, &PdfPageObject<'_>, &[PdfMatrix]) -> ControlFlow<()>,
{
    let current = *position;
    *position += 1;
    if visit(current, object, &forms[..]).is_break() {
        return ControlFlow::Break(());
    }

    let Some(form) = object.as_x_object_form_object() else {
        return ControlFlow::Continue(());
    };
    let matrix = match object.matrix() {
        Ok(matrix) => matrix,
        Err(e) => {
            debug!("Form object {} has no readable matrix: {:?}", current, e);
            return ControlFlow::Continue(());
        }
    };

    forms.push(matrix);
    let mut flow = ControlFlow::Continue(());
    for i in 0..form.len() {
        match form.get(i) {
            Ok(child) => {
                if walk(&child, forms, position, visit).is_break() {
                    flow = ControlFlow::Break(());
                    break;
                }
            }
            Err(e) => debug!("Form object {} child {} unavailable: {:?}", current, i, e),
        }
    }
    forms.pop();
    flow
}

/// Map a rectangle from nested form space to page space.
///
/// `forms` lists the enclosing form matrices outermost first; the innermost
/// is applied first. Returns `(left, bottom, right, top)`.
pub fn to_page_space(
    left: f32,
    bottom: f32,
    right: f32,
    top: f32,
    forms: &[PdfMatrix],
) -> (f32, f32, f32, f32) {
    if forms.is_empty() {
        return (left, bottom, right, top);
    }

    let corners = [(left, bottom), (left, top), (right, bottom), (right, top)].map(|(x, y)| {
        forms.iter().rev().fold((x, y), |(x, y), matrix| {
            let (x, y) = matrix.apply_to_points(PdfPoints::new(x), PdfPoints::new(y));
            (x.value, y.value)
        })
    });

    if corners.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return (f32::NAN, f32::NAN, f32::NAN, f32::NAN);
    }
    corners.iter().fold(
        (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        |(l, b, r, t), &(x, y)| (l.min(x), b.min(y), r.max(x), t.max(y)),
    )
}

/// Compute the display rectangle of one image placement.
fn resolve_placement(
    object: &PdfPageObject<'_>,
    forms: &[PdfMatrix],
    page: usize,
    position: usize,
    page_height: f32,
) -> Result<BoundingBox, BlockError> {
    let unresolved = |detail: String| BlockError::PlacementUnresolved {
        page: page + 1,
        object: position,
        detail,
    };

    let rect = object
        .bounds()
        .map_err(|e| unresolved(format!("{:?}", e)))?
        .to_rect();

    let (left, bottom, right, top) = to_page_space(
        rect.left().value,
        rect.bottom().value,
        rect.right().value,
        rect.top().value,
        forms,
    );

    BoundingBox::from_pdf_rect(left, bottom, right, top, page_height)
        .ok_or_else(|| unresolved("non-finite transform".to_string()))
}
