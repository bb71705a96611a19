//! Spatial sequencing: put a page's blocks into visual reading order.
//!
//! Blocks are ordered by top edge, then by left edge. Text and image blocks
//! share the comparator, so no per-kind merge step is needed. This is a
//! single-column approximation: on multi-column layouts lines from different
//! columns interleave by height.

use crate::pipeline::layout::ContentBlock;
use std::cmp::Ordering;

/// Reading-order comparator: ascending `y0`, ties broken by ascending `x0`.
///
/// Uses `f32::total_cmp`, so the order is total even for signed zeros.
pub fn reading_order(a: &ContentBlock, b: &ContentBlock) -> Ordering {
    let (a, b) = (a.bbox(), b.bbox());
    a.y0.total_cmp(&b.y0).then_with(|| a.x0.total_cmp(&b.x0))
}

/// Sort one page's blocks into reading order.
///
/// The sort is stable: blocks with identical top-left corners keep their
/// discovery order, so the result is deterministic for a given input.
pub fn sequence_blocks(mut blocks: Vec<ContentBlock>) -> Vec<ContentBlock> {
    blocks.sort_by(reading_order);
    blocks
}
