//! Property-based tests for reading order and text normalization.

use proptest::prelude::*;
use smartdocs::pipeline::normalize::{join_contributions, normalize_text};
use smartdocs::pipeline::sequence::sequence_blocks;
use smartdocs::{BoundingBox, ContentBlock, ImageRef};

/// Build blocks on a coarse grid so that ties are common; each block
/// carries its input position in its text (or object number).
fn blocks_from(cells: &[(u8, u8, bool)]) -> Vec<ContentBlock> {
    cells
        .iter()
        .enumerate()
        .map(|(i, &(y, x, is_image))| {
            let bbox = BoundingBox::new(x as f32 * 10.0, y as f32 * 10.0, 500.0, 800.0);
            if is_image {
                ContentBlock::Image {
                    bbox,
                    image: ImageRef { page: 0, object: i },
                }
            } else {
                ContentBlock::Text {
                    bbox,
                    text: i.to_string(),
                }
            }
        })
        .collect()
}

fn input_position(block: &ContentBlock) -> usize {
    match block {
        ContentBlock::Text { text, .. } => text.parse().unwrap(),
        ContentBlock::Image { image, .. } => image.object,
    }
}

// ============================================================================
// Reading order
// ============================================================================

/// Property: output is ordered by (y0, x0), ties keep input order.
#[test]
fn proptest_sequence_is_sorted_and_stable() {
    proptest!(|(cells in prop::collection::vec((0u8..4, 0u8..4, any::<bool>()), 0..40))| {
        let ordered = sequence_blocks(blocks_from(&cells));
        prop_assert_eq!(ordered.len(), cells.len());

        for pair in ordered.windows(2) {
            let (a, b) = (pair[0].bbox(), pair[1].bbox());
            prop_assert!((a.y0, a.x0) <= (b.y0, b.x0));
            if (a.y0, a.x0) == (b.y0, b.x0) {
                prop_assert!(input_position(&pair[0]) < input_position(&pair[1]));
            }
        }
    });
}

/// Property: sequencing is a permutation of its input.
#[test]
fn proptest_sequence_keeps_every_block() {
    proptest!(|(cells in prop::collection::vec((0u8..10, 0u8..10, any::<bool>()), 0..40))| {
        let ordered = sequence_blocks(blocks_from(&cells));
        let mut seen: Vec<usize> = ordered.iter().map(input_position).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..cells.len()).collect::<Vec<_>>());
    });
}

// ============================================================================
// Normalization
// ============================================================================

/// Property: normalizing twice equals normalizing once.
#[test]
fn proptest_normalize_is_idempotent() {
    proptest!(|(text in "\\PC{0,200}")| {
        let once = normalize_text(&text);
        prop_assert_eq!(normalize_text(&once), once);
    });
}

/// Property: whitespace-heavy input leaves no blank lines, no doubled
/// spaces and no surrounding whitespace.
#[test]
fn proptest_normalize_output_shape() {
    proptest!(|(text in "[a-zñ \t\n]{0,120}")| {
        let out = normalize_text(&text);
        prop_assert!(!out.contains("\n\n"));
        prop_assert!(!out.contains("  "));
        prop_assert!(!out.contains('\t'));
        prop_assert_eq!(out.trim(), out.as_str());
        prop_assert_eq!(normalize_text(&out), out.clone());
    });
}

/// Property: joined contributions normalize the same as their text joined by
/// newlines.
#[test]
fn proptest_join_matches_manual_join() {
    proptest!(|(parts in prop::collection::vec("[a-z \n]{0,20}", 0..8))| {
        prop_assert_eq!(join_contributions(&parts), normalize_text(&parts.join("\n")));
    });
}
