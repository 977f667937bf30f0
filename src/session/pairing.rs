//! Pairing of colors painted on both canvases

use crate::config::ColorToken;
use crate::error::Side;

/// Colors active on both canvases.
///
/// Ordered by first appearance in `source_active` so submission order stays
/// stable across re-renders. Inputs are each canvas's active colors.
pub fn reconcile(source_active: &[ColorToken], reference_active: &[ColorToken]) -> Vec<ColorToken> {
    let mut paired = Vec::new();
    for color in source_active {
        if reference_active.contains(color) && !paired.contains(color) {
            paired.push(*color);
        }
    }
    paired
}

/// Colors active on exactly one canvas, with the side they are painted on.
///
/// These are shown as "awaiting pairing" and are never submitted.
pub fn awaiting_pairing(
    source_active: &[ColorToken],
    reference_active: &[ColorToken],
) -> Vec<(ColorToken, Side)> {
    let mut waiting = Vec::new();
    for color in source_active {
        if !reference_active.contains(color) && !waiting.iter().any(|(c, _)| c == color) {
            waiting.push((*color, Side::Source));
        }
    }
    for color in reference_active {
        if !source_active.contains(color) && !waiting.iter().any(|(c, _)| c == color) {
            waiting.push((*color, Side::Reference));
        }
    }
    waiting
}
