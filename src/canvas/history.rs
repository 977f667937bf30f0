//! Ordered stroke log with a linear undo/redo cursor

use crate::config::ColorToken;
use crate::domain::{Point, Stroke};

/// Path being painted but not yet committed
#[derive(Clone, Debug, PartialEq)]
struct InProgress {
    color: ColorToken,
    brush_width: f32,
    path: Vec<Point>,
}

/// Stroke history of one canvas.
///
/// Strokes before `active_len` are active. The rest are redoable. Committing a
/// stroke drops the redo branch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StrokeHistory {
    strokes: Vec<Stroke>,
    active_len: usize,
    drawing: Option<InProgress>,
}

impl StrokeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new path. Committed history is not touched.
    pub fn begin_stroke(&mut self, color: ColorToken, brush_width: f32) {
        self.drawing = Some(InProgress {
            color,
            brush_width,
            path: Vec::new(),
        });
    }

    /// Append a point to the in-progress path; no-op when nothing is being painted
    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(drawing) = self.drawing.as_mut() {
            if drawing.path.last() == Some(&point) {
                return;
            }
            drawing.path.push(point);
        }
    }

    /// Commit the in-progress path. Returns whether history changed.
    ///
    /// A path without a single segment (a click with no drag) is discarded.
    pub fn commit_stroke(&mut self) -> bool {
        let Some(drawing) = self.drawing.take() else {
            return false;
        };
        if drawing.path.len() < 2 {
            return false;
        }
        self.strokes.truncate(self.active_len);
        self.strokes.push(Stroke {
            color: drawing.color,
            path: drawing.path,
            brush_width: drawing.brush_width,
        });
        self.active_len = self.strokes.len();
        true
    }

    /// Drop the in-progress path without committing it
    pub fn cancel_stroke(&mut self) {
        self.drawing = None;
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    pub fn undo(&mut self) {
        if self.active_len > 0 {
            self.active_len -= 1;
        }
    }

    pub fn redo(&mut self) {
        if self.active_len < self.strokes.len() {
            self.active_len += 1;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.active_len > 0
    }

    pub fn can_redo(&self) -> bool {
        self.active_len < self.strokes.len()
    }

    /// Reset to an empty history
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active_len = 0;
        self.drawing = None;
    }

    /// Remove every stroke of `color`, active or not.
    ///
    /// The cursor is clamped to the shorter history. This is not recorded in
    /// the undo log.
    pub fn delete_color(&mut self, color: ColorToken) {
        self.strokes.retain(|s| s.color != color);
        self.active_len = self.active_len.min(self.strokes.len());
        if self.drawing.as_ref().is_some_and(|d| d.color == color) {
            self.drawing = None;
        }
    }

    /// Cursor position: index of the last active stroke, `-1` when nothing is active
    pub fn index(&self) -> isize {
        self.active_len as isize - 1
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Every committed stroke, including redoable ones
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn active(&self) -> &[Stroke] {
        &self.strokes[..self.active_len]
    }

    pub fn active_of(&self, color: ColorToken) -> impl Iterator<Item = &Stroke> {
        self.active().iter().filter(move |s| s.color == color)
    }

    pub fn has_active(&self, color: ColorToken) -> bool {
        self.active_of(color).next().is_some()
    }

    /// Colors with at least one active stroke, in order of first appearance
    pub fn active_colors(&self) -> Vec<ColorToken> {
        let mut colors = Vec::new();
        for stroke in self.active() {
            if !colors.contains(&stroke.color) {
                colors.push(stroke.color);
            }
        }
        colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paint(history: &mut StrokeHistory, color: ColorToken, x: f32) {
        history.begin_stroke(color, 10.0);
        history.extend_stroke(Point::new(x, 0.0));
        history.extend_stroke(Point::new(x, 10.0));
        assert!(history.commit_stroke());
    }

    #[test]
    fn test_commit_moves_cursor() {
        let mut h = StrokeHistory::new();
        assert_eq!(h.index(), -1);
        assert!(!h.can_undo() && !h.can_redo());
        paint(&mut h, ColorToken::RED, 1.0);
        paint(&mut h, ColorToken::BLUE, 2.0);
        assert_eq!(h.index(), 1);
        assert_eq!(h.len(), 2);
        assert!(h.can_undo() && !h.can_redo());
    }

    #[test]
    fn test_click_without_drag_is_discarded() {
        let mut h = StrokeHistory::new();
        paint(&mut h, ColorToken::RED, 1.0);
        h.undo();
        h.begin_stroke(ColorToken::BLUE, 10.0);
        h.extend_stroke(Point::new(5.0, 5.0));
        h.extend_stroke(Point::new(5.0, 5.0));
        assert!(!h.commit_stroke());
        // redo branch survives a discarded click
        assert!(h.can_redo());
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_extend_without_begin_is_noop() {
        let mut h = StrokeHistory::new();
        h.extend_stroke(Point::new(1.0, 1.0));
        assert!(!h.commit_stroke());
        assert!(h.is_empty());
    }

    #[test]
    fn test_undo_redo_at_bounds() {
        let mut h = StrokeHistory::new();
        h.undo();
        h.redo();
        assert_eq!(h.index(), -1);
        paint(&mut h, ColorToken::RED, 1.0);
        h.redo();
        assert_eq!(h.index(), 0);
        h.undo();
        h.undo();
        assert_eq!(h.index(), -1);
        assert!(h.active().is_empty());
    }

    #[test]
    fn test_new_stroke_prunes_redo_branch() {
        let mut h = StrokeHistory::new();
        paint(&mut h, ColorToken::RED, 1.0);
        paint(&mut h, ColorToken::GREEN, 2.0);
        paint(&mut h, ColorToken::BLUE, 3.0);
        h.undo();
        h.undo();
        paint(&mut h, ColorToken::YELLOW, 4.0);
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        h.redo();
        assert_eq!(h.index(), 1);
        assert_eq!(
            h.active_colors(),
            vec![ColorToken::RED, ColorToken::YELLOW]
        );
    }

    #[test]
    fn test_delete_color_after_full_history() {
        let mut h = StrokeHistory::new();
        paint(&mut h, ColorToken::RED, 1.0);
        paint(&mut h, ColorToken::BLUE, 2.0);
        paint(&mut h, ColorToken::RED, 3.0);
        assert_eq!(h.index(), 2);

        h.delete_color(ColorToken::RED);
        assert_eq!(h.len(), 1);
        assert_eq!(h.index(), 0);
        assert_eq!(h.strokes()[0].color, ColorToken::BLUE);

        h.redo();
        assert!(!h.has_active(ColorToken::RED));
        h.undo();
        h.redo();
        assert_eq!(h.active_colors(), vec![ColorToken::BLUE]);
    }

    #[test]
    fn test_delete_color_removes_redoable_strokes() {
        let mut h = StrokeHistory::new();
        paint(&mut h, ColorToken::BLUE, 1.0);
        paint(&mut h, ColorToken::RED, 2.0);
        h.undo();
        h.delete_color(ColorToken::RED);
        assert_eq!(h.len(), 1);
        assert!(!h.can_redo());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut h = StrokeHistory::new();
        paint(&mut h, ColorToken::RED, 1.0);
        h.begin_stroke(ColorToken::RED, 4.0);
        h.clear();
        assert_eq!(h.index(), -1);
        assert!(h.is_empty());
        assert!(!h.is_drawing());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Paint(u8),
        Undo,
        Redo,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4).prop_map(Op::Paint),
            Just(Op::Undo),
            Just(Op::Redo),
        ]
    }

    fn color(n: u8) -> ColorToken {
        [
            ColorToken::RED,
            ColorToken::GREEN,
            ColorToken::BLUE,
            ColorToken::YELLOW,
        ][n as usize % 4]
    }

    proptest! {
        #[test]
        fn undo_then_redo_restores_active_set(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut h = StrokeHistory::new();
            for (i, op) in ops.iter().enumerate() {
                match op {
                    Op::Paint(c) => paint(&mut h, color(*c), i as f32),
                    Op::Undo => h.undo(),
                    Op::Redo => h.redo(),
                }
                prop_assert!(h.index() >= -1 && h.index() < h.len() as isize);
                prop_assert_eq!(h.can_undo(), h.index() > -1);
                prop_assert_eq!(h.can_redo(), h.index() < h.len() as isize - 1);
            }
            let before = h.active().to_vec();
            if h.can_undo() {
                h.undo();
                h.redo();
            }
            prop_assert_eq!(h.active(), before.as_slice());
        }
    }
}
