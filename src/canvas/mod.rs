//! Masking canvas: one image, its view transform and its stroke history
//!
//! A `MaskCanvas` turns pointer events into strokes. Primary-button drags
//! paint, middle-button drags pan, the wheel zooms at the pointer. Strokes are
//! stored in image space and rasterized on demand per color.

pub mod history;
pub mod transform;

pub use history::StrokeHistory;
pub use transform::{ViewTransform, Viewport, ZoomLimits};

use crate::config::{AppConfig, ColorToken};
use crate::domain::{Point, Size, Stroke};
use crate::error::Side;
use crate::imaging::SourceImage;
use crate::render::{self, MaskRaster, RasterTarget};

/// Narrow command interface a parent uses to drive a canvas
pub trait CanvasCommands {
    /// Clear all strokes and return to the fit-to-container view
    fn reset(&mut self);
    fn undo(&mut self);
    fn redo(&mut self);
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PointerButton {
    /// Paints strokes
    Primary,
    /// Pans the view
    Middle,
    Secondary,
}

/// Strokes of one color plus what is needed to rasterize them off-thread
#[derive(Clone, Debug)]
pub struct MaskSnapshot {
    pub color: ColorToken,
    pub strokes: Vec<Stroke>,
    pub target: RasterTarget,
}

impl MaskSnapshot {
    pub fn rasterize(&self) -> MaskRaster {
        render::rasterize(self.color, &self.strokes, &self.target)
    }
}

#[derive(Clone, Debug)]
pub struct MaskCanvas {
    side: Side,
    image: Option<SourceImage>,
    viewport: Viewport,
    history: StrokeHistory,
    /// Last pointer position while the pan button is held
    pan_anchor: Option<Point>,
    bbox_padding: u32,
}

impl MaskCanvas {
    pub fn new(side: Side, container: Size, config: &AppConfig) -> Self {
        Self {
            side,
            image: None,
            viewport: Viewport::new(container, ZoomLimits::from(config)),
            history: StrokeHistory::new(),
            pan_anchor: None,
            bbox_padding: config.bbox_padding,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn history(&self) -> &StrokeHistory {
        &self.history
    }

    /// Replace the image. History is cleared and the view re-fit.
    pub fn load_image(&mut self, image: SourceImage) {
        log::info!(
            "Loaded {} image {}x{}",
            self.side,
            image.width(),
            image.height()
        );
        self.viewport
            .load_image(Size::new(image.width() as f32, image.height() as f32));
        self.image = Some(image);
        self.history.clear();
        self.pan_anchor = None;
    }

    /// Container changed size: re-fit without touching strokes
    pub fn resize(&mut self, container: Size) {
        self.viewport.resize(container);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset_view();
    }

    /// Returns true when a paint stroke started
    pub fn pointer_down(
        &mut self,
        position: Point,
        button: PointerButton,
        color: ColorToken,
        brush_width: f32,
    ) -> bool {
        match button {
            PointerButton::Middle => {
                self.pan_anchor = Some(position);
                false
            }
            PointerButton::Primary => {
                let Some(point) = self.viewport.screen_to_image(position) else {
                    return false;
                };
                self.history
                    .begin_stroke(color, self.viewport.brush_to_image(brush_width));
                self.history.extend_stroke(point);
                true
            }
            PointerButton::Secondary => false,
        }
    }

    pub fn pointer_move(&mut self, position: Point) {
        if let Some(anchor) = self.pan_anchor {
            self.viewport
                .pan(position.x - anchor.x, position.y - anchor.y);
            self.pan_anchor = Some(position);
        } else if self.history.is_drawing()
            && let Some(point) = self.viewport.screen_to_image(position)
        {
            self.history.extend_stroke(point);
        }
    }

    /// Returns true when a stroke was committed
    pub fn pointer_up(&mut self, position: Point, button: PointerButton) -> bool {
        match button {
            PointerButton::Middle => {
                if let Some(anchor) = self.pan_anchor.take() {
                    self.viewport
                        .pan(position.x - anchor.x, position.y - anchor.y);
                }
                false
            }
            PointerButton::Primary => {
                if !self.history.is_drawing() {
                    return false;
                }
                if let Some(point) = self.viewport.screen_to_image(position) {
                    self.history.extend_stroke(point);
                }
                self.history.commit_stroke()
            }
            PointerButton::Secondary => false,
        }
    }

    pub fn cancel_stroke(&mut self) {
        self.history.cancel_stroke();
    }

    pub fn wheel(&mut self, position: Point, delta: f32) {
        self.viewport.zoom_at(position, delta);
    }

    /// Remove every stroke of `color`; not undoable
    pub fn delete_color(&mut self, color: ColorToken) {
        self.history.delete_color(color);
    }

    pub fn has_active(&self, color: ColorToken) -> bool {
        self.history.has_active(color)
    }

    pub fn active_colors(&self) -> Vec<ColorToken> {
        self.history.active_colors()
    }

    /// Raster geometry for this canvas, `None` before an image is loaded
    pub fn raster_target(&self) -> Option<RasterTarget> {
        let image = self.image.as_ref()?;
        Some(
            RasterTarget::new(image.width(), image.height(), self.viewport.space_width())
                .with_padding(self.bbox_padding),
        )
    }

    /// Owned copy of the active strokes of `color`
    pub fn snapshot(&self, color: ColorToken) -> Option<MaskSnapshot> {
        Some(MaskSnapshot {
            color,
            strokes: self.history.active_of(color).cloned().collect(),
            target: self.raster_target()?,
        })
    }

    /// Rasterize the active strokes of `color` at native resolution
    pub fn rasterize(&self, color: ColorToken) -> Option<MaskRaster> {
        let target = self.raster_target()?;
        Some(render::rasterize(color, self.history.active(), &target))
    }
}

impl CanvasCommands for MaskCanvas {
    fn reset(&mut self) {
        self.history.clear();
        self.viewport.reset_view();
        self.pan_anchor = None;
    }

    fn undo(&mut self) {
        self.history.undo();
    }

    fn redo(&mut self) {
        self.history.redo();
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
