//! Screen-to-image coordinate mapping for one canvas
//!
//! Three spaces are involved:
//! - screen: pointer position inside the container
//! - canvas: screen with pan/zoom removed (`(screen - offset) / scale`)
//! - image: canvas relative to the letterboxed placement origin, expressed in
//!   the placement size computed when the image was loaded
//!
//! Image space is pinned to the load-time placement width (`space_width`), so
//! re-fitting after a container resize rescales incoming points instead of
//! invalidating strokes that were already committed.

use crate::domain::{Placement, Point, Size};

/// Pan and zoom of one canvas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn screen_to_canvas(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.scale,
            (p.y - self.offset_y) / self.scale,
        )
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset_x,
            p.y * self.scale + self.offset_y,
        )
    }

    /// Zoom anchored at `pointer`: the canvas point under the pointer stays put
    pub fn zoom_at(&mut self, pointer: Point, delta: f32, limits: &ZoomLimits) {
        let new_scale = (self.scale + delta * limits.sensitivity).clamp(limits.min, limits.max);
        if new_scale == self.scale {
            return;
        }
        let anchor = self.screen_to_canvas(pointer);
        self.scale = new_scale;
        self.offset_x = pointer.x - anchor.x * new_scale;
        self.offset_y = pointer.y - anchor.y * new_scale;
    }

    /// Translate by a screen-space delta
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub sensitivity: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 10.0,
            sensitivity: 0.001,
        }
    }
}

impl From<&crate::config::AppConfig> for ZoomLimits {
    fn from(config: &crate::config::AppConfig) -> Self {
        Self {
            min: config.min_scale,
            max: config.max_scale,
            sensitivity: config.zoom_sensitivity,
        }
    }
}

/// Full view state of one canvas: container, placement and pan/zoom
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub transform: ViewTransform,
    pub limits: ZoomLimits,
    container: Size,
    image: Option<Size>,
    placement: Option<Placement>,
    space_width: f32,
}

impl Viewport {
    pub fn new(container: Size, limits: ZoomLimits) -> Self {
        Self {
            transform: ViewTransform::default(),
            limits,
            container,
            image: None,
            placement: None,
            space_width: 0.0,
        }
    }

    /// Fit a freshly loaded image, pinning image space to this placement
    pub fn load_image(&mut self, native: Size) {
        self.image = Some(native);
        self.placement = Placement::fit(self.container, native);
        self.space_width = self.placement.map(|p| p.width).unwrap_or(0.0);
        self.transform = ViewTransform::default();
    }

    /// Re-fit after the container changed size. Image space is untouched.
    pub fn resize(&mut self, container: Size) {
        self.container = container;
        if let Some(native) = self.image {
            self.placement = Placement::fit(container, native);
            if self.space_width <= 0.0 {
                self.space_width = self.placement.map(|p| p.width).unwrap_or(0.0);
            }
        }
    }

    /// Back to the fit-to-container default view
    pub fn reset_view(&mut self) {
        self.transform = ViewTransform::default();
    }

    pub fn container(&self) -> Size {
        self.container
    }

    pub fn placement(&self) -> Option<Placement> {
        self.placement
    }

    /// Width of image space (the load-time placement width)
    pub fn space_width(&self) -> f32 {
        self.space_width
    }

    /// Ratio of image-space units to current placement pixels
    fn refit_ratio(&self, placement: &Placement) -> f32 {
        if placement.width > 0.0 {
            self.space_width / placement.width
        } else {
            1.0
        }
    }

    /// Map a screen point into image space. `None` before an image is placed.
    pub fn screen_to_image(&self, screen: Point) -> Option<Point> {
        let placement = self.placement?;
        let canvas = self.transform.screen_to_canvas(screen);
        let ratio = self.refit_ratio(&placement);
        Some(Point::new(
            (canvas.x - placement.x) * ratio,
            (canvas.y - placement.y) * ratio,
        ))
    }

    /// Map an image-space point back onto the screen (for previews)
    pub fn image_to_screen(&self, image: Point) -> Option<Point> {
        let placement = self.placement?;
        let ratio = self.refit_ratio(&placement);
        let canvas = Point::new(image.x / ratio + placement.x, image.y / ratio + placement.y);
        Some(self.transform.canvas_to_screen(canvas))
    }

    /// Convert a brush width in placement pixels into image-space units
    pub fn brush_to_image(&self, width: f32) -> f32 {
        match self.placement {
            Some(placement) => width * self.refit_ratio(&placement),
            None => width,
        }
    }

    pub fn zoom_at(&mut self, pointer: Point, delta: f32) {
        let limits = self.limits;
        self.transform.zoom_at(pointer, delta, &limits);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.transform.pan(dx, dy);
    }
}
