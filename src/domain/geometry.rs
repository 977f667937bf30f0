//! Geometric types for canvas placement and mask regions

use serde::{Deserialize, Serialize};

/// A point in either screen or image space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size in pixels (container or native image)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Where the image sits inside its container before pan/zoom
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// Letterbox `image` inside `container`, preserving the aspect ratio and centering
    pub fn fit(container: Size, image: Size) -> Option<Placement> {
        if container.is_empty() || image.is_empty() {
            return None;
        }
        let image_aspect = image.width / image.height;
        let container_aspect = container.width / container.height;
        let (width, height) = if image_aspect > container_aspect {
            (container.width, container.width / image_aspect)
        } else {
            (container.height * image_aspect, container.height)
        };
        Some(Placement {
            x: (container.width - width) * 0.5,
            y: (container.height - height) * 0.5,
            width,
            height,
        })
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Axis-aligned mask bounding box in native image pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBox {
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    /// Grow by `margin` on every side without leaving `width` x `height`
    pub fn padded(&self, margin: u32, width: u32, height: u32) -> BBox {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = self.right().saturating_add(margin).min(width);
        let bottom = self.bottom().saturating_add(margin).min(height);
        BBox {
            x,
            y,
            w: right.saturating_sub(x),
            h: bottom.saturating_sub(y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_image_letterboxes_vertically() {
        let p = Placement::fit(Size::new(800.0, 600.0), Size::new(1600.0, 800.0)).unwrap();
        assert_eq!(p.width, 800.0);
        assert_eq!(p.height, 400.0);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 100.0);
    }

    #[test]
    fn test_fit_tall_image_letterboxes_horizontally() {
        let p = Placement::fit(Size::new(800.0, 600.0), Size::new(300.0, 600.0)).unwrap();
        assert_eq!(p.height, 600.0);
        assert_eq!(p.width, 300.0);
        assert_eq!(p.x, 250.0);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_fit_rejects_empty_sizes() {
        assert!(Placement::fit(Size::new(0.0, 600.0), Size::new(10.0, 10.0)).is_none());
        assert!(Placement::fit(Size::new(10.0, 10.0), Size::new(10.0, 0.0)).is_none());
    }

    #[test]
    fn test_padding_clamps_to_bounds() {
        let b = BBox { x: 3, y: 95, w: 4, h: 5 };
        let p = b.padded(10, 100, 100);
        assert_eq!(p, BBox { x: 0, y: 85, w: 17, h: 15 });
        assert!(p.right() <= 100 && p.bottom() <= 100);
    }
}
