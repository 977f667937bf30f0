//! Per-color mask rasterization using tiny-skia
//!
//! Masks are rendered at the native image resolution, white strokes on black,
//! with round caps and joins. Anti-aliasing is disabled so the raster stays
//! binary and byte-identical across runs.

use tiny_skia::{
    Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke as SkStroke, Transform,
};

use super::{DEFAULT_BBOX_PADDING, MASK_OFF, MASK_ON};
use crate::config::ColorToken;
use crate::domain::{BBox, Stroke};

/// Native raster dimensions and the image space strokes were recorded in
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterTarget {
    pub native_width: u32,
    pub native_height: u32,
    /// Width of the image space the stroke coordinates live in
    pub placement_width: f32,
    /// Margin added around the tight bounding box
    pub padding: u32,
}

impl RasterTarget {
    pub fn new(native_width: u32, native_height: u32, placement_width: f32) -> Self {
        Self {
            native_width,
            native_height,
            placement_width,
            padding: DEFAULT_BBOX_PADDING,
        }
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Native pixels per image-space unit
    pub fn render_scale(&self) -> f32 {
        if self.placement_width > 0.0 {
            self.native_width as f32 / self.placement_width
        } else {
            1.0
        }
    }
}

/// Binary mask for one color on one canvas
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskRaster {
    pub width: u32,
    pub height: u32,
    /// One byte per pixel, `MASK_ON` or `MASK_OFF`
    pub pixels: Vec<u8>,
    /// Padded bounding box of set pixels, `None` when nothing is set
    pub bbox: Option<BBox>,
}

impl MaskRaster {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![MASK_OFF; width as usize * height as usize],
            bbox: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bbox.is_none()
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.pixels[(y * self.width + x) as usize] == MASK_ON
    }

    /// Encode as an 8-bit single-channel PNG
    pub fn to_png(&self) -> Result<Vec<u8>, png::EncodingError> {
        let mut buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut buf, self.width, self.height);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(buf)
    }
}

/// Build a polyline path in native pixel coordinates
fn build_stroke_path(stroke: &Stroke, scale: f32) -> Option<tiny_skia::Path> {
    let (first, rest) = stroke.path.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x * scale, first.y * scale);
    for p in rest {
        pb.line_to(p.x * scale, p.y * scale);
    }
    pb.finish()
}

/// Tight bounding box of set pixels, before padding
fn scan_bbox(pixels: &[u8], width: u32, height: u32) -> Option<BBox> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for y in 0..height {
        let row = &pixels[(y * width) as usize..((y + 1) * width) as usize];
        for (x, value) in row.iter().enumerate() {
            if *value != MASK_OFF {
                let x = x as u32;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
                found = true;
            }
        }
    }

    found.then(|| BBox {
        x: min_x,
        y: min_y,
        w: max_x - min_x + 1,
        h: max_y - min_y + 1,
    })
}

/// Rasterize the strokes of `color` among `strokes` into a native-resolution mask.
///
/// Strokes of other colors are ignored. Returns an empty mask (no bbox) when
/// no stroke of `color` is present or nothing lands inside the raster.
pub fn rasterize(color: ColorToken, strokes: &[Stroke], target: &RasterTarget) -> MaskRaster {
    let (w, h) = (target.native_width, target.native_height);
    let mut matching = strokes.iter().filter(|s| s.color == color).peekable();
    if matching.peek().is_none() {
        return MaskRaster::empty(w, h);
    }
    let Some(mut pixmap) = Pixmap::new(w, h) else {
        return MaskRaster::empty(w, h);
    };
    pixmap.fill(Color::BLACK);

    let scale = target.render_scale();
    let mut paint = Paint::default();
    paint.set_color(Color::WHITE);
    paint.anti_alias = false;

    for stroke in matching {
        let Some(path) = build_stroke_path(stroke, scale) else {
            continue;
        };
        let sk_stroke = SkStroke {
            width: stroke.brush_width * scale,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &sk_stroke, Transform::identity(), None);
    }

    let pixels: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .map(|px| if px[0] >= 128 { MASK_ON } else { MASK_OFF })
        .collect();
    let bbox = scan_bbox(&pixels, w, h).map(|b| b.padded(target.padding, w, h));
    log::debug!(
        "Rasterized {} mask at {}x{} (scale {:.3}), bbox {:?}",
        color,
        w,
        h,
        scale,
        bbox
    );

    MaskRaster {
        width: w,
        height: h,
        pixels,
        bbox,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;
    use proptest::prelude::*;

    fn stroke(color: ColorToken, points: &[(f32, f32)], width: f32) -> Stroke {
        Stroke {
            color,
            path: points.iter().map(|(x, y)| Point::new(*x, *y)).collect(),
            brush_width: width,
        }
    }

    #[test]
    fn test_no_matching_stroke_gives_empty_mask() {
        let strokes = vec![stroke(ColorToken::BLUE, &[(10.0, 10.0), (50.0, 50.0)], 5.0)];
        let mask = rasterize(ColorToken::RED, &strokes, &RasterTarget::new(100, 100, 100.0));
        assert!(mask.is_empty());
        assert!(!mask.pixels.contains(&MASK_ON));
        assert_eq!(mask.pixels.len(), 100 * 100);
    }

    #[test]
    fn test_horizontal_stroke_bbox() {
        let strokes = vec![stroke(ColorToken::RED, &[(100.0, 100.0), (200.0, 100.0)], 20.0)];
        let target = RasterTarget::new(500, 500, 500.0).with_padding(10);
        let mask = rasterize(ColorToken::RED, &strokes, &target);
        let bbox = mask.bbox.unwrap();
        // round caps extend 10px past each end, padding adds 10 more
        assert!((78..=82).contains(&bbox.x), "{bbox:?}");
        assert!((78..=82).contains(&bbox.y), "{bbox:?}");
        assert!((138..=144).contains(&bbox.w), "{bbox:?}");
        assert!((38..=42).contains(&bbox.h), "{bbox:?}");
        assert!(mask.get(150, 100));
        assert!(!mask.get(150, 130));
    }

    #[test]
    fn test_render_scale_applies_to_points_and_width() {
        // image space is 250 wide, native is 500: everything doubles
        let strokes = vec![stroke(ColorToken::RED, &[(50.0, 50.0), (100.0, 50.0)], 10.0)];
        let target = RasterTarget::new(500, 500, 250.0).with_padding(0);
        let mask = rasterize(ColorToken::RED, &strokes, &target);
        let bbox = mask.bbox.unwrap();
        assert!((88..=92).contains(&bbox.x), "{bbox:?}");
        assert!((88..=92).contains(&bbox.y), "{bbox:?}");
        assert!(mask.get(150, 100));
        assert!(!mask.get(150, 115));
    }

    #[test]
    fn test_other_colors_do_not_leak() {
        let strokes = vec![
            stroke(ColorToken::RED, &[(10.0, 10.0), (40.0, 10.0)], 6.0),
            stroke(ColorToken::BLUE, &[(10.0, 80.0), (90.0, 80.0)], 6.0),
        ];
        let mask = rasterize(ColorToken::RED, &strokes, &RasterTarget::new(100, 100, 100.0));
        assert!(mask.get(25, 10));
        assert!(!mask.get(50, 80));
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let strokes = vec![
            stroke(ColorToken::RED, &[(12.3, 40.7), (80.1, 33.3), (60.0, 90.9)], 7.5),
            stroke(ColorToken::RED, &[(70.0, 10.0), (20.0, 75.5)], 3.25),
        ];
        let target = RasterTarget::new(137, 91, 120.0);
        let a = rasterize(ColorToken::RED, &strokes, &target);
        let b = rasterize(ColorToken::RED, &strokes, &target);
        assert_eq!(a, b);
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let strokes = vec![stroke(ColorToken::RED, &[(5.0, 5.0), (30.0, 20.0)], 4.0)];
        let mask = rasterize(ColorToken::RED, &strokes, &RasterTarget::new(64, 48, 64.0));
        let png_bytes = mask.to_png().unwrap();
        let decoded = image::load_from_memory(&png_bytes).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (64, 48));
        assert_eq!(decoded.as_raw(), &mask.pixels);
    }

    #[test]
    fn test_stroke_outside_raster_has_no_bbox() {
        let strokes = vec![stroke(ColorToken::RED, &[(-50.0, -50.0), (-20.0, -50.0)], 4.0)];
        let mask = rasterize(ColorToken::RED, &strokes, &RasterTarget::new(64, 64, 64.0));
        assert!(mask.is_empty());
    }

    proptest! {
        #[test]
        fn bbox_stays_inside_raster(
            x0 in -20.0f32..120.0,
            y0 in -20.0f32..120.0,
            x1 in -20.0f32..120.0,
            y1 in -20.0f32..120.0,
            width in 1.0f32..30.0,
            padding in 0u32..40,
        ) {
            let strokes = vec![stroke(ColorToken::RED, &[(x0, y0), (x1, y1)], width)];
            let target = RasterTarget::new(100, 80, 100.0).with_padding(padding);
            let mask = rasterize(ColorToken::RED, &strokes, &target);
            if let Some(b) = mask.bbox {
                prop_assert!(b.x + b.w <= 100);
                prop_assert!(b.y + b.h <= 80);
                prop_assert!(b.w > 0 && b.h > 0);
            }
        }
    }
}
