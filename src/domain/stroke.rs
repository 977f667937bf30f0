//! Stroke and correction task types
//!
//! Stroke coordinates are stored in image space (see `canvas::transform`), so
//! container resizes and view changes never touch committed strokes.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::config::ColorToken;

/// One committed freehand paint gesture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: ColorToken,
    /// Path points in image space
    pub path: Vec<Point>,
    /// Brush width in image-space units
    pub brush_width: f32,
}

/// Resolved correction strategy sent to the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Geometry-preserving warp, for crisp text and logos
    Extract,
    /// AI re-synthesis, for textures and photographic content
    Generate,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Extract => "extract",
            Method::Generate => "generate",
        }
    }
}
