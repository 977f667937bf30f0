//! Mask rendering module
//!
//! This module contains:
//! - Per-color mask rasterization using tiny-skia
//! - Mask PNG encoding for submission

pub mod mask;

pub use mask::{MaskRaster, RasterTarget, rasterize};

/// Margin added around mask bounding boxes, in native pixels
pub const DEFAULT_BBOX_PADDING: u32 = 10;
/// Set mask pixel (white)
pub const MASK_ON: u8 = 255;
/// Background mask pixel (black)
pub const MASK_OFF: u8 = 0;
