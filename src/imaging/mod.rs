//! Uploaded image handling and patch classification
//!
//! This module consolidates:
//! - Source/reference image type (image.rs)
//! - Auto-method patch classifier (classify.rs)

pub mod classify;
pub mod image;

pub use classify::PatchClassifier;
pub use image::SourceImage;
