//! Uploaded source/reference image with original bytes and decoded pixels

use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};

use crate::error::{Result, ValidationError};

/// An uploaded image: the original file bytes (sent untouched) plus decoded RGBA
#[derive(Clone, Debug)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
    rgba: Arc<RgbaImage>,
    format: ImageFormat,
}

impl SourceImage {
    /// Decode uploaded bytes. Only PNG, JPEG and WebP are accepted.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&bytes)
            .map_err(|_| ValidationError::UnsupportedFileType("unknown".to_string()))?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP) {
            return Err(ValidationError::UnsupportedFileType(format!("{format:?}")).into());
        }
        let rgba = image::load_from_memory_with_format(&bytes, format)?.to_rgba8();
        log::debug!(
            "Loaded {:?} image: {}x{} pixels",
            format,
            rgba.width(),
            rgba.height()
        );
        Ok(Self {
            bytes: bytes.into(),
            rgba: Arc::new(rgba),
            format,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Wrap an in-memory image, encoding it as PNG for upload
    pub fn from_rgba(rgba: RgbaImage) -> Result<Self> {
        let mut bytes = Vec::new();
        rgba.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(Self {
            bytes: bytes.into(),
            rgba: Arc::new(rgba),
            format: ImageFormat::Png,
        })
    }

    /// Original file bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Get the native width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the native height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}
