//! Patch routing for `auto` pairs using a color-count heuristic and rusty-tesseract
//!
//! Crisp text and logos go to `extract`, everything else to `generate`.

use std::collections::{HashMap, HashSet};

use image::{DynamicImage, Rgba, RgbaImage};

use crate::config::MethodChoice;
use crate::domain::Method;
use crate::error::ClassificationError;
use crate::render::MaskRaster;

/// Heuristic classifier for masked patches
#[derive(Clone, Debug)]
pub struct PatchClassifier {
    /// Whether to fall through to OCR when the color heuristic is inconclusive
    pub ocr_enabled: bool,
    /// At most this many quantized colors counts as flat artwork
    pub max_unique_colors: usize,
    /// Mean word confidence (0-100) above which the patch is treated as text
    pub min_text_confidence: f32,
}

impl Default for PatchClassifier {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            max_unique_colors: 24,
            min_text_confidence: 70.0,
        }
    }
}

impl PatchClassifier {
    pub fn new(ocr_enabled: bool) -> Self {
        Self {
            ocr_enabled,
            ..Self::default()
        }
    }

    /// Resolve a user choice to a concrete method. `auto` never fails: any
    /// classification error falls back to `generate`.
    pub fn resolve(&self, choice: MethodChoice, image: &RgbaImage, mask: &MaskRaster) -> Method {
        match choice {
            MethodChoice::Extract => Method::Extract,
            MethodChoice::Generate => Method::Generate,
            MethodChoice::Auto => self.classify(image, mask).unwrap_or_else(|err| {
                log::warn!("Patch classification failed, using generate: {}", err);
                Method::Generate
            }),
        }
    }

    /// Classify the content of `image` under `mask`
    pub fn classify(
        &self,
        image: &RgbaImage,
        mask: &MaskRaster,
    ) -> Result<Method, ClassificationError> {
        let bbox = mask.bbox.ok_or(ClassificationError::EmptyPatch)?;

        let unique = count_unique_colors(image, mask, self.max_unique_colors + 1);
        if unique == 0 {
            return Err(ClassificationError::EmptyPatch);
        }
        if unique <= self.max_unique_colors {
            log::info!("Patch has {} colors, routing to extract", unique);
            return Ok(Method::Extract);
        }
        if !self.ocr_enabled {
            return Ok(Method::Generate);
        }

        let patch = masked_patch(image, mask, bbox);
        let confidence = text_confidence(&patch)?;
        log::info!("Patch text confidence {:.1}", confidence);
        if confidence >= self.min_text_confidence {
            Ok(Method::Extract)
        } else {
            Ok(Method::Generate)
        }
    }
}

/// Count distinct 4-bit-per-channel colors under the mask, stopping at `limit`
fn count_unique_colors(image: &RgbaImage, mask: &MaskRaster, limit: usize) -> usize {
    let Some(bbox) = mask.bbox else {
        return 0;
    };
    let mut seen = HashSet::new();
    for y in bbox.y..bbox.bottom().min(image.height()) {
        for x in bbox.x..bbox.right().min(image.width()) {
            if !mask.get(x, y) {
                continue;
            }
            let Rgba([r, g, b, _]) = *image.get_pixel(x, y);
            seen.insert((r >> 4, g >> 4, b >> 4));
            if seen.len() >= limit {
                return seen.len();
            }
        }
    }
    seen.len()
}

/// Crop to the bbox, whitening pixels outside the mask
fn masked_patch(image: &RgbaImage, mask: &MaskRaster, bbox: crate::domain::BBox) -> RgbaImage {
    let w = bbox.w.min(image.width().saturating_sub(bbox.x));
    let h = bbox.h.min(image.height().saturating_sub(bbox.y));
    let mut patch = image::imageops::crop_imm(image, bbox.x, bbox.y, w, h).to_image();
    for (x, y, px) in patch.enumerate_pixels_mut() {
        if !mask.get(bbox.x + x, bbox.y + y) {
            *px = Rgba([255, 255, 255, 255]);
        }
    }
    patch
}

/// Mean tesseract word confidence for a patch
fn text_confidence(patch: &RgbaImage) -> Result<f32, ClassificationError> {
    use rusty_tesseract::{Args, Image};

    let dynamic_img = DynamicImage::ImageRgba8(patch.clone());

    // Tesseract works best with text that's at least 10-12 pixels tall
    let min_dimension = patch.width().min(patch.height());
    let processed = if min_dimension < 100 {
        dynamic_img.resize(
            patch.width() * 4,
            patch.height() * 4,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        dynamic_img
    };

    let tess_img = Image::from_dynamic_image(&processed)
        .map_err(|e| ClassificationError::Ocr(format!("failed to create tesseract image: {e}")))?;

    let args = Args {
        lang: "eng".to_string(),
        config_variables: HashMap::new(),
        dpi: Some(300),
        psm: Some(11), // Sparse text
        oem: Some(3),
    };

    let data = rusty_tesseract::image_to_data(&tess_img, &args)
        .map_err(|e| ClassificationError::Ocr(e.to_string()))?;

    let confidences: Vec<f32> = data
        .data
        .iter()
        .filter(|d| !d.text.trim().is_empty() && d.conf > 0.0)
        .map(|d| d.conf)
        .collect();
    if confidences.is_empty() {
        return Ok(0.0);
    }
    Ok(confidences.iter().sum::<f32>() / confidences.len() as f32)
}
