//! Canonical multipart payload for the `/process` endpoint
//!
//! Part order is fixed: `metadata`, `source_image`, `reference_image`, then
//! `source_mask_<i>` and `reference_mask_<i>` for each pair in metadata order.
//! Mask filenames embed the pair's color as `<name>_<rrggbb>.png`.

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::canvas::MaskSnapshot;
use crate::config::{ColorToken, MethodChoice};
use crate::domain::{BBox, Method};
use crate::error::{IncompleteMaskError, Result, Side, TransportError};
use crate::imaging::{PatchClassifier, SourceImage};

const PNG_MIME: &str = "image/png";

/// One paired color as captured at submission time
#[derive(Clone, Debug)]
pub struct PairRequest {
    pub color: ColorToken,
    pub method: MethodChoice,
    pub source: MaskSnapshot,
    pub reference: MaskSnapshot,
}

/// Everything needed to assemble a payload, detached from the live canvases
#[derive(Clone, Debug)]
pub struct SubmissionRequest {
    pub source: SourceImage,
    pub reference: SourceImage,
    pub pairs: Vec<PairRequest>,
    pub enforce_fixed_canvas: bool,
    pub sequential: bool,
    pub classifier: PatchClassifier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PairMetadata {
    #[serde(rename = "colorId")]
    pub color_id: String,
    pub method: Method,
    #[serde(rename = "sourceBBox")]
    pub source_bbox: Option<BBox>,
    #[serde(rename = "referenceBBox")]
    pub reference_bbox: Option<BBox>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Native source width; the processor must return exactly this size
    pub width: u32,
    pub height: u32,
    pub enforce_fixed_canvas: bool,
    pub sequential: bool,
    pub pairs: Vec<PairMetadata>,
}

/// A file field of the multipart body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Payload {
    pub metadata: Metadata,
    /// File parts in submission order
    pub parts: Vec<FilePart>,
}

impl Payload {
    pub fn metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.metadata)?)
    }

    pub fn part(&self, name: &str) -> Option<&FilePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    /// Build the reqwest form, consuming the payload
    pub fn into_form(self) -> Result<Form> {
        let mut form = Form::new().text("metadata", self.metadata_json()?);
        for part in self.parts {
            let file = Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str(part.mime)
                .map_err(TransportError::from)?;
            form = form.part(part.name, file);
        }
        Ok(form)
    }
}

/// Field name and filename of a pair's mask
pub fn mask_part_name(side: Side, index: usize, color: ColorToken) -> (String, String) {
    let name = format!("{}_mask_{}", side.name(), index);
    let file_name = format!("{}_{}.png", name, color.hex());
    (name, file_name)
}

/// Rasterize, classify and encode every pair into a payload.
///
/// Pairs whose mask turned out empty on either side are skipped with a
/// warning. If none survive, fails with `NoValidPairs`.
pub fn assemble(request: &SubmissionRequest) -> Result<Payload> {
    let mut pairs = Vec::new();
    let mut mask_parts = Vec::new();

    for pair in &request.pairs {
        let source_mask = pair.source.rasterize();
        let reference_mask = pair.reference.rasterize();

        if source_mask.is_empty() || reference_mask.is_empty() {
            let side = if source_mask.is_empty() {
                Side::Source
            } else {
                Side::Reference
            };
            log::warn!(
                "Skipping pair {}: {}",
                pair.color,
                IncompleteMaskError::EmptyMask {
                    color: pair.color,
                    side
                }
            );
            continue;
        }

        let method =
            request
                .classifier
                .resolve(pair.method, request.reference.rgba(), &reference_mask);

        let index = pairs.len();
        for (side, mask) in [(Side::Source, &source_mask), (Side::Reference, &reference_mask)] {
            let (name, file_name) = mask_part_name(side, index, pair.color);
            mask_parts.push(FilePart {
                name,
                file_name,
                mime: PNG_MIME,
                bytes: mask.to_png()?,
            });
        }

        log::info!(
            "Pair {} -> {} ({}), source bbox {:?}, reference bbox {:?}",
            index,
            pair.color,
            method.name(),
            source_mask.bbox,
            reference_mask.bbox
        );
        pairs.push(PairMetadata {
            color_id: pair.color.id(),
            method,
            source_bbox: source_mask.bbox,
            reference_bbox: reference_mask.bbox,
        });
    }

    if pairs.is_empty() {
        return Err(IncompleteMaskError::NoValidPairs.into());
    }

    let mut parts = vec![
        FilePart {
            name: "source_image".to_string(),
            file_name: "source.png".to_string(),
            mime: request.source.mime_type(),
            bytes: request.source.bytes().to_vec(),
        },
        FilePart {
            name: "reference_image".to_string(),
            file_name: "reference.png".to_string(),
            mime: request.reference.mime_type(),
            bytes: request.reference.bytes().to_vec(),
        },
    ];
    parts.extend(mask_parts);

    Ok(Payload {
        metadata: Metadata {
            width: request.source.width(),
            height: request.source.height(),
            enforce_fixed_canvas: request.enforce_fixed_canvas,
            sequential: request.sequential,
            pairs,
        },
        parts,
    })
}
