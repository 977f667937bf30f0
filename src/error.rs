//! Error taxonomy for the masking and submission pipeline
//!
//! Validation and incomplete-mask errors are raised before any network
//! traffic. Transport and dimension errors are raised at the submission
//! boundary and leave canvases untouched.

use thiserror::Error;

use crate::config::ColorToken;

pub type Result<T, E = PatchError> = std::result::Result<T, E>;

/// Which canvas a mask or stroke belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Source,
    Reference,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Source => Side::Reference,
            Side::Reference => Side::Source,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Reference => "reference",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("missing {0} image")]
    MissingImage(Side),
    #[error("no paired colors")]
    NoPairedColors,
    #[error("a submission is already in flight")]
    SubmissionInFlight,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IncompleteMaskError {
    #[error("color {color} is only painted on the {side} canvas")]
    Unpaired { color: ColorToken, side: Side },
    #[error("{side} mask for color {color} is empty")]
    EmptyMask { color: ColorToken, side: Side },
    #[error("no valid pairs remain after rasterization")]
    NoValidPairs,
}

/// Auto-routing failure. Always recovered locally by falling back to `generate`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("masked patch is empty")]
    EmptyPatch,
    #[error("text detection failed: {0}")]
    Ocr(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("background task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    IncompleteMask(#[from] IncompleteMaskError),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(
        "processor returned a {actual_width}x{actual_height} image, expected {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("failed to encode mask: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to serialize metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl PatchError {
    /// Whether the error was raised before any network call was made
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            PatchError::Validation(_)
                | PatchError::IncompleteMask(_)
                | PatchError::Classification(_)
                | PatchError::Encode(_)
                | PatchError::Metadata(_)
        )
    }
}
