//! HTTP submission to the external processor
//!
//! Mask rasterization and PNG encoding run on the blocking pool so the
//! caller's event loop stays responsive. The in-flight guard is held until
//! the response has been validated or the submission has failed.

use image::RgbaImage;
use reqwest::{Client, StatusCode};

use super::PendingSubmission;
use super::payload::{Payload, assemble};
use crate::config::AppConfig;
use crate::error::{PatchError, Result, TransportError};

/// Processor output, checked to match the source dimensions
#[derive(Clone, Debug)]
pub struct ProcessedImage {
    /// Response body as returned by the processor
    pub bytes: Vec<u8>,
    pub image: RgbaImage,
}

impl ProcessedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Client for the `<worker_url>/process` endpoint
#[derive(Clone, Debug)]
pub struct Processor {
    client: Client,
    url: String,
}

impl Processor {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(TransportError::from)?;
        Ok(Self::with_client(client, config.process_url()))
    }

    pub fn with_client(client: Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post a payload and validate the returned image against `expected` (width, height)
    pub async fn send(&self, payload: Payload, expected: (u32, u32)) -> Result<ProcessedImage> {
        let pair_count = payload.metadata.pairs.len();
        let part_names = payload.part_names().join(", ");
        let form = payload.into_form()?;

        log::info!("Submitting {} pair(s) to {}", pair_count, self.url);
        log::debug!("Multipart fields: {}", part_names);
        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        log::info!("Processor responded with {}", status);
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    log::warn!("Could not read error body from processor: {}", err);
                    String::new()
                }
            };
            let message = error_message(status, &body);
            log::error!("Processing failed: {}", message);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE)
            && content_type.as_bytes() != b"image/png"
        {
            log::warn!("Unexpected content type from processor: {:?}", content_type);
        }

        let bytes = response.bytes().await.map_err(TransportError::from)?;
        verify_dimensions(bytes.to_vec(), expected)
    }
}

/// Assemble `pending` off-thread and submit it.
///
/// Local state is never touched; on failure the caller can retry with the
/// same canvases.
pub async fn submit(pending: PendingSubmission, processor: &Processor) -> Result<ProcessedImage> {
    let PendingSubmission { request, guard } = pending;
    let expected = (request.source.width(), request.source.height());

    let payload = tokio::task::spawn_blocking(move || assemble(&request))
        .await
        .map_err(|e| TransportError::Task(e.to_string()))??;

    let result = processor.send(payload, expected).await;
    drop(guard);
    result
}

/// Decode a processor response and check it is exactly `expected` (width, height)
pub fn verify_dimensions(bytes: Vec<u8>, expected: (u32, u32)) -> Result<ProcessedImage> {
    let image = image::load_from_memory(&bytes)?.to_rgba8();
    let (actual_width, actual_height) = image.dimensions();
    if (actual_width, actual_height) != expected {
        log::error!(
            "Processor returned {}x{}, expected {}x{}",
            actual_width,
            actual_height,
            expected.0,
            expected.1
        );
        return Err(PatchError::DimensionMismatch {
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width,
            actual_height,
        });
    }
    Ok(ProcessedImage { bytes, image })
}

/// User-facing message for a failed response: the server's structured message
/// if present, else the raw body, else the status line
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
        if let Some(message) = value.as_str() {
            return message.to_string();
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}
