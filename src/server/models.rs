use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageReader, RgbImage};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use crate::document::{LineResult, PageResult};
use crate::jobs::{Job, JobStatus};
use crate::utils::serialization_utils::point_pairs;

/// Model name reported in every recognition response.
pub const MODEL_NAME: &str = "ndlocr-lite";

/// Name used when a JSON request does not carry a usable one.
pub const DEFAULT_IMAGE_NAME: &str = "base64_image.jpg";

/// Name used when a multipart upload does not carry a usable one.
pub const DEFAULT_UPLOAD_NAME: &str = "uploaded_image.jpg";

const ALLOWED_NAME_PUNCTUATION: &[char] = &['.', '_', '-', ' '];

/// Limits applied to submitted images before they reach the engine.
#[derive(Debug, Clone, Copy)]
pub struct ImageLimits {
    /// Maximum decoded size in bytes
    pub max_bytes: usize,
    /// Maximum width * height
    pub max_pixels: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrRequest {
    /// Base64 image data, optionally as a `data:<mime>;base64,` URL
    pub image: String,

    /// Requested model name; accepted for compatibility and otherwise ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Display name of the image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Use the tiered recognizers; `false` reads every line with the largest one
    #[serde(default = "default_cascade")]
    pub cascade: bool,
}

fn default_cascade() -> bool {
    true
}

impl OcrRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            model: None,
            filename: None,
            cascade: true,
        }
    }

    /// Decodes the image, enforcing the byte and pixel limits before the
    /// full decode.
    pub fn validate_and_decode(&self, limits: ImageLimits) -> Result<RgbImage, ValidationError> {
        let bytes = self.decode_base64(limits.max_bytes)?;
        decode_image(&bytes, limits)
    }

    fn decode_base64(&self, max_bytes: usize) -> Result<Vec<u8>, ValidationError> {
        let payload = strip_data_url(self.image.trim());
        if payload.is_empty() {
            return Err(ValidationError::MissingImage);
        }

        let max_encoded = (max_bytes / 3 + 1) * 4;
        if payload.len() > max_encoded {
            return Err(ValidationError::ImageTooLarge { max: max_bytes });
        }

        let decoded = STANDARD
            .decode(payload)
            .map_err(|e| ValidationError::InvalidBase64(e.to_string()))?;

        if decoded.len() > max_bytes {
            return Err(ValidationError::ImageTooLarge { max: max_bytes });
        }

        Ok(decoded)
    }

    pub fn sanitized_name(&self) -> String {
        self.filename
            .as_deref()
            .map(sanitize_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_NAME.to_string())
    }
}

/// Decodes raw image bytes after checking the pixel count from the header.
pub fn decode_image(bytes: &[u8], limits: ImageLimits) -> Result<RgbImage, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::MissingImage);
    }
    if bytes.len() > limits.max_bytes {
        return Err(ValidationError::ImageTooLarge {
            max: limits.max_bytes,
        });
    }

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ValidationError::InvalidImage(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;

    if width == 0 || height == 0 {
        return Err(ValidationError::EmptyImage);
    }

    let pixels = u64::from(width) * u64::from(height);
    if pixels > limits.max_pixels {
        return Err(ValidationError::TooManyPixels {
            pixels,
            max: limits.max_pixels,
        });
    }

    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ValidationError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(|e| ValidationError::InvalidImage(e.to_string()))?;

    Ok(image.to_rgb8())
}

/// Drops everything up to the first comma, which covers any
/// `data:<mime>;base64,` prefix. Base64 payloads never contain commas.
pub fn strip_data_url(image: &str) -> &str {
    image
        .split_once(',')
        .map_or(image, |(_, payload)| payload)
}

/// Keeps alphanumerics in any script and `._- `; everything else is removed.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || ALLOWED_NAME_PUNCTUATION.contains(c))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrLine {
    pub id: usize,
    pub text: String,
    pub confidence: f32,
    #[serde(rename = "boundingBox", with = "point_pairs")]
    pub bounding_box: [geo::Coord<i32>; 4],
}

impl From<LineResult> for OcrLine {
    fn from(line: LineResult) -> Self {
        Self {
            id: line.id,
            text: line.text,
            confidence: line.confidence,
            bounding_box: line.bounding_box,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    pub index: usize,
    /// Full transcript, one line per recognized text line
    pub markdown: String,
    pub width: u32,
    pub height: u32,
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResponse {
    pub model: String,
    pub pages: Vec<OcrPage>,
    pub usage: Usage,
}

impl OcrResponse {
    pub fn from_page(page: PageResult) -> Self {
        let page = OcrPage {
            index: 0,
            markdown: page.text,
            width: page.width,
            height: page.height,
            lines: page.lines.into_iter().map(OcrLine::from).collect(),
        };
        Self {
            model: MODEL_NAME.to_string(),
            pages: vec![page],
            usage: Usage { pages: 1 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreatedResponse {
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OcrResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id().to_string(),
            status: job.status(),
            result: job.result().cloned().map(OcrResponse::from_page),
            error: job.error().map(str::to_string),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine_ready: bool,
    pub version: String,
}

impl HealthResponse {
    pub fn ok(engine_ready: bool) -> Self {
        Self {
            status: "ok".to_string(),
            engine_ready,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
