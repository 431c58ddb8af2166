//! Request body extraction for the recognition endpoints.
//!
//! Both `POST /v1/ocr` and `POST /v1/ocr/jobs` take either a
//! `multipart/form-data` upload with a `file` part or the JSON [`OcrRequest`]
//! body. Both forms go through the same size and pixel limits.

use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use image::RgbImage;

use super::error::{AppError, ValidationError};
use super::models::{decode_image, sanitize_name, ImageLimits, OcrRequest, DEFAULT_UPLOAD_NAME};
use super::AppState;

const FILE_FIELD: &str = "file";
const CASCADE_FIELD: &str = "cascade";

#[derive(Debug)]
enum Payload {
    Base64(OcrRequest),
    Bytes(Vec<u8>),
}

/// An image submitted for recognition, not yet decoded.
#[derive(Debug)]
pub struct ImageUpload {
    pub name: String,
    pub cascade: bool,
    payload: Payload,
}

impl ImageUpload {
    pub fn decode(&self, limits: ImageLimits) -> Result<RgbImage, ValidationError> {
        match &self.payload {
            Payload::Base64(request) => request.validate_and_decode(limits),
            Payload::Bytes(bytes) => decode_image(bytes, limits),
        }
    }

    fn from_json(request: OcrRequest) -> Self {
        Self {
            name: request.sanitized_name(),
            cascade: request.cascade,
            payload: Payload::Base64(request),
        }
    }

    async fn from_multipart(
        mut multipart: Multipart,
        limits: ImageLimits,
    ) -> Result<Self, ValidationError> {
        let mut file: Option<(Vec<u8>, Option<String>)> = None;
        let mut cascade = true;

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| upload_error(e, limits))?
        {
            let field_name = field.name().map(str::to_string);
            match field_name.as_deref() {
                Some(FILE_FIELD) => {
                    let file_name = field.file_name().map(str::to_string);
                    let mut bytes = Vec::new();
                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|e| upload_error(e, limits))?
                    {
                        if bytes.len() + chunk.len() > limits.max_bytes {
                            return Err(ValidationError::ImageTooLarge {
                                max: limits.max_bytes,
                            });
                        }
                        bytes.extend_from_slice(&chunk);
                    }
                    file = Some((bytes, file_name));
                }
                Some(CASCADE_FIELD) => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| upload_error(e, limits))?;
                    cascade = parse_flag(&value)?;
                }
                _ => {}
            }
        }

        let (bytes, file_name) = file.ok_or(ValidationError::MissingImage)?;
        let name = file_name
            .as_deref()
            .map(sanitize_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_NAME.to_string());

        Ok(Self {
            name,
            cascade,
            payload: Payload::Bytes(bytes),
        })
    }
}

fn upload_error(error: MultipartError, limits: ImageLimits) -> ValidationError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::ImageTooLarge {
            max: limits.max_bytes,
        }
    } else {
        ValidationError::InvalidUpload(error.body_text())
    }
}

fn parse_flag(value: &str) -> Result<bool, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ValidationError::InvalidUpload(format!(
            "invalid cascade value: {other}"
        ))),
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

#[async_trait]
impl FromRequest<AppState> for ImageUpload {
    type Rejection = AppError;

    async fn from_request(request: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_multipart(&request) {
            let multipart = Multipart::from_request(request, state)
                .await
                .map_err(|e| ValidationError::InvalidUpload(e.body_text()))?;
            Ok(Self::from_multipart(multipart, state.image_limits()).await?)
        } else {
            let Json(body) = Json::<OcrRequest>::from_request(request, state)
                .await
                .map_err(|e| ValidationError::InvalidRequest(e.body_text()))?;
            Ok(Self::from_json(body))
        }
    }
}
