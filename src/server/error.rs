use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::document::DocumentError;
use crate::jobs::JobError;

/// Problems with a request, detected before the engine is involved.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("No image data provided")]
    MissingImage,

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(String),

    #[error("Image exceeds the maximum size of {max} bytes")]
    ImageTooLarge { max: usize },

    #[error("Image has {pixels} pixels, more than the maximum of {max}")]
    TooManyPixels { pixels: u64, max: u64 },

    #[error("Image could not be decoded: {0}")]
    InvalidImage(String),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Invalid multipart upload: {0}")]
    InvalidUpload(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error")]
    Validation {
        #[from]
        source: ValidationError,
    },

    #[error("Document processing error")]
    Document {
        #[from]
        source: DocumentError,
    },

    #[error("Job error")]
    Job {
        #[from]
        source: JobError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { source } => match source {
                ValidationError::ImageTooLarge { .. } | ValidationError::TooManyPixels { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large")
                }
                _ => (StatusCode::BAD_REQUEST, "Bad Request"),
            },
            AppError::Document { source } => match source {
                DocumentError::EngineNotReady => {
                    (StatusCode::SERVICE_UNAVAILABLE, "Engine Not Ready")
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Recognition Failed",
                ),
            },
            AppError::Job { source } => match source {
                JobError::NotFound { .. } => (StatusCode::NOT_FOUND, "Job not found"),
                JobError::EngineNotReady => {
                    (StatusCode::SERVICE_UNAVAILABLE, "Engine Not Ready")
                }
                JobError::QueueFull { .. } => (StatusCode::TOO_MANY_REQUESTS, "Queue Full"),
                JobError::InvalidTransition { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                }
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        }
    }

    fn details(&self) -> String {
        match self {
            AppError::Validation { source } => source.to_string(),
            AppError::Document { source } => match source {
                DocumentError::ModelProcessingError { source } => {
                    format!("Model processing failed: {source}")
                }
                other => other.to_string(),
            },
            AppError::Job { source } => source.to_string(),
            AppError::Internal(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let details = self.details();

        if status.is_server_error() {
            tracing::error!("{}: {}", kind, details);
        }

        let error_response = ErrorResponse::new(kind).with_details(details);
        (status, Json(error_response)).into_response()
    }
}
