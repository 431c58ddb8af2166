use axum::{
    extract::{Path, State},
    response::Json,
};

use super::error::AppError;
use super::models::{HealthResponse, JobCreatedResponse, JobStatusResponse, OcrResponse};
use super::upload::ImageUpload;
use super::AppState;
use crate::jobs::JobStatus;

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.engine.is_ready()))
}

/// Synchronous recognition of one page image
pub async fn recognize(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> Result<Json<OcrResponse>, AppError> {
    tracing::info!("Received recognition request for {}", upload.name);

    let limits = state.image_limits();
    let engine = state.engine.clone();

    let page = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let image = upload.decode(limits)?;
        let assembler = engine.get()?;
        Ok(assembler.recognize(&image, &upload.name, upload.cascade)?)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Recognition task failed: {e}")))??;

    tracing::info!("Recognized {} lines for {}", page.lines.len(), page.name);

    Ok(Json(OcrResponse::from_page(page)))
}

/// Queues one page image for background recognition
pub async fn create_job(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> Result<Json<JobCreatedResponse>, AppError> {
    let limits = state.image_limits();

    let (image, upload) = tokio::task::spawn_blocking(move || {
        upload.decode(limits).map(|image| (image, upload))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Image decoding task failed: {e}")))??;

    let job_id = state.jobs.submit(image, upload.name, upload.cascade)?;

    Ok(Json(JobCreatedResponse {
        job_id,
        status: JobStatus::Pending,
    }))
}

/// Current status of a job
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = state.jobs.get(&job_id)?;
    Ok(Json(JobStatusResponse::from(job)))
}
