use thiserror::Error;

use super::JobStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Job not found: {job_id}")]
    NotFound { job_id: String },

    #[error("Recognition engine is not ready")]
    EngineNotReady,

    #[error("Job queue is full ({capacity} jobs waiting or running)")]
    QueueFull { capacity: usize },

    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
