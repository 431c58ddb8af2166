use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::JobError;
use crate::document::PageResult;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// `Completed` and `Failed` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asynchronously tracked page recognition.
///
/// Only the transition methods change a job, and they enforce
/// `pending -> processing -> completed | failed`.
#[derive(Debug, Clone)]
pub struct Job {
    id: String,
    status: JobStatus,
    result: Option<PageResult>,
    error: Option<String>,
    created_at: Instant,
    finished_at: Option<Instant>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: Instant::now(),
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&PageResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Time since the job reached a terminal state.
    pub fn finished_for(&self) -> Option<Duration> {
        self.finished_at.map(|at| at.elapsed())
    }

    pub fn begin(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Pending, JobStatus::Processing)
    }

    pub fn complete(&mut self, result: PageResult) -> Result<(), JobError> {
        self.transition(JobStatus::Processing, JobStatus::Completed)?;
        self.result = Some(result);
        self.finished_at = Some(Instant::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Processing, JobStatus::Failed)?;
        self.error = Some(error.into());
        self.finished_at = Some(Instant::now());
        Ok(())
    }

    fn transition(&mut self, from: JobStatus, to: JobStatus) -> Result<(), JobError> {
        if self.status != from {
            return Err(JobError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
