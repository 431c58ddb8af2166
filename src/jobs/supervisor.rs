//! Job table and background execution.
//!
//! The table is a [`DashMap`], so polls and status updates for different jobs
//! never contend on a single lock. Two semaphores bound the work:
//! `queue_slots` caps jobs that are not yet terminal (submissions beyond it
//! are rejected), and `run_slots` caps jobs executing at once.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use image::RgbImage;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{Job, JobError, JobStatus};
use crate::document::PageAssembler;
use crate::inference::EngineSlot;
use crate::utils::config::AppConfig;

pub struct JobSupervisor {
    jobs: DashMap<String, Job>,
    engine: Arc<EngineSlot>,
    queue_slots: Arc<Semaphore>,
    run_slots: Arc<Semaphore>,
    capacity: usize,
    retention: Option<Duration>,
}

impl JobSupervisor {
    pub fn new(
        engine: Arc<EngineSlot>,
        max_queued_jobs: usize,
        max_concurrent_jobs: usize,
        retention: Option<Duration>,
    ) -> Self {
        let capacity = max_queued_jobs.max(1);
        Self {
            jobs: DashMap::new(),
            engine,
            queue_slots: Arc::new(Semaphore::new(capacity)),
            run_slots: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            capacity,
            retention,
        }
    }

    pub fn from_config(engine: Arc<EngineSlot>, config: &AppConfig) -> Self {
        Self::new(
            engine,
            config.max_queued_jobs,
            config.max_concurrent_jobs,
            config.job_retention_secs.map(Duration::from_secs),
        )
    }

    /// Registers a pending job and schedules it, returning its identifier.
    ///
    /// Never waits for the job to start. Must be called from within a Tokio
    /// runtime. Rejected submissions never enter the table.
    pub fn submit(
        self: &Arc<Self>,
        image: RgbImage,
        name: String,
        cascade: bool,
    ) -> Result<String, JobError> {
        let assembler = self.engine.get().map_err(|_| JobError::EngineNotReady)?;

        let queue_permit = Arc::clone(&self.queue_slots)
            .try_acquire_owned()
            .map_err(|_| JobError::QueueFull {
                capacity: self.capacity,
            })?;

        let job_id = Uuid::new_v4().to_string();
        self.jobs.insert(job_id.clone(), Job::new(job_id.clone()));
        info!("Job {} submitted for {}", job_id, name);

        let supervisor = Arc::clone(self);
        let id = job_id.clone();
        tokio::spawn(async move {
            let _queue_permit = queue_permit;

            let _run_permit = match Arc::clone(&supervisor.run_slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    supervisor.abandon(&id, format!("Job scheduling failed: {e}"));
                    return;
                }
            };

            let worker = Arc::clone(&supervisor);
            let worker_id = id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                worker.run(&worker_id, &assembler, &image, &name, cascade);
            });

            if let Err(e) = handle.await {
                supervisor.abandon(&id, format!("Job execution aborted: {e}"));
            }
        });

        Ok(job_id)
    }

    /// Returns a snapshot of the job's current record.
    pub fn get(&self, job_id: &str) -> Result<Job, JobError> {
        self.jobs
            .get(job_id)
            .map(|job| job.clone())
            .ok_or_else(|| JobError::NotFound {
                job_id: job_id.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs submitted but not yet completed or failed.
    pub fn active_jobs(&self) -> usize {
        self.capacity - self.queue_slots.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention
    }

    /// Evicts terminal jobs older than the configured retention.
    pub fn purge_expired(&self) -> usize {
        match self.retention {
            Some(max_age) => self.purge_finished_older_than(max_age),
            None => 0,
        }
    }

    /// Evicts terminal jobs that finished at least `max_age` ago.
    ///
    /// Pending and processing jobs are never evicted.
    pub fn purge_finished_older_than(&self, max_age: Duration) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| {
            !matches!(job.finished_for(), Some(age) if job.is_terminal() && age >= max_age)
        });
        let removed = before.saturating_sub(self.jobs.len());
        if removed > 0 {
            debug!("Evicted {} finished jobs", removed);
        }
        removed
    }

    /// Executes one job on the calling thread and records its outcome.
    fn run(
        &self,
        job_id: &str,
        assembler: &PageAssembler,
        image: &RgbImage,
        name: &str,
        cascade: bool,
    ) {
        if let Err(e) = self.update(job_id, |job| job.begin()) {
            error!("Job {} could not start: {}", job_id, e);
            return;
        }

        debug!("Job {} processing", job_id);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            assembler.recognize(image, name, cascade)
        }));

        let recorded = match outcome {
            Ok(Ok(page)) => {
                info!("Job {} completed with {} lines", job_id, page.lines.len());
                self.update(job_id, |job| job.complete(page))
            }
            Ok(Err(e)) => {
                error!("Job {} failed: {}", job_id, e);
                self.update(job_id, |job| job.fail(e.to_string()))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("Job {} panicked: {}", job_id, message);
                self.update(job_id, |job| job.fail(format!("Internal error: {message}")))
            }
        };

        if let Err(e) = recorded {
            error!("Job {} outcome was not recorded: {}", job_id, e);
        }
    }

    /// Moves a job that never reached a terminal state to `failed`.
    fn abandon(&self, job_id: &str, message: String) {
        error!("Job {}: {}", job_id, message);
        let result = self.update(job_id, |job| {
            if job.status() == JobStatus::Pending {
                job.begin()?;
            }
            if job.is_terminal() {
                return Ok(());
            }
            job.fail(message)
        });
        if let Err(e) = result {
            error!("Job {} could not be marked failed: {}", job_id, e);
        }
    }

    fn update<F>(&self, job_id: &str, f: F) -> Result<(), JobError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobError>,
    {
        match self.jobs.get_mut(job_id) {
            Some(mut job) => f(&mut job),
            None => Err(JobError::NotFound {
                job_id: job_id.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for JobSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSupervisor")
            .field("jobs", &self.jobs.len())
            .field("capacity", &self.capacity)
            .field("retention", &self.retention)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
