//! Asynchronous page recognition jobs.

pub mod error;
pub mod record;
pub mod supervisor;

pub use error::JobError;
pub use record::{Job, JobStatus};
pub use supervisor::JobSupervisor;
