//! Fixed-size worker pool for recognition calls.
//!
//! [`WorkerPool`] owns a dedicated rayon thread pool. A batch handed to
//! [`WorkerPool::map`] runs across the workers and the results come back in
//! input order, whatever order the calls finish in. Batches submitted from
//! different threads queue on the same workers.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;

use crate::inference::InferenceError;

pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
}

impl WorkerPool {
    const THREAD_NAME_PREFIX: &'static str = "ocr-worker";

    /// Creates a pool with `size` workers, or one per available core when
    /// `size` is `None` or zero.
    pub fn new(size: Option<usize>) -> Result<Self, InferenceError> {
        let size = match size {
            Some(n) if n > 0 => n,
            _ => Self::default_size(),
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("{}-{}", Self::THREAD_NAME_PREFIX, i))
            .build()
            .map_err(|e| InferenceError::WorkerPool {
                message: e.to_string(),
            })?;

        tracing::debug!("Started worker pool with {} threads", size);

        Ok(Self { pool, size })
    }

    /// Number of available hardware threads, falling back to 4.
    pub fn default_size() -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Applies `f` to every item on the pool's workers.
    ///
    /// Blocks the caller until the whole batch has finished. `result[i]` is
    /// always `f(&items[i])`.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if items.is_empty() {
            return Vec::new();
        }
        self.pool.install(|| items.par_iter().map(f).collect())
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .finish()
    }
}
