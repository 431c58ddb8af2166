//! Session pool utilities for concurrent model inference.
//!
//! Recognition workers call the same model from several threads at once, but
//! an ONNX session run needs exclusive access. [`SessionPool`] keeps N
//! instances of a model, each behind its own [`Mutex`], and shares one set of
//! [`PrepackedWeights`] across them to keep memory overhead down.

use ort::session::builder::PrepackedWeights;
use parking_lot::{Mutex, MutexGuard};

use crate::inference::InferenceError;

/// Acquires a lock from the pool using try_lock round-robin,
/// falling back to blocking on slot `hint % len` if all are contended.
fn acquire<T>(pool: &[Mutex<T>], hint: usize) -> MutexGuard<'_, T> {
    for m in pool.iter() {
        if let Some(guard) = m.try_lock() {
            return guard;
        }
    }
    pool[hint % pool.len()].lock()
}

/// A pool of N identical model instances sharing [`PrepackedWeights`].
pub struct SessionPool<T> {
    instances: Vec<Mutex<T>>,
}

impl<T> SessionPool<T> {
    /// Creates a pool of `pool_size` instances (at least one).
    pub fn new<F>(pool_size: usize, init: F) -> Result<Self, InferenceError>
    where
        F: Fn(&PrepackedWeights) -> Result<T, InferenceError>,
    {
        let pool_size = pool_size.max(1);
        let weights = PrepackedWeights::new();
        let mut instances = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            instances.push(Mutex::new(init(&weights)?));
        }
        Ok(Self { instances })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Executes a closure with exclusive access to one pooled instance.
    pub fn with<F, R>(&self, f: F) -> Result<R, InferenceError>
    where
        F: FnOnce(&mut T) -> Result<R, InferenceError>,
    {
        let hint = rayon::current_thread_index().unwrap_or(0);
        let mut guard = acquire(&self.instances, hint);
        f(&mut guard)
    }
}
