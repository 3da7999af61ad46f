//! Reusable instance pool.
//!
//! Poll cycles lease their short-lived request/response objects from a
//! [`Pool`] instead of allocating them; a [`Lease`] guard hands the
//! instance back on every exit path, including panics and early returns.
//! Instances are reset to construction-equivalent state before reuse.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

/// Reset contract for pooled instances.
pub trait Reusable {
    /// Restore all externally observable state to construction defaults:
    /// cleared collections, zeroed scalars, cleared callback
    /// subscriptions. Retaining allocated capacity is expected.
    ///
    /// Returns `false` if the instance cannot be safely reused, in which
    /// case the pool discards it. Must be idempotent.
    fn reset(&mut self) -> bool;
}

/// Byte and element buffers pool as-is: clearing keeps capacity.
impl<T> Reusable for Vec<T> {
    fn reset(&mut self) -> bool {
        self.clear();
        true
    }
}

struct Shared<T> {
    idle: Mutex<Vec<T>>,
}

/// A thread-safe pool of reusable instances.
///
/// `lease`/return are safe to call concurrently from any thread; the
/// leased instance itself is exclusively owned by its guard and is used
/// from a single thread for the lifetime of the lease. The pool grows to
/// the working-set high-water mark and holds idle instances for the
/// process lifetime.
pub struct Pool<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Reusable + Default> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Reusable + Default> Pool<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                idle: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Take a ready-to-use instance: a recycled one if available,
    /// otherwise freshly constructed.
    pub fn lease(&self) -> Lease<T> {
        let instance = self
            .shared
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Lease {
            instance: Some(instance),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Pre-populate the pool with `count` fresh instances.
    pub fn warm(&self, count: usize) {
        let mut idle = self
            .shared
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for _ in 0..count {
            idle.push(T::default());
        }
    }

    /// Number of idle instances currently held.
    pub fn idle_count(&self) -> usize {
        self.shared
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop idle instances beyond `keep`.
    pub fn shrink_to(&self, keep: usize) {
        self.shared
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .truncate(keep);
    }
}

/// Scoped, exclusive lease of a pooled instance.
///
/// Dropping the lease resets the instance and returns it to the pool; a
/// failed reset discards it instead. An instance is never observable by
/// two live leases.
pub struct Lease<T: Reusable> {
    instance: Option<T>,
    shared: Arc<Shared<T>>,
}

impl<T: Reusable> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.instance.as_ref().expect("lease instance present")
    }
}

impl<T: Reusable> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.instance.as_mut().expect("lease instance present")
    }
}

impl<T: Reusable> Drop for Lease<T> {
    fn drop(&mut self) {
        if let Some(mut instance) = self.instance.take()
            && instance.reset()
        {
            self.shared
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(instance);
        }
    }
}
