//! At-most-once callbacks.

use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

type Pending<T> = Box<dyn FnOnce() -> T + Send>;

/// Wraps a callback so that it runs on the first call only.
///
/// The first [`call`](Self::call) runs the callback and caches its result;
/// every later call returns a clone of the cached value without running
/// anything. `None` is returned only while the first call is still running
/// (a re-entrant call) or if the callback panicked.
pub struct AtMostOnce<T> {
    pending: Mutex<Option<Pending<T>>>,
    result: OnceLock<T>,
}

impl<T: Clone> AtMostOnce<T> {
    /// Wrap `callback`.
    pub fn new(callback: impl FnOnce() -> T + Send + 'static) -> Self {
        Self {
            pending: Mutex::new(Some(Box::new(callback))),
            result: OnceLock::new(),
        }
    }

    /// Run the callback if it has not run yet and return its result.
    pub fn call(&self) -> Option<T> {
        if let Some(value) = self.result.get() {
            return Some(value.clone());
        }
        let callback = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let value = callback();
        Some(self.result.get_or_init(|| value).clone())
    }

    /// Whether the callback has been consumed.
    pub fn has_run(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl<T> fmt::Debug for AtMostOnce<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtMostOnce")
            .field("settled", &self.result.get().is_some())
            .finish()
    }
}

/// The guarded load callback handed to a condition.
///
/// Cloning shares the guard: however many clones exist and however often
/// they are invoked, the underlying load runs at most once.
#[derive(Clone, Debug)]
pub struct LoadHandle {
    guard: Arc<AtMostOnce<()>>,
}

impl LoadHandle {
    /// Guard `load`.
    pub fn new(load: impl FnOnce() + Send + 'static) -> Self {
        Self {
            guard: Arc::new(AtMostOnce::new(load)),
        }
    }

    /// Trigger the load. Calls after the first are no-ops.
    pub fn load(&self) {
        let _ = self.guard.call();
    }

    /// Whether the load has been triggered.
    pub fn is_loaded(&self) -> bool {
        self.guard.has_run()
    }
}
