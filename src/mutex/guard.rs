//! Scope guards returned by successful acquisitions.

use super::GlobalMutex;
use crate::error::Result;
use crate::handle::{FileLock, NamedLock};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Exits a [`GlobalMutex`] once when dropped.
///
/// Dropping runs on every exit path, including early returns and unwinding.
/// A release failure during drop is logged, never panicked on; use
/// [`GlobalMutexGuard::release`] to observe it.
#[must_use = "if unused the global mutex is exited immediately"]
pub struct GlobalMutexGuard<'a, L: NamedLock = FileLock> {
    mutex: &'a GlobalMutex<L>,
    released: bool,
}

impl<'a, L: NamedLock> GlobalMutexGuard<'a, L> {
    pub(super) fn new(mutex: &'a GlobalMutex<L>) -> Self {
        Self {
            mutex,
            released: false,
        }
    }

    /// The mutex this guard exits.
    pub fn mutex(&self) -> &'a GlobalMutex<L> {
        self.mutex
    }

    /// Exit the mutex now.
    ///
    /// Returns `Ok(false)` if the mutex had nothing left to exit, which
    /// happens after it was disposed.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.mutex.try_exit()
    }
}

impl<L: NamedLock> Drop for GlobalMutexGuard<'_, L> {
    fn drop(&mut self) {
        if !self.released {
            exit_logged(self.mutex);
        }
    }
}

impl<L: NamedLock> fmt::Debug for GlobalMutexGuard<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalMutexGuard")
            .field("mutex", self.mutex)
            .finish()
    }
}

/// A [`GlobalMutexGuard`] that owns a reference count on its mutex.
///
/// Returned by [`GlobalMutex::acquire_owned`] and
/// [`GlobalMutex::acquire_async`]; can be moved across threads and tasks.
#[must_use = "if unused the global mutex is exited immediately"]
pub struct OwnedGlobalMutexGuard<L: NamedLock = FileLock> {
    mutex: Arc<GlobalMutex<L>>,
    released: bool,
}

impl<L: NamedLock> OwnedGlobalMutexGuard<L> {
    pub(super) fn new(mutex: Arc<GlobalMutex<L>>) -> Self {
        Self {
            mutex,
            released: false,
        }
    }

    /// The mutex this guard exits.
    pub fn mutex(&self) -> &Arc<GlobalMutex<L>> {
        &self.mutex
    }

    /// Exit the mutex now. See [`GlobalMutexGuard::release`].
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.mutex.try_exit()
    }
}

impl<L: NamedLock> Drop for OwnedGlobalMutexGuard<L> {
    fn drop(&mut self) {
        if !self.released {
            exit_logged(&self.mutex);
        }
    }
}

impl<L: NamedLock> fmt::Debug for OwnedGlobalMutexGuard<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedGlobalMutexGuard")
            .field("mutex", &*self.mutex)
            .finish()
    }
}

fn exit_logged<L: NamedLock>(mutex: &GlobalMutex<L>) {
    if let Err(e) = mutex.try_exit() {
        warn!(lock = %mutex.name(), error = %e, "failed to release global mutex");
    }
}
