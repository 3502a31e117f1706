//! The reentrant, cross-process global mutex.
//!
//! A [`GlobalMutex`] owns one [`NamedLock`] handle and a depth counter. The
//! first acquisition waits on the handle; nested acquisitions through the same
//! instance only bump the depth, and the lock is released when the depth
//! returns to zero. Reentrancy is scoped to the instance, not to a thread:
//! every caller sharing one `GlobalMutex` shares its depth. Two instances
//! opened with the same name contend through the handle exactly like two
//! processes would.
//!
//! # Serialization
//!
//! All depth transitions run under one process-local mutex, and the wait on
//! the handle happens while it is held. A thread acquiring an instance that
//! another thread is still waiting on blocks until that wait finishes, even if
//! the wait then turns into a reentry for it. The same applies to
//! [`GlobalMutex::dispose`].
//!
//! # Abandonment
//!
//! When the previous holder went away without releasing, the acquisition still
//! succeeds. Nothing the lock protected is validated or repaired; callers that
//! depend on such state must be able to recover it on their own.

mod guard;


pub use guard::{GlobalMutexGuard, OwnedGlobalMutexGuard};

use crate::config::Config;
use crate::error::{GlobalMutexError, Result};
use crate::handle::{AcquireOutcome, FileLock, NamedLock};
use crate::name::LockName;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A reentrant named mutex that can lock across processes.
pub struct GlobalMutex<L: NamedLock = FileLock> {
    name: LockName,
    /// Handle on the shared lock; `None` once disposed.
    handle: Mutex<Option<L>>,
    /// Written only while `handle` is locked, readable without it.
    depth: AtomicUsize,
    disposed: AtomicBool,
}

impl GlobalMutex<FileLock> {
    /// Open the global mutex `name` with the default configuration.
    ///
    /// The name is escaped and namespaced; any instance, in any process, opened
    /// with the same name and lock directory contends for the same lock.
    /// Does not wait for the lock.
    pub fn new(name: &str) -> Result<Self> {
        Self::with_config(name, &Config::default())
    }

    /// Open the global mutex `name` using the given configuration.
    pub fn with_config(name: &str, config: &Config) -> Result<Self> {
        let name = LockName::new(name)?;
        let handle = FileLock::open(&name, config)?;
        Ok(Self::from_handle(name, handle))
    }
}

impl<L: NamedLock> GlobalMutex<L> {
    /// Wrap an already opened handle.
    pub fn from_handle(name: LockName, handle: L) -> Self {
        Self {
            name,
            handle: Mutex::new(Some(handle)),
            depth: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// The lock name.
    pub fn name(&self) -> &LockName {
        &self.name
    }

    /// The current reentrancy depth.
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Whether this instance currently holds the lock.
    pub fn is_acquired(&self) -> bool {
        self.current_depth() > 0
    }

    /// Whether [`GlobalMutex::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Enter the mutex, blocking up to `timeout` until it is acquired.
    ///
    /// Returns a guard that exits the mutex when dropped. Nested calls on an
    /// instance that already holds the lock succeed immediately.
    /// [`INFINITE`](crate::INFINITE) waits forever.
    ///
    /// # Errors
    ///
    /// - [`GlobalMutexError::Timeout`] if the lock was not acquired in time.
    /// - [`GlobalMutexError::Disposed`] after [`GlobalMutex::dispose`].
    /// - [`GlobalMutexError::Platform`] if the underlying lock failed.
    pub fn acquire(&self, timeout: Duration) -> Result<GlobalMutexGuard<'_, L>> {
        if !self.try_enter(timeout)? {
            return Err(self.timeout_error(timeout));
        }
        Ok(GlobalMutexGuard::new(self))
    }

    /// Like [`GlobalMutex::acquire`], but a timeout yields `Ok(None)`.
    pub fn try_acquire(&self, timeout: Duration) -> Result<Option<GlobalMutexGuard<'_, L>>> {
        Ok(self
            .try_enter(timeout)?
            .then(|| GlobalMutexGuard::new(self)))
    }

    /// Reset the depth to zero and dispose the handle.
    ///
    /// The lock is not released first: if it was held, other holders observe
    /// it as abandoned. Outstanding guards become no-ops, and every later
    /// acquisition fails with [`GlobalMutexError::Disposed`]. Idempotent.
    pub fn dispose(&self) {
        let mut slot = self.handle.lock();
        let depth = self.depth.swap(0, Ordering::AcqRel);
        self.disposed.store(true, Ordering::Release);

        if let Some(mut handle) = slot.take() {
            let held = handle.is_held();
            handle.dispose();
            if held {
                warn!(
                    lock = %self.name,
                    depth,
                    "disposed global mutex while holding it; the lock is left abandoned"
                );
            } else {
                debug!(lock = %self.name, "disposed global mutex");
            }
        }
    }

    fn timeout_error(&self, timeout: Duration) -> GlobalMutexError {
        GlobalMutexError::Timeout {
            name: self.name.to_string(),
            timeout,
        }
    }

    fn try_enter(&self, timeout: Duration) -> Result<bool> {
        let mut slot = self.handle.lock();
        let handle = slot
            .as_mut()
            .ok_or_else(|| GlobalMutexError::Disposed(self.name.to_string()))?;

        // Re-enter if already acquired
        let depth = self.depth.load(Ordering::Acquire);
        if depth > 0 {
            self.depth.store(depth + 1, Ordering::Release);
            trace!(lock = %self.name, depth = depth + 1, "re-entered global mutex");
            return Ok(true);
        }

        let outcome = handle.wait(timeout)?;
        if !outcome.is_acquired() {
            debug!(lock = %self.name, ?timeout, "timed out acquiring global mutex");
            return Ok(false);
        }

        if outcome == AcquireOutcome::Abandoned {
            warn!(
                lock = %self.name,
                "acquired abandoned global mutex; protected state was not validated"
            );
        } else {
            debug!(lock = %self.name, "acquired global mutex");
        }

        self.depth.store(1, Ordering::Release);
        Ok(true)
    }

    /// Exit the mutex once. Returns `false` when there was nothing to exit.
    pub(crate) fn try_exit(&self) -> Result<bool> {
        let mut slot = self.handle.lock();

        let depth = self.depth.load(Ordering::Acquire);
        if depth == 0 {
            return Ok(false);
        }

        let depth = depth - 1;
        self.depth.store(depth, Ordering::Release);

        if depth > 0 {
            trace!(lock = %self.name, depth, "exited nested global mutex");
            return Ok(true);
        }

        // depth > 0 implies the handle was not disposed.
        if let Some(handle) = slot.as_mut() {
            handle.release()?;
            debug!(lock = %self.name, "released global mutex");
        }
        Ok(true)
    }
}

impl<L: NamedLock + 'static> GlobalMutex<L> {
    /// Like [`GlobalMutex::acquire`], but the guard keeps the mutex alive.
    pub fn acquire_owned(self: &Arc<Self>, timeout: Duration) -> Result<OwnedGlobalMutexGuard<L>> {
        if !self.try_enter(timeout)? {
            return Err(self.timeout_error(timeout));
        }
        Ok(OwnedGlobalMutexGuard::new(Arc::clone(self)))
    }

    /// Like [`GlobalMutex::try_acquire`], but the guard keeps the mutex alive.
    pub fn try_acquire_owned(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> Result<Option<OwnedGlobalMutexGuard<L>>> {
        Ok(self
            .try_enter(timeout)?
            .then(|| OwnedGlobalMutexGuard::new(Arc::clone(self))))
    }

    /// Acquire without blocking the calling task.
    ///
    /// The blocking wait runs on tokio's blocking thread pool, so this must be
    /// awaited inside a tokio runtime. Fails like [`GlobalMutex::acquire`].
    pub async fn acquire_async(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> Result<OwnedGlobalMutexGuard<L>> {
        let mutex = Arc::clone(self);
        tokio::task::spawn_blocking(move || mutex.acquire_owned(timeout)).await?
    }
}

impl<L: NamedLock> Drop for GlobalMutex<L> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<L: NamedLock> fmt::Debug for GlobalMutex<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalMutex")
            .field("name", &self.name.as_str())
            .field("depth", &self.current_depth())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
