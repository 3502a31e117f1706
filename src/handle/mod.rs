//! Named lock handles.
//!
//! A [`NamedLock`] is the leaf binding to a lock object shared by every holder
//! that opens the same name: other processes on the machine, and other handles
//! in this process. It is deliberately not reentrant; reentrancy lives in
//! [`GlobalMutex`](crate::GlobalMutex), which owns exactly one handle.
//!
//! Two backends are provided:
//! - [`FileLock`]: advisory file locks, visible across processes.
//! - [`MemoryLock`]: process-local locks from a [`MemoryNamespace`], for tests
//!   and for code that only needs the reentrancy layer.

mod file;
mod memory;

pub use file::FileLock;
pub(crate) use file::is_contended;
pub use memory::{MemoryLock, MemoryNamespace};

use crate::error::Result;
use std::time::{Duration, Instant};

/// A timeout that never elapses.
pub const INFINITE: Duration = Duration::MAX;

/// Result of waiting on a named lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The lock was free, or became free, and is now held by the caller.
    Acquired,
    /// The timeout elapsed first. The caller does not hold the lock.
    TimedOut,
    /// The previous holder went away without releasing. The caller now holds
    /// the lock, but whatever it protected was left in an unknown state.
    Abandoned,
}

impl AcquireOutcome {
    /// Whether the caller holds the lock after this outcome.
    pub fn is_acquired(self) -> bool {
        !matches!(self, AcquireOutcome::TimedOut)
    }
}

/// Binding to a lock object identified by name.
///
/// Implementations are opened unowned and must not block while opening.
pub trait NamedLock: Send {
    /// Block until the lock is obtained, the lock is found abandoned, or
    /// `timeout` elapses.
    ///
    /// A zero timeout tries once without blocking. [`INFINITE`] waits until
    /// the lock is obtained. Waiting on a handle that already holds the lock
    /// is a usage error.
    fn wait(&mut self, timeout: Duration) -> Result<AcquireOutcome>;

    /// Signal the lock as available for the next waiter.
    ///
    /// Releasing a lock this handle does not hold is a usage error.
    fn release(&mut self) -> Result<()>;

    /// Free every resource tied to the handle. Idempotent.
    ///
    /// A held lock is not released first: other holders observe it as
    /// [`AcquireOutcome::Abandoned`].
    fn dispose(&mut self);

    /// Whether this handle currently holds the lock.
    fn is_held(&self) -> bool;
}

/// Deadline for a timeout, or `None` when it is effectively infinite.
pub(crate) fn deadline(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}
