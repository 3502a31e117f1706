//! Global Mutex: a reentrant mutex that locks across processes.
//!
//! A [`GlobalMutex`] is identified by a string name. Every instance opened with
//! the same name, in this process or in any other process on the machine that
//! uses the same lock directory, contends for the same lock. An instance that
//! already holds its lock can acquire it again without waiting; the lock is
//! released when every acquisition has been exited.
//!
//! ```no_run
//! use global_mutex::{GlobalMutex, INFINITE};
//!
//! # fn main() -> global_mutex::Result<()> {
//! let mutex = GlobalMutex::new("nightly-build")?;
//! let guard = mutex.acquire(INFINITE)?;
//! // ... exclusive work ...
//! guard.release()?;
//! # Ok(())
//! # }
//! ```
//!
//! Locks are file-backed by default ([`FileLock`]). [`MemoryNamespace`]
//! provides process-local locks with the same semantics.

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod handle;
pub mod locks;
pub mod mutex;
pub mod name;

pub use config::Config;
pub use error::{GlobalMutexError, Result};
pub use handle::{AcquireOutcome, FileLock, INFINITE, MemoryLock, MemoryNamespace, NamedLock};
pub use mutex::{GlobalMutex, GlobalMutexGuard, OwnedGlobalMutexGuard};
pub use name::LockName;
