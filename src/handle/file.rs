//! File-backed named locks.
//!
//! Uses `fs2` for cross-platform advisory locking (flock on Unix, LockFileEx
//! on Windows). Every name maps to two files in the configured lock
//! directory:
//!
//! - `<escaped>.lock`: the file the OS lock is taken on. Created on open and
//!   never deleted, so every holder always locks the same inode.
//! - `<escaped>.owner`: a JSON [`LockMetadata`] record, written right after
//!   the OS lock is obtained and removed right before it is released.
//!
//! The OS drops the lock when its holder exits, but it leaves the owner record
//! behind. Finding an owner record after obtaining the lock is therefore how a
//! waiter learns that the previous holder terminated (or disposed its handle)
//! without releasing, and why such an acquisition reports
//! [`AcquireOutcome::Abandoned`].
//!
//! Detection has a gap: a holder that dies after obtaining the OS lock but
//! before its owner record is in place leaves nothing behind, and the next
//! waiter reports [`AcquireOutcome::Acquired`]. The same happens if the
//! record is deleted by hand while its holder is gone.

use super::{AcquireOutcome, NamedLock, deadline};
use crate::config::Config;
use crate::error::{GlobalMutexError, Result};
use crate::fs::{atomic_write, remove_if_exists};
use crate::locks::LockMetadata;
use crate::name::LockName;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A named lock shared across processes through a lock file.
#[derive(Debug)]
pub struct FileLock {
    name: LockName,
    lock_path: PathBuf,
    owner_path: PathBuf,
    /// `None` once disposed.
    file: Option<File>,
    held: bool,
    poll_min: Duration,
    poll_max: Duration,
}

impl FileLock {
    /// Create or open the lock file for `name` in the configured directory.
    ///
    /// The lock is not taken.
    pub fn open(name: &LockName, config: &Config) -> Result<Self> {
        let dir = config.lock_dir();
        fs::create_dir_all(&dir).map_err(|e| GlobalMutexError::platform(&dir, e))?;

        let lock_path = dir.join(name.lock_file_name());
        let file = open_lock_file(&lock_path)?;

        debug!(
            lock = %name,
            id = %name.namespaced(),
            path = %lock_path.display(),
            "opened lock file"
        );

        Ok(Self {
            name: name.clone(),
            owner_path: dir.join(name.owner_file_name()),
            lock_path,
            file: Some(file),
            held: false,
            poll_min: config.poll_min(),
            poll_max: config.poll_max(),
        })
    }

    /// The lock name.
    pub fn name(&self) -> &LockName {
        &self.name
    }

    /// Path of the file the OS lock is taken on.
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Path of the owner record written while the lock is held.
    pub fn owner_path(&self) -> &Path {
        &self.owner_path
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or_else(|| {
            GlobalMutexError::Usage(format!("lock handle '{}' has been disposed", self.name))
        })
    }

    /// Take the OS lock, polling with exponential backoff until the deadline.
    ///
    /// Returns whether the lock was taken.
    fn lock_file(&self, timeout: Duration) -> Result<bool> {
        let file = self.file()?;

        let Some(deadline) = deadline(timeout) else {
            loop {
                match FileExt::lock_exclusive(file) {
                    Ok(()) => return Ok(true),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(GlobalMutexError::platform(&self.lock_path, e)),
                }
            }
        };

        let mut delay = self.poll_min;
        loop {
            match FileExt::try_lock_exclusive(file) {
                Ok(()) => return Ok(true),
                Err(e) if is_contended(&e) => {}
                Err(e) => return Err(GlobalMutexError::platform(&self.lock_path, e)),
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }

            thread::sleep(delay.min(deadline - now));
            delay = (delay * 2).min(self.poll_max);
        }
    }

    /// Read the owner record left behind by a previous holder, if any.
    fn previous_owner(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.owner_path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GlobalMutexError::platform(&self.owner_path, e)),
        }
    }

    fn write_owner(&self) -> Result<()> {
        let metadata = LockMetadata::new(self.name.as_str());
        atomic_write(&self.owner_path, metadata.to_json()?.as_bytes())
    }

    /// Drop the OS lock after a failure between locking and reporting success.
    fn unlock_quietly(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
        self.held = false;
    }
}

impl NamedLock for FileLock {
    fn wait(&mut self, timeout: Duration) -> Result<AcquireOutcome> {
        if self.held {
            return Err(GlobalMutexError::Usage(format!(
                "lock '{}' is already held by this handle",
                self.name
            )));
        }

        if !self.lock_file(timeout)? {
            return Ok(AcquireOutcome::TimedOut);
        }
        self.held = true;

        let outcome = match self.previous_owner() {
            Ok(None) => AcquireOutcome::Acquired,
            Ok(Some(record)) => {
                match LockMetadata::from_json(&record) {
                    Ok(previous) => warn!(
                        lock = %self.name,
                        previous_owner = %previous.owner,
                        previous_pid = ?previous.pid,
                        held_since = %previous.acquired_at,
                        "previous holder exited without releasing the lock"
                    ),
                    Err(_) => warn!(
                        lock = %self.name,
                        "previous holder exited without releasing the lock (unreadable owner record)"
                    ),
                }
                AcquireOutcome::Abandoned
            }
            Err(e) => {
                self.unlock_quietly();
                return Err(e);
            }
        };

        if let Err(e) = self.write_owner() {
            self.unlock_quietly();
            return Err(e);
        }

        Ok(outcome)
    }

    fn release(&mut self) -> Result<()> {
        if !self.held {
            return Err(GlobalMutexError::Usage(format!(
                "release of lock '{}' which this handle does not hold",
                self.name
            )));
        }

        // The record goes first: once unlocked, the next holder must not see it.
        let removed = remove_if_exists(&self.owner_path);
        let unlocked = self
            .file()
            .and_then(|file| {
                FileExt::unlock(file).map_err(|e| GlobalMutexError::platform(&self.lock_path, e))
            });
        self.held = false;

        removed?;
        unlocked
    }

    fn dispose(&mut self) {
        if let Some(file) = self.file.take() {
            if self.held {
                debug!(lock = %self.name, "disposing held lock without releasing it");
            }
            drop(file);
        }
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| GlobalMutexError::platform(path, e))
}

/// Whether a non-blocking lock attempt failed only because someone holds it.
pub(crate) fn is_contended(err: &io::Error) -> bool {
    err.raw_os_error().is_some()
        && err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
