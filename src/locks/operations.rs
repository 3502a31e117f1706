//! Lock inspection, listing, and clearing operations.

use super::metadata::LockMetadata;
use super::types::{LockInfo, LockState};
use crate::config::Config;
use crate::error::{GlobalMutexError, Result};
use crate::fs::remove_if_exists;
use crate::handle::is_contended;
use crate::name::{LOCK_EXTENSION, LockName};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Paths belonging to one lock name.
struct LockPaths {
    lock: PathBuf,
    owner: PathBuf,
}

impl LockPaths {
    fn new(config: &Config, name: &LockName) -> Self {
        let dir = config.lock_dir();
        Self {
            lock: dir.join(name.lock_file_name()),
            owner: dir.join(name.owner_file_name()),
        }
    }
}

/// Open an existing lock file without creating it.
fn open_existing(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(GlobalMutexError::platform(path, e)),
    }
}

/// Try to take the lock without blocking. Returns whether it was taken.
fn probe(file: &File, path: &Path) -> Result<bool> {
    match FileExt::try_lock_exclusive(file) {
        Ok(()) => Ok(true),
        Err(e) if is_contended(&e) => Ok(false),
        Err(e) => Err(GlobalMutexError::platform(path, e)),
    }
}

/// Read an owner record for display; unreadable records yield `None`.
fn read_owner(path: &Path) -> Option<LockMetadata> {
    LockMetadata::from_file(path).ok()
}

/// Inspect the lock `name` without waiting for it.
///
/// A name that was never opened is reported as [`LockState::Free`].
pub fn inspect(config: &Config, name: &str) -> Result<LockInfo> {
    let name = LockName::new(name)?;
    inspect_name(config, name)
}

fn inspect_name(config: &Config, name: LockName) -> Result<LockInfo> {
    let paths = LockPaths::new(config, &name);

    let Some(file) = open_existing(&paths.lock)? else {
        return Ok(LockInfo {
            name,
            path: paths.lock,
            state: LockState::Free,
        });
    };

    let state = if probe(&file, &paths.lock)? {
        // Holding the probe lock, the owner record cannot change under us.
        let state = if paths.owner.exists() {
            LockState::Abandoned(read_owner(&paths.owner))
        } else {
            LockState::Free
        };
        let _ = FileExt::unlock(&file);
        state
    } else {
        let owner = read_owner(&paths.owner);
        if let Some(owner) = &owner
            && owner.is_stale(config.stale_minutes)
        {
            warn!(
                lock = %name,
                owner = %owner.owner,
                age = %owner.age_string(),
                "lock has been held longer than {} minutes",
                config.stale_minutes
            );
        }
        LockState::Held(owner)
    };

    Ok(LockInfo {
        name,
        path: paths.lock,
        state,
    })
}

/// List every lock in the configured lock directory, sorted by name.
///
/// Files whose names are not canonical escaped lock names are skipped.
pub fn list_locks(config: &Config) -> Result<Vec<LockInfo>> {
    let dir = config.lock_dir();
    let mut locks = Vec::new();

    if !dir.exists() {
        return Ok(locks);
    }

    let entries = fs::read_dir(&dir).map_err(|e| GlobalMutexError::platform(&dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| GlobalMutexError::platform(&dir, e))?;
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some(LOCK_EXTENSION) {
            continue;
        }

        let Some(name) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(LockName::from_escaped)
        else {
            continue;
        };

        locks.push(inspect_name(config, name)?);
    }

    locks.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));

    Ok(locks)
}

/// Remove the owner record of an abandoned lock.
///
/// The caller is responsible for deciding that whatever the lock protected
/// is consistent again. Refuses to touch a lock that is free or held.
///
/// Returns the lock as it was before clearing.
pub fn clear_abandoned(config: &Config, name: &str) -> Result<LockInfo> {
    let name = LockName::new(name)?;
    let paths = LockPaths::new(config, &name);

    let Some(file) = open_existing(&paths.lock)? else {
        return Err(GlobalMutexError::Usage(format!(
            "lock '{}' does not exist at: {}",
            name,
            paths.lock.display()
        )));
    };

    if !probe(&file, &paths.lock)? {
        return Err(GlobalMutexError::Usage(format!(
            "lock '{}' is held by a live owner; refusing to clear it",
            name
        )));
    }

    let owner = read_owner(&paths.owner);
    let removed = remove_if_exists(&paths.owner);
    let _ = FileExt::unlock(&file);

    if !removed? {
        return Err(GlobalMutexError::Usage(format!(
            "lock '{}' is not abandoned",
            name
        )));
    }

    warn!(lock = %name, previous_owner = ?owner.as_ref().map(|o| &o.owner), "cleared abandoned lock");

    Ok(LockInfo {
        name,
        path: paths.lock,
        state: LockState::Abandoned(owner),
    })
}
