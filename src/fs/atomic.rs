//! Atomic filesystem operations for owner records.
//!
//! Owner records are read by other processes (inspection, the next lock
//! holder) at arbitrary times, so they are never written in place:
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk
//! 3. Rename it over the target
//!
//! `rename` replaces the destination on every supported platform, and is
//! atomic when source and destination share a filesystem, which holds because
//! the temporary file is created next to the target.
//!
//! Writers must hold the lock the record belongs to: the temporary name is
//! derived from the target name and is not unique.

use crate::error::{GlobalMutexError, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| GlobalMutexError::platform(parent, e))?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        GlobalMutexError::platform(path, e)
    })?;

    Ok(())
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(GlobalMutexError::platform(path, e)),
    }
}

/// Temporary file path in the same directory as the target: `.{filename}.tmp`.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            GlobalMutexError::Usage(format!("invalid file path '{}'", target.display()))
        })?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| GlobalMutexError::platform(path, e))?;

    let written = file.write_all(content).and_then(|()| file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(path);
        return Err(GlobalMutexError::platform(path, e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("jobs.owner");

        atomic_write(&file_path, b"{\"pid\":1}").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "{\"pid\":1}");
    }

    #[test]
    fn test_atomic_write_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("jobs.owner");

        fs::write(&file_path, "original content").unwrap();
        atomic_write(&file_path, b"new content").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "new content");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("dirs").join("jobs.owner");

        atomic_write(&file_path, b"nested content").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "nested content");
    }

    #[test]
    fn test_atomic_write_temp_file_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("jobs.owner");

        atomic_write(&file_path, b"content").unwrap();

        let temp_path = temp_dir.path().join(".jobs.owner.tmp");
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_temp_path_for() {
        let target = Path::new("/some/path/jobs.owner");
        let temp = temp_path_for(target).unwrap();

        assert_eq!(temp, Path::new("/some/path/.jobs.owner.tmp"));
    }

    #[test]
    fn test_remove_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("jobs.owner");
        fs::write(&file_path, "x").unwrap();

        assert!(remove_if_exists(&file_path).unwrap());
        assert!(!file_path.exists());
        assert!(!remove_if_exists(&file_path).unwrap());
    }
}
