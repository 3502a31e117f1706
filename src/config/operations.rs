//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::default_lock_dir;
use crate::error::{GlobalMutexError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a YAML config file for [`Config::discover`].
pub const CONFIG_ENV: &str = "GLOBAL_MUTEX_CONFIG";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            GlobalMutexError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load the config named by [`CONFIG_ENV`], or the defaults when unset.
    pub fn discover() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            GlobalMutexError::Config(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    ///
    /// Validation rules:
    /// - `poll_min_ms` must be positive
    /// - `poll_max_ms` must not be below `poll_min_ms`
    /// - `stale_minutes` must be positive
    /// - `lock_dir`, when set, must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.poll_min_ms == 0 {
            return Err(GlobalMutexError::Config(
                "config validation failed: poll_min_ms must be greater than 0".to_string(),
            ));
        }

        if self.poll_max_ms < self.poll_min_ms {
            return Err(GlobalMutexError::Config(format!(
                "config validation failed: poll_max_ms ({}) must be at least poll_min_ms ({})",
                self.poll_max_ms, self.poll_min_ms
            )));
        }

        if self.stale_minutes == 0 {
            return Err(GlobalMutexError::Config(
                "config validation failed: stale_minutes must be greater than 0".to_string(),
            ));
        }

        if let Some(dir) = &self.lock_dir
            && dir.as_os_str().is_empty()
        {
            return Err(GlobalMutexError::Config(
                "config validation failed: lock_dir must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Directory holding lock files, resolved against the defaults.
    ///
    /// The default is `/tmp/global-mutex` on Unix and
    /// `%ProgramData%\global-mutex` on Windows. It does not follow `TMPDIR`.
    pub fn lock_dir(&self) -> PathBuf {
        self.lock_dir.clone().unwrap_or_else(default_lock_dir)
    }

    /// First delay between polls.
    pub fn poll_min(&self) -> Duration {
        Duration::from_millis(self.poll_min_ms)
    }

    /// Upper bound for the poll delay.
    pub fn poll_max(&self) -> Duration {
        Duration::from_millis(self.poll_max_ms)
    }
}
