//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration shared by every lock opened with it.
///
/// Two processes only contend for the same named lock when their configs
/// resolve to the same [`Config::lock_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding lock files and owner records.
    ///
    /// Defaults to a fixed machine-wide directory when unset (see
    /// [`Config::lock_dir`]). Processes running as different users can only
    /// share locks through a directory all of them can write to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_dir: Option<PathBuf>,

    /// First delay between polls while waiting with a finite timeout.
    #[serde(default = "default_poll_min_ms")]
    pub poll_min_ms: u64,

    /// Upper bound for the doubling poll delay.
    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,

    /// Minutes after which a held lock is reported as stale by inspection.
    #[serde(default = "default_stale_minutes")]
    pub stale_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_dir: None,
            poll_min_ms: default_poll_min_ms(),
            poll_max_ms: default_poll_max_ms(),
            stale_minutes: default_stale_minutes(),
        }
    }
}
