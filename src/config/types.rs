//! Default value functions used by the Config struct.

use crate::name::NAMESPACE;
use std::path::PathBuf;

pub(crate) fn default_poll_min_ms() -> u64 {
    1
}

pub(crate) fn default_poll_max_ms() -> u64 {
    50
}

pub(crate) fn default_stale_minutes() -> u32 {
    120
}

/// Machine-wide default lock directory.
///
/// Fixed per platform rather than derived from the process environment, so
/// processes with different `TMPDIR`/`TEMP` settings still share locks.
pub(crate) fn default_lock_dir() -> PathBuf {
    #[cfg(windows)]
    {
        std::env::var_os("ProgramData")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
            .join(NAMESPACE)
    }

    #[cfg(not(windows))]
    {
        PathBuf::from("/tmp").join(NAMESPACE)
    }
}
