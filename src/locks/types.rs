//! Lock state and information structures.

use super::metadata::LockMetadata;
use crate::name::LockName;
use std::fmt;
use std::path::PathBuf;

/// Observed state of a named lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    /// Nobody holds the lock.
    Free,
    /// Somebody holds the lock. The owner record may be missing if the
    /// holder is between taking the lock and writing it.
    Held(Option<LockMetadata>),
    /// Nobody holds the lock, but the last holder never released it.
    /// The owner record may be unreadable.
    Abandoned(Option<LockMetadata>),
}

impl LockState {
    /// Short lowercase label for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Free => "free",
            LockState::Held(_) => "held",
            LockState::Abandoned(_) => "abandoned",
        }
    }

    /// The owner record, when one was read.
    pub fn owner(&self) -> Option<&LockMetadata> {
        match self {
            LockState::Free => None,
            LockState::Held(owner) | LockState::Abandoned(owner) => owner.as_ref(),
        }
    }
}

/// Information about a named lock.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock name.
    pub name: LockName,

    /// The lock file path.
    pub path: PathBuf,

    /// The state observed when the lock was inspected.
    pub state: LockState,
}

impl LockInfo {
    /// Whether the lock has been held (or abandoned) longer than the threshold.
    pub fn is_stale(&self, stale_minutes: u32) -> bool {
        self.state
            .owner()
            .is_some_and(|owner| owner.is_stale(stale_minutes))
    }
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.name, self.state.as_str())?;
        if let Some(owner) = self.state.owner() {
            write!(f, ", owner: {}, age: {}", owner.owner, owner.age_string())?;
        }
        write!(f, ")")
    }
}
