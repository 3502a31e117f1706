//! Error types for global mutex operations.
//!
//! Uses thiserror for derive macros. Every variant maps to a CLI exit code so
//! the `gmutex` binary can report failures without inspecting messages.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for global mutex operations.
#[derive(Error, Debug)]
pub enum GlobalMutexError {
    /// The lock was not acquired before the requested timeout elapsed.
    ///
    /// No state is mutated when this is returned.
    #[error("timed out after {timeout:?} acquiring global mutex '{name}'")]
    Timeout { name: String, timeout: Duration },

    /// The lock was used incorrectly (release without holding, bad name).
    #[error("invalid use of global mutex: {0}")]
    Usage(String),

    /// The mutex was disposed and can no longer be acquired.
    #[error("global mutex '{0}' has been disposed")]
    Disposed(String),

    /// The underlying lock object could not be created or operated on.
    #[error("platform error on '{}': {source}", path.display())]
    Platform {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be read or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// The command to run under the lock could not be started.
    #[error("failed to run '{program}': {source}")]
    Command {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The background worker running an async acquisition failed.
    #[error("acquisition task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl GlobalMutexError {
    /// Build a [`GlobalMutexError::Platform`] for the given path.
    pub fn platform(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GlobalMutexError::Platform {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a timeout, as opposed to a hard failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GlobalMutexError::Timeout { .. })
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GlobalMutexError::Timeout { .. } => exit_codes::LOCK_TIMEOUT,
            GlobalMutexError::Usage(_) => exit_codes::USER_ERROR,
            GlobalMutexError::Disposed(_) => exit_codes::USER_ERROR,
            GlobalMutexError::Config(_) => exit_codes::USER_ERROR,
            GlobalMutexError::Platform { .. } => exit_codes::PLATFORM_FAILURE,
            GlobalMutexError::Command { .. } => exit_codes::COMMAND_FAILURE,
            GlobalMutexError::Join(_) => exit_codes::PLATFORM_FAILURE,
        }
    }
}

/// Result type alias for global mutex operations.
pub type Result<T> = std::result::Result<T, GlobalMutexError>;
