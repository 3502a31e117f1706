//! Exit code constants for the `gmutex` CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, misuse of a lock)
//! - 2: The child command could not be started
//! - 3: Platform failure (lock directory or lock file unusable)
//! - 4: Lock acquisition timed out
//!
//! `gmutex run` passes the child's own exit code through when it ran.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid config, or misuse of a lock.
pub const USER_ERROR: i32 = 1;

/// The command to run under the lock could not be spawned.
pub const COMMAND_FAILURE: i32 = 2;

/// Platform failure: lock file creation, permissions, or lock syscalls.
pub const PLATFORM_FAILURE: i32 = 3;

/// The lock could not be acquired before the timeout elapsed.
pub const LOCK_TIMEOUT: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            COMMAND_FAILURE,
            PLATFORM_FAILURE,
            LOCK_TIMEOUT,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
    }
}
