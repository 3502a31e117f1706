//! Inspection of file-backed locks.
//!
//! Lock files live in the configured lock directory (see
//! [`Config::lock_dir`](crate::Config::lock_dir)), one `<escaped>.lock` per
//! name that was ever opened, next to a `<escaped>.owner` record while the
//! lock is held.
//!
//! # Owner Records
//!
//! Each owner record contains JSON metadata:
//! - `owner`: The owner of the lock (e.g., `user@HOST`)
//! - `pid`: The process ID (optional)
//! - `name`: The lock name before escaping
//! - `acquired_at`: RFC3339 timestamp
//!
//! # Probing
//!
//! A lock's state is determined by briefly trying to take it without
//! blocking. While a probe holds the lock, a concurrent zero-timeout
//! acquisition of the same name can time out.

mod metadata;
mod operations;
mod types;


pub use metadata::LockMetadata;
pub use operations::{clear_abandoned, inspect, list_locks};
pub use types::{LockInfo, LockState};
