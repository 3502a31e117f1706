//! Filesystem utilities for the file-backed lock.

pub mod atomic;

pub use atomic::{atomic_write, remove_if_exists};
