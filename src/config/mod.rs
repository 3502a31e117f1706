//! Configuration for global mutexes.
//!
//! The configuration can be read from a YAML file. Parsing is forward
//! compatible (unknown fields are ignored) and every field has a default, so
//! an empty document is a valid configuration.

mod model;
mod operations;
mod types;

#[cfg(test)]
mod tests;

pub use model::Config;
pub use operations::CONFIG_ENV;
