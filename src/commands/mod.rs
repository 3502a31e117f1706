//! Command implementations for gmutex.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every handler returns the process exit code on success.

mod lock;
mod run;

use crate::cli::{Cli, Command};
use global_mutex::{Config, Result};

/// Dispatch a command to its implementation.
///
/// The config is loaded from `--config` when given, otherwise discovered
/// from the environment.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };

    match cli.command {
        Command::Run(args) => run::cmd_run(&config, args),
        Command::Status(args) => lock::cmd_status(&config, args),
        Command::List => lock::cmd_list(&config),
        Command::Clear(args) => lock::cmd_clear(&config, args),
    }
}
