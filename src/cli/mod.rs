//! CLI argument parsing for gmutex.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gmutex: run commands under a named lock shared by every process on the machine.
///
/// Locks are identified by name. Any two processes using the same name (and
/// the same lock directory) exclude each other.
#[derive(Parser, Debug)]
#[command(name = "gmutex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML config file. Defaults to $GLOBAL_MUTEX_CONFIG, then built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log lock activity to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for gmutex.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a lock.
    ///
    /// Waits for the lock, runs the command, releases the lock, and exits
    /// with the command's exit code.
    Run(RunArgs),

    /// Show the state of a lock.
    Status(StatusArgs),

    /// List every lock in the lock directory.
    ///
    /// Shows each lock's state with the owner and age of its holder.
    List,

    /// Clear the owner record of an abandoned lock.
    ///
    /// Only needed to silence abandonment reporting; the next holder
    /// acquires an abandoned lock either way.
    Clear(ClearArgs),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name of the lock to hold.
    pub name: String,

    /// Seconds to wait for the lock. Waits forever when omitted.
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Command line to run, split with shell quoting rules.
    #[arg(short, long, value_name = "STRING", conflicts_with = "args")]
    pub command: Option<String>,

    /// Program and arguments to run, after `--`.
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Name of the lock to inspect.
    pub name: String,
}

/// Arguments for the `clear` command.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Name of the lock to clear.
    pub name: String,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_run_with_trailing_args() {
        let cli = Cli::try_parse_from(["gmutex", "run", "deploy", "--", "make", "-j4"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.name, "deploy");
            assert_eq!(args.timeout, None);
            assert_eq!(args.command, None);
            assert_eq!(args.args, vec!["make", "-j4"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_with_command_string() {
        let cli = Cli::try_parse_from([
            "gmutex",
            "run",
            "deploy",
            "--timeout",
            "2.5",
            "--command",
            "echo 'hello world'",
        ])
        .unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.timeout, Some(2.5));
            assert_eq!(args.command.as_deref(), Some("echo 'hello world'"));
            assert!(args.args.is_empty());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_rejects_both_command_forms() {
        let result = Cli::try_parse_from([
            "gmutex", "run", "deploy", "--command", "true", "--", "false",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["gmutex", "status", "deploy"]).unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.name, "deploy");
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn parse_list_with_global_flags() {
        let cli =
            Cli::try_parse_from(["gmutex", "list", "--verbose", "--config", "locks.yaml"]).unwrap();
        assert!(matches!(cli.command, Command::List));
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("locks.yaml")));
    }

    #[test]
    fn parse_clear() {
        let cli = Cli::try_parse_from(["gmutex", "clear", "deploy", "--force"]).unwrap();
        if let Command::Clear(args) = cli.command {
            assert_eq!(args.name, "deploy");
            assert!(args.force);
        } else {
            panic!("Expected Clear command");
        }
    }

    #[test]
    fn parse_clear_without_force() {
        let cli = Cli::try_parse_from(["gmutex", "clear", "deploy"]).unwrap();
        if let Command::Clear(args) = cli.command {
            assert!(!args.force);
        } else {
            panic!("Expected Clear command");
        }
    }
}
