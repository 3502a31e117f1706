//! Implementation of the `gmutex run` command.

use crate::cli::RunArgs;
use global_mutex::exit_codes;
use global_mutex::{Config, GlobalMutex, GlobalMutexError, INFINITE, Result};
use std::process::{Command, ExitStatus};
use std::time::Duration;
use tracing::debug;

/// Run a command while holding the named lock.
///
/// Returns the child's exit code. The lock is released once the child exits,
/// whether or not it succeeded.
pub fn cmd_run(config: &Config, args: RunArgs) -> Result<i32> {
    let argv = command_line(&args)?;
    let timeout = parse_timeout(args.timeout)?;

    let mutex = GlobalMutex::with_config(&args.name, config)?;
    let guard = mutex.acquire(timeout)?;

    let status = run_child(&argv);
    let released = guard.release();

    let status = status?;
    released?;

    debug!(lock = %args.name, %status, "command finished");
    Ok(child_exit_code(status))
}

/// Resolve the program and arguments from either `--command` or `-- ARGS`.
fn command_line(args: &RunArgs) -> Result<Vec<String>> {
    let argv = match &args.command {
        Some(line) => shell_words::split(line).map_err(|e| {
            GlobalMutexError::Usage(format!("invalid --command '{}': {}", line, e))
        })?,
        None => args.args.clone(),
    };

    if argv.is_empty() {
        return Err(GlobalMutexError::Usage(
            "no command given; use --command STRING or -- PROGRAM [ARGS...]".to_string(),
        ));
    }

    Ok(argv)
}

/// Convert `--timeout` seconds into a duration; absent means wait forever.
fn parse_timeout(seconds: Option<f64>) -> Result<Duration> {
    match seconds {
        None => Ok(INFINITE),
        Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
            GlobalMutexError::Usage(format!(
                "invalid timeout {}: must be a non-negative number of seconds",
                secs
            ))
        }),
    }
}

fn run_child(argv: &[String]) -> Result<ExitStatus> {
    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| GlobalMutexError::Usage("no command given".to_string()))?;

    debug!(program = %program, args = ?rest, "running command under lock");

    Command::new(program)
        .args(rest)
        .status()
        .map_err(|source| GlobalMutexError::Command {
            program: program.clone(),
            source,
        })
}

/// The child's exit code, or `128 + signal` when it was killed on Unix.
fn child_exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    exit_codes::COMMAND_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            lock_dir: Some(temp_dir.path().join("locks")),
            ..Config::default()
        }
    }

    fn run_args(name: &str, command: Option<&str>, args: &[&str]) -> RunArgs {
        RunArgs {
            name: name.to_string(),
            timeout: None,
            command: command.map(str::to_string),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn command_line_splits_command_string() {
        let args = run_args("deploy", Some("echo 'hello world' done"), &[]);
        assert_eq!(
            command_line(&args).unwrap(),
            vec!["echo", "hello world", "done"]
        );
    }

    #[test]
    fn command_line_uses_trailing_args() {
        let args = run_args("deploy", None, &["make", "-j4"]);
        assert_eq!(command_line(&args).unwrap(), vec!["make", "-j4"]);
    }

    #[test]
    fn command_line_requires_a_command() {
        let err = command_line(&run_args("deploy", None, &[])).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = command_line(&run_args("deploy", Some("   "), &[])).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn command_line_rejects_unbalanced_quotes() {
        let err = command_line(&run_args("deploy", Some("echo 'oops"), &[])).unwrap_err();
        assert!(err.to_string().contains("invalid --command"));
    }

    #[test]
    fn parse_timeout_values() {
        assert_eq!(parse_timeout(None).unwrap(), INFINITE);
        assert_eq!(parse_timeout(Some(0.0)).unwrap(), Duration::ZERO);
        assert_eq!(
            parse_timeout(Some(1.5)).unwrap(),
            Duration::from_millis(1500)
        );
        assert!(parse_timeout(Some(-1.0)).is_err());
        assert!(parse_timeout(Some(f64::NAN)).is_err());
    }

    #[test]
    fn missing_program_is_command_failure() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let args = run_args("deploy", None, &["gmutex-test-no-such-program"]);

        let err = cmd_run(&config, args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::COMMAND_FAILURE);

        // The lock must not stay held after a failed spawn.
        let mutex = GlobalMutex::with_config("deploy", &config).unwrap();
        assert!(mutex.try_acquire(Duration::ZERO).unwrap().is_some());
    }

    #[test]
    fn run_times_out_while_lock_is_held() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let holder = GlobalMutex::with_config("deploy", &config).unwrap();
        let _guard = holder.acquire(INFINITE).unwrap();

        let mut args = run_args("deploy", None, &["gmutex-test-no-such-program"]);
        args.timeout = Some(0.0);

        let err = cmd_run(&config, args).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::LOCK_TIMEOUT);
    }

    #[cfg(unix)]
    #[test]
    fn child_exit_code_is_passed_through() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let args = run_args("deploy", Some("sh -c 'exit 7'"), &[]);
        assert_eq!(cmd_run(&config, args).unwrap(), 7);

        let args = run_args("deploy", None, &["true"]);
        assert_eq!(cmd_run(&config, args).unwrap(), exit_codes::SUCCESS);
    }

    #[cfg(unix)]
    #[test]
    fn child_holds_the_lock_while_running() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let lock_dir = config.lock_dir();
        let owner = lock_dir.join("deploy.owner");

        // The owner record exists only while the lock is held.
        let script = format!("test -f '{}'", owner.display());
        let args = run_args("deploy", None, &["sh", "-c", &script]);
        assert_eq!(cmd_run(&config, args).unwrap(), 0);
        assert!(!owner.exists());
    }
}
