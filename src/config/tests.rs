//! Tests for config functionality.

use crate::config::{CONFIG_ENV, Config};
use crate::error::GlobalMutexError;
use serial_test::serial;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.lock_dir, None);
    assert_eq!(config.poll_min_ms, 1);
    assert_eq!(config.poll_max_ms, 50);
    assert_eq!(config.stale_minutes, 120);
    assert_eq!(config.poll_min(), Duration::from_millis(1));
    assert_eq!(config.poll_max(), Duration::from_millis(50));
}

#[cfg(unix)]
#[test]
fn test_default_lock_dir_is_fixed() {
    let config = Config::default();
    assert_eq!(config.lock_dir(), PathBuf::from("/tmp/global-mutex"));
}

#[cfg(unix)]
#[test]
#[serial]
fn test_default_lock_dir_ignores_tmpdir() {
    let original = std::env::var_os("TMPDIR");
    // Left in place: tests running in parallel may create temp dirs in it.
    let alternate = std::env::temp_dir().join("global-mutex-alt-tmpdir-a");
    std::fs::create_dir_all(&alternate).unwrap();

    let before = Config::default().lock_dir();
    // SAFETY: serialized with every other test touching the environment.
    unsafe { std::env::set_var("TMPDIR", &alternate) };
    let after = Config::default().lock_dir();
    match original {
        Some(value) => unsafe { std::env::set_var("TMPDIR", value) },
        None => unsafe { std::env::remove_var("TMPDIR") },
    }

    assert_eq!(before, after);
    assert!(!after.starts_with(&alternate));
}

#[test]
fn test_parse_empty_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
lock_dir: /var/run/locks
poll_max_ms: 200
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_dir(), PathBuf::from("/var/run/locks"));
    assert_eq!(config.poll_max_ms, 200);

    // Unspecified values should use defaults
    assert_eq!(config.poll_min_ms, 1);
    assert_eq!(config.stale_minutes, 120);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
stale_minutes: 30
future_option: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.stale_minutes, 30);
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let err = Config::from_yaml("poll_min_ms: [not, a, number]").unwrap_err();
    assert!(matches!(err, GlobalMutexError::Config(_)));
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_validate_rejects_zero_poll_interval() {
    let err = Config::from_yaml("poll_min_ms: 0").unwrap_err();
    assert!(err.to_string().contains("poll_min_ms"));
}

#[test]
fn test_validate_rejects_inverted_poll_bounds() {
    let err = Config::from_yaml("poll_min_ms: 100\npoll_max_ms: 10").unwrap_err();
    assert!(err.to_string().contains("poll_max_ms (10)"));
}

#[test]
fn test_validate_rejects_zero_stale_minutes() {
    let err = Config::from_yaml("stale_minutes: 0").unwrap_err();
    assert!(err.to_string().contains("stale_minutes"));
}

#[test]
fn test_validate_rejects_empty_lock_dir() {
    let err = Config::from_yaml("lock_dir: \"\"").unwrap_err();
    assert!(err.to_string().contains("lock_dir"));
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "stale_minutes: 15\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.stale_minutes, 15);
}

#[test]
fn test_load_missing_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = Config::load(temp_dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, GlobalMutexError::Config(_)));
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
#[serial]
fn test_discover_reads_env_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "poll_max_ms: 75\n").unwrap();

    // SAFETY: serialized with every other test touching the environment.
    unsafe { std::env::set_var(CONFIG_ENV, &path) };
    let config = Config::discover();
    unsafe { std::env::remove_var(CONFIG_ENV) };

    assert_eq!(config.unwrap().poll_max_ms, 75);
}

#[test]
#[serial]
fn test_discover_defaults_without_env() {
    // SAFETY: serialized with every other test touching the environment.
    unsafe { std::env::remove_var(CONFIG_ENV) };
    assert_eq!(Config::discover().unwrap(), Config::default());
}
