//! Configuration resolution and graceful degradation tests
//!
//! Tests that manipulate REEL_* environment variables are marked #[serial]
//! so they never run in parallel with each other.

use reel_common::config::{
    load_toml_config, resolve_with, write_toml_config, CompiledDefaults, ConfigOverrides,
    ConfigResolver, LoggingConfig, LookupSettings, TomlConfig, ENV_API_BASE_URL, ENV_LOG_LEVEL,
};
use serial_test::serial;
use std::env;
use std::time::Duration;
use tempfile::TempDir;

fn defaults() -> CompiledDefaults {
    CompiledDefaults::for_current_platform()
}

#[test]
#[serial]
fn test_no_overrides_uses_compiled_defaults() {
    env::remove_var(ENV_API_BASE_URL);
    env::remove_var(ENV_LOG_LEVEL);

    let resolved = resolve_with(&ConfigOverrides::default(), &TomlConfig::default(), &defaults());

    assert_eq!(resolved.api_base_url, "http://localhost:8080/api");
    assert_eq!(resolved.log_level, "info");
    assert_eq!(resolved.debounce, Duration::from_millis(500));
    assert_eq!(resolved.backup_cap_bytes, 1_000_000);
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ENV_API_BASE_URL, "http://env-host/api/");

    let toml_config = TomlConfig {
        api_base_url: Some("http://toml-host/api".to_string()),
        ..Default::default()
    };
    let resolved = resolve_with(&ConfigOverrides::default(), &toml_config, &defaults());

    // Trailing slash is normalised away
    assert_eq!(resolved.api_base_url, "http://env-host/api");

    env::remove_var(ENV_API_BASE_URL);
}

#[test]
#[serial]
fn test_cli_beats_env() {
    env::set_var(ENV_LOG_LEVEL, "warn");

    let overrides = ConfigOverrides {
        log_level: Some("debug".to_string()),
        ..Default::default()
    };
    let resolved = resolve_with(&overrides, &TomlConfig::default(), &defaults());
    assert_eq!(resolved.log_level, "debug");

    env::remove_var(ENV_LOG_LEVEL);
}

#[test]
#[serial]
fn test_toml_used_when_no_cli_or_env() {
    env::remove_var(ENV_API_BASE_URL);
    env::remove_var(ENV_LOG_LEVEL);

    let toml_config = TomlConfig {
        api_base_url: Some("http://toml-host/api".to_string()),
        logging: LoggingConfig {
            level: "trace".to_string(),
        },
        lookup: LookupSettings {
            debounce_ms: 250,
            page_size: 5,
        },
        ..Default::default()
    };
    let resolved = resolve_with(&ConfigOverrides::default(), &toml_config, &defaults());

    assert_eq!(resolved.api_base_url, "http://toml-host/api");
    assert_eq!(resolved.log_level, "trace");
    assert_eq!(resolved.debounce, Duration::from_millis(250));
    assert_eq!(resolved.lookup_page_size, 5);
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_not_fatal() {
    env::remove_var(ENV_API_BASE_URL);

    let temp_dir = TempDir::new().unwrap();
    let overrides = ConfigOverrides {
        config_path: Some(temp_dir.path().join("does-not-exist.toml")),
        ..Default::default()
    };

    let resolved = ConfigResolver::new("reel-search").resolve(&overrides);
    assert_eq!(resolved.api_base_url, "http://localhost:8080/api");
}

#[test]
#[serial]
fn test_broken_config_file_falls_back_to_defaults() {
    env::remove_var(ENV_API_BASE_URL);

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "api_base_url = [not valid").unwrap();

    assert!(load_toml_config(&path).is_err());

    let overrides = ConfigOverrides {
        config_path: Some(path),
        ..Default::default()
    };
    let resolved = ConfigResolver::new("reel-search").resolve(&overrides);
    assert_eq!(resolved.api_base_url, "http://localhost:8080/api");
}

#[test]
fn test_write_toml_config_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("reel-search.toml");

    let config = TomlConfig {
        api_base_url: Some("http://api.example".to_string()),
        image_base_url: Some("https://img.example/w185".to_string()),
        ..Default::default()
    };

    write_toml_config(&config, &target).unwrap();

    assert!(target.exists());
    assert!(!temp_dir.path().join("nested").join("reel-search.toml.tmp").exists());

    let parsed = load_toml_config(&target).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_default_config_path_names_module() {
    if let Some(path) = ConfigResolver::new("reel-search").default_config_path() {
        assert!(path.ends_with("reel/reel-search.toml"));
    }
}
