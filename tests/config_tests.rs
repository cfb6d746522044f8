// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use frameflow::Config;
use frameflow::FlowError;
use frameflow::errors::ConfigError;
use std::path::PathBuf;

fn temp_config_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("frameflow-test-{}-{}", name, std::process::id()))
        .join("config.json")
}

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.transport.worker_inflight_limit, 2);
    assert_eq!(config.transport.sab_write_retry_limit, 2);
    assert!(config.validate().is_ok(), "Default config should be valid");
}

#[test]
fn test_config_save_and_load() {
    let path = temp_config_path("roundtrip");
    let mut config = Config::default();
    config.transport.worker_inflight_limit = 3;
    config.simulation.row_padding = 0;

    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_missing_file_uses_defaults() {
    let path = temp_config_path("missing");
    let config = Config::load_or_default(Some(&path)).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_malformed_file_is_an_error() {
    let path = temp_config_path("malformed");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_or_default(Some(&path));
    assert!(matches!(
        result,
        Err(FlowError::Config(ConfigError::Malformed(_)))
    ));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_zero_limit_rejected_on_load() {
    let path = temp_config_path("zero-limit");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "transport": { "worker_inflight_limit": 0 } }"#).unwrap();

    let result = Config::load(&path);
    assert!(matches!(
        result,
        Err(FlowError::Config(ConfigError::InvalidValue { .. }))
    ));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
