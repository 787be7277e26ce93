//! 配置加载测试

use std::fs;

use tempfile::TempDir;

use smartlinker::config::{StaticConfig, get_config, init_config};
use smartlinker::storage::SchemaVersion;

#[test]
fn test_load_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("smartlinker.toml");
    fs::write(
        &path,
        r#"
[server]
port = 9090

[store]
path = "/tmp/clicks.csv"
schema = "v1"

[recorder]
require_account = false

[api]
trusted_proxies = ["10.0.0.0/8"]
"#,
    )
    .unwrap();

    let config = StaticConfig::load(path.to_str()).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.store.path, "/tmp/clicks.csv");
    assert_eq!(config.store.schema, SchemaVersion::V1);
    assert!(!config.recorder.require_account);
    assert!(config.recorder.validate_destination);
    assert_eq!(config.api.trusted_proxies, vec!["10.0.0.0/8".to_string()]);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

    let config = StaticConfig::load(path.to_str()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.store.schema, SchemaVersion::V2);
    assert!(config.recorder.require_account);
}

#[test]
fn test_explicit_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = StaticConfig::load(path.to_str()).unwrap_err();
    assert_eq!(err.code(), "E004");
    assert!(err.message().contains("absent.toml"));
    assert!(init_config(path.to_str()).is_err());
}

#[test]
fn test_invalid_schema_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[store]\nschema = \"v9\"\n").unwrap();

    let err = StaticConfig::load(path.to_str()).unwrap_err();
    assert_eq!(err.code(), "E004");
}

#[test]
fn test_sample_config_roundtrips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.toml");
    StaticConfig::default().save_to_file(&path).unwrap();

    let loaded = StaticConfig::load(path.to_str()).unwrap();
    assert_eq!(loaded, StaticConfig::default());
    assert!(StaticConfig::generate_sample_config().contains("[store]"));
}

#[test]
fn test_init_config_updates_global() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("global.toml");
    fs::write(&path, "[server]\nport = 7070\n").unwrap();

    let config = init_config(path.to_str()).unwrap();
    assert_eq!(config.server.port, 7070);
    assert_eq!(get_config().server.port, 7070);
}
