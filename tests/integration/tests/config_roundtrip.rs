//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be serialized, written to disk,
//! loaded back, and turned into a working vault.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use vaultkv_core::config::{BackendKind, Config, ConfigBuilder, LogLevel};
use vaultkv_store::{open_backing_store, MemoryBackingStore, Vault};

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vaultkv.json5");

    let config = ConfigBuilder::new()
        .namespace("com.example.app")
        .persisting_key("install_id")
        .persisting_key("device_token")
        .backend(BackendKind::Memory)
        .sweep_namespace(true)
        .log_level(LogLevel::Debug)
        .build();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.namespace, "com.example.app");
    assert_eq!(loaded.persisting_keys, vec!["install_id", "device_token"]);
    assert_eq!(loaded.backend.kind, BackendKind::Memory);
    assert!(loaded.reset.sweep_namespace);
    assert_eq!(loaded.logging.level, LogLevel::Debug);
}

#[test]
fn test_config_parse_json5_with_comments() {
    let config = Config::parse(
        r#"{
            // vault identity
            namespace: 'com.example.app',
            persisting_keys: ['install_id',],
            backend: { kind: 'file', dir: '/tmp/vaultkv-test' },
        }"#,
    )
    .unwrap();
    assert_eq!(config.namespace, "com.example.app");
    assert_eq!(config.backend.kind, BackendKind::File);
    assert_eq!(config.store_dir().unwrap(), Path::new("/tmp/vaultkv-test"));
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/vaultkv.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json5").is_err());
}

#[tokio::test]
async fn test_vault_from_loaded_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vaultkv.json5");
    ConfigBuilder::new()
        .namespace("configured")
        .persisting_key("keep")
        .build()
        .save(&path)
        .unwrap();

    let config = Config::load(&path).unwrap();
    let vault = Vault::from_config(&config, Arc::new(MemoryBackingStore::new())).unwrap();
    vault.set_string("keep", "1").await.unwrap();
    vault.set_string("drop", "2").await.unwrap();
    vault.reset().await.unwrap();

    assert_eq!(vault.string("keep").await.unwrap().as_deref(), Some("1"));
    assert!(vault.string("drop").await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_memory_backend_from_config() {
    let config = ConfigBuilder::new().backend(BackendKind::Memory).build();
    let backing = open_backing_store(&config).unwrap();
    assert_eq!(backing.name(), "memory");
}
