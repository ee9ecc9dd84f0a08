//! Vault behavior over the encrypted file backend.
//!
//! These tests drive [`Vault`] against a real directory tree so the update,
//! add, and sweep primitives are exercised end to end.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use vaultkv_integration_tests::file_store;
use vaultkv_store::{BackingStore, Category, Vault};

fn count_files(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

#[tokio::test]
async fn test_values_survive_a_new_vault() {
    let dir = TempDir::new().unwrap();
    {
        let vault = Vault::new("com.example.app", file_store(dir.path()));
        vault.set_string("greeting", "Hello, Vault!").await.unwrap();
        vault.set_int("launches", 3).await.unwrap();
        vault.set_bool("onboarded", true).await.unwrap();
    }

    // A fresh vault has an empty cache and must read through to disk.
    let vault = Vault::new("com.example.app", file_store(dir.path()));
    assert_eq!(vault.cache().cached_len(), 0);
    assert_eq!(vault.string("greeting").await.unwrap().as_deref(), Some("Hello, Vault!"));
    assert_eq!(vault.int("launches").await.unwrap(), Some(3));
    assert_eq!(vault.bool("onboarded").await.unwrap(), Some(true));
}

#[tokio::test]
async fn test_overwrite_keeps_a_single_record() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new("ns", file_store(dir.path()));

    vault.set_string("k", "first").await.unwrap();
    vault.set_string("k", "second").await.unwrap();
    vault.set_string("k", "third").await.unwrap();

    assert_eq!(count_files(dir.path()), 1);
    assert_eq!(vault.string("k").await.unwrap().as_deref(), Some("third"));
}

#[tokio::test]
async fn test_two_vaults_share_a_namespace() {
    let dir = TempDir::new().unwrap();
    let writer = Vault::new("shared", file_store(dir.path()));
    let reader = Vault::new("shared", file_store(dir.path()));

    // A miss is not cached, so the reader sees a later write from the writer.
    assert!(reader.string("k").await.unwrap().is_none());
    writer.set_string("k", "v").await.unwrap();
    assert_eq!(reader.string("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn test_namespaces_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let store = file_store(dir.path());
    let a = Vault::new("app.a", store.clone());
    let b = Vault::new("app.b", store.clone());

    a.set_string("token", "A").await.unwrap();
    b.set_string("token", "B").await.unwrap();
    b.remove_data("token").await.unwrap();

    assert_eq!(a.string("token").await.unwrap().as_deref(), Some("A"));
    assert!(b.string("token").await.unwrap().is_none());
}

#[tokio::test]
async fn test_selective_reset_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = file_store(dir.path());
    let vault = Vault::builder("ns", store.clone())
        .persisting_key("install_id")
        .build();

    vault.set_string("install_id", "device-1").await.unwrap();
    vault.set_string("session", "s3cr3t").await.unwrap();

    let report = vault.reset().await.unwrap().ensure_complete().unwrap();
    assert_eq!(report.restored, vec!["install_id".to_string()]);
    assert_eq!(count_files(dir.path()), 1);

    let fresh = Vault::new("ns", file_store(dir.path()));
    assert_eq!(fresh.string("install_id").await.unwrap().as_deref(), Some("device-1"));
    assert!(fresh.string("session").await.unwrap().is_none());
}

#[tokio::test]
async fn test_hard_reset_clears_disk() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::builder("ns", file_store(dir.path()))
        .persisting_key("install_id")
        .sweep_namespace(true)
        .build();

    vault.set_string("install_id", "device-1").await.unwrap();
    vault.set_data("blob", &[1, 2, 3]).await.unwrap();

    let report = vault.hard_reset().await;
    assert!(report.is_complete());
    assert!(report.namespace_swept);
    assert_eq!(count_files(dir.path()), 0);
    assert!(vault.string("install_id").await.unwrap().is_none());
}

#[tokio::test]
async fn test_typed_json_on_disk() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        id: u64,
        scopes: Vec<String>,
    }

    let dir = TempDir::new().unwrap();
    let vault = Vault::new("ns", file_store(dir.path()));
    let account = Account {
        id: 7,
        scopes: vec!["read".to_string(), "write".to_string()],
    };
    vault.set_json("account", &account).await.unwrap();

    let fresh = Vault::new("ns", file_store(dir.path()));
    assert_eq!(fresh.json::<Account>("account").await.unwrap(), Some(account));
}

#[tokio::test]
async fn test_plaintext_is_not_on_disk() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new("ns", file_store(dir.path()));
    vault.set_string("password", "hunter2-very-unique").await.unwrap();

    let item_dir = dir.path().join(Category::GenericSecret.as_str());
    let mut found = false;
    for ns in std::fs::read_dir(&item_dir).unwrap().flatten() {
        for file in std::fs::read_dir(ns.path()).unwrap().flatten() {
            let contents = std::fs::read_to_string(file.path()).unwrap();
            assert!(!contents.contains("hunter2-very-unique"));
            found = true;
        }
    }
    assert!(found);
}

#[tokio::test]
async fn test_concurrent_writers_and_readers() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(Vault::new("ns", file_store(dir.path())));

    let mut handles = Vec::new();
    for i in 0..8 {
        let vault = vault.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("key-{}", i % 4);
            vault.set_int(&key, i).await.unwrap();
            vault.int(&key).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    assert_eq!(count_files(dir.path()), 4);
    let store = file_store(dir.path());
    for i in 0..4 {
        assert!(store.fetch("ns", &format!("key-{i}")).await.is_ok());
    }
}
