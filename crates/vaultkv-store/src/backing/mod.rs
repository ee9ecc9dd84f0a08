//! Backing store abstraction.
//!
//! The [`BackingStore`] trait is the only interface the cache consumes. It is
//! the authoritative record for every namespace and is shared between vault
//! instances, so implementations must be safe to call concurrently.
//!
//! Two implementations ship with this crate: [`MemoryBackingStore`], an
//! instrumented in-process double, and [`FileBackingStore`], which keeps one
//! encrypted record per item on disk.

mod file;
mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vaultkv_core::config::BackendKind;
use vaultkv_core::Config;

use crate::error::Result;

pub use file::FileBackingStore;
pub use memory::{CallCounts, MemoryBackingStore, Operation};

/// Failure codes reported by the bundled backends.
pub mod codes {
    /// Filesystem error without an OS error number.
    pub const IO: i32 = 1;
    /// A stored record could not be parsed or did not match its location.
    pub const CORRUPT: i32 = 2;
    /// Encryption or decryption failed.
    pub const CRYPTO: i32 = 3;
    /// Failure injected by [`super::MemoryBackingStore`].
    pub const INJECTED: i32 = 99;
}

/// Result of a single backing store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackingError {
    #[error("item not found")]
    NotFound,

    #[error("item already exists")]
    Duplicate,

    #[error("code {code}: {message}")]
    Failure { code: i32, message: String },
}

impl BackingError {
    pub fn failure(code: i32, message: impl Into<String>) -> Self {
        Self::Failure {
            code,
            message: message.into(),
        }
    }

    /// Numeric code, if this is a [`BackingError::Failure`].
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Failure { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Classification the backing store uses to organize items.
///
/// Resets sweep every category independently because bulk deletion in the
/// store is scoped by category, not by namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GenericSecret,
    NetworkCredential,
    Certificate,
    CryptographicKey,
    Identity,
}

impl Category {
    /// Every category, in sweep order.
    pub const ALL: [Category; 5] = [
        Category::GenericSecret,
        Category::NetworkCredential,
        Category::Certificate,
        Category::CryptographicKey,
        Category::Identity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GenericSecret => "generic_secret",
            Category::NetworkCredential => "network_credential",
            Category::Certificate => "certificate",
            Category::CryptographicKey => "cryptographic_key",
            Category::Identity => "identity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative, possibly slow, possibly failing key-value store.
///
/// Vault entries always live in [`Category::GenericSecret`]; the other
/// categories hold items written by other parties and matter only to resets.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Read the bytes stored under `(namespace, key)`.
    ///
    /// Returns [`BackingError::NotFound`] when no such item exists.
    async fn fetch(&self, namespace: &str, key: &str) -> std::result::Result<Vec<u8>, BackingError>;

    /// Replace the bytes of an existing item.
    ///
    /// Returns [`BackingError::NotFound`] when the item does not exist.
    async fn update(
        &self,
        namespace: &str,
        key: &str,
        value: &[u8],
    ) -> std::result::Result<(), BackingError>;

    /// Create a new item.
    ///
    /// Returns [`BackingError::Duplicate`] when the item already exists.
    async fn add(
        &self,
        namespace: &str,
        key: &str,
        value: &[u8],
    ) -> std::result::Result<(), BackingError>;

    /// Update the item if it exists, otherwise create it.
    async fn upsert(
        &self,
        namespace: &str,
        key: &str,
        value: &[u8],
    ) -> std::result::Result<(), BackingError> {
        match self.update(namespace, key, value).await {
            Err(BackingError::NotFound) => self.add(namespace, key, value).await,
            other => other,
        }
    }

    /// Delete one item. Returns [`BackingError::NotFound`] when it is absent.
    async fn delete(&self, namespace: &str, key: &str) -> std::result::Result<(), BackingError>;

    /// Delete every item in `category`, across all namespaces.
    ///
    /// An already-empty category is a success.
    async fn delete_all_in_category(
        &self,
        category: Category,
    ) -> std::result::Result<(), BackingError>;

    /// Delete every item stored under `namespace`, in any category.
    async fn delete_all_in_namespace(
        &self,
        _namespace: &str,
    ) -> std::result::Result<(), BackingError> {
        Ok(())
    }
}

/// Open the backing store selected by `config`.
pub fn open_backing_store(config: &Config) -> Result<Arc<dyn BackingStore>> {
    match config.backend.kind {
        BackendKind::Memory => Ok(Arc::new(MemoryBackingStore::new())),
        BackendKind::File => {
            let dir = config.store_dir()?;
            let master_key = crate::keychain::get_or_create_master_key(&dir)?;
            Ok(Arc::new(FileBackingStore::new(dir, master_key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_all_is_unique() {
        let mut names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Category::ALL.len());
    }

    #[test]
    fn test_category_serde_matches_display() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_backing_error_code() {
        assert_eq!(BackingError::failure(7, "boom").code(), Some(7));
        assert_eq!(BackingError::NotFound.code(), None);
    }

    #[test]
    fn test_open_memory_backend() {
        let config = vaultkv_core::config::ConfigBuilder::new()
            .backend(BackendKind::Memory)
            .build();
        let store = open_backing_store(&config).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_default_upsert_falls_back_to_add() {
        let store = MemoryBackingStore::new();
        store.upsert("ns", "k", b"v1").await.unwrap();
        store.upsert("ns", "k", b"v2").await.unwrap();

        assert_eq!(store.fetch("ns", "k").await.unwrap(), b"v2");
        let calls = store.calls();
        assert_eq!(calls.update, 2);
        assert_eq!(calls.add, 1);
        assert_eq!(store.len(), 1);
    }
}
