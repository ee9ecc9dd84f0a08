//! Error types for vault operations.

use thiserror::Error;
use vaultkv_core::ConfigError;

use crate::backing::{BackingError, Category};

/// Errors surfaced by [`crate::Vault`] and [`crate::CacheCore`].
///
/// "Not found" never appears here: a missing entry is `Ok(None)` on reads and
/// a no-op on deletes. Type mismatches on the string/bool/int accessors are
/// likewise reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Backing store failure: {0}")]
    Backing(#[from] BackingError),

    #[error("Malformed value: {0}")]
    MalformedValue(#[from] serde_json::Error),

    #[error(
        "Reset incomplete: failed categories {failed_categories:?}, \
         namespace cleanup failed: {namespace_cleanup_failed}, unrestored keys {unrestored_keys:?}"
    )]
    ResetPartialFailure {
        failed_categories: Vec<Category>,
        namespace_cleanup_failed: bool,
        unrestored_keys: Vec<String>,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
