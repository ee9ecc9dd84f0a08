//! Encrypted file-system backing store.
//!
//! Each item is one JSON record at
//! `{base_dir}/{category}/{sha256(namespace)}/{sha256(key)}.json`, holding the
//! sealed value plus the plaintext namespace and key it belongs to. Hashing
//! keeps path components short and filesystem-safe; the stored names are
//! checked on every read. Directories are `0700` and files `0600` on Unix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use super::{codes, BackingError, BackingStore, Category};
use crate::crypto::{self, CryptoError, Sealed};

/// On-disk representation of one item.
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    namespace: String,
    key: String,
    category: Category,
    /// `nonce || ciphertext`, base64-encoded.
    encrypted_value: String,
    /// HKDF salt, hex-encoded.
    salt: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CryptoError> for BackingError {
    fn from(e: CryptoError) -> Self {
        BackingError::failure(codes::CRYPTO, e.to_string())
    }
}

fn io_failure(context: &str, e: std::io::Error) -> BackingError {
    BackingError::failure(
        e.raw_os_error().unwrap_or(codes::IO),
        format!("{context}: {e}"),
    )
}

fn corrupt(message: impl Into<String>) -> BackingError {
    BackingError::failure(codes::CORRUPT, message)
}

fn digest_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// A file-system-backed [`BackingStore`].
pub struct FileBackingStore {
    base_dir: PathBuf,
    master_key: Zeroizing<Vec<u8>>,
}

impl FileBackingStore {
    /// Create a store rooted at `base_dir` sealing records with `master_key`.
    pub fn new(base_dir: PathBuf, master_key: Zeroizing<Vec<u8>>) -> Self {
        Self {
            base_dir,
            master_key,
        }
    }

    fn category_dir(&self, category: Category) -> PathBuf {
        self.base_dir.join(category.as_str())
    }

    fn namespace_dir(&self, category: Category, namespace: &str) -> PathBuf {
        self.category_dir(category).join(digest_hex(namespace))
    }

    fn item_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(Category::GenericSecret, namespace)
            .join(digest_hex(key))
            .with_extension("json")
    }

    async fn read_item(&self, path: &Path) -> Result<Option<StoredItem>, BackingError> {
        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_failure("read item", e)),
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| corrupt(format!("item json decode error: {e}")))
    }

    fn seal(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(String, String), BackingError> {
        let sealed = crypto::seal(&self.master_key, value, &crypto::record_aad(namespace, key))?;
        Ok((
            base64::engine::general_purpose::STANDARD.encode(&sealed.ciphertext),
            hex::encode(&sealed.salt),
        ))
    }

    fn open(&self, item: &StoredItem) -> Result<Vec<u8>, BackingError> {
        let sealed = Sealed {
            ciphertext: base64::engine::general_purpose::STANDARD
                .decode(&item.encrypted_value)
                .map_err(|e| corrupt(format!("base64 decode failed: {e}")))?,
            salt: hex::decode(&item.salt).map_err(|e| corrupt(format!("hex decode failed: {e}")))?,
        };
        let aad = crypto::record_aad(&item.namespace, &item.key);
        Ok(crypto::open(&self.master_key, &sealed, &aad)?)
    }

    fn encode_item(item: &StoredItem) -> Result<Vec<u8>, BackingError> {
        serde_json::to_vec_pretty(item).map_err(|e| corrupt(format!("item json encode error: {e}")))
    }

    /// Replace the record at `path`.
    async fn write_item(&self, path: &Path, item: &StoredItem) -> Result<(), BackingError> {
        let tmp = write_tmp(path, &Self::encode_item(item)?).await?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| io_failure("rename tmp", e))
    }

    /// Create the record at `path`, failing with [`BackingError::Duplicate`]
    /// if one already exists.
    async fn create_item(&self, path: &Path, item: &StoredItem) -> Result<(), BackingError> {
        let tmp = write_tmp(path, &Self::encode_item(item)?).await?;
        // Linking refuses to overwrite, so only one concurrent creator wins.
        let linked = tokio::fs::hard_link(&tmp, path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(BackingError::Duplicate),
            Err(e) => Err(io_failure("link item", e)),
        }
    }
}

/// Create `dir` and its parents, restricting each to the owner on Unix.
async fn ensure_dir(dir: &Path) -> Result<(), BackingError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| io_failure("create dir", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
            .await
            .map_err(|e| io_failure("set dir permissions", e))?;
    }

    Ok(())
}

/// Write `bytes` to a temp file beside `path`, unique to this call.
async fn write_tmp(path: &Path, bytes: &[u8]) -> Result<PathBuf, BackingError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    let tmp = path.with_extension(format!("{:016x}.tmp", rand::random::<u64>()));
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| io_failure("write tmp", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| io_failure("set file permissions", e))?;
    }

    Ok(tmp)
}

async fn remove_tree(dir: &Path) -> Result<(), BackingError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_failure("remove dir", e)),
    }
}

#[async_trait]
impl BackingStore for FileBackingStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn fetch(&self, namespace: &str, key: &str) -> Result<Vec<u8>, BackingError> {
        let path = self.item_path(namespace, key);
        let item = self.read_item(&path).await?.ok_or(BackingError::NotFound)?;
        if item.namespace != namespace || item.key != key {
            return Err(corrupt(format!("item at {} does not match its location", path.display())));
        }
        self.open(&item)
    }

    async fn update(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), BackingError> {
        let path = self.item_path(namespace, key);
        let existing = self.read_item(&path).await?.ok_or(BackingError::NotFound)?;

        let (encrypted_value, salt) = self.seal(namespace, key, value)?;
        let item = StoredItem {
            namespace: namespace.to_string(),
            key: key.to_string(),
            category: Category::GenericSecret,
            encrypted_value,
            salt,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        debug!(namespace, key, path = %path.display(), "updating item");
        self.write_item(&path, &item).await
    }

    async fn add(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), BackingError> {
        let path = self.item_path(namespace, key);
        let (encrypted_value, salt) = self.seal(namespace, key, value)?;
        let now = Utc::now();
        let item = StoredItem {
            namespace: namespace.to_string(),
            key: key.to_string(),
            category: Category::GenericSecret,
            encrypted_value,
            salt,
            created_at: now,
            updated_at: now,
        };
        debug!(namespace, key, path = %path.display(), "adding item");
        self.create_item(&path, &item).await
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), BackingError> {
        let path = self.item_path(namespace, key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(namespace, key, "deleted item");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(BackingError::NotFound),
            Err(e) => Err(io_failure("remove item", e)),
        }
    }

    async fn delete_all_in_category(&self, category: Category) -> Result<(), BackingError> {
        debug!(%category, "sweeping category");
        remove_tree(&self.category_dir(category)).await
    }

    async fn delete_all_in_namespace(&self, namespace: &str) -> Result<(), BackingError> {
        let mut first_error = None;
        for category in Category::ALL {
            if let Err(e) = remove_tree(&self.namespace_dir(category, namespace)).await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
