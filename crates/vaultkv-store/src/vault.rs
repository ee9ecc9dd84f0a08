//! Typed vault facade.
//!
//! [`Vault`] pairs a [`CacheCore`] with the [`crate::codec`] functions. It has
//! no state of its own beyond the persisting-key list; every accessor is a
//! cache read followed by a decode, or an encode followed by a cache write.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use vaultkv_core::{Config, SecretBytes};

use crate::backing::BackingStore;
use crate::cache::{CacheCore, ResetReport};
use crate::codec;
use crate::error::Result;

/// Builder for [`Vault`].
pub struct VaultBuilder {
    namespace: String,
    backing: Arc<dyn BackingStore>,
    persisting_keys: Vec<String>,
    sweep_namespace: bool,
}

impl VaultBuilder {
    /// Add a key that survives [`Vault::reset`].
    pub fn persisting_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.persisting_keys.contains(&key) {
            self.persisting_keys.push(key);
        }
        self
    }

    pub fn persisting_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            self = self.persisting_key(key);
        }
        self
    }

    /// Also clear everything under the namespace during resets.
    pub fn sweep_namespace(mut self, enabled: bool) -> Self {
        self.sweep_namespace = enabled;
        self
    }

    pub fn build(self) -> Vault {
        Vault {
            core: CacheCore::new(self.namespace, self.backing)
                .with_namespace_sweep(self.sweep_namespace),
            persisting_keys: self.persisting_keys,
        }
    }
}

/// A namespaced, typed key-value vault.
pub struct Vault {
    core: CacheCore,
    persisting_keys: Vec<String>,
}

impl Vault {
    pub fn new(namespace: impl Into<String>, backing: Arc<dyn BackingStore>) -> Self {
        Self::builder(namespace, backing).build()
    }

    pub fn builder(namespace: impl Into<String>, backing: Arc<dyn BackingStore>) -> VaultBuilder {
        VaultBuilder {
            namespace: namespace.into(),
            backing,
            persisting_keys: Vec::new(),
            sweep_namespace: false,
        }
    }

    /// Build a vault from validated configuration.
    pub fn from_config(config: &Config, backing: Arc<dyn BackingStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self::builder(config.namespace.clone(), backing)
            .persisting_keys(config.persisting_keys.iter().cloned())
            .sweep_namespace(config.reset.sweep_namespace)
            .build())
    }

    pub fn namespace(&self) -> &str {
        self.core.namespace()
    }

    pub fn persisting_keys(&self) -> &[String] {
        &self.persisting_keys
    }

    /// The underlying cache, for diagnostics.
    pub fn cache(&self) -> &CacheCore {
        &self.core
    }

    // -- raw bytes ----------------------------------------------------------

    pub async fn data(&self, key: &str) -> Result<Option<SecretBytes>> {
        self.core.get(key).await
    }

    pub async fn set_data(&self, key: &str, value: &[u8]) -> Result<()> {
        self.core.set(key, Some(value)).await
    }

    /// Delete `key`. Deleting a missing key succeeds.
    pub async fn remove_data(&self, key: &str) -> Result<()> {
        self.core.set(key, None).await
    }

    /// Alias of [`Vault::remove_data`]; removal does not depend on the type.
    pub async fn remove_value(&self, key: &str) -> Result<()> {
        self.remove_data(key).await
    }

    // -- strings ------------------------------------------------------------

    /// `None` when absent or not valid UTF-8.
    pub async fn string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .core
            .get(key)
            .await?
            .and_then(|bytes| codec::decode_string(bytes.expose_secret())))
    }

    pub async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set_data(key, &codec::encode_string(value)).await
    }

    /// Store `value`, or remove the key when it is `None`.
    pub async fn set_string_opt(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => self.set_string(key, value).await,
            None => self.remove_data(key).await,
        }
    }

    // -- booleans -----------------------------------------------------------

    /// `None` when absent or not a JSON boolean.
    pub async fn bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self
            .core
            .get(key)
            .await?
            .and_then(|bytes| codec::decode_bool(bytes.expose_secret())))
    }

    pub async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set_data(key, &codec::encode_bool(value)).await
    }

    pub async fn set_bool_opt(&self, key: &str, value: Option<bool>) -> Result<()> {
        match value {
            Some(value) => self.set_bool(key, value).await,
            None => self.remove_data(key).await,
        }
    }

    // -- integers -----------------------------------------------------------

    /// `None` when absent or not a JSON integer.
    pub async fn int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .core
            .get(key)
            .await?
            .and_then(|bytes| codec::decode_int(bytes.expose_secret())))
    }

    pub async fn set_int(&self, key: &str, value: i64) -> Result<()> {
        self.set_data(key, &codec::encode_int(value)).await
    }

    pub async fn set_int_opt(&self, key: &str, value: Option<i64>) -> Result<()> {
        match value {
            Some(value) => self.set_int(key, value).await,
            None => self.remove_data(key).await,
        }
    }

    // -- generic JSON -------------------------------------------------------

    /// Read any JSON value. Bytes that are not JSON are an error.
    pub async fn value(&self, key: &str) -> Result<Option<Value>> {
        match self.core.get(key).await? {
            Some(bytes) => Ok(Some(codec::decode_value(bytes.expose_secret())?)),
            None => Ok(None),
        }
    }

    pub async fn set_value(&self, key: &str, value: &Value) -> Result<()> {
        let bytes = codec::encode_value(value)?;
        self.set_data(key, &bytes).await
    }

    /// Read a JSON-encoded `T`. A payload that does not deserialize is an error.
    pub async fn json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.core.get(key).await? {
            Some(bytes) => Ok(Some(codec::decode_json(bytes.expose_secret())?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = codec::encode_json(value)?;
        self.set_data(key, &bytes).await
    }

    // -- resets -------------------------------------------------------------

    /// Clear every key except the persisting keys.
    ///
    /// Returns `Err` without deleting anything when a persisting key can be
    /// neither read from the backing store nor found in the cache. Sweep and
    /// restore failures are reported in the [`ResetReport`] instead.
    pub async fn reset(&self) -> Result<ResetReport> {
        self.core.reset(&self.persisting_keys).await
    }

    /// Clear every key, persisting keys included.
    pub async fn hard_reset(&self) -> ResetReport {
        self.core.hard_reset().await
    }
}
