//! Cache-coherent access to a [`BackingStore`] for one namespace.
//!
//! Concurrency discipline: a `tokio::sync::RwLock<()>` gate admits any number
//! of readers or exactly one writer. Readers hold the shared side across their
//! backing `fetch`, so a fetch never races an in-flight mutation. Writers
//! (`set`, `reset`, `hard_reset`) hold the exclusive side across every backing
//! call they make. The entry map itself sits behind a short-lived
//! `parking_lot::RwLock` that is never held across an await.
//!
//! Absence is never cached. A miss always goes back to the backing store,
//! since another vault sharing the namespace may have written the key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::RwLock as Gate;
use tracing::{debug, warn};
use vaultkv_core::key::check_key;
use vaultkv_core::SecretBytes;

use crate::backing::{BackingError, BackingStore, Category};
use crate::error::{Result, VaultError};

pub use vaultkv_core::key::MAX_KEY_LEN;

/// Outcome of a reset or hard reset.
///
/// Every category is attempted even when earlier ones fail.
#[derive(Debug, Default)]
pub struct ResetReport {
    /// Categories whose sweep failed, with the failure.
    pub failed_categories: Vec<(Category, BackingError)>,
    /// Whether the namespace cleanup ran.
    pub namespace_swept: bool,
    /// Failure of the namespace cleanup, if it ran and failed.
    pub namespace_error: Option<BackingError>,
    /// Preserved keys written back after the sweep.
    pub restored: Vec<String>,
    /// Preserved keys that could not be written back.
    pub unrestored: Vec<(String, BackingError)>,
}

impl ResetReport {
    pub fn is_complete(&self) -> bool {
        self.failed_categories.is_empty()
            && self.namespace_error.is_none()
            && self.unrestored.is_empty()
    }

    /// Turn a partial failure into [`VaultError::ResetPartialFailure`].
    pub fn ensure_complete(self) -> Result<Self> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(VaultError::ResetPartialFailure {
            failed_categories: self.failed_categories.iter().map(|(c, _)| *c).collect(),
            namespace_cleanup_failed: self.namespace_error.is_some(),
            unrestored_keys: self.unrestored.iter().map(|(k, _)| k.clone()).collect(),
        })
    }
}

/// Reject keys the backing stores cannot address.
pub fn validate_key(key: &str) -> Result<()> {
    check_key(key).map_err(VaultError::InvalidKey)
}

/// In-memory mirror of one namespace in a [`BackingStore`].
pub struct CacheCore {
    namespace: String,
    backing: Arc<dyn BackingStore>,
    sweep_namespace: bool,
    gate: Gate<()>,
    entries: RwLock<HashMap<String, SecretBytes>>,
}

impl CacheCore {
    pub fn new(namespace: impl Into<String>, backing: Arc<dyn BackingStore>) -> Self {
        Self {
            namespace: namespace.into(),
            backing,
            sweep_namespace: false,
            gate: Gate::new(()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Also call [`BackingStore::delete_all_in_namespace`] after the category
    /// sweep of every reset.
    pub fn with_namespace_sweep(mut self, enabled: bool) -> Self {
        self.sweep_namespace = enabled;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of keys currently held in memory.
    pub fn cached_len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Read `key`, consulting the backing store on a cache miss.
    pub async fn get(&self, key: &str) -> Result<Option<SecretBytes>> {
        validate_key(key)?;
        let _shared = self.gate.read().await;
        self.load(key).await
    }

    /// Write `key`, or delete it when `value` is `None`.
    ///
    /// On a backing failure the in-memory entry is restored to what it was
    /// before the call.
    pub async fn set(&self, key: &str, value: Option<&[u8]>) -> Result<()> {
        validate_key(key)?;
        let _exclusive = self.gate.write().await;
        Ok(self.store(key, value.map(SecretBytes::from)).await?)
    }

    /// Clear everything except `preserve`.
    ///
    /// Preserved keys are read from the backing store before the sweep and
    /// written back after it. If a preserved key cannot be read and has no
    /// cached copy, the reset is abandoned before anything is deleted.
    pub async fn reset(&self, preserve: &[String]) -> Result<ResetReport> {
        for key in preserve {
            validate_key(key)?;
        }
        let _exclusive = self.gate.write().await;

        let mut kept = Vec::with_capacity(preserve.len());
        for key in preserve {
            match self.backing.fetch(&self.namespace, key).await {
                Ok(bytes) => kept.push((key.clone(), SecretBytes::new(bytes))),
                Err(BackingError::NotFound) => {}
                Err(e) => {
                    let cached = self.entries.read().get(key).cloned();
                    match cached {
                        Some(value) => {
                            warn!(namespace = %self.namespace, key = %key, error = %e,
                                "preserved key unreadable; keeping cached copy");
                            kept.push((key.clone(), value));
                        }
                        None => {
                            warn!(namespace = %self.namespace, key = %key, error = %e,
                                "preserved key unreadable; reset abandoned");
                            return Err(VaultError::Backing(e));
                        }
                    }
                }
            }
        }

        self.entries.write().clear();
        let mut report = self.sweep().await;

        for (key, value) in kept {
            match self.store(&key, Some(value)).await {
                Ok(()) => report.restored.push(key),
                Err(e) => {
                    warn!(namespace = %self.namespace, key = %key, error = %e,
                        "failed to restore preserved key");
                    report.unrestored.push((key, e));
                }
            }
        }

        debug!(
            namespace = %self.namespace,
            restored = report.restored.len(),
            complete = report.is_complete(),
            "reset finished"
        );
        Ok(report)
    }

    /// Clear everything, persisting keys included.
    pub async fn hard_reset(&self) -> ResetReport {
        let _exclusive = self.gate.write().await;
        self.entries.write().clear();
        let report = self.sweep().await;
        debug!(namespace = %self.namespace, complete = report.is_complete(), "hard reset finished");
        report
    }

    async fn load(&self, key: &str) -> Result<Option<SecretBytes>> {
        let cached = self.entries.read().get(key).cloned();
        if let Some(value) = cached {
            return Ok(Some(value));
        }

        match self.backing.fetch(&self.namespace, key).await {
            Ok(bytes) => {
                let value = SecretBytes::new(bytes);
                self.entries.write().insert(key.to_string(), value.clone());
                Ok(Some(value))
            }
            Err(BackingError::NotFound) => Ok(None),
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "backing fetch failed");
                Err(VaultError::Backing(e))
            }
        }
    }

    /// Caller must hold the exclusive gate.
    async fn store(
        &self,
        key: &str,
        value: Option<SecretBytes>,
    ) -> std::result::Result<(), BackingError> {
        let previous = {
            let mut entries = self.entries.write();
            match &value {
                Some(bytes) => entries.insert(key.to_string(), bytes.clone()),
                None => entries.remove(key),
            }
        };

        let result = match &value {
            Some(bytes) => {
                self.backing
                    .upsert(&self.namespace, key, bytes.expose_secret())
                    .await
            }
            None => match self.backing.delete(&self.namespace, key).await {
                Err(BackingError::NotFound) => Ok(()),
                other => other,
            },
        };

        if let Err(e) = result {
            let mut entries = self.entries.write();
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            warn!(namespace = %self.namespace, key, error = %e, "backing write failed; cache rolled back");
            return Err(e);
        }

        debug!(namespace = %self.namespace, key, deleted = value.is_none(), "stored");
        Ok(())
    }

    /// Caller must hold the exclusive gate.
    async fn sweep(&self) -> ResetReport {
        let mut report = ResetReport::default();

        for category in Category::ALL {
            if let Err(e) = self.backing.delete_all_in_category(category).await {
                warn!(namespace = %self.namespace, %category, error = %e, "category sweep failed");
                report.failed_categories.push((category, e));
            }
        }

        if self.sweep_namespace {
            report.namespace_swept = true;
            if let Err(e) = self.backing.delete_all_in_namespace(&self.namespace).await {
                warn!(namespace = %self.namespace, error = %e, "namespace sweep failed");
                report.namespace_error = Some(e);
            }
        }

        report
    }
}
