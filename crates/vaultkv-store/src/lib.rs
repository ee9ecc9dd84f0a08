//! Namespaced key-value vault for vaultkv.
//!
//! A [`Vault`] fronts a slow, fallible [`BackingStore`] with an in-memory
//! cache under a single-writer, multiple-reader discipline. Values can be
//! read and written as raw bytes, UTF-8 strings, booleans, integers, or
//! arbitrary JSON. Two resets are offered: a selective reset that keeps the
//! vault's persisting keys, and a hard reset that keeps nothing.

pub mod backing;
pub mod cache;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod keychain;
pub mod vault;

pub use backing::{
    open_backing_store, BackingError, BackingStore, Category, FileBackingStore,
    MemoryBackingStore,
};
pub use cache::{CacheCore, ResetReport};
pub use error::{Result, VaultError};
pub use vault::{Vault, VaultBuilder};
