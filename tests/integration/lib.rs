//! Shared helpers for the vaultkv integration tests.

use std::path::Path;
use std::sync::Arc;

use vaultkv_store::FileBackingStore;
use zeroize::Zeroizing;

/// Fixed master key so tests never touch the OS keychain.
pub const TEST_MASTER_KEY: [u8; 32] = [0x42; 32];

/// Open an encrypted file store rooted at `dir`.
pub fn file_store(dir: &Path) -> Arc<FileBackingStore> {
    Arc::new(FileBackingStore::new(
        dir.to_path_buf(),
        Zeroizing::new(TEST_MASTER_KEY.to_vec()),
    ))
}
