//! Master key provisioning for the file backend.
//!
//! The master key is resolved in priority order:
//! 1. `VAULTKV_MASTER_KEY` environment variable (hex-encoded)
//! 2. macOS Keychain via Security.framework, or a `master.key` file in the
//!    store directory on other platforms
//! 3. Generate a new key and persist it to the location from step 2

use std::path::Path;

use tracing::debug;
use vaultkv_core::env::{get_var, vars};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_SIZE};
use crate::error::{Result, VaultError};

#[cfg(target_os = "macos")]
const SERVICE_NAME: &str = "vaultkv";
#[cfg(target_os = "macos")]
const ACCOUNT_NAME: &str = "master_key";

#[cfg(not(target_os = "macos"))]
const KEY_FILE: &str = "master.key";

/// Retrieve the master key, creating one if it does not exist yet.
///
/// `store_dir` is where the key file is kept on platforms without an OS
/// keychain.
pub fn get_or_create_master_key(store_dir: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(hex_key) = get_var(vars::MASTER_KEY) {
        debug!("using master key from environment variable");
        return parse_key(&hex_key, vars::MASTER_KEY);
    }

    if let Some(key) = load_persisted(store_dir)? {
        debug!("using persisted master key");
        return Ok(key);
    }

    debug!("generating new master key");
    let key = crypto::generate_master_key();
    persist(store_dir, &key)?;
    Ok(key)
}

fn parse_key(hex_key: &str, source: &str) -> Result<Zeroizing<Vec<u8>>> {
    let key = Zeroizing::new(
        hex::decode(hex_key.trim())
            .map_err(|e| VaultError::Keychain(format!("invalid hex in {source}: {e}")))?,
    );
    if key.len() != KEY_SIZE {
        return Err(VaultError::Keychain(format!(
            "{source} must decode to exactly {KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    Ok(key)
}

// ---------------------------------------------------------------------------
// macOS keychain implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
const ERR_SEC_ITEM_NOT_FOUND: i32 = -25300;

#[cfg(target_os = "macos")]
fn load_persisted(_store_dir: &Path) -> Result<Option<Zeroizing<Vec<u8>>>> {
    use security_framework::passwords::get_generic_password;

    match get_generic_password(SERVICE_NAME, ACCOUNT_NAME) {
        Ok(data) => {
            let hex_str = Zeroizing::new(String::from_utf8(data).map_err(|e| {
                VaultError::Keychain(format!("keychain data is not valid UTF-8: {e}"))
            })?);
            parse_key(&hex_str, "keychain item").map(Some)
        }
        Err(e) if e.code() == ERR_SEC_ITEM_NOT_FOUND => Ok(None),
        Err(e) => Err(VaultError::Keychain(format!("keychain read failed: {e}"))),
    }
}

#[cfg(target_os = "macos")]
fn persist(_store_dir: &Path, key: &[u8]) -> Result<()> {
    use security_framework::passwords::set_generic_password;

    let hex_key = Zeroizing::new(hex::encode(key));
    set_generic_password(SERVICE_NAME, ACCOUNT_NAME, hex_key.as_bytes())
        .map_err(|e| VaultError::Keychain(format!("keychain write failed: {e}")))
}

// ---------------------------------------------------------------------------
// Key file for platforms without an OS keychain
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "macos"))]
fn load_persisted(store_dir: &Path) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let path = store_dir.join(KEY_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let contents = Zeroizing::new(contents);
            parse_key(&contents, &path.display().to_string()).map(Some)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(VaultError::Keychain(format!(
            "could not read {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(not(target_os = "macos"))]
fn persist(store_dir: &Path, key: &[u8]) -> Result<()> {
    std::fs::create_dir_all(store_dir)?;
    let path = store_dir.join(KEY_FILE);
    let hex_key = Zeroizing::new(hex::encode(key));
    std::fs::write(&path, hex_key.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::warn!(
        path = %path.display(),
        "no OS keychain on this platform; master key stored in a file"
    );
    Ok(())
}
