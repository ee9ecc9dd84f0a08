//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the vaultkv base directory (~/.vaultkv).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".vaultkv"))
}

/// Get the main config file path (~/.vaultkv/vaultkv.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("vaultkv.json5"))
}

/// Get the default file backend directory (~/.vaultkv/store).
pub fn store_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("store"))
}
