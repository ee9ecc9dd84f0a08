//! Environment variable handling.

use std::env;

/// Well-known environment variable names.
pub mod vars {
    /// Path to the config file.
    pub const CONFIG: &str = "VAULTKV_CONFIG";
    /// Namespace override.
    pub const NAMESPACE: &str = "VAULTKV_NAMESPACE";
    /// Backing store directory override.
    pub const DIR: &str = "VAULTKV_DIR";
    /// Hex-encoded master key for the file backend.
    pub const MASTER_KEY: &str = "VAULTKV_MASTER_KEY";
}

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
