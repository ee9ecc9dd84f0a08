//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Namespace isolating this vault's keys from every other vault.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Keys that survive a selective reset.
    #[serde(default)]
    pub persisting_keys: Vec<String>,

    /// Backing store selection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Reset behavior.
    #[serde(default)]
    pub reset: ResetConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            persisting_keys: Vec::new(),
            backend: BackendConfig::default(),
            reset: ResetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Backing store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Which backend to use.
    #[serde(default)]
    pub kind: BackendKind,

    /// Root directory for the file backend. Defaults to `~/.vaultkv/store`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Available backing stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Encrypted files on disk.
    #[default]
    File,
    /// Process-local memory; contents are lost on exit.
    Memory,
}

/// Reset configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Also delete everything stored under the namespace after the
    /// per-category sweep.
    #[serde(default)]
    pub sweep_namespace: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
