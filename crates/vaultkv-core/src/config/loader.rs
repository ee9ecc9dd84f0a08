//! Configuration loading and persistence.

use super::{BackendKind, Config, LogLevel};
use crate::env;
use crate::error::ConfigError;
use crate::key::check_key;
use crate::paths;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.namespace.trim().is_empty() {
            errors.push("Namespace must not be empty".to_string());
        }
        if self.namespace.chars().any(char::is_control) {
            errors.push("Namespace must not contain control characters".to_string());
        }

        let mut seen = HashSet::new();
        for key in &self.persisting_keys {
            if let Err(reason) = check_key(key) {
                errors.push(format!("Persisting key {:?} is invalid: {}", key, reason));
            } else if !seen.insert(key.as_str()) {
                errors.push(format!("Persisting key '{}' is listed more than once", key));
            }
        }

        if let Some(dir) = &self.backend.dir {
            if self.backend.kind == BackendKind::Memory {
                errors.push(format!(
                    "Backend dir '{}' is set but the memory backend does not use it",
                    dir.display()
                ));
            }
            if dir.as_os_str().is_empty() {
                errors.push("Backend dir must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from the default path, falling back to defaults if no
    /// file exists. Environment overrides are applied in both cases.
    pub fn load_or_default() -> Self {
        let mut config = match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("ignoring unreadable config file: {e}");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// Apply `VAULTKV_NAMESPACE` and `VAULTKV_DIR` on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(namespace) = env::get_var(env::vars::NAMESPACE) {
            self.namespace = namespace;
        }
        if let Some(dir) = env::get_var(env::vars::DIR) {
            self.backend.dir = Some(PathBuf::from(dir));
        }
    }

    /// Root directory for the file backend.
    pub fn store_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.backend.dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::store_dir(),
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Add a key that survives selective resets.
    pub fn persisting_key(mut self, key: impl Into<String>) -> Self {
        self.config.persisting_keys.push(key.into());
        self
    }

    /// Select the backend kind.
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.config.backend.kind = kind;
        self
    }

    /// Set the file backend directory.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.backend.dir = Some(dir.into());
        self
    }

    /// Enable or disable the namespace sweep during resets.
    pub fn sweep_namespace(mut self, enabled: bool) -> Self {
        self.config.reset.sweep_namespace = enabled;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }

    /// Validate and build the config, returning an error if validation fails.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
