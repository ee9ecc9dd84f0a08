//! # vaultkv-core
//!
//! Shared building blocks for the vaultkv crates:
//!
//! - **Configuration**: loading, validation, and persistence of the JSON5 config file
//! - **Keys**: the naming rules every vault key must satisfy
//! - **Paths**: resolution of the `~/.vaultkv` directory tree
//! - **Secrets**: a zeroizing byte buffer that never prints its contents

pub mod config;
pub mod env;
pub mod error;
pub mod key;
pub mod paths;
pub mod secret;

pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use secret::SecretBytes;
