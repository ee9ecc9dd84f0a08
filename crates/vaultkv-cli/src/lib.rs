//! vaultkv command-line interface.

pub mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use vaultkv_core::config::LogLevel;
use vaultkv_core::env::vars;
use vaultkv_core::{Config, ConfigError};
use vaultkv_store::{open_backing_store, Vault};

/// vaultkv - namespaced encrypted key-value vault
#[derive(Parser)]
#[command(name = "vaultkv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = vars::CONFIG, global = true)]
    pub config: Option<PathBuf>,

    /// Namespace to operate on, overriding the config
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the value stored under a key
    Get(commands::value::GetArgs),

    /// Store a value under a key
    Set(commands::value::SetArgs),

    /// Remove a key
    Remove(commands::value::RemoveArgs),

    /// Clear every key except the configured persisting keys
    Reset,

    /// Clear every key, persisting keys included
    HardReset,

    /// Show version information
    Version,
}

/// Load the configuration the CLI runs with.
///
/// An explicit path must exist; otherwise the default location is used and
/// a missing file falls back to defaults.
pub fn load_config(path: Option<&Path>, namespace: Option<&str>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => {
            let mut config = Config::load(path).map_err(|e| match e {
                ConfigError::NotFound(p) => {
                    anyhow::anyhow!("config file not found: {}", p.display())
                }
                other => anyhow::Error::new(other)
                    .context(format!("failed to load {}", path.display())),
            })?;
            config.apply_env_overrides();
            config
        }
        None => Config::load_or_default(),
    };

    if let Some(namespace) = namespace {
        config.namespace = namespace.to_string();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Filter directive for the tracing subscriber.
pub fn log_filter(verbose: u8, configured: LogLevel) -> String {
    let level = match verbose {
        0 => configured.as_str(),
        1 => "debug",
        _ => "trace",
    };
    format!("vaultkv={level},vaultkv_store={level},vaultkv_core={level}")
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("vaultkv {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let backing = open_backing_store(&config)
        .map_err(|e| anyhow::anyhow!("Failed to open backing store: {}", e))?;
    let vault = Vault::from_config(&config, Arc::clone(&backing))?;
    tracing::debug!(
        namespace = vault.namespace(),
        backend = backing.name(),
        "vault opened"
    );

    match cli.command {
        Commands::Get(args) => commands::value::get(&vault, args).await,
        Commands::Set(args) => commands::value::set(&vault, args).await,
        Commands::Remove(args) => commands::value::remove(&vault, args).await,
        Commands::Reset => commands::reset::reset(&vault).await,
        Commands::HardReset => commands::reset::hard_reset(&vault).await,
        Commands::Version => Ok(()),
    }
}
