//! `vaultkv get|set|remove` subcommands.

use clap::{Args, ValueEnum};
use vaultkv_store::Vault;

/// How a value is encoded on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    /// Bytes, written and printed as hex
    Raw,
    /// UTF-8 text
    #[default]
    String,
    /// `true` or `false`
    Bool,
    /// Signed 64-bit integer
    Int,
    /// Any JSON document
    Json,
}

#[derive(Args)]
pub struct GetArgs {
    /// Key to read
    pub key: String,

    /// Interpret the stored bytes as this type
    #[arg(long = "type", value_enum, default_value_t)]
    pub value_type: ValueType,
}

#[derive(Args)]
pub struct SetArgs {
    /// Key to write
    pub key: String,

    /// Value to store
    pub value: String,

    /// Encode the value as this type
    #[arg(long = "type", value_enum, default_value_t)]
    pub value_type: ValueType,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Key to remove
    pub key: String,
}

pub async fn get(vault: &Vault, args: GetArgs) -> anyhow::Result<()> {
    let key = args.key.as_str();
    let rendered = match args.value_type {
        ValueType::Raw => vault
            .data(key)
            .await?
            .map(|bytes| hex::encode(bytes.expose_secret())),
        ValueType::String => vault.string(key).await?,
        ValueType::Bool => vault.bool(key).await?.map(|b| b.to_string()),
        ValueType::Int => vault.int(key).await?.map(|i| i.to_string()),
        ValueType::Json => match vault.value(key).await? {
            Some(value) => Some(serde_json::to_string_pretty(&value)?),
            None => None,
        },
    };

    match rendered {
        Some(text) => {
            println!("{}", text);
            Ok(())
        }
        None => anyhow::bail!("No {:?} value stored under '{}'", args.value_type, key),
    }
}

pub async fn set(vault: &Vault, args: SetArgs) -> anyhow::Result<()> {
    let key = args.key.as_str();
    match args.value_type {
        ValueType::Raw => {
            let bytes = hex::decode(args.value.trim())
                .map_err(|e| anyhow::anyhow!("Raw values must be hex: {}", e))?;
            vault.set_data(key, &bytes).await?;
        }
        ValueType::String => vault.set_string(key, &args.value).await?,
        ValueType::Bool => {
            let value: bool = args
                .value
                .parse()
                .map_err(|_| anyhow::anyhow!("Expected 'true' or 'false', got '{}'", args.value))?;
            vault.set_bool(key, value).await?;
        }
        ValueType::Int => {
            let value: i64 = args
                .value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid integer '{}': {}", args.value, e))?;
            vault.set_int(key, value).await?;
        }
        ValueType::Json => {
            let value: serde_json::Value = serde_json::from_str(&args.value)?;
            vault.set_value(key, &value).await?;
        }
    }

    println!("Stored '{}'.", key);
    Ok(())
}

pub async fn remove(vault: &Vault, args: RemoveArgs) -> anyhow::Result<()> {
    vault.remove_data(&args.key).await?;
    println!("Removed '{}'.", args.key);
    Ok(())
}
