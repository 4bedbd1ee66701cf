// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "KUSK";

/// Node settings. Loaded from built-in defaults, then the TOML
/// configuration file if present, then `KUSK_` prefixed environment
/// variables using `__` between section and key, e.g.
/// `KUSK_TXPOOL__MAX_POOL_TXS=500`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Node settings.
    pub node: NodeSettings,

    /// Transaction pool settings.
    pub txpool: TxPoolSettings,
}

impl Settings {
    /// Loads settings using the default configuration file path.
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(default_config_path().as_deref())
    }

    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Writes the default settings as TOML to `path`, creating parent
    /// directories as needed.
    pub fn write_default(path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let settings_str = toml::ser::to_string_pretty(&Settings::default())?;
        fs::write(path, settings_str)?;
        Ok(())
    }
}

/// `<config dir>/Kusk/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("Kusk");
    path.push("config.toml");
    Some(path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// The network the node runs on. One of `mainnet`, `wisdom` or `solonet`.
    pub network_name: String,

    /// Node data directory
    pub data_dir: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|mut path| {
                path.push("Kusk");
                path.to_string_lossy().into_owned()
            })
            .unwrap_or_default();

        Self {
            network_name: "mainnet".to_owned(),
            data_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxPoolSettings {
    /// Maximum number of remembered validation failures.
    pub max_cached_err_txs: usize,

    /// Seconds after which a remembered validation failure is forgotten.
    pub err_cache_ttl_secs: u64,

    /// Maximum number of admitted transactions.
    pub max_pool_txs: usize,

    /// Outputs below this amount make a transaction dust.
    pub min_output_amount: u64,

    /// Seconds after which an admitted transaction is dropped.
    pub tx_ttl_secs: u64,
}

impl Default for TxPoolSettings {
    fn default() -> Self {
        Self {
            max_cached_err_txs: 1000,
            err_cache_ttl_secs: 600,
            max_pool_txs: 10_000,
            min_output_amount: 1,
            tx_ttl_secs: 3600,
        }
    }
}
