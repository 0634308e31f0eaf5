//! Static configuration of a deployment, read from a TOML file.
//!
//! ```toml
//! store = "records.json"
//!
//! [platforms]
//! SpiNNaker = "core-hours"
//!
//! [[provider]]
//! name = "manchester"
//! api_key = "..."
//! platforms = ["SpiNNaker"]
//!
//! [ledger]
//! order = "creation-time"
//! overflow = "drop"
//!
//! [identity]
//! directory = "directory.toml"
//! cache_capacity = 256
//! cache_ttl = "5m"
//! ```
//!
//! Relative paths are resolved against the directory of the configuration file.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use hwq_core::auth::{ProviderEntry, ProviderTable};
use hwq_core::ledger::{Ledger, OverflowPolicy, QuotaOrder};
use hwq_core::model::PlatformTable;

use crate::common::error::error;

pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(256).unwrap();
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "records.json";

pub fn default_hwq_directory() -> PathBuf {
    let mut home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    home.push(".hwq");
    home
}

pub fn default_config_path() -> PathBuf {
    default_hwq_directory().join(CONFIG_FILE_NAME)
}

pub fn default_store_path() -> PathBuf {
    default_hwq_directory().join(STORE_FILE_NAME)
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default)]
    pub order: QuotaOrder,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Static directory of users and public collaborations.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: NonZeroUsize,
    #[serde(
        default = "default_cache_ttl",
        deserialize_with = "deserialize_duration"
    )]
    pub cache_ttl: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            directory: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

fn default_cache_capacity() -> NonZeroUsize {
    DEFAULT_CACHE_CAPACITY
}

fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}

// Allows specifying humantime format (30s, 5m, etc.)
fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: Option<PathBuf>,
    #[serde(default)]
    pub platforms: PlatformTable,
    #[serde(default, rename = "provider")]
    pub providers: Vec<ProviderEntry>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration at `path`. Without an explicit path, the default location is
    /// tried and the built-in defaults are used when there is no file.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = default_config_path();
                if !path.is_file() {
                    log::debug!("No configuration at {}, using defaults", path.display());
                    return Ok(Config::default());
                }
                path
            }
        };
        log::debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|e| {
            crate::Error::GenericError(format!(
                "Cannot read configuration {}: {e}",
                path.display()
            ))
        })?;
        let mut config = Config::from_toml(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(store) = self.store.as_mut() {
            resolve(store);
        }
        if let Some(directory) = self.identity.directory.as_mut() {
            resolve(directory);
        }
    }

    fn validate(&self) -> crate::Result<()> {
        for provider in &self.providers {
            if let Some(platform) = provider
                .platforms
                .iter()
                .find(|p| self.platforms.canonical_units(p).is_none())
            {
                return error(format!(
                    "Provider '{}' operates unknown platform '{platform}'",
                    provider.name
                ));
            }
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(default_store_path)
    }

    pub fn provider_table(&self) -> crate::Result<ProviderTable> {
        Ok(ProviderTable::new(self.providers.iter().cloned())?)
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(
            self.platforms.clone(),
            self.ledger.order,
            self.ledger.overflow,
        )
    }
}
