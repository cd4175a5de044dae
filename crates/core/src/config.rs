//! Application configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then the
//! optional JSON file under the user's config directory, then `STOREFRONT_*`
//! environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ledger::RebuyPolicy;

/// Directory under the platform config/data roots owned by the application.
pub const APP_DIR: &str = "storefront";
/// Name of the configuration file inside [`config_path`]'s directory.
pub const CONFIG_FILE: &str = "config.json";
/// Public product endpoint used when nothing else is configured.
pub const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com/products";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "STOREFRONT";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Runtime settings for the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Product list endpoint; `<catalog_url>/{id}` serves single products.
    pub catalog_url: String,
    /// Directory holding persisted state.
    pub data_dir: PathBuf,
    /// Per-request timeout for catalog calls.
    pub request_timeout_secs: u64,
    /// Treatment of purchases of already-owned products.
    #[serde(default)]
    pub rebuy_policy: RebuyPolicy,
    /// Fixed seed for reward draws; random when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            data_dir: default_data_dir(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            rebuy_policy: RebuyPolicy::default(),
            reward_seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_layered(&config_path(), ENV_PREFIX)
    }

    /// Load configuration from `path` (if it exists) and variables prefixed with `env_prefix`.
    pub fn load_layered(path: &Path, env_prefix: &str) -> Result<Self> {
        let defaults = Self::default();
        let config = Config::builder()
            .set_default("catalog_url", defaults.catalog_url)?
            .set_default(
                "data_dir",
                defaults.data_dir.to_string_lossy().into_owned(),
            )?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("rebuy_policy", "charge")?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(env_prefix).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let loaded: Self = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        Ok(loaded)
    }
}

/// Default location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default directory for persisted state.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!(path = %path.display(), "Default configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TEST_PREFIX: &str = "STOREFRONT_CONFIG_TEST_UNSET";

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_layered(&dir.path().join(CONFIG_FILE), TEST_PREFIX)?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{ "catalog_url": "http://localhost:8080/products", "rebuy_policy": "reject", "reward_seed": 7 }"#,
        )?;

        let config = AppConfig::load_layered(&path, TEST_PREFIX)?;
        assert_eq!(config.catalog_url, "http://localhost:8080/products");
        assert_eq!(config.rebuy_policy, RebuyPolicy::Reject);
        assert_eq!(config.reward_seed, Some(7));
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn default_file_is_written_once_and_loadable() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.is_file());

        fs::write(&path, r#"{ "request_timeout_secs": 3 }"#)?;
        write_default_config(&path)?;
        let config = AppConfig::load_layered(&path, TEST_PREFIX)?;
        assert_eq!(config.request_timeout_secs, 3);
        Ok(())
    }
}
