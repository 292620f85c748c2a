//! Configuration file support for bodylog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/bodylog/config.toml`.
//! Every section is optional.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub access: AccessConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Lift key → lowercase substring searched for in free-text exercise names
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedLifts(BTreeMap<String, String>);

impl TrackedLifts {
    pub fn new(lifts: BTreeMap<String, String>) -> Self {
        Self(lifts)
    }

    /// `(key, match_substring)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TrackedLifts {
    fn default() -> Self {
        let lifts = ["присед", "становая", "жим стоя"]
            .into_iter()
            .map(|name| (name.to_string(), name.to_string()))
            .collect();
        Self(lifts)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TrackedLifts {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Analytics parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    #[serde(default)]
    pub tracked_lifts: TrackedLifts,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            tracked_lifts: TrackedLifts::default(),
        }
    }
}

/// Result size limits for listing and search
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
            search_limit: default_search_limit(),
        }
    }
}

/// Shared-secret access configuration. No identity means open access.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AccessConfig {
    #[serde(default)]
    pub allowed_identity: Option<String>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("bodylog")
}

fn default_window_days() -> i64 {
    14
}

fn default_list_limit() -> usize {
    14
}

fn default_search_limit() -> usize {
    50
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the analytics engine cannot use
    pub fn validate(&self) -> Result<()> {
        for (key, pattern) in self.analytics.tracked_lifts.iter() {
            if pattern.trim().is_empty() {
                return Err(Error::Config(format!(
                    "tracked lift {:?} has an empty match pattern",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("bodylog").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
