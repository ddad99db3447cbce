//! Configuration types.

use crate::analytics::SortKey;
use crate::format::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration, merged across tiers.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where collections are persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("engagement-tracker/tracker.db")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsConfig {
    /// Seconds between recomputations in `watch`.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Scorecard ordering when `--sort` is not given.
    #[serde(default)]
    pub default_sort: SortKey,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            default_sort: SortKey::default(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    /// Default output format (json or markdown).
    #[serde(default)]
    pub format: OutputFormat,
}
