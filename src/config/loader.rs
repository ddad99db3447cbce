//! Configuration loader with tier-based merging.
//!
//! Tiers, lowest priority first: embedded defaults, the project file
//! (`./engagement-tracker/config.yaml`), the user file
//! (`~/.engagement-tracker/config.yaml`), then environment variables.
//! An explicit `--config` file sits above the user tier.

use super::merge::deep_merge_all;
use super::types::Config;
use crate::format::OutputFormat;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_PREFIX: &str = "ENGAGEMENT_TRACKER_";
const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Explicit = 3,
    Environment = 4,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConfigTier::Defaults => "defaults",
            ConfigTier::Project => "project",
            ConfigTier::User => "user",
            ConfigTier::Explicit => "explicit",
            ConfigTier::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    /// File given with `--config` or `ENGAGEMENT_TRACKER_CONFIG_PATH`.
    pub explicit_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover directories from the environment, falling back to
    /// `./engagement-tracker` and `~/.engagement-tracker`.
    pub fn discover() -> Self {
        let env_path = |name: &str| std::env::var(format!("{}{}", ENV_PREFIX, name)).ok().map(PathBuf::from);

        Self {
            project_dir: env_path("PROJECT_DIR").or_else(|| Some(PathBuf::from("engagement-tracker"))),
            user_dir: env_path("USER_DIR")
                .or_else(|| dirs::home_dir().map(|home| home.join(".engagement-tracker"))),
            explicit_file: env_path("CONFIG_PATH"),
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    pub fn with_explicit_file(mut self, file: Option<PathBuf>) -> Self {
        if file.is_some() {
            self.explicit_file = file;
        }
        self
    }
}

/// Loads and holds the merged configuration.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed, with their tier.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with_env(paths, |name| std::env::var(name).ok())
    }

    /// Load with an injectable environment lookup.
    pub fn load_with_env<F>(paths: ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut sources = Vec::new();

        let candidates = [
            (ConfigTier::Project, paths.project_dir.as_ref().map(|d| d.join(CONFIG_FILE))),
            (ConfigTier::User, paths.user_dir.as_ref().map(|d| d.join(CONFIG_FILE))),
        ];
        for (tier, file) in candidates {
            let Some(file) = file.filter(|f| f.exists()) else {
                continue;
            };
            if let Some(value) = read_yaml_tier(&file, tier) {
                tiers.push(value);
                sources.push((tier, file));
            }
        }

        // An explicit file must exist and parse.
        if let Some(file) = &paths.explicit_file {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("reading config file {}", file.display()))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("parsing config file {}", file.display()))?;
            tiers.push(value);
            sources.push((ConfigTier::Explicit, file.clone()));
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(tiers))?;
        Self::apply_env_overrides(&mut config, env);

        debug!(sources = ?sources, "loaded configuration");
        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Apply `ENGAGEMENT_TRACKER_*` overrides. Unparseable values are ignored
    /// with a warning.
    fn apply_env_overrides<F>(config: &mut Config, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(&format!("{}{}", ENV_PREFIX, name));

        if let Some(db_path) = var("DB_PATH") {
            config.store.db_path = PathBuf::from(db_path);
        }
        if let Some(secs) = var("REFRESH_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.analytics.refresh_interval_secs = secs,
                Err(_) => warn!(value = %secs, "ignoring invalid {}REFRESH_SECS", ENV_PREFIX),
            }
        }
        if let Some(sort) = var("SORT") {
            match sort.parse() {
                Ok(key) => config.analytics.default_sort = key,
                Err(e) => warn!(error = %e, "ignoring invalid {}SORT", ENV_PREFIX),
            }
        }
        if let Some(format) = var("FORMAT") {
            match OutputFormat::parse(&format) {
                Some(format) => config.output.format = format,
                None => warn!(value = %format, "ignoring invalid {}FORMAT", ENV_PREFIX),
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

fn read_yaml_tier(file: &Path, tier: ConfigTier) -> Option<Value> {
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(%tier, file = %file.display(), error = %e, "cannot read config file; skipping");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%tier, file = %file.display(), error = %e, "invalid YAML in config file; skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::SortKey;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );
        let loader = ConfigLoader::load_with_env(paths, no_env).unwrap();
        assert_eq!(loader.config(), &Config::default());
        assert_eq!(loader.config().analytics.refresh_interval_secs, 5);
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn test_user_overrides_project_per_field() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("engagement-tracker");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join("config.yaml"),
            "analytics:\n  refresh_interval_secs: 30\n  default_sort: momentum\n",
        )
        .unwrap();
        std::fs::write(user_dir.join("config.yaml"), "analytics:\n  refresh_interval_secs: 60\n").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));
        let loader = ConfigLoader::load_with_env(paths, no_env).unwrap();
        let config = loader.config();
        assert_eq!(config.analytics.refresh_interval_secs, 60);
        assert_eq!(config.analytics.default_sort, SortKey::Momentum);
        assert_eq!(loader.sources().len(), 2);
    }

    #[test]
    fn test_invalid_tier_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("p");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "analytics: [unclosed").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_env(paths, no_env).unwrap();
        assert_eq!(loader.config(), &Config::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(None, None)
            .with_explicit_file(Some(temp.path().join("nope.yaml")));
        assert!(ConfigLoader::load_with_env(paths, no_env).is_err());
    }

    #[test]
    fn test_env_overrides_win() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("custom.yaml");
        std::fs::write(&explicit, "store:\n  db_path: from-file.db\noutput:\n  format: json\n").unwrap();

        let paths = ConfigPaths::with_dirs(None, None).with_explicit_file(Some(explicit));
        let loader = ConfigLoader::load_with_env(paths, |name| match name {
            "ENGAGEMENT_TRACKER_DB_PATH" => Some("from-env.db".to_string()),
            "ENGAGEMENT_TRACKER_REFRESH_SECS" => Some("not-a-number".to_string()),
            _ => None,
        })
        .unwrap();
        let config = loader.config();
        assert_eq!(config.store.db_path, PathBuf::from("from-env.db"));
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.analytics.refresh_interval_secs, 5);
    }
}
