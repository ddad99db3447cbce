//! Configuration system.
//!
//! Consolidates configuration from several tiers with field-by-field YAML
//! merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/engagement-tracker/config.yaml`
//! 3. **User** - `~/.engagement-tracker/config.yaml`
//! 4. **Explicit** - `--config <file>`
//! 5. **Environment** - `ENGAGEMENT_TRACKER_*`
//!
//! ## Environment Variables
//! - `ENGAGEMENT_TRACKER_CONFIG_PATH` - Explicit config file
//! - `ENGAGEMENT_TRACKER_PROJECT_DIR` - Project config dir
//! - `ENGAGEMENT_TRACKER_USER_DIR` - User config dir
//! - `ENGAGEMENT_TRACKER_DB_PATH` - Database path
//! - `ENGAGEMENT_TRACKER_REFRESH_SECS` - `watch` interval
//! - `ENGAGEMENT_TRACKER_SORT` - Default scorecard ordering
//! - `ENGAGEMENT_TRACKER_FORMAT` - Default output format

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier, ENV_PREFIX};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
