//! Import subcommand.
//!
//! Replaces one collection with the records in a JSON file. Gzipped files
//! are detected by content and inflated before parsing.

use crate::types::CollectionName;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Collection to replace: clients, engagements, client-interactions or users
    #[arg(value_name = "COLLECTION")]
    pub collection: CollectionName,

    /// Path to the JSON document to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Validate the document without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl ImportArgs {
    /// Check if this is a gzipped file based on extension
    pub fn is_gzipped(&self) -> bool {
        self.file.extension().is_some_and(|ext| ext == "gz")
    }

    /// Describe the import mode for logging
    pub fn import_mode(&self) -> &'static str {
        if self.dry_run { "dry-run" } else { "replace" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(file: &str, dry_run: bool) -> ImportArgs {
        ImportArgs {
            collection: CollectionName::Engagements,
            file: PathBuf::from(file),
            dry_run,
        }
    }

    #[test]
    fn test_is_gzipped() {
        assert!(!args("engagements.json", false).is_gzipped());
        assert!(args("engagements.json.gz", false).is_gzipped());
    }

    #[test]
    fn test_import_mode() {
        assert_eq!(args("e.json", true).import_mode(), "dry-run");
        assert_eq!(args("e.json", false).import_mode(), "replace");
    }
}
