//! CLI command definitions for engagement-tracker
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod export;
pub mod import;
pub mod records;

use crate::analytics::{SortKey, TaskFilter};
use crate::format::OutputFormat;
use clap::{Parser, Subcommand};
use export::ExportArgs;
use import::ImportArgs;
use records::{ClientCommand, EngagementCommand, InteractionCommand, ReportCommand, UserCommand};
use std::path::PathBuf;

/// Client engagement tracking and health analytics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Signed-in user id; records created are owned by this user
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Act with the manager role (see every user's records)
    #[arg(long, global = true)]
    pub manager: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the client health scorecard
    Metrics {
        /// Ordering (defaults to analytics.default_sort)
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,
    },

    /// Show per-user workload metrics
    Users,

    /// Summarize tasks across engagements, or list tasks matching a filter
    Summary {
        /// Task status (e.g. "in-progress", "stalled") or "complete"
        #[arg(long, value_parser = parse_task_filter)]
        filter: Option<TaskFilter>,
    },

    /// Recompute the scorecard on an interval until interrupted
    Watch {
        /// Seconds between refreshes (overrides config)
        #[arg(long)]
        interval: Option<u64>,

        /// Ordering (defaults to analytics.default_sort)
        #[arg(short, long, value_enum)]
        sort: Option<SortKey>,
    },

    /// Replace a collection with records from a JSON file
    Import(ImportArgs),

    /// Export a collection as pretty JSON
    Export(ExportArgs),

    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage engagements and their tasks
    #[command(subcommand)]
    Engagement(EngagementCommand),

    /// Manage client interactions
    #[command(subcommand)]
    Interaction(InteractionCommand),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommand),
}

fn parse_task_filter(s: &str) -> Result<TaskFilter, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "engagement-tracker",
            "metrics",
            "--sort",
            "momentum",
            "--format",
            "json",
            "--user",
            "usr-1",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.user.as_deref(), Some("usr-1"));
        assert!(!cli.manager);
        assert_eq!(cli.log, "2");
        assert!(matches!(
            cli.command,
            Command::Metrics {
                sort: Some(SortKey::Momentum)
            }
        ));
    }

    #[test]
    fn test_summary_filter() {
        let cli = Cli::try_parse_from(["engagement-tracker", "summary", "--filter", "complete"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Summary {
                filter: Some(TaskFilter::Complete)
            }
        ));

        assert!(Cli::try_parse_from(["engagement-tracker", "summary", "--filter", "bogus"]).is_err());
    }
}
