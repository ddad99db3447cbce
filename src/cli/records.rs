//! Record management subcommands: clients, engagements, interactions, users
//! and reports.

use crate::types::{InteractionStatus, InteractionType, TaskStatus};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Create a client if no client has this name; print its id
    Ensure {
        name: String,

        /// Primary contact for a newly created client
        #[arg(long)]
        contact: Option<String>,
    },

    /// Rename a client, rewriting every engagement and interaction that references it
    Rename {
        old_name: String,
        new_name: String,
    },

    /// Edit a client's contact or notes
    Update {
        name: String,

        #[arg(long)]
        contact: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a client; referencing records are kept
    Delete { name: String },

    /// List clients in collection order
    List,
}

#[derive(Subcommand, Debug)]
pub enum EngagementCommand {
    /// Create an engagement, creating its client if needed
    Create {
        name: String,

        #[arg(long)]
        client: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete an engagement and its tasks
    Delete { id: String },

    /// Add a task to an engagement
    AddTask {
        engagement_id: String,
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long, default_value = "")]
        due: String,
    },

    /// Change a task's status
    SetTaskStatus {
        engagement_id: String,
        task_id: String,

        /// not-started, in-progress, stalled, finished or delivered
        #[arg(value_parser = parse_task_status)]
        status: TaskStatus,
    },

    /// Remove a task from an engagement
    DeleteTask {
        engagement_id: String,
        task_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum InteractionCommand {
    /// Log an interaction, creating its client if needed
    Create {
        client: String,
        contact: String,

        /// meeting, call, email, follow-up or review
        #[arg(long = "type", value_parser = parse_interaction_type, default_value = "meeting")]
        interaction_type: InteractionType,

        /// When it happened or is scheduled (defaults to now)
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        notes: String,

        /// scheduled, completed or cancelled
        #[arg(long, value_parser = parse_interaction_status, default_value = "scheduled")]
        status: InteractionStatus,
    },

    /// Change an interaction's status
    SetStatus {
        id: String,

        #[arg(value_parser = parse_interaction_status)]
        status: InteractionStatus,
    },

    /// Delete an interaction
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Add a user; a unique external id is generated
    Add { first_name: String, last_name: String },

    /// Remove a user by id or external id
    Remove { id: String },

    /// List users
    List,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Generate an engagement report from current client metrics
    Engagement {
        /// Mark the report as published instead of draft
        #[arg(long)]
        publish: bool,
    },
}

fn parse_task_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::parse(s).ok_or_else(|| format!("unknown task status '{}'", s))
}

fn parse_interaction_type(s: &str) -> Result<InteractionType, String> {
    InteractionType::parse(s).ok_or_else(|| format!("unknown interaction type '{}'", s))
}

fn parse_interaction_status(s: &str) -> Result<InteractionStatus, String> {
    InteractionStatus::parse(s).ok_or_else(|| format!("unknown interaction status '{}'", s))
}

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use crate::types::{InteractionStatus, InteractionType, TaskStatus};
    use clap::Parser;

    use super::*;

    #[test]
    fn test_set_task_status_accepts_dashed_names() {
        let cli = Cli::try_parse_from([
            "engagement-tracker",
            "engagement",
            "set-task-status",
            "eng-1",
            "task-1",
            "in-progress",
        ])
        .unwrap();
        match cli.command {
            Command::Engagement(EngagementCommand::SetTaskStatus { status, .. }) => {
                assert_eq!(status, TaskStatus::InProgress)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_interaction_create_defaults() {
        let cli = Cli::try_parse_from([
            "engagement-tracker",
            "interaction",
            "create",
            "Acme",
            "Jo Smith",
            "--type",
            "follow-up",
        ])
        .unwrap();
        match cli.command {
            Command::Interaction(InteractionCommand::Create {
                interaction_type,
                status,
                date,
                ..
            }) => {
                assert_eq!(interaction_type, InteractionType::FollowUp);
                assert_eq!(status, InteractionStatus::Scheduled);
                assert!(date.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_interaction_status() {
        assert!(
            Cli::try_parse_from(["engagement-tracker", "interaction", "set-status", "int-1", "done"])
                .is_err()
        );
    }
}
