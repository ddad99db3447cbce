//! Output formatting for markdown and JSON.

use crate::analytics::{ClientMetrics, TaskListing, TaskStatusSummary, UserMetrics};
use crate::reports::Report;
use crate::types::{Client, User};
use serde::{Deserialize, Serialize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Render `value` as pretty JSON, or with `markdown` otherwise.
pub fn render<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    markdown: impl FnOnce(&T) -> String,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value),
        OutputFormat::Markdown => Ok(markdown(value)),
    }
}

/// Client health scorecard, one row per client plus any red flags.
pub fn format_metrics_markdown(metrics: &[ClientMetrics]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Client Health ({})\n\n", metrics.len()));
    if metrics.is_empty() {
        md.push_str("_No clients._\n");
        return md;
    }

    md.push_str("| Client | Health | Band | Momentum | Cadence | Engagements | Tasks | Interactions |\n");
    md.push_str("|---|---:|---|---|---|---:|---:|---:|\n");
    for m in metrics {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {}/{} | {} |\n",
            m.client_name,
            m.health_score,
            m.band().as_str(),
            m.engagement_momentum.as_str(),
            m.interaction_cadence.as_str(),
            m.total_engagements,
            m.completed_tasks,
            m.total_tasks,
            m.total_interactions,
        ));
    }

    let flagged: Vec<&ClientMetrics> = metrics.iter().filter(|m| !m.red_flags.is_empty()).collect();
    if !flagged.is_empty() {
        md.push_str("\n## Red Flags\n\n");
        for m in flagged {
            let flags: Vec<String> = m.red_flags.iter().map(ToString::to_string).collect();
            md.push_str(&format!("- **{}**: {}\n", m.client_name, flags.join("; ")));
        }
    }

    md
}

pub fn format_user_metrics_markdown(metrics: &[UserMetrics]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Users ({})\n\n", metrics.len()));
    for m in metrics {
        md.push_str(&format!("## {}\n", m.display_name));
        md.push_str(&format!("- **id**: `{}` (`{}`)\n", m.user_id, m.external_id));
        md.push_str(&format!("- **engagements**: {}\n", m.total_engagements));
        md.push_str(&format!("- **interactions**: {}\n", m.total_interactions));
        md.push_str(&format!(
            "- **tasks**: {} ({} not started, {} in progress, {} stalled, {} finished, {} closed)\n",
            m.tasks.total_tasks,
            m.tasks.tasks_not_started,
            m.tasks.tasks_in_progress,
            m.tasks.tasks_stalled,
            m.tasks.tasks_finished,
            m.tasks.tasks_closed,
        ));
        md.push_str(&format!("- **completion**: {}%\n\n", m.completion_rate));
    }

    md
}

pub fn format_summary_markdown(summary: &TaskStatusSummary) -> String {
    let b = &summary.buckets;
    let mut md = String::new();

    md.push_str("# Overview\n\n");
    md.push_str(&format!("- **engagements**: {}\n", summary.total_engagements));
    md.push_str(&format!("- **tasks**: {}\n", b.total_tasks));
    md.push_str(&format!("  - not started: {}\n", b.tasks_not_started));
    md.push_str(&format!("  - in progress: {}\n", b.tasks_in_progress));
    md.push_str(&format!("  - stalled: {}\n", b.tasks_stalled));
    md.push_str(&format!("  - finished: {}\n", b.tasks_finished));
    md.push_str(&format!("  - closed: {}\n", b.tasks_closed));
    md.push_str(&format!("- **completion**: {}%\n", summary.completion_rate));

    md.push_str("\n## Insights\n\n");
    for insight in &summary.insights {
        md.push_str(&format!("- {}\n", insight));
    }

    md
}

pub fn format_task_listing_markdown(listings: &[TaskListing]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Tasks ({})\n\n", listings.len()));
    for l in listings {
        let due = if l.task.due_date.is_empty() {
            String::new()
        } else {
            format!(" due {}", l.task.due_date)
        };
        md.push_str(&format!(
            "- {} `{}` [{}]{} - {} ({})\n",
            l.task.title, l.task.id, l.task.status, due, l.engagement_name, l.client_name
        ));
    }

    md
}

pub fn format_clients_markdown(clients: &[Client]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Clients ({})\n\n", clients.len()));
    for c in clients {
        let contact = c
            .primary_contact
            .as_ref()
            .map(|p| format!(" - {}", p))
            .unwrap_or_default();
        md.push_str(&format!("- **{}** `{}`{}\n", c.name, c.id, contact));
    }

    md
}

pub fn format_users_markdown(users: &[User]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Users ({})\n\n", users.len()));
    for u in users {
        md.push_str(&format!("- **{}** `{}` ({})\n", u.display_name(), u.id, u.external_id));
    }

    md
}

pub fn format_report_markdown(report: &Report) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n", report.name));
    md.push_str(&format!("- **id**: `{}`\n", report.id));
    md.push_str(&format!("- **type**: {:?}\n", report.report_type));
    md.push_str(&format!("- **status**: {:?}\n", report.status));
    md.push_str(&format!("- **period**: {}\n", report.period));
    md.push_str(&format!("- **generated**: {}\n", report.generated_date));
    md.push_str("\n## Metrics\n\n");
    for (key, value) in &report.metrics {
        let shown = value
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string());
        md.push_str(&format!("- **{}**: {}\n", key, shown));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::compute_client_metrics;
    use chrono::Utc;

    fn client(name: &str) -> Client {
        Client {
            id: format!("cli-{}", name),
            name: name.to_string(),
            primary_contact: Some("Jo".to_string()),
            notes: None,
            created_at: "2025-01-01".to_string(),
            updated_at: "2025-01-01".to_string(),
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_scorecard_lists_flags() {
        let metrics = compute_client_metrics(&[client("Acme")], &[], &[], Utc::now());
        let md = format_metrics_markdown(&metrics);
        assert!(md.contains("| Acme | 31 | critical |"));
        assert!(md.contains("- **Acme**: No active engagements"));
    }

    #[test]
    fn test_render_json() {
        let clients = vec![client("Acme")];
        let out = render(clients.as_slice(), OutputFormat::Json, format_clients_markdown).unwrap();
        assert!(out.starts_with("[\n  {"));
        let out = render(clients.as_slice(), OutputFormat::Markdown, format_clients_markdown).unwrap();
        assert!(out.contains("- **Acme** `cli-Acme` - Jo"));
    }
}
