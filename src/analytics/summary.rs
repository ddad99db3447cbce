//! Task-status summary over a set of engagements.

use crate::types::{Engagement, Task, TaskStatus};
use serde::Serialize;
use std::str::FromStr;

/// Task counts per status bucket. `Delivered` tasks count as closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBuckets {
    pub total_tasks: usize,
    pub tasks_not_started: usize,
    pub tasks_in_progress: usize,
    pub tasks_stalled: usize,
    pub tasks_finished: usize,
    pub tasks_closed: usize,
}

impl TaskBuckets {
    pub fn record(&mut self, status: TaskStatus) {
        self.total_tasks += 1;
        match status {
            TaskStatus::NotStarted => self.tasks_not_started += 1,
            TaskStatus::InProgress => self.tasks_in_progress += 1,
            TaskStatus::Stalled => self.tasks_stalled += 1,
            TaskStatus::Finished => self.tasks_finished += 1,
            TaskStatus::Delivered => self.tasks_closed += 1,
        }
    }

    pub fn from_engagements<'a>(engagements: impl IntoIterator<Item = &'a Engagement>) -> Self {
        let mut buckets = TaskBuckets::default();
        for task in engagements.into_iter().flat_map(|e| e.tasks.iter()) {
            buckets.record(task.status);
        }
        buckets
    }

    /// Finished plus closed, as a whole percentage. Zero when there are no tasks.
    pub fn completion_rate(&self) -> u32 {
        if self.total_tasks == 0 {
            return 0;
        }
        let done = (self.tasks_closed + self.tasks_finished) as f64;
        (done / self.total_tasks as f64 * 100.0).round() as u32
    }
}

/// Engagement and task totals shown on the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusSummary {
    pub total_engagements: usize,
    #[serde(flatten)]
    pub buckets: TaskBuckets,
    pub completion_rate: u32,
    pub insights: Vec<String>,
}

pub fn summarize_tasks(engagements: &[Engagement]) -> TaskStatusSummary {
    let buckets = TaskBuckets::from_engagements(engagements);
    TaskStatusSummary {
        total_engagements: engagements.len(),
        completion_rate: buckets.completion_rate(),
        insights: insights(engagements.len(), &buckets),
        buckets,
    }
}

/// Plain-language suggestions derived from the bucket counts.
pub fn insights(total_engagements: usize, buckets: &TaskBuckets) -> Vec<String> {
    let mut out = Vec::new();

    if buckets.tasks_stalled > 0 {
        let n = buckets.tasks_stalled;
        out.push(format!(
            "{} stalled task{}. Review blockers and reassign where needed.",
            n,
            if n > 1 { "s" } else { "" }
        ));
    }
    if buckets.tasks_not_started > 3 {
        out.push(format!(
            "{} tasks have not started yet. Prioritize them before they become backlog.",
            buckets.tasks_not_started
        ));
    }
    if buckets.tasks_finished > 0 {
        let n = buckets.tasks_finished;
        out.push(format!(
            "{} task{} ready for delivery. Schedule a client review.",
            n,
            if n > 1 { "s are" } else { " is" }
        ));
    }
    if buckets.tasks_in_progress > 5 {
        out.push(format!(
            "High workload: {} tasks in progress.",
            buckets.tasks_in_progress
        ));
    }
    if buckets.total_tasks > 0 && buckets.tasks_closed + buckets.tasks_finished == 0 {
        out.push("No completed tasks yet. Look for quick wins.".to_string());
    }
    if total_engagements == 0 {
        out.push("No engagements yet.".to_string());
    }
    let rate = buckets.completion_rate();
    if rate > 75 {
        out.push(format!("{}% completion rate.", rate));
    }
    if out.is_empty() {
        out.push("Everything looks good.".to_string());
    }
    out
}

/// Which tasks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    Status(TaskStatus),
    /// Finished or Delivered.
    Complete,
}

impl TaskFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            TaskFilter::Status(wanted) => *wanted == status,
            TaskFilter::Complete => status.is_complete(),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("complete") {
            return Ok(TaskFilter::Complete);
        }
        TaskStatus::parse(s)
            .map(TaskFilter::Status)
            .ok_or_else(|| format!("unknown task filter '{}'", s))
    }
}

/// A task listed alongside the engagement it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    pub engagement_name: String,
    pub client_name: String,
    #[serde(flatten)]
    pub task: Task,
}

pub fn filter_tasks(engagements: &[Engagement], filter: TaskFilter) -> Vec<TaskListing> {
    engagements
        .iter()
        .flat_map(|e| {
            e.tasks
                .iter()
                .filter(move |t| filter.matches(t.status))
                .map(move |t| TaskListing {
                    engagement_name: e.name.clone(),
                    client_name: e.client_name.clone(),
                    task: t.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engagement(statuses: &[TaskStatus]) -> Engagement {
        Engagement {
            id: "eng-1".to_string(),
            name: "Rollout".to_string(),
            client_name: "Acme".to_string(),
            description: String::new(),
            created_at: "2025-01-01".to_string(),
            tasks: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| Task {
                    id: format!("task-{}", i),
                    engagement_id: "eng-1".to_string(),
                    title: format!("Task {}", i),
                    description: String::new(),
                    due_date: String::new(),
                    status: *status,
                    created_at: "2025-01-01".to_string(),
                })
                .collect(),
            owner_user_id: None,
        }
    }

    #[test]
    fn test_buckets_and_rate() {
        use TaskStatus::*;
        let summary = summarize_tasks(&[engagement(&[NotStarted, InProgress, Stalled, Finished, Delivered, Delivered])]);
        assert_eq!(summary.total_engagements, 1);
        assert_eq!(summary.buckets.total_tasks, 6);
        assert_eq!(summary.buckets.tasks_closed, 2);
        assert_eq!(summary.buckets.tasks_finished, 1);
        // 3 / 6
        assert_eq!(summary.completion_rate, 50);
    }

    #[test]
    fn test_empty_summary_has_no_tasks_insight() {
        let summary = summarize_tasks(&[]);
        assert_eq!(summary.completion_rate, 0);
        assert_eq!(summary.insights, vec!["No engagements yet.".to_string()]);
    }

    #[test]
    fn test_stalled_insight_comes_first() {
        let summary = summarize_tasks(&[engagement(&[TaskStatus::Stalled, TaskStatus::InProgress])]);
        assert!(summary.insights[0].starts_with("1 stalled task."));
    }

    #[test]
    fn test_filter_complete_and_by_status() {
        use TaskStatus::*;
        let engagements = vec![engagement(&[NotStarted, Finished, Delivered])];
        let complete = filter_tasks(&engagements, "complete".parse().unwrap());
        assert_eq!(complete.len(), 2);
        assert!(complete.iter().all(|l| l.engagement_name == "Rollout"));

        let not_started = filter_tasks(&engagements, "not-started".parse().unwrap());
        assert_eq!(not_started.len(), 1);
        assert!("blocked".parse::<TaskFilter>().is_err());
    }
}
