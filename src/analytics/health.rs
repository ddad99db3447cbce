//! Client health scoring.
//!
//! Every client gets a 0-100 health score built from task completion,
//! engagement and interaction volume, and penalties for stalled tasks and
//! cancelled interactions. The weights are fixed:
//!
//! ```text
//! rate      = completed / total * 100        (50 when there are no tasks)
//! activity  = min(engagements * 20, 30)
//! frequency = min(interactions * 5, 30)
//! stalled   = max(0, 10 - stalled * 2)
//! cancelled = max(0, 10 - cancelled * 3)
//! health    = round((rate * 0.4 + activity + frequency + stalled + cancelled) / 1.3)
//! ```

use crate::types::{
    Client, ClientInteraction, Engagement, InteractionStatus, TaskStatus, parse_timestamp, to_iso,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MOMENTUM_WINDOW_DAYS: i64 = 30;
const QUIET_CLIENT_DAYS: i64 = 60;
const LOW_COMPLETION_RATE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Momentum {
    High,
    Medium,
    Low,
}

impl Momentum {
    fn from_recent(recent: usize) -> Self {
        match recent {
            0 => Momentum::Low,
            1 => Momentum::Medium,
            _ => Momentum::High,
        }
    }

    /// Sort weight: high=3, medium=2, low=1.
    pub fn rank(&self) -> u8 {
        match self {
            Momentum::High => 3,
            Momentum::Medium => 2,
            Momentum::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Momentum::High => "high",
            Momentum::Medium => "medium",
            Momentum::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Frequent,
    Moderate,
    Sparse,
}

impl Cadence {
    fn from_last(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last else {
            return Cadence::Sparse;
        };
        let days = (now - last).num_milliseconds() as f64 / Duration::days(1).num_milliseconds() as f64;
        if days < 7.0 {
            Cadence::Frequent
        } else if days < 30.0 {
            Cadence::Moderate
        } else {
            Cadence::Sparse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Frequent => "frequent",
            Cadence::Moderate => "moderate",
            Cadence::Sparse => "sparse",
        }
    }
}

/// Coarse band a health score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthBand {
    Healthy,
    Fair,
    AtRisk,
    Critical,
}

impl HealthBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            80.. => HealthBand::Healthy,
            60..=79 => HealthBand::Fair,
            40..=59 => HealthBand::AtRisk,
            _ => HealthBand::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthBand::Healthy => "healthy",
            HealthBand::Fair => "fair",
            HealthBand::AtRisk => "at-risk",
            HealthBand::Critical => "critical",
        }
    }
}

/// Warning conditions, reported in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedFlag {
    StalledTasks(usize),
    CancelledInteractions(usize),
    NoRecentInteraction,
    NoActiveEngagements,
    LowCompletionRate,
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedFlag::StalledTasks(n) => write!(f, "{} stalled task{}", n, plural(*n)),
            RedFlag::CancelledInteractions(n) => {
                write!(f, "{} cancelled interaction{}", n, plural(*n))
            }
            RedFlag::NoRecentInteraction => f.write_str("No interaction in 60+ days"),
            RedFlag::NoActiveEngagements => f.write_str("No active engagements"),
            RedFlag::LowCompletionRate => f.write_str("Low task completion rate"),
        }
    }
}

impl Serialize for RedFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Derived health metrics for one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetrics {
    pub client_id: String,
    pub client_name: String,
    pub total_engagements: usize,
    pub total_interactions: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub stalled_tasks: usize,
    pub cancelled_interactions: usize,
    #[serde(serialize_with = "serialize_opt_ts", skip_serializing_if = "Option::is_none")]
    pub last_interaction_date: Option<DateTime<Utc>>,
    pub task_completion_rate: f64,
    pub engagement_activity: u32,
    pub interaction_frequency: u32,
    pub stalled_penalty: u32,
    pub cancelled_penalty: u32,
    pub health_score: u8,
    pub red_flags: Vec<RedFlag>,
    pub engagement_momentum: Momentum,
    pub interaction_cadence: Cadence,
}

fn serialize_opt_ts<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&to_iso(*ts)),
        None => serializer.serialize_none(),
    }
}

impl ClientMetrics {
    pub fn band(&self) -> HealthBand {
        HealthBand::for_score(self.health_score)
    }
}

/// Combine the weighted components into a score clamped to `[0, 100]`.
pub fn health_score(
    task_completion_rate: f64,
    engagement_activity: u32,
    interaction_frequency: u32,
    stalled_penalty: u32,
    cancelled_penalty: u32,
) -> u8 {
    let raw = (task_completion_rate * 0.4
        + f64::from(engagement_activity)
        + f64::from(interaction_frequency)
        + f64::from(stalled_penalty)
        + f64::from(cancelled_penalty))
        / 1.3;
    raw.round().clamp(0.0, 100.0) as u8
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Latest usable timestamp of an interaction: its `date`, else `createdAt`.
fn interaction_time(interaction: &ClientInteraction) -> Option<DateTime<Utc>> {
    parse_timestamp(&interaction.date).or_else(|| parse_timestamp(&interaction.created_at))
}

/// Compute metrics for one client. `now` anchors the recency windows.
pub fn client_metrics(
    client: &Client,
    engagements: &[Engagement],
    interactions: &[ClientInteraction],
    now: DateTime<Utc>,
) -> ClientMetrics {
    let owned: Vec<&Engagement> = engagements
        .iter()
        .filter(|e| e.client_name == client.name)
        .collect();
    let talks: Vec<&ClientInteraction> = interactions
        .iter()
        .filter(|i| i.client_name == client.name)
        .collect();

    let total_engagements = owned.len();
    let tasks = owned.iter().flat_map(|e| e.tasks.iter());
    let (mut total_tasks, mut completed_tasks, mut stalled_tasks) = (0usize, 0usize, 0usize);
    for task in tasks {
        total_tasks += 1;
        if task.status.is_complete() {
            completed_tasks += 1;
        }
        if task.status == TaskStatus::Stalled {
            stalled_tasks += 1;
        }
    }

    let total_interactions = talks.len();
    let cancelled_interactions = talks
        .iter()
        .filter(|i| i.status == InteractionStatus::Cancelled)
        .count();
    let last_interaction_date = talks.iter().filter_map(|i| interaction_time(i)).max();

    let task_completion_rate = if total_tasks > 0 {
        completed_tasks as f64 / total_tasks as f64 * 100.0
    } else {
        50.0
    };
    let engagement_activity = saturating_u32(total_engagements).saturating_mul(20).min(30);
    let interaction_frequency = saturating_u32(total_interactions).saturating_mul(5).min(30);
    let stalled_penalty = 10u32.saturating_sub(saturating_u32(stalled_tasks).saturating_mul(2));
    let cancelled_penalty =
        10u32.saturating_sub(saturating_u32(cancelled_interactions).saturating_mul(3));
    let score = health_score(
        task_completion_rate,
        engagement_activity,
        interaction_frequency,
        stalled_penalty,
        cancelled_penalty,
    );

    let window_start = now - Duration::days(MOMENTUM_WINDOW_DAYS);
    let recent = owned
        .iter()
        .filter(|e| parse_timestamp(&e.created_at).is_some_and(|ts| ts > window_start))
        .count();

    let mut red_flags = Vec::new();
    if stalled_tasks > 0 {
        red_flags.push(RedFlag::StalledTasks(stalled_tasks));
    }
    if cancelled_interactions > 0 {
        red_flags.push(RedFlag::CancelledInteractions(cancelled_interactions));
    }
    if last_interaction_date.is_some_and(|last| now - last > Duration::days(QUIET_CLIENT_DAYS)) {
        red_flags.push(RedFlag::NoRecentInteraction);
    }
    if total_engagements == 0 {
        red_flags.push(RedFlag::NoActiveEngagements);
    }
    if total_tasks > 0 && task_completion_rate < LOW_COMPLETION_RATE {
        red_flags.push(RedFlag::LowCompletionRate);
    }

    ClientMetrics {
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        total_engagements,
        total_interactions,
        total_tasks,
        completed_tasks,
        stalled_tasks,
        cancelled_interactions,
        last_interaction_date,
        task_completion_rate,
        engagement_activity,
        interaction_frequency,
        stalled_penalty,
        cancelled_penalty,
        health_score: score,
        red_flags,
        engagement_momentum: Momentum::from_recent(recent),
        interaction_cadence: Cadence::from_last(last_interaction_date, now),
    }
}

/// Compute metrics for every client, in client collection order.
pub fn compute_client_metrics<'a>(
    clients: impl IntoIterator<Item = &'a Client>,
    engagements: &[Engagement],
    interactions: &[ClientInteraction],
    now: DateTime<Utc>,
) -> Vec<ClientMetrics> {
    clients
        .into_iter()
        .map(|client| client_metrics(client, engagements, interactions, now))
        .collect()
}

/// Orderings offered for the scorecard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Health,
    Momentum,
    Interactions,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Health => "health",
            SortKey::Momentum => "momentum",
            SortKey::Interactions => "interactions",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "health" => Ok(SortKey::Health),
            "momentum" => Ok(SortKey::Momentum),
            "interactions" => Ok(SortKey::Interactions),
            other => Err(format!(
                "unknown sort key '{}' (expected health, momentum or interactions)",
                other
            )),
        }
    }
}

/// Sort descending by `key`. The sort is stable, so ties keep their
/// current relative order.
pub fn sort_metrics(metrics: &mut [ClientMetrics], key: SortKey) {
    match key {
        SortKey::Health => metrics.sort_by(|a, b| b.health_score.cmp(&a.health_score)),
        SortKey::Momentum => metrics.sort_by(|a, b| {
            b.engagement_momentum
                .rank()
                .cmp(&a.engagement_momentum.rank())
        }),
        SortKey::Interactions => {
            metrics.sort_by(|a, b| b.total_interactions.cmp(&a.total_interactions))
        }
    }
}
