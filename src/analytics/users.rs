//! Per-user workload metrics.

use super::summary::TaskBuckets;
use crate::types::{ClientInteraction, Engagement, User};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetrics {
    pub user_id: String,
    pub external_id: String,
    pub display_name: String,
    pub total_engagements: usize,
    pub total_interactions: usize,
    #[serde(flatten)]
    pub tasks: TaskBuckets,
    /// Whole percentage of finished or delivered tasks; 0 with no tasks.
    pub completion_rate: u32,
}

/// Metrics for each user over the records they own.
///
/// A record belongs to a user when its owner field equals the user's `id`
/// or `externalId`.
pub fn compute_user_metrics(
    users: &[User],
    engagements: &[Engagement],
    interactions: &[ClientInteraction],
) -> Vec<UserMetrics> {
    users
        .iter()
        .map(|user| {
            let owned: Vec<&Engagement> = engagements
                .iter()
                .filter(|e| user.owns(e.owner_user_id.as_deref()))
                .collect();
            let total_interactions = interactions
                .iter()
                .filter(|i| user.owns(i.owner_user_id.as_deref()))
                .count();
            let tasks = TaskBuckets::from_engagements(owned.iter().copied());

            UserMetrics {
                user_id: user.id.clone(),
                external_id: user.external_id.clone(),
                display_name: user.display_name(),
                total_engagements: owned.len(),
                total_interactions,
                completion_rate: tasks.completion_rate(),
                tasks,
            }
        })
        .collect()
}
