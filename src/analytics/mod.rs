//! Aggregation engine.
//!
//! Pure functions over loaded collections. Nothing here reads the store or
//! the clock; callers pass `now` explicitly.

pub mod health;
pub mod summary;
pub mod users;

pub use health::{
    Cadence, ClientMetrics, HealthBand, Momentum, RedFlag, SortKey, client_metrics,
    compute_client_metrics, health_score, sort_metrics,
};
pub use summary::{
    TaskBuckets, TaskFilter, TaskListing, TaskStatusSummary, filter_tasks, summarize_tasks,
};
pub use users::{UserMetrics, compute_user_metrics};
