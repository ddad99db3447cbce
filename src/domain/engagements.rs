//! Engagement and task mutations.

use super::clients::vivify_client;
use super::ids::{ENGAGEMENT_PREFIX, TASK_PREFIX, new_id};
use crate::db::CollectionStore;
use crate::error::{CoreError, CoreResult};
use crate::store::{Store, WriteBatch};
use crate::types::{Engagement, Task, TaskStatus, now_iso};
use tracing::info;

/// Input for [`Store::create_engagement`].
#[derive(Debug, Clone, Default)]
pub struct NewEngagement {
    pub name: String,
    pub description: String,
    pub client_name: String,
    pub owner_user_id: Option<String>,
}

/// Input for [`Store::add_task`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

impl<S: CollectionStore> Store<S> {
    /// Create an engagement, vivifying its client in the same batch.
    pub fn create_engagement(&self, input: NewEngagement) -> CoreResult<Engagement> {
        if input.name.trim().is_empty() {
            return Err(CoreError::missing_field("name"));
        }
        if input.client_name.trim().is_empty() {
            return Err(CoreError::missing_field("clientName"));
        }

        let now = now_iso();
        let mut clients = self.clients();
        let (_, vivified) = vivify_client(&mut clients, &input.client_name, None, &now);

        let engagement = Engagement {
            id: new_id(ENGAGEMENT_PREFIX),
            name: input.name,
            client_name: input.client_name,
            description: input.description,
            created_at: now,
            tasks: Vec::new(),
            owner_user_id: input.owner_user_id,
        };
        let mut engagements = self.engagements();
        engagements.push(engagement.clone());

        let mut batch = WriteBatch::new();
        batch.engagements(&engagements)?;
        if vivified {
            batch.clients(&clients)?;
        }
        self.commit(batch)?;

        info!(id = %engagement.id, client = %engagement.client_name, "created engagement");
        Ok(engagement)
    }

    pub fn delete_engagement(&self, id: &str) -> CoreResult<Engagement> {
        let mut engagements = self.engagements();
        let idx = engagements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::engagement_not_found(id))?;
        let removed = engagements.remove(idx);
        self.save_engagements(&engagements)?;
        info!(id, tasks = removed.tasks.len(), "deleted engagement");
        Ok(removed)
    }

    /// Append a `Not Started` task to an engagement.
    pub fn add_task(&self, engagement_id: &str, input: NewTask) -> CoreResult<Task> {
        if input.title.trim().is_empty() {
            return Err(CoreError::missing_field("title"));
        }
        let mut engagements = self.engagements();
        let engagement = engagements
            .iter_mut()
            .find(|e| e.id == engagement_id)
            .ok_or_else(|| CoreError::engagement_not_found(engagement_id))?;

        let task = Task {
            id: new_id(TASK_PREFIX),
            engagement_id: engagement.id.clone(),
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            status: TaskStatus::NotStarted,
            created_at: now_iso(),
        };
        engagement.tasks.push(task.clone());
        self.save_engagements(&engagements)?;

        info!(engagement = engagement_id, task = %task.id, "added task");
        Ok(task)
    }

    /// Set a task's status. Any transition is allowed.
    pub fn update_task_status(
        &self,
        engagement_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> CoreResult<Task> {
        let mut engagements = self.engagements();
        let engagement = engagements
            .iter_mut()
            .find(|e| e.id == engagement_id)
            .ok_or_else(|| CoreError::engagement_not_found(engagement_id))?;
        let task = engagement
            .task_mut(task_id)
            .ok_or_else(|| CoreError::task_not_found(engagement_id, task_id))?;

        let from = task.status;
        task.status = status;
        let updated = task.clone();
        self.save_engagements(&engagements)?;

        info!(engagement = engagement_id, task = task_id, %from, to = %status, "task status changed");
        Ok(updated)
    }

    pub fn delete_task(&self, engagement_id: &str, task_id: &str) -> CoreResult<Task> {
        let mut engagements = self.engagements();
        let engagement = engagements
            .iter_mut()
            .find(|e| e.id == engagement_id)
            .ok_or_else(|| CoreError::engagement_not_found(engagement_id))?;
        let idx = engagement
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| CoreError::task_not_found(engagement_id, task_id))?;
        let removed = engagement.tasks.remove(idx);
        self.save_engagements(&engagements)?;

        info!(engagement = engagement_id, task = task_id, "deleted task");
        Ok(removed)
    }
}
