//! Team members.

use super::ids::{USER_PREFIX, generate_external_id, new_id};
use crate::db::CollectionStore;
use crate::error::{CoreError, CoreResult};
use crate::store::Store;
use crate::types::{User, now_iso};
use std::collections::HashSet;
use tracing::info;

impl<S: CollectionStore> Store<S> {
    /// Add a user with a freshly generated, unique external id.
    pub fn add_user(&self, first_name: &str, last_name: &str) -> CoreResult<User> {
        if first_name.trim().is_empty() {
            return Err(CoreError::missing_field("firstName"));
        }
        let mut users = self.users();
        let taken: HashSet<&str> = users.iter().map(|u| u.external_id.as_str()).collect();
        let external_id = generate_external_id(&taken)?;

        let user = User {
            id: new_id(USER_PREFIX),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            external_id,
            created_at: now_iso(),
        };
        users.push(user.clone());
        self.save_users(&users)?;

        info!(id = %user.id, external_id = %user.external_id, "added user");
        Ok(user)
    }

    /// Remove a user by id or external id. Records they own keep their owner
    /// field.
    pub fn remove_user(&self, id: &str) -> CoreResult<User> {
        let mut users = self.users();
        let idx = users
            .iter()
            .position(|u| u.id == id || u.external_id == id)
            .ok_or_else(|| CoreError::user_not_found(id))?;
        let removed = users.remove(idx);
        self.save_users(&users)?;

        info!(id = %removed.id, "removed user");
        Ok(removed)
    }
}
