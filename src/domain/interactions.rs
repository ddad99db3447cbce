//! Client interaction mutations.

use super::clients::vivify_client;
use super::ids::{INTERACTION_PREFIX, new_id};
use crate::db::CollectionStore;
use crate::error::{CoreError, CoreResult};
use crate::store::{Store, WriteBatch};
use crate::types::{
    ActionItems, ClientInteraction, InteractionStatus, InteractionType, now_iso,
};
use tracing::info;

/// Input for [`Store::create_interaction`].
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub client_name: String,
    pub contact_person: String,
    pub interaction_type: InteractionType,
    /// Defaults to now when `None`.
    pub date: Option<String>,
    pub notes: String,
    pub action_items: ActionItems,
    pub status: InteractionStatus,
    pub owner_user_id: Option<String>,
}

impl NewInteraction {
    pub fn new(client_name: impl Into<String>, contact_person: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            contact_person: contact_person.into(),
            interaction_type: InteractionType::Meeting,
            date: None,
            notes: String::new(),
            action_items: ActionItems::default(),
            status: InteractionStatus::Scheduled,
            owner_user_id: None,
        }
    }
}

impl<S: CollectionStore> Store<S> {
    /// Log an interaction. The client is vivified with the contact person as
    /// its primary contact.
    pub fn create_interaction(&self, input: NewInteraction) -> CoreResult<ClientInteraction> {
        if input.client_name.trim().is_empty() {
            return Err(CoreError::missing_field("clientName"));
        }
        if input.contact_person.trim().is_empty() {
            return Err(CoreError::missing_field("contactPerson"));
        }

        let now = now_iso();
        let mut clients = self.clients();
        let (_, vivified) = vivify_client(
            &mut clients,
            &input.client_name,
            Some(input.contact_person.as_str()),
            &now,
        );

        let interaction = ClientInteraction {
            id: new_id(INTERACTION_PREFIX),
            client_name: input.client_name,
            contact_person: input.contact_person,
            interaction_type: input.interaction_type,
            date: input.date.unwrap_or_else(|| now.clone()),
            notes: input.notes,
            action_items: input.action_items,
            status: input.status,
            created_at: now,
            owner_user_id: input.owner_user_id,
        };
        let mut interactions = self.interactions();
        interactions.push(interaction.clone());

        let mut batch = WriteBatch::new();
        batch.interactions(&interactions)?;
        if vivified {
            batch.clients(&clients)?;
        }
        self.commit(batch)?;

        info!(
            id = %interaction.id,
            client = %interaction.client_name,
            kind = %interaction.interaction_type,
            "logged interaction"
        );
        Ok(interaction)
    }

    pub fn update_interaction_status(
        &self,
        id: &str,
        status: InteractionStatus,
    ) -> CoreResult<ClientInteraction> {
        let mut interactions = self.interactions();
        let interaction = interactions
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| CoreError::interaction_not_found(id))?;
        interaction.status = status;
        let updated = interaction.clone();
        self.save_interactions(&interactions)?;

        info!(id, status = %status, "interaction status changed");
        Ok(updated)
    }

    pub fn delete_interaction(&self, id: &str) -> CoreResult<ClientInteraction> {
        let mut interactions = self.interactions();
        let idx = interactions
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| CoreError::interaction_not_found(id))?;
        let removed = interactions.remove(idx);
        self.save_interactions(&interactions)?;

        info!(id, "deleted interaction");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::ErrorCode;

    #[test]
    fn test_create_interaction_vivifies_client_with_contact() {
        let store = Store::new(MemoryStore::new());
        let created = store
            .create_interaction(NewInteraction::new("Initech", "Bill"))
            .unwrap();
        assert!(created.id.starts_with("int-"));
        assert_eq!(created.date, created.created_at);

        let clients = store.clients();
        assert_eq!(clients.get("Initech").unwrap().primary_contact.as_deref(), Some("Bill"));
    }

    #[test]
    fn test_existing_client_contact_is_untouched() {
        let store = Store::new(MemoryStore::new());
        store.ensure_client("Initech", Some("Peter")).unwrap();
        store
            .create_interaction(NewInteraction::new("Initech", "Bill"))
            .unwrap();
        let clients = store.clients();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients.get("Initech").unwrap().primary_contact.as_deref(), Some("Peter"));
    }

    #[test]
    fn test_status_update_and_delete() {
        let store = Store::new(MemoryStore::new());
        let created = store
            .create_interaction(NewInteraction::new("Initech", "Bill"))
            .unwrap();
        let updated = store
            .update_interaction_status(&created.id, InteractionStatus::Cancelled)
            .unwrap();
        assert_eq!(updated.status, InteractionStatus::Cancelled);

        store.delete_interaction(&created.id).unwrap();
        let err = store.delete_interaction(&created.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::InteractionNotFound);
    }
}
