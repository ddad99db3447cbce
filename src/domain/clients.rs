//! Client records: auto-vivification, rename cascade and edits.
//!
//! Client names are the join key for engagements and interactions, so a
//! rename rewrites every referencing record in the same atomic batch.

use super::ids::{CLIENT_PREFIX, new_id};
use crate::db::CollectionStore;
use crate::error::{CoreError, CoreResult};
use crate::store::{Store, WriteBatch};
use crate::types::{Client, ClientRegistry, now_iso};
use serde::Serialize;
use tracing::info;

/// Counts of records rewritten by a client rename.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOutcome {
    pub engagements: usize,
    pub interactions: usize,
}

/// Find `name` in the registry, creating it if absent.
///
/// Returns the client id and whether a new client was created. The lookup is
/// exact and case-sensitive.
pub fn vivify_client(
    registry: &mut ClientRegistry,
    name: &str,
    contact_hint: Option<&str>,
    now: &str,
) -> (String, bool) {
    if let Some(existing) = registry.get(name) {
        return (existing.id.clone(), false);
    }
    let client = Client {
        id: new_id(CLIENT_PREFIX),
        name: name.to_string(),
        primary_contact: contact_hint
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string),
        notes: None,
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let id = client.id.clone();
    registry.insert(client);
    (id, true)
}

fn require_name(name: &str, field: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::missing_field(field));
    }
    Ok(())
}

impl<S: CollectionStore> Store<S> {
    /// Return the id of the client called `name`, creating it if needed.
    pub fn ensure_client(&self, name: &str, contact_hint: Option<&str>) -> CoreResult<String> {
        require_name(name, "clientName")?;
        let mut clients = self.clients();
        let (id, created) = vivify_client(&mut clients, name, contact_hint, &now_iso());
        if created {
            self.save_clients(&clients)?;
            info!(client = name, id = %id, "created client");
        }
        Ok(id)
    }

    /// Re-key `old_name` to `new_client` and rewrite `clientName` on every
    /// engagement and interaction that referenced it.
    ///
    /// All three collections are written in one batch.
    pub fn rename_client(&self, old_name: &str, new_client: Client) -> CoreResult<RenameOutcome> {
        require_name(&new_client.name, "name")?;
        let mut clients = self.clients();
        if !clients.contains(old_name) {
            return Err(CoreError::client_not_found(old_name));
        }
        let new_name = new_client.name.clone();
        if new_name != old_name && clients.contains(&new_name) {
            return Err(CoreError::already_exists("Client", &new_name));
        }

        let mut client = new_client;
        client.updated_at = now_iso();
        clients.rekey(old_name, client);

        let mut engagements = self.engagements();
        let mut interactions = self.interactions();
        let mut outcome = RenameOutcome::default();
        for engagement in engagements.iter_mut().filter(|e| e.client_name == old_name) {
            engagement.client_name = new_name.clone();
            outcome.engagements += 1;
        }
        for interaction in interactions.iter_mut().filter(|i| i.client_name == old_name) {
            interaction.client_name = new_name.clone();
            outcome.interactions += 1;
        }

        let mut batch = WriteBatch::new();
        batch.clients(&clients)?;
        if outcome.engagements > 0 {
            batch.engagements(&engagements)?;
        }
        if outcome.interactions > 0 {
            batch.interactions(&interactions)?;
        }
        self.commit(batch)?;

        info!(
            from = old_name,
            to = %new_name,
            engagements = outcome.engagements,
            interactions = outcome.interactions,
            "renamed client"
        );
        Ok(outcome)
    }

    /// Create or edit a client.
    ///
    /// An existing client is matched by id; if its name changed the rename
    /// cascades. A client with an unknown id is created, and its name must
    /// not already be taken.
    pub fn save_client(&self, client: Client) -> CoreResult<Client> {
        require_name(&client.name, "name")?;
        let mut clients = self.clients();
        let now = now_iso();

        let previous = clients.get_by_id(&client.id).cloned();
        match previous {
            Some(existing) if existing.name != client.name => {
                let mut renamed = client;
                renamed.created_at = existing.created_at;
                self.rename_client(&existing.name, renamed.clone())?;
                Ok(self.clients().get(&renamed.name).cloned().unwrap_or(renamed))
            }
            Some(existing) => {
                let mut updated = client;
                updated.created_at = existing.created_at;
                updated.updated_at = now;
                clients.insert(updated.clone());
                self.save_clients(&clients)?;
                info!(client = %updated.name, "updated client");
                Ok(updated)
            }
            None => {
                if clients.contains(&client.name) {
                    return Err(CoreError::already_exists("Client", &client.name));
                }
                let mut created = client;
                if created.id.trim().is_empty() {
                    created.id = new_id(CLIENT_PREFIX);
                }
                created.created_at = now.clone();
                created.updated_at = now;
                clients.insert(created.clone());
                self.save_clients(&clients)?;
                info!(client = %created.name, id = %created.id, "created client");
                Ok(created)
            }
        }
    }

    /// Remove a client by name.
    ///
    /// Engagements and interactions that reference it are left in place.
    pub fn delete_client(&self, name: &str) -> CoreResult<Client> {
        let mut clients = self.clients();
        let removed = clients
            .remove(name)
            .ok_or_else(|| CoreError::client_not_found(name))?;
        self.save_clients(&clients)?;
        info!(client = name, "deleted client");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::ErrorCode;

    #[test]
    fn test_vivify_is_case_sensitive() {
        let mut registry = ClientRegistry::new();
        let (first, created) = vivify_client(&mut registry, "Acme", Some("Jo"), "t");
        assert!(created);
        let (again, created_again) = vivify_client(&mut registry, "Acme", None, "t");
        assert!(!created_again);
        assert_eq!(first, again);

        let (_, created_lower) = vivify_client(&mut registry, "acme", None, "t");
        assert!(created_lower);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Acme").unwrap().primary_contact.as_deref(), Some("Jo"));
    }

    #[test]
    fn test_ensure_client_rejects_blank_name() {
        let store = Store::new(MemoryStore::new());
        let err = store.ensure_client("  ", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn test_rename_into_existing_name_is_rejected() {
        let store = Store::new(MemoryStore::new());
        store.ensure_client("Acme", None).unwrap();
        store.ensure_client("Globex", None).unwrap();
        let mut acme = store.clients().get("Acme").unwrap().clone();
        acme.name = "Globex".to_string();
        let err = store.rename_client("Acme", acme).unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyExists);
        assert_eq!(store.clients().len(), 2);
    }

    #[test]
    fn test_save_client_detects_rename_by_id() {
        let store = Store::new(MemoryStore::new());
        let id = store.ensure_client("Acme", None).unwrap();
        let mut edited = store.clients().get("Acme").unwrap().clone();
        edited.name = "Acme Corp".to_string();
        edited.notes = Some("renewal in May".to_string());

        let saved = store.save_client(edited).unwrap();
        assert_eq!(saved.id, id);
        let clients = store.clients();
        assert!(!clients.contains("Acme"));
        assert_eq!(clients.get("Acme Corp").unwrap().notes.as_deref(), Some("renewal in May"));
    }

    #[test]
    fn test_delete_unknown_client() {
        let store = Store::new(MemoryStore::new());
        let err = store.delete_client("Nobody").unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientNotFound);
    }
}
