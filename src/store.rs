//! Typed access to the persisted collections.
//!
//! Loads never fail on bad content: an absent or malformed collection reads
//! as empty and a warning is logged. Saves always replace whole collections.

use crate::db::CollectionStore;
use crate::error::{CoreError, CoreResult};
use crate::types::{Client, ClientInteraction, ClientRegistry, CollectionName, Engagement, User};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Typed collection layer over an injected [`CollectionStore`].
pub struct Store<S> {
    backend: S,
}

impl<S: CollectionStore> Store<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Raw JSON of a collection, or `None` if absent, unreadable or not JSON.
    fn read_json(&self, name: CollectionName) -> Option<Value> {
        if !name.is_persisted() {
            return None;
        }
        let body = match self.backend.read(name.as_str()) {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(e) => {
                warn!(collection = %name, error = %e, "failed to read collection; treating as empty");
                return None;
            }
        };
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(collection = %name, error = %e, "stored collection is not valid JSON; treating as empty");
                None
            }
        }
    }

    /// Load an array collection. Records that do not match the expected shape
    /// are skipped with a warning.
    fn load_array<T: DeserializeOwned>(&self, name: CollectionName) -> Vec<T> {
        let items = match self.read_json(name) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!(collection = %name, "stored collection is not an array; treating as empty");
                return Vec::new();
            }
            None => return Vec::new(),
        };
        let total = items.len();
        let records: Vec<T> = items
            .into_iter()
            .enumerate()
            .filter_map(|(idx, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(collection = %name, index = idx, error = %e, "skipping malformed record");
                    None
                }
            })
            .collect();
        debug!(collection = %name, loaded = records.len(), total, "loaded collection");
        records
    }

    /// Load the client registry. Stored clients are keyed by name, but an
    /// array is accepted too. Malformed client records are skipped.
    pub fn clients(&self) -> ClientRegistry {
        let name = CollectionName::Clients;
        let records: Vec<Value> = match self.read_json(name) {
            Some(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                warn!(collection = %name, "stored clients are not an object or array; treating as empty");
                return ClientRegistry::new();
            }
            None => return ClientRegistry::new(),
        };
        let total = records.len();
        let mut registry = ClientRegistry::new();
        for (idx, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Client>(record) {
                Ok(client) => registry.insert(client),
                Err(e) => {
                    warn!(collection = %name, index = idx, error = %e, "skipping malformed client");
                }
            }
        }
        debug!(collection = %name, loaded = registry.len(), total, "loaded collection");
        registry
    }

    pub fn engagements(&self) -> Vec<Engagement> {
        self.load_array(CollectionName::Engagements)
    }

    pub fn interactions(&self) -> Vec<ClientInteraction> {
        self.load_array(CollectionName::ClientInteractions)
    }

    pub fn users(&self) -> Vec<User> {
        self.load_array(CollectionName::Users)
    }

    /// Load any collection as plain JSON records, in collection order.
    ///
    /// Clients come back as a list even though they are stored keyed by
    /// name. The session-only `reports` collection always reads as empty.
    pub fn load_collection(&self, name: CollectionName) -> Vec<Value> {
        let typed = match name {
            CollectionName::Clients => serde_json::to_value(self.clients().as_slice()),
            CollectionName::Engagements => serde_json::to_value(self.engagements()),
            CollectionName::ClientInteractions => serde_json::to_value(self.interactions()),
            CollectionName::Users => serde_json::to_value(self.users()),
            CollectionName::Reports => return Vec::new(),
        };
        match typed {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Replace a collection with the given JSON records.
    ///
    /// Records are checked against the collection's shape first; nothing is
    /// written if any record does not fit.
    pub fn save_collection(&self, name: CollectionName, records: Vec<Value>) -> CoreResult<()> {
        let mut batch = WriteBatch::new();
        match name {
            CollectionName::Clients => {
                let registry = ClientRegistry::from_value(Value::Array(records))?;
                batch.clients(&registry)?;
            }
            CollectionName::Engagements => {
                let engagements: Vec<Engagement> = serde_json::from_value(Value::Array(records))?;
                batch.engagements(&engagements)?;
            }
            CollectionName::ClientInteractions => {
                let interactions: Vec<ClientInteraction> =
                    serde_json::from_value(Value::Array(records))?;
                batch.interactions(&interactions)?;
            }
            CollectionName::Users => {
                let users: Vec<User> = serde_json::from_value(Value::Array(records))?;
                batch.users(&users)?;
            }
            CollectionName::Reports => {
                return Err(CoreError::ephemeral_collection(name.as_str()));
            }
        }
        self.commit(batch)
    }

    pub fn save_clients(&self, clients: &ClientRegistry) -> CoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.clients(clients)?;
        self.commit(batch)
    }

    pub fn save_engagements(&self, engagements: &[Engagement]) -> CoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.engagements(engagements)?;
        self.commit(batch)
    }

    pub fn save_interactions(&self, interactions: &[ClientInteraction]) -> CoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.interactions(interactions)?;
        self.commit(batch)
    }

    pub fn save_users(&self, users: &[User]) -> CoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.users(users)?;
        self.commit(batch)
    }

    /// Write every collection in the batch atomically.
    pub fn commit(&self, batch: WriteBatch) -> CoreResult<()> {
        if batch.writes.is_empty() {
            return Ok(());
        }
        let writes: Vec<(&str, String)> = batch
            .writes
            .into_iter()
            .map(|(name, body)| (name.as_str(), body))
            .collect();
        let names: Vec<&str> = writes.iter().map(|(name, _)| *name).collect();
        self.backend.write_all(&writes)?;
        debug!(collections = ?names, "committed collections");
        Ok(())
    }
}

/// A set of whole-collection replacements committed together.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<(CollectionName, String)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    fn put<T: Serialize + ?Sized>(&mut self, name: CollectionName, records: &T) -> CoreResult<()> {
        let body = serde_json::to_string(records).map_err(CoreError::internal)?;
        self.writes.retain(|(n, _)| *n != name);
        self.writes.push((name, body));
        Ok(())
    }

    pub fn clients(&mut self, clients: &ClientRegistry) -> CoreResult<&mut Self> {
        self.put(CollectionName::Clients, clients)?;
        Ok(self)
    }

    pub fn engagements(&mut self, engagements: &[Engagement]) -> CoreResult<&mut Self> {
        self.put(CollectionName::Engagements, engagements)?;
        Ok(self)
    }

    pub fn interactions(&mut self, interactions: &[ClientInteraction]) -> CoreResult<&mut Self> {
        self.put(CollectionName::ClientInteractions, interactions)?;
        Ok(self)
    }

    pub fn users(&mut self, users: &[User]) -> CoreResult<&mut Self> {
        self.put(CollectionName::Users, users)?;
        Ok(self)
    }
}
