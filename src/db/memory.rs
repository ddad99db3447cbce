//! In-process collection store for tests and dry runs.

use super::{CollectionStore, StoreError};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Collection blobs held in a map. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw blob, bypassing any validation.
    pub fn with_blob(self, name: &str, body: impl Into<String>) -> Self {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(name.to_string(), body.into());
        }
        self
    }
}

impl CollectionStore for MemoryStore {
    fn read(&self, name: &str) -> Result<Option<String>> {
        let blobs = self.blobs.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(blobs.get(name).cloned())
    }

    fn write_all(&self, writes: &[(&str, String)]) -> Result<()> {
        let mut blobs = self.blobs.lock().map_err(|_| StoreError::LockPoisoned)?;
        for (name, body) in writes {
            blobs.insert(name.to_string(), body.clone());
        }
        Ok(())
    }
}
