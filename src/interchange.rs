//! JSON import and export of whole collections.
//!
//! Imports are all-or-nothing: every record is normalized first, and only
//! when all of them pass are the collection and any newly seen clients
//! written together in one batch.

use crate::db::CollectionStore;
use crate::domain::{
    normalize_client, normalize_engagement, normalize_interaction, normalize_user, vivify_client,
};
use crate::error::{CoreError, CoreResult};
use crate::store::{Store, WriteBatch};
use crate::types::{ClientRegistry, CollectionName, now_iso};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Result of a successful import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub collection: String,
    pub records: usize,
    pub clients_created: usize,
    pub message: String,
    pub warnings: Vec<String>,
}

fn expect_array(value: Value) -> CoreResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(CoreError::invalid_document(
            "Import file must contain a JSON array of records",
        )),
    }
}

/// Replace `name` with the records in `raw`.
///
/// A client import keeps every client still named by a stored engagement or
/// interaction, recreating any the document leaves out. Nothing is written if the document is not valid JSON, is not an array
/// (clients may also be an object keyed by name), or any record is rejected.
pub fn import_collection<S: CollectionStore>(
    store: &Store<S>,
    name: CollectionName,
    raw: &str,
) -> CoreResult<ImportOutcome> {
    if !name.is_persisted() {
        return Err(CoreError::ephemeral_collection(name.as_str()));
    }
    let document: Value = serde_json::from_str(raw)?;
    let now = now_iso();
    let mut warnings = Vec::new();
    let mut batch = WriteBatch::new();
    let mut clients = store.clients();
    let clients_before = clients.len();
    let mut clients_kept = 0;

    let records = match name {
        CollectionName::Engagements => {
            let items = expect_array(document)?;
            let mut engagements = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let (engagement, mut notes) = normalize_engagement(item, idx, &now)?;
                warnings.append(&mut notes);
                engagements.push(engagement);
            }
            for engagement in &engagements {
                vivify_client(&mut clients, &engagement.client_name, None, &now);
            }
            batch.engagements(&engagements)?;
            engagements.len()
        }
        CollectionName::ClientInteractions => {
            let items = expect_array(document)?;
            let interactions: Vec<_> = items
                .iter()
                .map(|item| normalize_interaction(item, &now))
                .collect();
            for interaction in &interactions {
                vivify_client(
                    &mut clients,
                    &interaction.client_name,
                    Some(interaction.contact_person.as_str()),
                    &now,
                );
            }
            batch.interactions(&interactions)?;
            interactions.len()
        }
        CollectionName::Clients => {
            let items: Vec<Value> = match document {
                Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
                other => expect_array(other)?,
            };
            let mut imported = ClientRegistry::new();
            for (idx, item) in items.iter().enumerate() {
                let client = normalize_client(item, idx, &now)?;
                if imported.contains(&client.name) {
                    warnings.push(format!(
                        "Client {} appears more than once; the last record wins",
                        client.name
                    ));
                }
                imported.insert(client);
            }
            let count = imported.len();
            let referenced = store
                .engagements()
                .into_iter()
                .map(|e| (e.client_name, None))
                .chain(
                    store
                        .interactions()
                        .into_iter()
                        .map(|i| (i.client_name, Some(i.contact_person))),
                );
            for (client_name, contact) in referenced {
                if client_name.trim().is_empty() {
                    continue;
                }
                let (_, created) =
                    vivify_client(&mut imported, &client_name, contact.as_deref(), &now);
                if created {
                    clients_kept += 1;
                    warnings.push(format!(
                        "Client {} is referenced by stored records and was recreated",
                        client_name
                    ));
                }
            }
            clients = imported;
            count
        }
        CollectionName::Users => {
            let items = expect_array(document)?;
            let mut taken = HashSet::new();
            let users = items
                .iter()
                .map(|item| normalize_user(item, &now, &mut taken))
                .collect::<CoreResult<Vec<_>>>()?;
            batch.users(&users)?;
            users.len()
        }
        CollectionName::Reports => {
            return Err(CoreError::ephemeral_collection(name.as_str()));
        }
    };

    let clients_created = if name == CollectionName::Clients {
        clients_kept
    } else {
        clients.len() - clients_before
    };
    if name == CollectionName::Clients || clients_created > 0 {
        batch.clients(&clients)?;
    }
    store.commit(batch)?;

    for w in &warnings {
        warn!(collection = %name, "{}", w);
    }
    info!(collection = %name, records, clients_created, "imported collection");

    Ok(ImportOutcome {
        collection: name.as_str().to_string(),
        records,
        clients_created,
        message: format!(
            "Imported {} {}(s) successfully.",
            records,
            name.record_noun()
        ),
        warnings,
    })
}

/// Serialize a collection as pretty JSON (2-space indent).
///
/// Clients export in their stored form, an object keyed by name.
pub fn export_collection<S: CollectionStore>(
    store: &Store<S>,
    name: CollectionName,
) -> CoreResult<String> {
    let text = match name {
        CollectionName::Clients => serde_json::to_string_pretty(&store.clients()),
        CollectionName::Engagements => serde_json::to_string_pretty(&store.engagements()),
        CollectionName::ClientInteractions => serde_json::to_string_pretty(&store.interactions()),
        CollectionName::Users => serde_json::to_string_pretty(&store.users()),
        CollectionName::Reports => return Err(CoreError::ephemeral_collection(name.as_str())),
    };
    text.map_err(CoreError::internal)
}

/// Read an import file, transparently inflating gzip input.
pub fn read_document(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut text = String::new();
        flate2::read::GzDecoder::new(bytes.as_slice()).read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

/// Write export text to `path`, gzip-compressed when `gzip` is set.
pub fn write_document(path: &Path, text: &str, gzip: bool) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    if gzip {
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(text.as_bytes())?;
        encoder.finish()?;
    } else {
        let mut writer = std::io::BufWriter::new(file);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
    }
    Ok(())
}
