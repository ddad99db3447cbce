//! SQLite-backed collection blobs.

use super::{CollectionStore, Database, StoreError, now_ms};
use anyhow::Result;
use rusqlite::{OptionalExtension, params};

impl CollectionStore for Database {
    fn read(&self, name: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let body = conn
                .query_row(
                    "SELECT body FROM collections WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(StoreError::from)?;
            Ok(body)
        })
    }

    fn write_all(&self, writes: &[(&str, String)]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        self.with_conn_mut(|conn| {
            let tx = conn.transaction().map_err(StoreError::from)?;
            let now = now_ms();
            for (name, body) in writes {
                tx.execute(
                    "INSERT INTO collections (name, body, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                    params![name, body, now],
                )
                .map_err(StoreError::from)?;
            }
            tx.commit().map_err(StoreError::from)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.read("engagements").unwrap(), None);
    }

    #[test]
    fn test_write_replaces_whole_blob() {
        let db = Database::open_in_memory().unwrap();
        db.write("engagements", "[1,2,3]".to_string()).unwrap();
        db.write("engagements", "[]".to_string()).unwrap();
        assert_eq!(db.read("engagements").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_batch_write_lands_all_keys() {
        let db = Database::open_in_memory().unwrap();
        db.write_all(&[
            ("clients", "{}".to_string()),
            ("engagements", "[]".to_string()),
        ])
        .unwrap();
        assert_eq!(db.read("clients").unwrap().as_deref(), Some("{}"));
        assert_eq!(db.read("engagements").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tracker.db");
        let db = Database::open(&path).unwrap();
        db.write("users", "[]".to_string()).unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.read("users").unwrap().as_deref(), Some("[]"));
    }
}
