//! Storage layer for the engagement tracker.
//!
//! Collections are stored as whole JSON blobs, one row per collection name.
//! The typed layer in [`crate::store`] talks to storage only through the
//! [`CollectionStore`] trait.

pub mod collections;
pub mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Failures raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage connection lock was poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] refinery::Error),
}

/// Raw access to named collection blobs.
///
/// `read` returns the stored text for a key, or `None` if it was never
/// written. `write_all` replaces every listed key atomically: either all
/// writes land or none do.
pub trait CollectionStore {
    fn read(&self, name: &str) -> Result<Option<String>>;

    fn write_all(&self, writes: &[(&str, String)]) -> Result<()>;

    fn write(&self, name: &str, body: String) -> Result<()> {
        self.write_all(&[(name, body)])
    }
}

impl<S: CollectionStore + ?Sized> CollectionStore for &S {
    fn read(&self, name: &str) -> Result<Option<String>> {
        (**self).read(name)
    }

    fn write_all(&self, writes: &[(&str, String)]) -> Result<()> {
        (**self).write_all(writes)
    }
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(StoreError::from)?;

        // WAL with a busy timeout; other processes may read while we write
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA busy_timeout=5000;",
        )
        .map_err(StoreError::from)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "opened collection database");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner()
            .run(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
