//! SQLite-backed durable storage shared by the model registry and the
//! vector cache.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use crate::error::{EmbeddingError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS models (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        model TEXT UNIQUE
    );
    CREATE TABLE IF NOT EXISTS hashes (
        hash TEXT,
        model INTEGER,
        embedding BLOB,
        PRIMARY KEY (hash, model),
        FOREIGN KEY(model) REFERENCES models(id)
    );
";

/// Owns the SQLite connection.
///
/// Every access is serialized through one mutex; SQLite's own uniqueness
/// constraints make concurrent inserts of the same key safe.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) a database file, apply pragmas, and create tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;

        match &path {
            Some(p) => info!("Opened embedding database at {}", p.display()),
            None => info!("Opened in-memory embedding database"),
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| EmbeddingError::LockPoisoned)?;
        f(&guard)
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
