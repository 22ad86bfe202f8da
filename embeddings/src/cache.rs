//! Content-addressed embedding cache.

use std::sync::Arc;

use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::Embedding;
use crate::codec;
use crate::error::Result;
use crate::hash::ContentHash;
use crate::registry::ModelId;
use crate::storage::Database;

/// Result of a cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The vector was written.
    Inserted,
    /// A vector already existed under this key and was left untouched.
    AlreadyPresent,
}

/// Write-once store of vectors keyed by `(content hash, model id)`.
///
/// Implementations are blocking; async callers should run them on a
/// blocking thread.
pub trait VectorStore: Send + Sync {
    /// Fetch a stored vector. `Ok(None)` means the key has never been
    /// written; errors are reserved for storage or decoding failures.
    fn lookup(&self, hash: &ContentHash, model_id: ModelId) -> Result<Option<Embedding>>;

    /// Store a vector. An existing entry for the key is never overwritten.
    fn store(&self, hash: &ContentHash, model_id: ModelId, embedding: &[f32])
    -> Result<StoreOutcome>;
}

/// [`VectorStore`] backed by the `hashes` table.
pub struct SqliteVectorStore {
    db: Arc<Database>,
}

impl SqliteVectorStore {
    /// Create a store on top of an open database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Number of cached vectors.
    pub fn count(&self) -> Result<u64> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM hashes", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
    }
}

impl VectorStore for SqliteVectorStore {
    fn lookup(&self, hash: &ContentHash, model_id: ModelId) -> Result<Option<Embedding>> {
        let blob: Option<Vec<u8>> = self.db.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT embedding FROM hashes WHERE hash = ?1 AND model = ?2",
                    params![hash.as_str(), model_id],
                    |row| row.get(0),
                )
                .optional()?)
        })?;

        blob.map(|bytes| codec::decode(&bytes)).transpose()
    }

    fn store(
        &self,
        hash: &ContentHash,
        model_id: ModelId,
        embedding: &[f32],
    ) -> Result<StoreOutcome> {
        let blob = codec::encode(embedding);
        let changed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT OR IGNORE INTO hashes (hash, model, embedding) VALUES (?1, ?2, ?3)",
                params![hash.as_str(), model_id, blob],
            )?)
        })?;

        if changed == 0 {
            debug!("Embedding for {hash} (model {model_id}) already cached");
            Ok(StoreOutcome::AlreadyPresent)
        } else {
            debug!("Cached {} dimensions for {hash} (model {model_id})", embedding.len());
            Ok(StoreOutcome::Inserted)
        }
    }
}
