//! Model name to model id registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rusqlite::params;
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::storage::Database;

/// Small stable integer standing in for a model name in cache keys.
pub type ModelId = i64;

/// Maps model names to ids, backed by the `models` table.
///
/// Known names are served from an in-memory mirror loaded at startup. An
/// unseen name is inserted with `INSERT OR IGNORE` and then read back, so the
/// unique constraint on `models.model` decides the winner when two callers
/// race to register the same name.
pub struct ModelRegistry {
    db: Arc<Database>,
    known: RwLock<HashMap<String, ModelId>>,
}

impl ModelRegistry {
    /// Load every registered model from storage.
    pub fn load(db: Arc<Database>) -> Result<Self> {
        let known = db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, model FROM models")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, ModelId>(0)?))
            })?;
            let mut known = HashMap::new();
            for row in rows {
                let (name, id) = row?;
                known.insert(name, id);
            }
            Ok(known)
        })?;

        info!("Loaded {} models", known.len());

        Ok(Self {
            db,
            known: RwLock::new(known),
        })
    }

    /// Return the id for `name`, registering it if it has never been seen.
    pub fn get_or_create(&self, name: &str) -> Result<ModelId> {
        if let Some(id) = self.cached(name)? {
            return Ok(id);
        }

        let (id, inserted) = self.db.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO models (model) VALUES (?1)",
                params![name],
            )? > 0;
            let id: ModelId = conn.query_row(
                "SELECT id FROM models WHERE model = ?1",
                params![name],
                |row| row.get(0),
            )?;
            Ok((id, inserted))
        })?;

        if inserted {
            info!("Registered model {name} with id {id}");
        } else {
            debug!("Model {name} already registered with id {id}");
        }

        self.known
            .write()
            .map_err(|_| EmbeddingError::LockPoisoned)?
            .insert(name.to_string(), id);

        Ok(id)
    }

    /// Number of models known to this registry.
    pub fn len(&self) -> Result<usize> {
        let known = self.known.read().map_err(|_| EmbeddingError::LockPoisoned)?;
        Ok(known.len())
    }

    /// Whether no model has been registered yet.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn cached(&self, name: &str) -> Result<Option<ModelId>> {
        let known = self.known.read().map_err(|_| EmbeddingError::LockPoisoned)?;
        Ok(known.get(name).copied())
    }
}
