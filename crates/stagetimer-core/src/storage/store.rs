//! Durable key-value store for presets and settings.
//!
//! Values are JSON. Writes are staged by `set` and become durable on `save`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::data_dir;
use crate::error::StoreError;

/// Store file name inside the data directory.
pub const STORE_FILE: &str = "stagetimer.db";

pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
    /// Durably flush staged writes.
    fn save(&mut self) -> Result<(), StoreError>;
}

/// Typed access on top of any [`KvStore`].
pub trait KvStoreExt: KvStore {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

/// SQLite-backed store using a single `kv` table.
pub struct SqliteStore {
    conn: Connection,
    pending: BTreeMap<String, String>,
}

impl SqliteStore {
    /// Open the store at `~/.config/stagetimer/stagetimer.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created or the
    /// database cannot be opened or migrated.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = data_dir()?.join(STORE_FILE);
        Self::open(&path)
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            pending: BTreeMap::new(),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database. Nothing survives the process.
    pub fn open_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            pending: BTreeMap::new(),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Number of writes staged but not yet saved.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if let Some(raw) = self.pending.get(key) {
            return Ok(Some(serde_json::from_str(raw)?));
        }
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.pending.insert(key.to_string(), serde_json::to_string(&value)?);
        Ok(())
    }

    fn save(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction()?;
        for (key, value) in &self.pending {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        self.pending.clear();
        Ok(())
    }
}

/// In-process store; `save` only counts flushes.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.saves += 1;
        Ok(())
    }
}
