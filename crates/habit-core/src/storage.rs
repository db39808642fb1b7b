//! Persistence for the habit collection.
//!
//! The whole collection is stored as one JSON document under a fixed
//! namespace in a key-value table. Derived stats are written alongside the
//! raw data but are only a cache; [`crate::store::HabitStore`] recomputes them
//! on load.

use crate::error::StorageResult;
use crate::models::Habit;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

/// Key under which the habit collection is stored.
pub const NAMESPACE: &str = "habits";

/// Load/save boundary used by the store.
pub trait HabitRepository {
    /// Load every stored habit. An empty store yields an empty list.
    fn load(&self) -> StorageResult<Vec<Habit>>;

    /// Replace the stored collection.
    fn save(&mut self, habits: &[Habit]) -> StorageResult<()>;
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a store at path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        debug!(path = %path.display(), "opened habit store");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> StorageResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                namespace TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Raw value stored under a namespace.
    pub fn get(&self, namespace: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE namespace = ?1",
                params![namespace],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace the value under a namespace.
    pub fn put(&self, namespace: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (namespace, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(namespace) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![namespace, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl HabitRepository for SqliteStore {
    fn load(&self) -> StorageResult<Vec<Habit>> {
        match self.get(NAMESPACE)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, habits: &[Habit]) -> StorageResult<()> {
        let json = serde_json::to_string(habits)?;
        self.put(NAMESPACE, &json)?;
        debug!(count = habits.len(), bytes = json.len(), "saved habits");
        Ok(())
    }
}

/// Repository that keeps the serialized collection in memory.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    value: Option<String>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repository with a collection.
    pub fn with_habits(habits: &[Habit]) -> StorageResult<Self> {
        Ok(Self {
            value: Some(serde_json::to_string(habits)?),
        })
    }
}

impl HabitRepository for MemoryRepository {
    fn load(&self) -> StorageResult<Vec<Habit>> {
        match &self.value {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, habits: &[Habit]) -> StorageResult<()> {
        self.value = Some(serde_json::to_string(habits)?);
        Ok(())
    }
}

/// Write the collection to a pretty-printed JSON file.
pub fn export_json(habits: &[Habit], path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(habits)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), count = habits.len(), "exported habits");
    Ok(())
}

/// Read a collection from a JSON file written by [`export_json`] or by the
/// browser version of the tracker.
pub fn import_json(path: &Path) -> StorageResult<Vec<Habit>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
