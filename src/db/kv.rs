use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::connection::{ensure_schema, open_database};
use crate::errors::StorageError;

/// Minimal string key-value interface the catalog persists through. Values
/// are opaque to the backend; the catalog decides what goes in them.
pub trait KeyValueStore {
    /// Return the value stored under `key`, or `None` when the key was never
    /// written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Key-value store backed by a single `kv` table in SQLite.
pub struct SqliteKv {
    conn: Connection,
}

impl SqliteKv {
    /// Open the database file at `path`, creating it and its schema if
    /// needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_database(path)?;
        Ok(Self { conn })
    }

    /// Throwaway database that disappears with the process.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local store, used by tests and `--in-memory` sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `value` already stored under `key`.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
