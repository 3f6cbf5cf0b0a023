//! Persistence for the catalog slot: a key-value abstraction plus the SQLite
//! file that backs it in normal runs.

mod connection;
mod kv;

pub use kv::{KeyValueStore, MemoryKv, SqliteKv};
