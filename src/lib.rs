//! Core library surface for the song catalog.
//!
//! The catalog store and its storage backends carry no UI dependency; the
//! `ui` module is one consumer of them and the binary wires the two together.
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod render;
pub mod ui;

pub use catalog::{CatalogStore, DEFAULT_STORAGE_KEY};
pub use config::Config;
pub use db::{KeyValueStore, MemoryKv, SqliteKv};
pub use errors::{CatalogError, StorageError};
pub use models::{Track, TrackFields};
pub use render::{render_rows, Notice, NoticeKind, TrackRow};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
