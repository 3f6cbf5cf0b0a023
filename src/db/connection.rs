use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Open (or create) the SQLite file at `path` and run the lazy migration for
/// the key-value table. Parent directories are created on demand so a fresh
/// data directory works on first launch.
pub(crate) fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the single table the key-value store needs.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create kv table")?;

    Ok(())
}
