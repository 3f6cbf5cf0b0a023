//! Binary entry point: read configuration, start file logging, open the
//! catalog slot and hand control to the terminal UI.
use std::env;

use anyhow::{Context, Result};
use song_catalog::{logging, run_app, App, CatalogStore, Config, MemoryKv, SqliteKv};
use tracing::info;

fn main() -> Result<()> {
    let mut config = Config::from_env()?;
    config.in_memory = env::args().skip(1).any(|arg| arg == "--in-memory");
    let _guard = logging::init(&config)?;

    if config.in_memory {
        info!("starting with an in-memory catalog");
        let catalog = CatalogStore::load(MemoryKv::new(), config.storage_key.as_str())
            .context("failed to load catalog")?;
        let mut app = App::new(catalog, config.notice_lifetime);
        return run_app(&mut app);
    }

    let db_path = config.db_path();
    info!(path = %db_path.display(), "opening catalog database");
    let storage = SqliteKv::open(&db_path)?;
    let catalog = CatalogStore::load(storage, config.storage_key.as_str())
        .context("failed to load catalog")?;

    let mut app = App::new(catalog, config.notice_lifetime);
    run_app(&mut app)
}
