//! Runtime configuration. Values come from the process environment, with an
//! optional `.env` file loaded first; anything unset or blank falls back to a
//! default under `~/.song-catalog`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

use crate::catalog::DEFAULT_STORAGE_KEY;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".song-catalog";
/// SQLite file name stored inside the data directory.
const DB_FILE_NAME: &str = "catalog.sqlite";
/// Log file written next to the database.
const LOG_FILE_NAME: &str = "song-catalog.log";
const DEFAULT_NOTICE_SECS: u64 = 3;
const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub notice_lifetime: Duration,
    pub log_filter: String,
    /// Keep the catalog in memory only; nothing is read from or written to
    /// disk except the log.
    pub in_memory: bool,
}

impl Config {
    /// Build the configuration from the environment, loading `.env` first
    /// when one is present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match lookup("SONG_CATALOG_DIR") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };

        Ok(Self {
            data_dir,
            storage_key: lookup("SONG_CATALOG_KEY")
                .filter(|key| !key.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
            notice_lifetime: Duration::from_secs(parse_notice_secs(
                lookup("SONG_CATALOG_NOTICE_SECS").as_deref(),
            )),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            in_memory: false,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_file_name(&self) -> &'static str {
        LOG_FILE_NAME
    }
}

/// Resolve `~/.song-catalog`.
fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Zero and unparseable values fall back to the default.
fn parse_notice_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_NOTICE_SECS)
}
