//! File-based tracing setup. The terminal belongs to the TUI, so events go to
//! a log file in the data directory instead of stdout.

use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

pub fn init(config: &Config) -> Result<LoggingGuard> {
    fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;

    let appender = tracing_appender::rolling::never(&config.data_dir, config.log_file_name());
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to build log filter")?;

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard { _guard: guard })
}
