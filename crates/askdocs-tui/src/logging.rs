//! Tracing setup.
//!
//! The TUI owns the terminal, so interactive sessions log to a file under the
//! data directory. One-shot commands log to stderr.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "askdocs.log";

/// `RUST_LOG` wins; otherwise verbosity picks the level.
fn filter(verbose: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    }
}

pub fn init_stderr(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Log to `<data dir>/askdocs/askdocs.log`. Keep the guard alive until exit
/// so buffered lines are flushed.
pub fn init_file(verbose: u8) -> Result<(WorkerGuard, PathBuf)> {
    let dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("askdocs");
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_ansi(false)
        .with_writer(writer)
        .init();

    Ok((guard, dir.join(LOG_FILE)))
}
