//! Logging init: file under XDG state dir, or graceful fallback to stderr.

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dcm_core=debug,dcm_cli=debug"))
}

/// Initialize structured logging to `~/.local/state/dcm/dcm.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dcm")?;
    let log_dir = xdg_dirs.get_state_home().join("dcm");

    fs::create_dir_all(&log_dir)?;
    let log_file_path: PathBuf = log_dir.join("dcm.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    // Each log line gets its own cloned handle; if cloning fails mid-run the
    // line goes to stderr instead of being lost.
    let writer = BoxMakeWriter::new(move || {
        file.try_clone()
            .map(|f| Box::new(f) as Box<dyn Write + Send>)
            .unwrap_or_else(|_| Box::new(io::stderr()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("dcm logging initialized at {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
