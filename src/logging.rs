//! Log subscriber setup for the binary.
//!
//! Events go to stderr and are appended to `<exe_dir>/logs/autobuy.log`.
//! The filter comes from `RUST_LOG` and defaults to `info`.

use anyhow::{Result, anyhow};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber.
///
/// If the log file cannot be opened, logging continues on stderr only.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file);

    let installed = match file {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(file)))
            .try_init(),
        Err(e) => {
            eprintln!("Cannot open {}: {}. Logging to stderr only.", log_file.display(), e);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .try_init()
        }
    };

    installed.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
