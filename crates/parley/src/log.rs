//! Logging for parley.
use anyhow::Context;
use parley_core::get_data_dir;
use std::io::LineWriter;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::OffsetTime;

const MAX_LOG_BYTES: u64 = 100 * 1024;

/// Initializes file-based logging at `<data_dir>/parley.log`.
///
/// A log file larger than 100KB is rotated to `parley.log.old` first. The
/// `RUST_LOG` style filter defaults to debug for the parley crates.
///
/// # Errors
///
/// Returns an error if the data directory or log file cannot be prepared, or
/// the local time offset cannot be determined.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = data_dir.join("parley.log");

    if log_path.exists() {
        let metadata = std::fs::metadata(&log_path)?;
        if metadata.len() > MAX_LOG_BYTES {
            let backup_path = data_dir.join("parley.log.old");
            if backup_path.exists() {
                std::fs::remove_file(&backup_path)?;
            }
            std::fs::rename(&log_path, backup_path)?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    // Ensure the logs are flushed after every line
    let writer = Mutex::new(LineWriter::new(log_file));

    tracing_subscriber::fmt()
        .with_env_filter("parley=debug,parley_core=debug,reqwest=info")
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}
