//! Tracing setup for the CLI: logs never reach the terminal, which belongs to the chat.
//!
//! - **RUST_LOG**: level filter, e.g. `info`, `agent_thread=debug`. Default: `info`.
//! - **LOG_FILE**: when set, logs are appended there (plain text, no ANSI) through a
//!   non-blocking writer. When unset, logs are dropped.

use std::path::Path;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_FILE_KEY: &str = "LOG_FILE";

#[derive(Error, Debug)]
pub enum InitError {
    #[error("open log file {path}: {source}")]
    OpenLogFile {
        path: String,
        source: std::io::Error,
    },
    #[error("install subscriber: {0}")]
    Install(String),
}

/// Installs the global subscriber.
///
/// Keep the returned guard alive for the whole process; dropping it flushes and stops
/// the background log writer.
pub fn init(default_filter: &str) -> Result<Option<WorkerGuard>, InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match std::env::var(LOG_FILE_KEY) {
        Ok(path) if !path.trim().is_empty() => {
            let file = open_append(Path::new(&path)).map_err(|source| InitError::OpenLogFile {
                path: path.clone(),
                source,
            })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            tracing_subscriber::registry()
                .with(layer)
                .try_init()
                .map_err(|e| InitError::Install(e.to_string()))?;
            tracing::info!(path = %path, "agent-chat logging to file");
            Ok(Some(guard))
        }
        _ => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::sink)
                .with_filter(filter);
            tracing_subscriber::registry()
                .with(layer)
                .try_init()
                .map_err(|e| InitError::Install(e.to_string()))?;
            Ok(None)
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}
