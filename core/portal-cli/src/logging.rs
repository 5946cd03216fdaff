//! Log setup: a daily-rolling file under the storage root.
//!
//! stdout belongs to command output, so logs never go there. If the log
//! directory can't be created, logs go to stderr instead.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "PORTAL_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "portal-session.log";

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = filter();

    if let Err(err) = std::fs::create_dir_all(logs_dir) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!(error = %err, path = %logs_dir.display(), "Log directory unavailable; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
