//! Tracing configuration and log routing.
//!
//! Logs go to stdout with a compact formatter, and to a file when one can be opened:
//! `DOCSTREAM_LOG_FILE` names an explicit append target, otherwise logs land in
//! `logs/docstream.log`. File output goes through a non-blocking writer so logging
//! never stalls request handling.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Configure tracing subscribers for stdout and optional file logging.
///
/// Respects `RUST_LOG` for filtering and defaults to `info`. The worker guard for
/// the non-blocking writer is parked in a process-lifetime static.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact());

    match file_writer() {
        Some(writer) => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .compact(),
            )
            .init(),
        None => registry.init(),
    }
}

/// Build a non-blocking writer for file logging.
///
/// Returns `None` when neither the configured file nor the default logs directory
/// can be opened; the server then logs to stdout only.
fn file_writer() -> Option<NonBlocking> {
    let (non_blocking, guard) = match std::env::var("DOCSTREAM_LOG_FILE") {
        Ok(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .inspect_err(|err| eprintln!("Failed to open log file {path}: {err}"))
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        Err(_) => {
            std::fs::create_dir_all("logs")
                .inspect_err(|err| eprintln!("Failed to create logs directory: {err}"))
                .ok()?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                "logs",
                "docstream.log",
            ))
        }
    };

    let _ = LOG_GUARD.set(guard);
    Some(non_blocking)
}
