//! Logging Initialization
//!
//! Tracing setup for embedding hosts: stdout plus a daily rolling log file.
//! The engine itself only emits `tracing` events; hosts that already install
//! their own subscriber can skip this module entirely.

use std::path::Path;
use std::sync::OnceLock;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes tracing with a stdout layer and a daily rolling file layer.
///
/// The filter honors `RUST_LOG` and defaults to INFO. Safe to call more than
/// once: later calls are no-ops if a global subscriber is already installed.
pub fn init_logging(log_dir: &Path) {
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "adgenius.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    use tracing_subscriber::prelude::*;

    let env_filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, embedder subscribers).
    let _ = tracing::subscriber::set_global_default(subscriber);
}

// =============================================================================
// Tests
// =============================================================================
