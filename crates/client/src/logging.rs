//! Tracing setup: a per-session log file plus stderr.
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Installs the global subscriber.
///
/// Everything at `RUST_LOG` (default `info`) goes to
/// `<cache>/logs/<session>/client.log`; stderr only shows warnings unless
/// `verbose` is set. Keep the returned guard alive until exit so the file
/// writer flushes.
pub fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let session_id = format!("session_{}", chrono::Utc::now().format("%Y%m%dT%H%M%S"));
    let session_log_dir = log_dir().join(&session_id);
    std::fs::create_dir_all(&session_log_dir)
        .with_context(|| format!("creating log directory {}", session_log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stderr_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::from_level(stderr_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::info!("Logging initialized: session={}", session_id);
    tracing::info!("Log file: {}/client.log", session_log_dir.display());

    Ok(guard)
}

/// Platform cache directory for logs, falling back to `/tmp/rps-zk/logs`.
fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "rps-zk")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/rps-zk"))
        .join("logs")
}
