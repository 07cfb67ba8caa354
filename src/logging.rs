//! Logging setup for pipeline runs
//!
//! Logs go to the console and to rotating files under the project's `logs/`
//! directory.
//!
//! ## Files
//!
//! - `pipeline.<date>.log`: every record that passes the filter
//! - `error.<date>.log`: warnings and errors only
//!
//! Both rotate daily and keep the last 10 files.
//!
//! ## Usage
//!
//! ```no_run
//! use covid_pipeline::logging;
//!
//! logging::init("logs".as_ref())?;
//! tracing::info!("Run started");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

pub const LOG_PREFIX: &str = "pipeline";
pub const ERROR_LOG_PREFIX: &str = "error";
const MAX_LOG_FILES: usize = 10;

/// Installs the global subscriber: a pretty console layer plus the two file
/// layers. `RUST_LOG` overrides the default `info` filter.
///
/// # Errors
///
/// Returns error if the log directory cannot be created, a file appender
/// fails, or a global subscriber is already installed.
pub fn init(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let all_logs_appender = appender(log_dir, LOG_PREFIX)?;
    let error_logs_appender = appender(log_dir, ERROR_LOG_PREFIX)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true)
        .pretty();

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());
    Ok(())
}

fn appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create '{prefix}' log appender"))
}

/// Today's full log file inside `log_dir`.
pub fn current_log_path(log_dir: &Path) -> PathBuf {
    dated_path(log_dir, LOG_PREFIX)
}

/// Today's warning/error log file inside `log_dir`.
pub fn current_error_log_path(log_dir: &Path) -> PathBuf {
    dated_path(log_dir, ERROR_LOG_PREFIX)
}

fn dated_path(log_dir: &Path, prefix: &str) -> PathBuf {
    // The appender dates files in UTC.
    let today = chrono::Utc::now().format("%Y-%m-%d");
    log_dir.join(format!("{prefix}.{today}.log"))
}
