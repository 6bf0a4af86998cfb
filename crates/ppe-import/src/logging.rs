use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Per-run log file named after the run's start time. Created once in `main`;
/// dropping it flushes pending lines to disk.
pub struct RunLog {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl RunLog {
    pub fn create(log_dir: &Path, started_at: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

        let file_name = log_file_name(started_at);
        let appender = tracing_appender::rolling::never(log_dir, &file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false),
            )
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .context("failed to install log subscriber")?;

        Ok(Self {
            path: log_dir.join(file_name),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn log_file_name(started_at: DateTime<Local>) -> String {
    started_at.format("%Y%m%d%H%M%S.log").to_string()
}
