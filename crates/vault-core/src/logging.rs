//! Logging setup for vault binaries.
//!
//! [`Logging::init`] builds the process subscriber from explicit
//! [`LogSettings`] and returns a handle that owns the file writer. Keep the
//! handle alive for as long as logs should be written; dropping it flushes
//! buffered file output.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt;

/// What to log and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: tracing::Level,
    /// Mirror output into this file (appended, no ANSI colours)
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            file: None,
        }
    }
}

impl LogSettings {
    /// Level from `VAULT_LOG` (`trace|debug|info|warn|error`, default info).
    pub fn from_env() -> Self {
        Self {
            level: parse_level(std::env::var("VAULT_LOG").ok().as_deref()),
            file: None,
        }
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

fn parse_level(raw: Option<&str>) -> tracing::Level {
    match raw.unwrap_or("info").trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Live logging configuration. Drop to flush and detach the file writer.
#[derive(Debug)]
pub struct Logging {
    settings: LogSettings,
    installed: bool,
    _file_guard: Option<WorkerGuard>,
}

impl Logging {
    /// Install the subscriber described by `settings`.
    ///
    /// Never fails: if the log file cannot be opened, logging continues on
    /// stdout only; if a subscriber is already installed (e.g. in tests),
    /// the returned handle reports `installed() == false`.
    pub fn init(settings: LogSettings) -> Self {
        let (file_layer, guard) = match settings.file.as_deref().map(open_file_writer) {
            Some(Ok((writer, guard))) => {
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false);
                (Some(layer), Some(guard))
            }
            Some(Err(e)) => {
                eprintln!("Warning: file logging disabled: {e}");
                (None, None)
            }
            None => (None, None),
        };

        let stdout_layer = fmt::layer().with_target(false);
        let installed = tracing_subscriber::registry()
            .with(LevelFilter::from_level(settings.level))
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .is_ok();

        Self {
            settings,
            installed,
            _file_guard: guard,
        }
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    /// Whether this call installed the global subscriber
    pub fn installed(&self) -> bool {
        self.installed
    }
}

fn open_file_writer(
    path: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    Ok(tracing_appender::non_blocking(file))
}
