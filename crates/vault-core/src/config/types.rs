//! Configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Vault directory layout
    #[serde(default)]
    pub vault: VaultConfig,
    /// Intake daemon settings
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// Activity log settings
    #[serde(default)]
    pub activity_log: ActivityLogConfig,
}

/// Vault directory layout. Sub-directories are relative to `root` unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub root: PathBuf,
    pub inbox: PathBuf,
    pub needs_action: PathBuf,
    pub logs: PathBuf,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            inbox: PathBuf::from("Inbox"),
            needs_action: PathBuf::from("Needs_Action"),
            logs: PathBuf::from("Logs"),
        }
    }
}

impl VaultConfig {
    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join(&self.inbox)
    }

    pub fn needs_action_dir(&self) -> PathBuf {
        self.root.join(&self.needs_action)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(&self.logs)
    }
}

/// Which detector the daemon runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// OS filesystem notifications
    #[default]
    Event,
    /// Periodic directory listing diff
    Polling,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Event => "event",
            Self::Polling => "polling",
        })
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" | "events" | "notify" => Ok(Self::Event),
            "poll" | "polling" => Ok(Self::Polling),
            other => Err(format!("unknown strategy '{other}' (expected 'event' or 'polling')")),
        }
    }
}

/// Intake daemon settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub strategy: Strategy,
    /// Seconds between polls (polling strategy only)
    pub poll_interval_secs: u64,
    /// Pause before the stability sample, in milliseconds
    pub settle_delay_ms: u64,
    /// Gap between the two size samples, in milliseconds
    pub stability_window_ms: u64,
    /// Upper bound on waiting for in-flight transfers at shutdown
    pub shutdown_timeout_secs: u64,
    /// Daemon log file, relative to the vault root. Empty disables file logging.
    pub log_file: PathBuf,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Event,
            poll_interval_secs: 2,
            settle_delay_ms: 500,
            stability_window_ms: 300,
            shutdown_timeout_secs: 5,
            log_file: PathBuf::from("filesystem_watcher.log"),
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn stability_window(&self) -> Duration {
        Duration::from_millis(self.stability_window_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Absolute log file path under `root`, or `None` when disabled.
    pub fn log_file_path(&self, root: &Path) -> Option<PathBuf> {
        if self.log_file.as_os_str().is_empty() {
            None
        } else {
            Some(root.join(&self.log_file))
        }
    }
}

/// Activity log settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLogConfig {
    /// Append a record to the daily log for every moved file
    pub enabled: bool,
}
