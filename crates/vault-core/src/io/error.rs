//! Error types for log appends

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can end a single [`append_log_entry`](super::append_log_entry) call.
///
/// Every variant leaves the log path in one of its guaranteed-valid states:
/// unchanged, restored from backup, or absent if it was absent before.
#[derive(Error, Debug)]
pub enum AppendError {
    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the record or the container
    #[error("JSON error for {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Could not preserve a corrupted log before resetting it
    #[error("Failed to quarantine corrupted log {path}: {source}")]
    QuarantineFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The staged temporary file did not read back as the expected array
    #[error("Staged log {path} failed verification: {reason}")]
    StageVerifyFailed { path: PathBuf, reason: String },

    /// The atomic replace of the log file failed
    #[error("Failed to commit {path}: {source}")]
    CommitFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}
