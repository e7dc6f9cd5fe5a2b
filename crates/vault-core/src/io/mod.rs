//! Crash-safe JSON log appends
//!
//! A log file is a single JSON array of records. [`append_log_entry`] adds
//! one record per call and guarantees that, at every instant, the log path
//! either does not exist or holds a syntactically valid array whose records
//! are a prefix of everything ever appended successfully.
//!
//! Side artifacts next to `<log>`:
//!
//! - `<log>.tmp` - staged new version, never visible at the log path
//! - `<log>.backup` - last known-good version before the latest replace
//! - `<log>.corrupted.<unix-ts>` - quarantined malformed originals
//!
//! One appender per log path at a time is a precondition: concurrent
//! appenders are not made mutually exclusive.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use std::path::Path;
//! use vault_core::io::append_log_entry;
//!
//! let log = Path::new("Logs/2026-02-18.json");
//! let report = append_log_entry(log, &json!({"action": "file_moved"})).unwrap();
//! println!("{} entries in {}", report.total_entries, log.display());
//! ```

pub mod append;
pub mod error;

pub use append::{AppendReport, append_log_entry, daily_log_path};
pub use error::AppendError;
