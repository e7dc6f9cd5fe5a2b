//! Atomic read-validate-append-replace for JSON-array log files

use crate::io::error::AppendError;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Result of a successful append
#[derive(Debug, Clone, PartialEq)]
pub struct AppendReport {
    /// Number of records in the log after the append
    pub total_entries: usize,

    /// Where a corrupted previous log was preserved, if one was found
    pub quarantined: Option<PathBuf>,
}

/// Append one record to the JSON-array log at `log_path`.
///
/// The sequence is read → (quarantine if corrupted) → append in memory →
/// stage to `<log>.tmp` → re-parse the staged file → copy the current log
/// to `<log>.backup` → rename the staged file over the log.
///
/// A missing log, or one that is empty or whitespace-only, starts a new
/// array. A log that does not parse as an array is copied to
/// `<log>.corrupted.<unix-ts>` and replaced by a fresh array holding only
/// `entry`; the original bytes are never deleted.
///
/// # Errors
///
/// On failure after staging, the temporary file is removed and, if the log
/// path is missing while a backup exists, the log is restored from the
/// backup. Previously committed records are never lost; only `entry` is.
pub fn append_log_entry<T>(log_path: &Path, entry: &T) -> Result<AppendReport, AppendError>
where
    T: Serialize + ?Sized,
{
    let record = serde_json::to_value(entry).map_err(|e| AppendError::Json {
        path: log_path.to_path_buf(),
        source: e,
    })?;

    let plan = AppendPlan::new(log_path);
    plan.ensure_parent()?;

    let (mut entries, quarantined) = plan.read()?;
    entries.push(record);
    let total_entries = entries.len();

    let result = plan
        .stage(&entries)
        .and_then(|()| plan.verify(total_entries))
        .and_then(|()| plan.backup())
        .and_then(|()| plan.commit());

    match result {
        Ok(()) => {
            info!(
                log = %log_path.display(),
                total_entries,
                "Log entry written"
            );
            Ok(AppendReport {
                total_entries,
                quarantined,
            })
        }
        Err(e) => {
            error!(log = %log_path.display(), "Error writing log entry: {e}");
            plan.cleanup();
            Err(e)
        }
    }
}

/// Path of the daily log for `date` inside `logs_dir` (`<logs_dir>/YYYY-MM-DD.json`).
pub fn daily_log_path(logs_dir: &Path, date: NaiveDate) -> PathBuf {
    logs_dir.join(format!("{}.json", date.format("%Y-%m-%d")))
}

/// `path` with `suffix` appended to its final component, bytes preserved.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = OsString::from(path.as_os_str());
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Parse a log container. `Err` carries why the content counts as corrupted.
fn parse_container(bytes: &[u8]) -> Result<Vec<Value>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err("log file is not a JSON array".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// The files touched by one append, and the steps between them.
struct AppendPlan {
    log: PathBuf,
    tmp: PathBuf,
    backup: PathBuf,
}

impl AppendPlan {
    fn new(log_path: &Path) -> Self {
        Self {
            log: log_path.to_path_buf(),
            tmp: with_suffix(log_path, ".tmp"),
            backup: with_suffix(log_path, ".backup"),
        }
    }

    fn ensure_parent(&self) -> Result<(), AppendError> {
        match self.log.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| AppendError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })
            }
            _ => Ok(()),
        }
    }

    fn read(&self) -> Result<(Vec<Value>, Option<PathBuf>), AppendError> {
        let bytes = match fs::read(&self.log) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), None)),
            Err(e) => {
                return Err(AppendError::Io {
                    path: self.log.clone(),
                    source: e,
                });
            }
        };

        match parse_container(&bytes) {
            Ok(entries) => Ok((entries, None)),
            Err(reason) => {
                let quarantine = self.quarantine()?;
                warn!(
                    log = %self.log.display(),
                    backup = %quarantine.display(),
                    "Corrupted log file detected ({reason}); starting a fresh array"
                );
                Ok((Vec::new(), Some(quarantine)))
            }
        }
    }

    /// Copy the current log to a fresh `.corrupted.<ts>` path. Never overwrites.
    fn quarantine(&self) -> Result<PathBuf, AppendError> {
        let base = with_suffix(&self.log, &format!(".corrupted.{}", Utc::now().timestamp()));
        let mut candidate = base.clone();
        let mut counter = 1u32;
        while candidate.exists() {
            candidate = with_suffix(&base, &format!(".{counter}"));
            counter += 1;
        }

        fs::copy(&self.log, &candidate).map_err(|e| AppendError::QuarantineFailed {
            path: self.log.clone(),
            source: e,
        })?;
        Ok(candidate)
    }

    fn stage(&self, entries: &[Value]) -> Result<(), AppendError> {
        let content = serde_json::to_vec_pretty(entries).map_err(|e| AppendError::Json {
            path: self.tmp.clone(),
            source: e,
        })?;

        let mut tmp_file = fs::File::create(&self.tmp).map_err(|e| AppendError::Io {
            path: self.tmp.clone(),
            source: e,
        })?;
        tmp_file.write_all(&content).map_err(|e| AppendError::Io {
            path: self.tmp.clone(),
            source: e,
        })?;
        tmp_file.sync_all().map_err(|e| AppendError::Io {
            path: self.tmp.clone(),
            source: e,
        })
    }

    fn verify(&self, expected_entries: usize) -> Result<(), AppendError> {
        let failed = |reason: String| AppendError::StageVerifyFailed {
            path: self.tmp.clone(),
            reason,
        };

        let bytes = fs::read(&self.tmp).map_err(|e| failed(e.to_string()))?;
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(entries)) if entries.len() == expected_entries => Ok(()),
            Ok(Value::Array(entries)) => Err(failed(format!(
                "expected {expected_entries} entries, found {}",
                entries.len()
            ))),
            Ok(_) => Err(failed("staged content is not a JSON array".to_string())),
            Err(e) => Err(failed(e.to_string())),
        }
    }

    fn backup(&self) -> Result<(), AppendError> {
        if !self.log.exists() {
            return Ok(());
        }
        fs::copy(&self.log, &self.backup)
            .map(|_| ())
            .map_err(|e| AppendError::Io {
                path: self.backup.clone(),
                source: e,
            })
    }

    fn commit(&self) -> Result<(), AppendError> {
        fs::rename(&self.tmp, &self.log).map_err(|e| AppendError::CommitFailed {
            path: self.log.clone(),
            source: e,
        })
    }

    /// Best-effort recovery after a failed stage/verify/backup/commit.
    fn cleanup(&self) {
        if self.tmp.exists()
            && let Err(e) = fs::remove_file(&self.tmp)
        {
            warn!(tmp = %self.tmp.display(), "Failed to remove staged log: {e}");
        }

        if self.log.exists() || !self.backup.exists() {
            return;
        }

        // Restore through the tmp path so the log never appears half-copied.
        let restored = fs::copy(&self.backup, &self.tmp)
            .and_then(|_| fs::rename(&self.tmp, &self.log));
        match restored {
            Ok(()) => info!(log = %self.log.display(), "Restored log file from backup"),
            Err(e) => {
                let _ = fs::remove_file(&self.tmp);
                error!(log = %self.log.display(), "Failed to restore log from backup: {e}");
            }
        }
        debug!(backup = %self.backup.display(), "Backup left in place");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn read_entries(path: &Path) -> Vec<Value> {
        let content = fs::read_to_string(path).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    fn quarantine_files(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().contains(".corrupted."))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_append_creates_missing_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("2026-02-18.json");

        let report = append_log_entry(&log, &json!({"action": "test"})).unwrap();

        assert_eq!(report.total_entries, 1);
        assert!(report.quarantined.is_none());
        assert_eq!(read_entries(&log), vec![json!({"action": "test"})]);
        assert!(!with_suffix(&log, ".tmp").exists());
        // No previous version, so nothing to back up
        assert!(!with_suffix(&log, ".backup").exists());
    }

    #[test]
    fn test_append_sequence_preserves_order() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");

        for n in 1..=3 {
            append_log_entry(&log, &json!({"seq": n})).unwrap();
        }

        assert_eq!(
            read_entries(&log),
            vec![json!({"seq": 1}), json!({"seq": 2}), json!({"seq": 3})]
        );
    }

    #[test]
    fn test_append_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("Logs").join("nested").join("day.json");

        append_log_entry(&log, &json!({"a": 1})).unwrap();

        assert_eq!(read_entries(&log).len(), 1);
    }

    #[test]
    fn test_whitespace_only_log_is_empty_array() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        fs::write(&log, "  \n\t ").unwrap();

        let report = append_log_entry(&log, &json!("first")).unwrap();

        assert_eq!(report.total_entries, 1);
        assert!(report.quarantined.is_none());
        assert!(quarantine_files(temp_dir.path()).is_empty());
    }

    #[test]
    #[traced_test]
    fn test_corrupted_log_is_quarantined_and_reset() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        let garbage = b"{not json at all \xff";
        fs::write(&log, garbage).unwrap();

        let report = append_log_entry(&log, &json!({"action": "after"})).unwrap();

        let quarantined = report.quarantined.expect("corrupted log should be preserved");
        assert_eq!(fs::read(&quarantined).unwrap(), garbage);
        assert_eq!(quarantine_files(temp_dir.path()), vec![quarantined]);
        assert_eq!(read_entries(&log), vec![json!({"action": "after"})]);
        assert!(logs_contain("Corrupted log file detected"));
    }

    #[test]
    fn test_non_array_json_counts_as_corrupted() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        fs::write(&log, r#"{"entries": []}"#).unwrap();

        let report = append_log_entry(&log, &json!(1)).unwrap();

        assert!(report.quarantined.is_some());
        assert_eq!(read_entries(&log), vec![json!(1)]);
    }

    #[test]
    fn test_quarantine_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        fs::write(&log, "first corruption").unwrap();
        let plan = AppendPlan::new(&log);

        let first = plan.quarantine().unwrap();
        fs::write(&log, "second corruption").unwrap();
        let second = plan.quarantine().unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "first corruption");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second corruption");
    }

    #[test]
    fn test_backup_holds_previous_version() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");

        append_log_entry(&log, &json!("one")).unwrap();
        append_log_entry(&log, &json!("two")).unwrap();

        let backup = with_suffix(&log, ".backup");
        assert_eq!(read_entries(&backup), vec![json!("one")]);
        assert_eq!(read_entries(&log), vec![json!("one"), json!("two")]);
    }

    #[test]
    fn test_interrupt_before_commit_leaves_log_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        append_log_entry(&log, &json!("committed")).unwrap();
        let before = fs::read(&log).unwrap();

        let plan = AppendPlan::new(&log);
        let (mut entries, _) = plan.read().unwrap();
        entries.push(json!("in flight"));
        plan.stage(&entries).unwrap();
        plan.verify(entries.len()).unwrap();
        plan.backup().unwrap();
        // Process dies here: no commit.

        assert_eq!(fs::read(&log).unwrap(), before);
        assert!(plan.tmp.exists());

        plan.cleanup();
        assert!(!plan.tmp.exists());
        assert_eq!(fs::read(&log).unwrap(), before);
    }

    #[test]
    fn test_interrupt_before_commit_on_new_log_leaves_no_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");

        let plan = AppendPlan::new(&log);
        plan.stage(&[json!("in flight")]).unwrap();

        assert!(!log.exists());
        plan.cleanup();
        assert!(!log.exists());
        assert!(!plan.tmp.exists());
    }

    #[test]
    fn test_verify_rejects_damaged_stage() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        append_log_entry(&log, &json!("committed")).unwrap();
        let before = fs::read(&log).unwrap();

        let plan = AppendPlan::new(&log);
        plan.stage(&[json!("committed"), json!("new")]).unwrap();
        fs::write(&plan.tmp, b"[\"committed\", \"ne").unwrap();

        let err = plan.verify(2).unwrap_err();
        assert!(matches!(err, AppendError::StageVerifyFailed { .. }));

        plan.cleanup();
        assert!(!plan.tmp.exists());
        assert_eq!(fs::read(&log).unwrap(), before);
    }

    #[test]
    fn test_verify_rejects_wrong_entry_count() {
        let temp_dir = TempDir::new().unwrap();
        let plan = AppendPlan::new(&temp_dir.path().join("log.json"));
        plan.stage(&[json!(1)]).unwrap();

        let err = plan.verify(2).unwrap_err();
        assert!(err.to_string().contains("expected 2 entries, found 1"));
    }

    #[test]
    fn test_cleanup_restores_missing_log_from_backup() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        append_log_entry(&log, &json!("one")).unwrap();
        append_log_entry(&log, &json!("two")).unwrap();

        let plan = AppendPlan::new(&log);
        plan.stage(&[json!("one"), json!("two"), json!("three")]).unwrap();
        fs::remove_file(&log).unwrap();

        plan.cleanup();

        assert_eq!(read_entries(&log), vec![json!("one")]);
        assert!(!plan.tmp.exists());
        assert!(plan.backup.exists());
    }

    #[test]
    fn test_record_key_order_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");
        let entry: Value =
            serde_json::from_str(r#"{"timestamp":"2026-02-18T10:00:00Z","action":"test","actor":"me"}"#)
                .unwrap();

        append_log_entry(&log, &entry).unwrap();

        let content = fs::read_to_string(&log).unwrap();
        let ts = content.find("timestamp").unwrap();
        let action = content.find("action").unwrap();
        let actor = content.find("actor").unwrap();
        assert!(ts < action && action < actor);
    }

    #[test]
    fn test_non_ascii_written_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("log.json");

        append_log_entry(&log, &json!({"note": "café ✓"})).unwrap();

        assert!(fs::read_to_string(&log).unwrap().contains("café ✓"));
    }

    #[test]
    fn test_daily_log_path_format() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 8).unwrap();
        assert_eq!(
            daily_log_path(Path::new("/vault/Logs"), date),
            PathBuf::from("/vault/Logs/2026-02-08.json")
        );
    }
}
