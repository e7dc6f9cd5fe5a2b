//! Opt-in JSON activity log of completed moves

use chrono::{Local, Utc};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};
use vault_core::config::VaultConfig;
use vault_core::io::{append_log_entry, daily_log_path};
use vault_core::{TransferObserver, TransferOutcome};

/// Appends a `file_moved` record to `<logs>/<YYYY-MM-DD>.json` for every
/// successful transfer. Other outcomes are ignored.
///
/// Appends are serialized through an internal lock: concurrent transfers on
/// the event strategy would otherwise race on the same daily log.
///
/// `source` and `destination` are recorded relative to the vault root,
/// using the configured Inbox and Needs_Action directory names.
#[derive(Debug)]
pub struct ActivityLogObserver {
    logs_dir: PathBuf,
    inbox: PathBuf,
    needs_action: PathBuf,
    write_lock: Mutex<()>,
}

impl ActivityLogObserver {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            inbox: PathBuf::from("Inbox"),
            needs_action: PathBuf::from("Needs_Action"),
            write_lock: Mutex::new(()),
        }
    }

    /// Record paths under the vault's configured directory names.
    pub fn for_vault(vault: &VaultConfig) -> Self {
        Self {
            inbox: vault.inbox.clone(),
            needs_action: vault.needs_action.clone(),
            ..Self::new(vault.logs_dir())
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }
}

impl TransferObserver for ActivityLogObserver {
    fn on_outcome(&self, _source: &Path, outcome: &TransferOutcome) {
        let TransferOutcome::Moved {
            source,
            destination,
        } = outcome
        else {
            return;
        };

        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "action": "file_moved",
            "source": format!("{}/{source}", self.inbox.display()),
            "destination": format!("{}/{destination}", self.needs_action.display()),
            "result": "success",
        });
        let log_path = daily_log_path(&self.logs_dir, Local::now().date_naive());

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match append_log_entry(&log_path, &entry) {
            Ok(report) => debug!(
                "Recorded move in {} ({} entries)",
                log_path.display(),
                report.total_entries
            ),
            Err(e) => warn!("Failed to record activity: {e}"),
        }
    }
}
