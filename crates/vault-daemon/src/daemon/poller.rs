//! Polling strategy: diff Inbox listings on a fixed interval
//!
//! Files already present at startup are recorded as known and never
//! processed. A name joins the known set only once a transfer attempt has
//! concluded and left the file in place (permission or OS errors).
//! `StillWriting` leaves it out so the next poll retries it, and a moved
//! or vanished name is free for the next file that uses it.

use crate::daemon::detector::{Detector, DetectorContext, DetectorError};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use vault_core::config::Strategy;
use vault_core::intake::is_candidate_name;
use vault_core::{InFlightSet, TransferOutcome};

/// Outcomes of one poll, in the order files were processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    pub outcomes: Vec<(OsString, TransferOutcome)>,
}

impl PollReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn moved(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_moved()).count()
    }
}

pub struct PollingDetector {
    ctx: DetectorContext,
    interval: Duration,
    known: HashSet<OsString>,
    in_flight: InFlightSet,
}

impl PollingDetector {
    /// Snapshot the Inbox so that pre-existing files are left alone.
    ///
    /// # Errors
    ///
    /// Fails if the Inbox cannot be listed: starting without a snapshot would
    /// process every pre-existing file.
    pub fn new(ctx: DetectorContext, interval: Duration) -> Result<Self, DetectorError> {
        let known = list_candidates(ctx.inbox.path())?;
        if !known.is_empty() {
            info!(
                "Found {} existing file(s) in Inbox (will not be processed)",
                known.len()
            );
        }

        Ok(Self {
            ctx,
            interval,
            known,
            in_flight: InFlightSet::new(),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_known(&self, name: &OsStr) -> bool {
        self.known.contains(name)
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    /// List the Inbox once and transfer every name not seen before.
    ///
    /// Stops picking up further files once `cancel` fires; names left
    /// unprocessed stay unknown.
    pub fn poll(&mut self, cancel: &CancellationToken) -> Result<PollReport, DetectorError> {
        let inbox = self.ctx.inbox.path().to_path_buf();
        let current = list_candidates(&inbox)?;

        let mut new_names: Vec<OsString> = current.difference(&self.known).cloned().collect();
        new_names.sort();

        let mut report = PollReport::default();
        for name in new_names {
            if cancel.is_cancelled() {
                break;
            }
            let Some(guard) = self.in_flight.try_acquire(PathBuf::from(&name)) else {
                continue;
            };

            let source = inbox.join(&name);
            info!("New file detected: {}", name.to_string_lossy());
            let outcome = self
                .ctx
                .protocol
                .transfer(&source, self.ctx.needs_action.path());
            drop(guard);

            match outcome {
                // Retried on the next poll
                TransferOutcome::StillWriting => {}
                // Gone from the Inbox, so a later file reusing the name is new
                TransferOutcome::Moved { .. } | TransferOutcome::VanishedBeforeProcessing => {}
                _ => {
                    self.known.insert(name.clone());
                }
            }

            self.ctx.observer.on_outcome(&source, &outcome);
            report.outcomes.push((name, outcome));
        }

        self.known.retain(|name| current.contains(name));
        Ok(report)
    }
}

impl Detector for PollingDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Polling
    }

    async fn run(self, cancel: CancellationToken) -> Result<(), DetectorError> {
        info!(
            "Polling {} every {:?}",
            self.ctx.inbox.path().display(),
            self.interval
        );

        let mut detector = self;
        loop {
            let poll_cancel = cancel.clone();
            let (returned, result) = tokio::task::spawn_blocking(move || {
                let result = detector.poll(&poll_cancel);
                (detector, result)
            })
            .await?;
            detector = returned;

            match result {
                Ok(report) if !report.is_empty() => debug!(
                    "Poll processed {} file(s), {} moved",
                    report.outcomes.len(),
                    report.moved()
                ),
                Ok(_) => {}
                Err(e) => error!("Poll failed: {e}"),
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Polling watcher cancelled");
                    break;
                }
                _ = tokio::time::sleep(detector.interval) => {}
            }
        }
        Ok(())
    }
}

/// Names of regular files in `dir` that are transfer candidates.
fn list_candidates(dir: &Path) -> Result<HashSet<OsString>, DetectorError> {
    let entries = fs::read_dir(dir).map_err(|source| DetectorError::Scan {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = HashSet::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let name = entry.file_name();
        if !is_candidate_name(&name) {
            continue;
        }
        if fs::metadata(entry.path()).is_ok_and(|m| m.is_file()) {
            names.insert(name);
        }
    }
    Ok(names)
}
