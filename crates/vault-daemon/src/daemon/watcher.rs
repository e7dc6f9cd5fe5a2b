//! Event strategy: react to filesystem notifications on the Inbox
//!
//! A file found still being written stays eligible for retry: any later
//! modify or close-after-write notification for it triggers another
//! attempt, including one that arrives while an attempt is sampling. A
//! writer that falls silent without a further notification is not retried.
//! Paths that leave the Inbox (deleted or renamed out) are forgotten.

use crate::daemon::detector::{Detector, DetectorContext, DetectorError};
use crate::daemon::shutdown::drain_transfers;
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vault_core::config::Strategy;
use vault_core::intake::is_candidate_name;
use vault_core::{InFlightSet, TransferOutcome};

/// What a notification means for a path in the Inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A new entry appeared (created or renamed in)
    Arrival,
    /// A rename whose direction the backend could not tell us
    AmbiguousRename,
    /// Content changed or a writer closed the file
    Modified,
}

fn classify(kind: &EventKind) -> Option<Trigger> {
    match kind {
        EventKind::Create(CreateKind::Folder) => None,
        EventKind::Create(_) => Some(Trigger::Arrival),
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both)) => {
            Some(Trigger::Arrival)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Other)) => {
            Some(Trigger::AmbiguousRename)
        }
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
        | EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(Trigger::Modified),
        _ => None,
    }
}

/// Turn one notification into the Inbox paths that should be transferred.
///
/// Arrivals always qualify. Modifications qualify only for paths that an
/// earlier attempt found still being written (`is_deferred`), which is how
/// a file skipped as `StillWriting` gets retried.
fn parse_event(inbox: &Path, event: &Event, is_deferred: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let Some(trigger) = classify(&event.kind) else {
        return Vec::new();
    };

    // A two-path rename lists [from, to]; only the destination is an arrival.
    let paths: &[PathBuf] = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().map(std::slice::from_ref).unwrap_or_default()
        }
        _ => &event.paths,
    };

    paths
        .iter()
        .filter(|path| path.parent() == Some(inbox))
        .filter(|path| path.file_name().is_some_and(is_candidate_name))
        .filter(|path| match trigger {
            Trigger::Arrival => true,
            Trigger::AmbiguousRename => path.symlink_metadata().is_ok(),
            Trigger::Modified => is_deferred(path.as_path()),
        })
        .cloned()
        .collect()
}

/// Inbox paths this notification reports as gone (deleted or renamed out).
fn parse_departures(inbox: &Path, event: &Event) -> Vec<PathBuf> {
    let (paths, must_be_gone): (&[PathBuf], bool) = match event.kind {
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            (event.paths.as_slice(), false)
        }
        // [from, to]: the source side left its directory
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => (
            event.paths.first().map(std::slice::from_ref).unwrap_or_default(),
            false,
        ),
        EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Other)) => {
            (event.paths.as_slice(), true)
        }
        _ => return Vec::new(),
    };

    paths
        .iter()
        .filter(|path| path.parent() == Some(inbox))
        .filter(|path| !must_be_gone || path.symlink_metadata().is_err())
        .cloned()
        .collect()
}

/// Per-path retry bookkeeping, shared by all transfer tasks.
#[derive(Debug, Default)]
struct RetryState {
    /// Paths being sampled or found still being written; a modify
    /// notification for one of them triggers an attempt
    deferred: HashSet<PathBuf>,
    /// Paths notified while their own transfer was running
    rearmed: HashSet<PathBuf>,
}

/// Per-path work shared by every transfer task the watcher spawns.
#[derive(Clone)]
struct ArrivalHandler {
    ctx: DetectorContext,
    in_flight: InFlightSet,
    retry: Arc<Mutex<RetryState>>,
}

impl ArrivalHandler {
    fn retry_state(&self) -> MutexGuard<'_, RetryState> {
        self.retry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_deferred(&self, path: &Path) -> bool {
        self.retry_state().deferred.contains(path)
    }

    fn forget(&self, path: &Path) -> bool {
        let mut state = self.retry_state();
        state.rearmed.remove(path);
        state.deferred.remove(path)
    }

    fn handle(&self, path: &Path) -> Option<TransferOutcome> {
        let Some(_guard) = self.in_flight.try_acquire(path) else {
            debug!("Already processing {}", path.display());
            self.retry_state().rearmed.insert(path.to_path_buf());
            return None;
        };

        if fs::symlink_metadata(path).is_ok_and(|m| m.is_dir()) {
            return None;
        }

        let name = path.file_name().unwrap_or_default().to_string_lossy();
        info!("New file detected: {name}");

        loop {
            {
                let mut state = self.retry_state();
                state.deferred.insert(path.to_path_buf());
                state.rearmed.remove(path);
            }

            let outcome = self
                .ctx
                .protocol
                .transfer(path, self.ctx.needs_action.path());

            {
                let mut state = self.retry_state();
                if outcome == TransferOutcome::StillWriting {
                    if state.rearmed.remove(path) {
                        debug!("{name} changed again while sampling, retrying");
                        continue;
                    }
                } else {
                    state.deferred.remove(path);
                }
            }

            self.ctx.observer.on_outcome(path, &outcome);
            return Some(outcome);
        }
    }
}

/// Watches the Inbox (non-recursively) and transfers each arriving file on a
/// blocking worker, so one slow file never delays the next notification.
pub struct EventDetector {
    handler: ArrivalHandler,
    shutdown_timeout: Duration,
}

impl EventDetector {
    pub fn new(ctx: DetectorContext, shutdown_timeout: Duration) -> Self {
        Self {
            handler: ArrivalHandler {
                ctx,
                in_flight: InFlightSet::new(),
                retry: Arc::default(),
            },
            shutdown_timeout,
        }
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.handler.in_flight
    }

    /// Paths skipped as still-being-written, awaiting a modify notification
    pub fn deferred_count(&self) -> usize {
        self.handler.retry_state().deferred.len()
    }

    /// Drop retry bookkeeping for Inbox paths this notification reports as
    /// gone. Returns how many deferred paths were forgotten.
    pub fn forget_departures(&self, event: &Event) -> usize {
        parse_departures(self.handler.ctx.inbox.path(), event)
            .iter()
            .filter(|path| self.handler.forget(path))
            .count()
    }

    /// Inbox paths this notification asks us to transfer
    pub fn triggers(&self, event: &Event) -> Vec<PathBuf> {
        parse_event(self.handler.ctx.inbox.path(), event, |p| {
            self.handler.is_deferred(p)
        })
    }

    /// Transfer one arrived path. Blocking.
    ///
    /// Returns `None` without touching the file when a transfer of the same
    /// path is already running.
    pub fn handle_arrival(&self, path: &Path) -> Option<TransferOutcome> {
        self.handler.handle(path)
    }
}

impl Detector for EventDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Event
    }

    async fn run(self, cancel: CancellationToken) -> Result<(), DetectorError> {
        let inbox = self.handler.ctx.inbox.path().to_path_buf();
        info!("Starting event watcher for: {}", inbox.display());

        let (tx, rx) = channel();
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Err(e) = tx.send(event) {
                        error!("Failed to forward file system event: {e}");
                    }
                }
                Err(e) => error!("File system watcher error: {e}"),
            })?;
        watcher.watch(&inbox, RecursiveMode::NonRecursive)?;
        info!("Watching {} for changes", inbox.display());

        let runtime = tokio::runtime::Handle::current();
        let detector = Arc::new(self);
        let loop_detector = Arc::clone(&detector);
        let loop_cancel = cancel.clone();
        let transfers = tokio::task::spawn_blocking(move || {
            let mut transfers: Vec<JoinHandle<()>> = Vec::new();
            loop {
                if loop_cancel.is_cancelled() {
                    info!("Event watcher cancelled");
                    break;
                }

                match rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => {
                        debug!("File system event: {event:?}");
                        loop_detector.forget_departures(&event);
                        for path in loop_detector.triggers(&event) {
                            let handler = loop_detector.handler.clone();
                            transfers.push(runtime.spawn_blocking(move || {
                                handler.handle(&path);
                            }));
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => {
                        warn!("Watcher channel disconnected");
                        break;
                    }
                }
                transfers.retain(|t| !t.is_finished());
            }
            transfers
        })
        .await?;

        // Unsubscribe before draining so no new work arrives.
        drop(watcher);
        drain_transfers(transfers, detector.shutdown_timeout).await;
        Ok(())
    }
}
