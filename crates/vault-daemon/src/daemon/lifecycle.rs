//! Daemon lifecycle: validate directories, run one detector, stop on request

use crate::daemon::detector::{Detector, DetectorContext, DetectorError};
use crate::daemon::poller::PollingDetector;
use crate::daemon::watcher::EventDetector;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vault_core::config::{Config, Strategy};
use vault_core::intake::{DirectoryRole, WriteStabilityDetector};
use vault_core::{PathMissing, TransferObserver, TransferProtocol, WatchedDirectory};

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    PathMissing(#[from] PathMissing),

    #[error(transparent)]
    Detector(#[from] DetectorError),
}

/// One watcher over one vault. `start` is meant to be called once.
pub struct Daemon {
    config: Config,
    observer: Arc<dyn TransferObserver>,
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    done: watch::Sender<bool>,
}

/// Cloneable control surface for a [`Daemon`] running elsewhere.
#[derive(Clone)]
pub struct DaemonHandle {
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
    stop_timeout: Duration,
}

impl Daemon {
    pub fn new(config: Config, observer: Arc<dyn TransferObserver>) -> Self {
        let (done, _) = watch::channel(false);
        Self {
            config,
            observer,
            running: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            done,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            running: Arc::clone(&self.running),
            cancel: self.cancel.clone(),
            done: self.done.subscribe(),
            stop_timeout: self.config.watcher.shutdown_timeout() + Duration::from_secs(1),
        }
    }

    /// Validate the vault layout, then run the configured detector until
    /// [`DaemonHandle::stop`] is called.
    ///
    /// # Errors
    ///
    /// [`DaemonError::PathMissing`] if the vault root, Inbox or Needs_Action
    /// does not exist; nothing is watched in that case.
    pub async fn start(&self) -> Result<(), DaemonError> {
        let vault = WatchedDirectory::validate(DirectoryRole::VaultRoot, &self.config.vault.root)?;
        let inbox = WatchedDirectory::validate(DirectoryRole::Inbox, self.config.vault.inbox_dir())?;
        let needs_action = WatchedDirectory::validate(
            DirectoryRole::NeedsAction,
            self.config.vault.needs_action_dir(),
        )?;

        let watcher = &self.config.watcher;
        let rule = "=".repeat(60);
        info!("{rule}");
        info!("Vault intake watcher ({} strategy)", watcher.strategy);
        info!("Vault: {}", vault.path().display());
        info!("Watching: {}", inbox.path().display());
        info!("Destination: {}", needs_action.path().display());
        if watcher.strategy == Strategy::Polling {
            info!("Poll interval: {}s", watcher.poll_interval_secs);
        }
        info!("Press Ctrl+C to stop");
        info!("{rule}");

        let protocol = TransferProtocol::new(
            watcher.settle_delay(),
            WriteStabilityDetector::new(watcher.stability_window()),
        );
        let ctx = DetectorContext::new(inbox, needs_action, protocol, Arc::clone(&self.observer));

        let result = match watcher.strategy {
            Strategy::Event => {
                let detector = EventDetector::new(ctx, watcher.shutdown_timeout());
                self.run_detector(detector).await
            }
            Strategy::Polling => match PollingDetector::new(ctx, watcher.poll_interval()) {
                Ok(detector) => self.run_detector(detector).await,
                Err(e) => Err(e),
            },
        };
        self.done.send_replace(true);

        match &result {
            Ok(()) => info!("Watcher stopped"),
            Err(e) => error!("Watcher failed: {e}"),
        }
        result.map_err(DaemonError::from)
    }

    /// Running is reported only once the detector exists, so the polling
    /// snapshot is taken before anyone is told the daemon is up.
    async fn run_detector<D: Detector>(&self, detector: D) -> Result<(), DetectorError> {
        info!("Starting {} detector", detector.strategy());
        self.running.store(true, Ordering::SeqCst);
        let result = detector.run(self.cancel.clone()).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }
}

impl DaemonHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask the daemon to stop and wait (bounded) until it has.
    ///
    /// Returns `false` if the daemon was still running when the shutdown
    /// timeout elapsed.
    pub async fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.cancel.cancel();
        if !was_running {
            return true;
        }

        info!("Stopping watcher...");
        let mut done = self.done.clone();
        // A closed channel also ends the wait: the daemon itself is gone.
        let stopped = tokio::time::timeout(self.stop_timeout, done.wait_for(|stopped| *stopped))
            .await
            .is_ok();
        if !stopped {
            warn!("Watcher did not stop within {:?}", self.stop_timeout);
        }
        stopped
    }
}
