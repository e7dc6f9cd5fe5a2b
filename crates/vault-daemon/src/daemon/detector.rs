//! The interface shared by both detection strategies

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use vault_core::config::Strategy;
use vault_core::{TransferObserver, TransferProtocol, WatchedDirectory};

/// Failures that stop a detector. Per-file problems never surface here.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Subscribing to filesystem notifications failed
    #[error("File system watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Listing the Inbox failed
    #[error("Failed to list {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A blocking poll task panicked or was cancelled
    #[error("Detector task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Everything a detector needs to hand files to the transfer protocol.
#[derive(Clone)]
pub struct DetectorContext {
    pub inbox: WatchedDirectory,
    pub needs_action: WatchedDirectory,
    pub protocol: TransferProtocol,
    pub observer: Arc<dyn TransferObserver>,
}

impl DetectorContext {
    pub fn new(
        inbox: WatchedDirectory,
        needs_action: WatchedDirectory,
        protocol: TransferProtocol,
        observer: Arc<dyn TransferObserver>,
    ) -> Self {
        Self {
            inbox,
            needs_action,
            protocol,
            observer,
        }
    }
}

/// A front-end that discovers new Inbox files and transfers them.
///
/// Lifecycle: construct → `run()` until the token is cancelled. `run`
/// returns only on cancellation or a detector-level failure.
pub trait Detector: Send {
    fn strategy(&self) -> Strategy;

    /// Long-running loop. Must respect cancellation.
    fn run(
        self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), DetectorError>> + Send
    where
        Self: Sized;
}
