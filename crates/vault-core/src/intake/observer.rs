//! Reporting seam for transfer outcomes

use crate::intake::transfer::TransferOutcome;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Receives every outcome a detector produces.
///
/// Detectors call this from whichever thread ran the transfer, so
/// implementations must be thread-safe.
pub trait TransferObserver: Send + Sync {
    fn on_outcome(&self, source: &Path, outcome: &TransferOutcome);
}

impl<T: TransferObserver + ?Sized> TransferObserver for Arc<T> {
    fn on_outcome(&self, source: &Path, outcome: &TransferOutcome) {
        (**self).on_outcome(source, outcome);
    }
}

/// Logs outcomes through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TransferObserver for TracingObserver {
    fn on_outcome(&self, source: &Path, outcome: &TransferOutcome) {
        let file = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());

        match outcome {
            TransferOutcome::Moved {
                source,
                destination,
            } => {
                info!(file = %source, destination = %destination, "Moved: {source} -> Needs_Action/{destination}");
            }
            TransferOutcome::StillWriting => {
                info!(file = %file, "File still being written, skipping for now");
            }
            TransferOutcome::VanishedBeforeProcessing => {
                warn!(file = %file, "File disappeared before processing");
            }
            TransferOutcome::PermissionDenied { detail } => {
                error!(file = %file, "Permission denied moving file: {detail}");
            }
            TransferOutcome::OsError { detail } => {
                error!(file = %file, "OS error moving file: {detail}");
            }
            TransferOutcome::RenameCollisionExhausted => {
                error!(file = %file, "Could not find a free name in Needs_Action");
            }
        }
    }
}

/// Forwards each outcome to several observers in order.
#[derive(Default, Clone)]
pub struct ObserverChain {
    observers: Vec<Arc<dyn TransferObserver>>,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl TransferObserver + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl TransferObserver for ObserverChain {
    fn on_outcome(&self, source: &Path, outcome: &TransferOutcome) {
        for observer in &self.observers {
            observer.on_outcome(source, outcome);
        }
    }
}
