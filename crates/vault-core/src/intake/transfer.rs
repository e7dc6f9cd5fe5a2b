//! One Inbox → Needs_Action move

use crate::intake::namer::unique_destination;
use crate::intake::stability::{Stability, WriteStabilityDetector};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default pause before sampling a newly detected file
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Result of one [`TransferProtocol::transfer`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Renamed into the destination directory
    Moved { source: String, destination: String },
    /// Size changed between samples; the caller decides whether to retry
    StillWriting,
    /// The source disappeared before it could be moved
    VanishedBeforeProcessing,
    /// The OS refused access to the source or destination
    PermissionDenied { detail: String },
    /// Any other OS-level failure
    OsError { detail: String },
    /// No free `<stem>_<n><suffix>` name within the attempt limit
    RenameCollisionExhausted,
}

impl TransferOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    /// Short stable label for logs and activity records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Moved { .. } => "moved",
            Self::StillWriting => "still_writing",
            Self::VanishedBeforeProcessing => "vanished",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::OsError { .. } => "os_error",
            Self::RenameCollisionExhausted => "collision_exhausted",
        }
    }

    fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::VanishedBeforeProcessing,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                detail: err.to_string(),
            },
            _ => Self::OsError {
                detail: err.to_string(),
            },
        }
    }
}

/// The move algorithm shared by every detection strategy.
///
/// Steps: existence check → settle delay → stability sample → destination
/// resolution (collision-free) → single `rename`. No retries happen here;
/// retry policy belongs to the caller. The rename is atomic only when Inbox
/// and Needs_Action are on the same volume.
#[derive(Debug, Clone)]
pub struct TransferProtocol {
    settle_delay: Duration,
    stability: WriteStabilityDetector,
}

impl Default for TransferProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY, WriteStabilityDetector::default())
    }
}

impl TransferProtocol {
    pub fn new(settle_delay: Duration, stability: WriteStabilityDetector) -> Self {
        Self {
            settle_delay,
            stability,
        }
    }

    /// Move `source` into `destination_dir`. Blocks for the settle delay plus
    /// the stability window.
    pub fn transfer(&self, source: &Path, destination_dir: &Path) -> TransferOutcome {
        if fs::symlink_metadata(source).is_err() {
            return TransferOutcome::VanishedBeforeProcessing;
        }

        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }

        match self.stability.sample(source) {
            Ok(Stability::Stable { size }) => {
                debug!(file = %source.display(), size, "File size stable");
            }
            Ok(Stability::Changing { before, after }) => {
                debug!(file = %source.display(), before, after, "File size changed between samples");
                return TransferOutcome::StillWriting;
            }
            Ok(Stability::Vanished) => return TransferOutcome::VanishedBeforeProcessing,
            Err(e) => return TransferOutcome::from_io(&e),
        }

        let Some(name) = source.file_name() else {
            return TransferOutcome::OsError {
                detail: format!("{} has no file name", source.display()),
            };
        };

        let desired = destination_dir.join(name);
        let destination = match unique_destination(&desired) {
            Ok(path) => path,
            Err(e) => {
                debug!("{e}");
                return TransferOutcome::RenameCollisionExhausted;
            }
        };
        if destination != desired {
            warn!(
                file = %name.to_string_lossy(),
                destination = %destination.display(),
                "File exists, using unique name"
            );
        }

        match fs::rename(source, &destination) {
            Ok(()) => TransferOutcome::Moved {
                source: name.to_string_lossy().into_owned(),
                destination: destination
                    .file_name()
                    .unwrap_or(name)
                    .to_string_lossy()
                    .into_owned(),
            },
            // Source still there: the destination side is what went missing.
            Err(e) if e.kind() == io::ErrorKind::NotFound && fs::symlink_metadata(source).is_ok() => {
                TransferOutcome::OsError {
                    detail: e.to_string(),
                }
            }
            Err(e) => TransferOutcome::from_io(&e),
        }
    }
}
