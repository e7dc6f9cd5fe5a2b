//! Write-completion heuristic based on two size samples

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Gap between the two size samples unless configured otherwise
pub const DEFAULT_STABILITY_WINDOW: Duration = Duration::from_millis(300);

/// Result of sampling a file's size twice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// Same size on both samples
    Stable { size: u64 },
    /// Size differed between samples; a writer is probably still active
    Changing { before: u64, after: u64 },
    /// The file was gone on one of the samples
    Vanished,
}

/// Samples a file's size, waits `window`, samples again.
///
/// This is a heuristic: a producer that writes in bursts further apart than
/// the window can still be observed as stable while incomplete.
#[derive(Debug, Clone, Copy)]
pub struct WriteStabilityDetector {
    window: Duration,
}

impl Default for WriteStabilityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_STABILITY_WINDOW)
    }
}

impl WriteStabilityDetector {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Take both samples. Blocks for the configured window.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error for failures other than not-found
    /// (e.g. permission denied on `stat`).
    pub fn sample(&self, path: &Path) -> io::Result<Stability> {
        let Some(before) = size_of(path)? else {
            return Ok(Stability::Vanished);
        };
        std::thread::sleep(self.window);
        let Some(after) = size_of(path)? else {
            return Ok(Stability::Vanished);
        };

        if before == after {
            Ok(Stability::Stable { size: after })
        } else {
            Ok(Stability::Changing { before, after })
        }
    }

    /// `true` if the size changed across the window.
    pub fn is_still_writing(&self, path: &Path) -> bool {
        matches!(self.sample(path), Ok(Stability::Changing { .. }))
    }
}

fn size_of(path: &Path) -> io::Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
