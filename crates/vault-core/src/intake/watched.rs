//! Startup validation of the directories the daemon works on

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which directory a [`WatchedDirectory`] stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    VaultRoot,
    Inbox,
    NeedsAction,
}

impl fmt::Display for DirectoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VaultRoot => "Vault",
            Self::Inbox => "Inbox",
            Self::NeedsAction => "Needs_Action",
        })
    }
}

/// A required directory is absent. Fatal at startup.
#[derive(Debug, Error)]
#[error("{role} folder not found: {}", path.display())]
pub struct PathMissing {
    pub role: DirectoryRole,
    pub path: PathBuf,
}

/// An absolute path to a directory that existed when it was validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedDirectory {
    role: DirectoryRole,
    path: PathBuf,
}

impl WatchedDirectory {
    /// Resolve `path` to an absolute, canonical directory path.
    ///
    /// # Errors
    ///
    /// Returns [`PathMissing`] if the path does not exist or is not a directory.
    pub fn validate(role: DirectoryRole, path: impl AsRef<Path>) -> Result<Self, PathMissing> {
        let path = path.as_ref();
        match std::fs::canonicalize(path) {
            Ok(abs) if abs.is_dir() => Ok(Self { role, path: abs }),
            _ => Err(PathMissing {
                role,
                path: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            }),
        }
    }

    pub fn role(&self) -> DirectoryRole {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for WatchedDirectory {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
