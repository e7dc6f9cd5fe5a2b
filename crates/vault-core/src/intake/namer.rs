//! Collision-free destination names: `<stem>_<n><suffix>`

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on `_<n>` candidates tried before giving up
pub const MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// Every candidate name up to the attempt limit was taken
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Could not generate unique filename for {} after {attempts} attempts", desired.display())]
pub struct CollisionExhausted {
    pub desired: PathBuf,
    pub attempts: u32,
}

/// Return `desired` if nothing occupies it, otherwise the first free
/// `<stem>_1<suffix>`, `<stem>_2<suffix>`, ... beside it.
///
/// The check is made at call time only; the caller must be the sole writer
/// into the destination directory for the result to stay free.
pub fn unique_destination(desired: &Path) -> Result<PathBuf, CollisionExhausted> {
    unique_destination_within(desired, MAX_COLLISION_ATTEMPTS)
}

fn unique_destination_within(desired: &Path, max_attempts: u32) -> Result<PathBuf, CollisionExhausted> {
    if !occupied(desired) {
        return Ok(desired.to_path_buf());
    }

    let parent = desired.parent().unwrap_or_else(|| Path::new(""));
    let stem = desired.file_stem().unwrap_or_default();
    let extension = desired.extension();

    for counter in 1..=max_attempts {
        let mut name = OsString::from(stem);
        name.push(format!("_{counter}"));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        let candidate = parent.join(name);
        if !occupied(&candidate) {
            return Ok(candidate);
        }
    }

    Err(CollisionExhausted {
        desired: desired.to_path_buf(),
        attempts: max_attempts,
    })
}

/// Dangling symlinks count as occupied so a rename never clobbers them.
fn occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
