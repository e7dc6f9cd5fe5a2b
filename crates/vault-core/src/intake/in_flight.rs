//! Membership set of paths currently undergoing a transfer

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared set of in-flight transfer keys.
///
/// Cloning is cheap and yields a handle to the same set. A key is held from
/// [`try_acquire`](Self::try_acquire) until the returned guard is dropped, so
/// release happens on every exit path of a transfer, including unwinding.
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    inner: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-set: returns a guard if `key` was not already in flight,
    /// `None` if another transfer holds it.
    pub fn try_acquire(&self, key: impl Into<PathBuf>) -> Option<InFlightGuard> {
        let key = key.into();
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            set: self.clone(),
            key,
        })
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Entries are only ever inserted/removed whole, so a poisoned set is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds one key in an [`InFlightSet`]; releases it on drop.
#[must_use = "the key is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct InFlightGuard {
    set: InFlightSet,
    key: PathBuf,
}

impl InFlightGuard {
    pub fn key(&self) -> &Path {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.key);
    }
}
