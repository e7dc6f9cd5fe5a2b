//! Core types and safe-mutation primitives for vault-intake
//!
//! This crate owns every on-disk side effect the vault performs:
//!
//! - [`intake`]: moving newly-arrived Inbox files into Needs_Action exactly
//!   once (stability check, collision-free naming, atomic rename)
//! - [`io`]: appending structured records to JSON-array log files so that a
//!   log is never observed truncated or malformed
//!
//! Configuration, home-directory resolution and logging setup shared by the
//! `vault-watcher` daemon and the `vault` CLI also live here.

pub mod config;
pub mod home;
pub mod intake;
pub mod io;
pub mod logging;

pub use intake::{
    InFlightGuard, InFlightSet, PathMissing, TransferObserver, TransferOutcome,
    TransferProtocol, WatchedDirectory,
};
pub use io::{AppendError, AppendReport, append_log_entry};
