//! Inbox → Needs_Action transfer engine
//!
//! Detection strategies live in the daemon; everything they share is here:
//! the [`TransferProtocol`] that performs one move, its helpers
//! ([`namer`], [`stability`]), the [`InFlightSet`] that stops two transfers
//! of the same path from overlapping, and the [`TransferObserver`] seam
//! through which outcomes are reported.
//!
//! One detector instance per destination directory is a precondition:
//! collision resolution checks for a free name and then renames, which is
//! not atomic against a second process renaming into the same directory.

pub mod filter;
pub mod in_flight;
pub mod namer;
pub mod observer;
pub mod stability;
pub mod transfer;
pub mod watched;

pub use filter::{is_candidate_name, is_hidden_name};
pub use in_flight::{InFlightGuard, InFlightSet};
pub use namer::{CollisionExhausted, MAX_COLLISION_ATTEMPTS, unique_destination};
pub use observer::{ObserverChain, TracingObserver, TransferObserver};
pub use stability::{Stability, WriteStabilityDetector};
pub use transfer::{TransferOutcome, TransferProtocol};
pub use watched::{DirectoryRole, PathMissing, WatchedDirectory};
