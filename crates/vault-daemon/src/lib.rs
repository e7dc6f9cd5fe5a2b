//! vault-watcher: moves newly-arrived Inbox files into Needs_Action
//!
//! The daemon runs exactly one detection strategy (filesystem notifications
//! or directory polling); both hand each new file to the shared
//! [`vault_core::TransferProtocol`].

pub mod daemon;
