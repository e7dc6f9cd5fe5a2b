//! Configuration resolution
//!
//! Resolves configuration from multiple sources with priority:
//! 1. Command-line flags (passed as [`ConfigOverrides`])
//! 2. Environment variables (`VAULT_ROOT`, `VAULT_STRATEGY`, `VAULT_POLL_INTERVAL`)
//! 3. Vault-local config (`.vault.toml`, searched upward to the git root)
//! 4. Global config (`~/.config/vault/config.toml`)
//! 5. Defaults

mod discovery;
mod types;

pub use discovery::{ConfigError, ConfigOverrides, resolve_config};
pub use types::{ActivityLogConfig, Config, Strategy, VaultConfig, WatcherConfig};
