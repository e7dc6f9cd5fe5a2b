//! Canonical home directory resolution for vault tools
//!
//! The global config file lives at `<home>/.config/vault/config.toml`. Tests
//! and custom deployments point `VAULT_HOME` at a scratch directory instead of
//! touching the real home.
//!
//! # Precedence
//!
//! 1. `VAULT_HOME` environment variable (if set and non-empty)
//! 2. `dirs::home_dir()` platform default

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the home directory used for global vault configuration.
///
/// # Errors
///
/// Returns an error if `VAULT_HOME` is unset and the platform home directory
/// cannot be determined.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("VAULT_HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    dirs::home_dir().context("Could not determine home directory")
}

/// Directory holding the global `config.toml`.
pub fn global_config_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".config").join("vault"))
}
