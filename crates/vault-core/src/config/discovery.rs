//! Configuration discovery and resolution

use super::types::{Config, Strategy};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const LOCAL_CONFIG_NAME: &str = ".vault.toml";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parsing error in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Merged configuration does not deserialize or fails validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Command-line overrides for configuration
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Explicit config file; replaces global and vault-local discovery
    pub config_path: Option<PathBuf>,
    /// Override vault root
    pub vault_root: Option<PathBuf>,
    /// Override detection strategy
    pub strategy: Option<Strategy>,
    /// Override poll interval in seconds
    pub poll_interval_secs: Option<u64>,
}

/// Resolve configuration from all sources
///
/// Files are merged key by key, so a vault-local file that only sets
/// `[watcher] strategy` keeps the global file's other settings. A relative
/// `vault.root` in a file is taken relative to that file's directory;
/// relative roots from the environment or command line are taken relative
/// to `current_dir`.
pub fn resolve_config(
    overrides: &ConfigOverrides,
    current_dir: &Path,
    home_dir: &Path,
) -> Result<Config, ConfigError> {
    let mut merged = toml::Table::new();

    if let Some(path) = &overrides.config_path {
        // Explicit file: errors are fatal
        let table = load_table(path)?;
        merge_tables(&mut merged, table);
    } else {
        // 4. Global config
        let global_config_path = home_dir.join(".config/vault/config.toml");
        if global_config_path.exists() {
            match load_table(&global_config_path) {
                Ok(table) => merge_tables(&mut merged, table),
                Err(e) => warn!("Failed to parse global config: {e}"),
            }
        }

        // 3. Vault-local config (current dir or up to git root)
        if let Some(local_config) = find_local_config(current_dir) {
            match load_table(&local_config) {
                Ok(table) => merge_tables(&mut merged, table),
                Err(e) => warn!("Failed to parse vault config: {e}"),
            }
        }
    }

    let mut config: Config = toml::Value::Table(merged)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))?;

    // 2. Environment variables
    apply_env_overrides(&mut config);

    // 1. Command-line overrides
    apply_cli_overrides(&mut config, overrides);

    if config.vault.root.is_relative() {
        config.vault.root = current_dir.join(&config.vault.root);
    }

    validate(&config)?;
    Ok(config)
}

/// Find `.vault.toml`, searching the current directory and its parents up to
/// the git root.
fn find_local_config(current_dir: &Path) -> Option<PathBuf> {
    let mut dir = current_dir;

    loop {
        let config_path = dir.join(LOCAL_CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if dir.join(".git").exists() {
            break;
        }

        dir = dir.parent()?;
    }

    None
}

/// Load a TOML file as a table, anchoring a relative `vault.root` at the file's directory.
fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut table: toml::Table = toml::from_str(&contents).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    if let Some(toml::Value::Table(vault)) = table.get_mut("vault")
        && let Some(toml::Value::String(root)) = vault.get_mut("root")
        && Path::new(root.as_str()).is_relative()
    {
        *root = base.join(root.as_str()).to_string_lossy().into_owned();
    }

    debug!("Loaded config from {}", path.display());
    Ok(table)
}

/// Recursively merge `overlay` into `base`; overlay values win.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Apply environment variable overrides. Unparseable values are ignored with a warning.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(root) = std::env::var("VAULT_ROOT")
        && !root.trim().is_empty()
    {
        config.vault.root = PathBuf::from(root.trim());
    }

    if let Ok(strategy) = std::env::var("VAULT_STRATEGY") {
        match strategy.parse::<Strategy>() {
            Ok(s) => config.watcher.strategy = s,
            Err(e) => warn!("Ignoring VAULT_STRATEGY: {e}"),
        }
    }

    if let Ok(interval) = std::env::var("VAULT_POLL_INTERVAL") {
        match interval.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.watcher.poll_interval_secs = secs,
            _ => warn!(
                "Invalid VAULT_POLL_INTERVAL '{interval}', using {} seconds",
                config.watcher.poll_interval_secs
            ),
        }
    }
}

/// Apply command-line overrides
fn apply_cli_overrides(config: &mut Config, overrides: &ConfigOverrides) {
    if let Some(ref root) = overrides.vault_root {
        config.vault.root = root.clone();
    }

    if let Some(strategy) = overrides.strategy {
        config.watcher.strategy = strategy;
    }

    if let Some(secs) = overrides.poll_interval_secs {
        config.watcher.poll_interval_secs = secs;
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.watcher.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid(
            "watcher.poll_interval_secs must be at least 1".to_string(),
        ));
    }
    if config.watcher.stability_window_ms == 0 {
        return Err(ConfigError::Invalid(
            "watcher.stability_window_ms must be at least 1".to_string(),
        ));
    }
    Ok(())
}
