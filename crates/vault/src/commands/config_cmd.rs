//! Config command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use vault_core::config::{ConfigOverrides, Strategy, resolve_config};
use vault_core::home::{get_home_dir, global_config_dir};

/// Show effective configuration
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Vault root to resolve against
    #[arg(long, value_name = "PATH")]
    vault: Option<PathBuf>,

    /// Explicit configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the detection strategy
    #[arg(long, value_name = "STRATEGY")]
    strategy: Option<Strategy>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let home_dir = get_home_dir()?;
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;

    let overrides = ConfigOverrides {
        config_path: args.config.clone(),
        vault_root: args.vault,
        strategy: args.strategy,
        ..Default::default()
    };
    let config = resolve_config(&overrides, &current_dir, &home_dir)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    match &args.config {
        Some(path) => println!("# config file: {}", path.display()),
        None => {
            let global = global_config_dir()?.join("config.toml");
            let state = if global.exists() { "found" } else { "not found" };
            println!("# global config: {} ({state})", global.display());
        }
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
