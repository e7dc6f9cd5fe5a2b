//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Parser, Subcommand};

mod append;
mod config_cmd;

/// vault - tools for a file-based vault
#[derive(Parser, Debug)]
#[command(
    name = "vault",
    version,
    about = "Tools for a file-based vault",
    long_about = "Crash-safe JSON log appends and configuration inspection for vault-watcher"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a JSON entry to a JSON-array log file
    Append(append::AppendArgs),

    /// Show the resolved configuration
    Config(config_cmd::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Append(args) => append::execute(args),
            Commands::Config(args) => config_cmd::execute(args),
        }
    }
}
