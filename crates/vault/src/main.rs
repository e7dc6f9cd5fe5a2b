//! vault - tools for a file-based vault
//!
//! Appends records to JSON-array logs with the same crash-safe protocol the
//! watcher uses, and shows the configuration the watcher would run with.

use clap::Parser;

mod commands;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
