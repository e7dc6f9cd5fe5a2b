//! Append command implementation

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Value, json};
use std::io::Read;
use std::path::PathBuf;
use vault_core::append_log_entry;

/// Append one entry to a log
#[derive(Args, Debug)]
pub struct AppendArgs {
    /// Log file holding a JSON array; created (with parent directories) if missing
    #[arg(value_name = "LOG_FILE")]
    log_file: PathBuf,

    /// JSON value to append, or `-` to read it from stdin
    #[arg(value_name = "ENTRY")]
    entry: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the append command
pub fn execute(args: AppendArgs) -> Result<()> {
    let raw = if args.entry == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read entry from stdin")?;
        buf
    } else {
        args.entry
    };

    // Reject bad input before the log is touched
    let entry: Value = serde_json::from_str(&raw).context("Entry is not valid JSON")?;

    let report = append_log_entry(&args.log_file, &entry)
        .with_context(|| format!("Failed to append to {}", args.log_file.display()))?;

    if let Some(quarantined) = &report.quarantined {
        eprintln!(
            "Warning: {} was corrupted; moved aside to {}",
            args.log_file.display(),
            quarantined.display()
        );
    }

    if args.json {
        let output = json!({
            "log": args.log_file.display().to_string(),
            "totalEntries": report.total_entries,
            "quarantined": report.quarantined.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "Appended to {} ({} entries)",
            args.log_file.display(),
            report.total_entries
        );
    }
    Ok(())
}
