//! vault-watcher: moves new Inbox files into Needs_Action

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use vault_core::config::{ConfigOverrides, Strategy, resolve_config};
use vault_core::intake::{ObserverChain, TracingObserver};
use vault_core::logging::{LogSettings, Logging};
use vault_daemon::daemon::{self, ActivityLogObserver, Daemon};

/// Watch a vault's Inbox and move each new file into Needs_Action
#[derive(Parser, Debug)]
#[command(name = "vault-watcher")]
#[command(version)]
struct Args {
    /// Vault root containing Inbox/ and Needs_Action/
    #[arg(value_name = "VAULT")]
    vault: Option<PathBuf>,

    /// Seconds between polls (polling strategy)
    #[arg(value_name = "POLL_INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: Option<u64>,

    /// Detection strategy: event or polling
    #[arg(long, value_name = "STRATEGY")]
    strategy: Option<Strategy>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let home_dir =
        vault_core::home::get_home_dir().context("Failed to determine home directory")?;
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;

    let overrides = ConfigOverrides {
        config_path: args.config.clone(),
        vault_root: args.vault.clone(),
        strategy: args.strategy,
        poll_interval_secs: args.poll_interval,
    };
    let config = resolve_config(&overrides, &current_dir, &home_dir)
        .context("Failed to resolve configuration")?;

    // Only log to a file inside an existing vault; creating the file would
    // otherwise create the vault root itself.
    let root = &config.vault.root;
    let log_file = root
        .is_dir()
        .then(|| config.watcher.log_file_path(root))
        .flatten();
    let mut settings = LogSettings::from_env().with_file(log_file);
    if args.verbose {
        settings = settings.with_level(tracing::Level::DEBUG);
    }
    let _logging = Logging::init(settings);

    let mut observers = ObserverChain::new().with(TracingObserver);
    if config.activity_log.enabled {
        let logs_dir = config.vault.logs_dir();
        info!("Recording moves in {}", logs_dir.display());
        observers = observers.with(ActivityLogObserver::for_vault(&config.vault));
    }

    let watcher = Daemon::new(config, Arc::new(observers));
    let handle = watcher.handle();
    tokio::spawn(async move {
        daemon::wait_for_shutdown_signal().await;
        handle.stop().await;
    });

    watcher.start().await?;
    info!("Watcher stopped gracefully");
    Ok(())
}
