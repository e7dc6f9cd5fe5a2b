//! Signal handling and bounded draining of in-flight transfers

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// How draining in-flight transfers went
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub completed: usize,
    pub panicked: usize,
    pub abandoned: usize,
}

/// Wait for SIGINT (Ctrl-C) or, on unix, SIGTERM.
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                if let Err(e) = ctrl_c.await {
                    error!("Failed to listen for Ctrl-C: {e}");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        match ctrl_c.await {
            Ok(()) => info!("Received Ctrl-C"),
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    }
}

/// Await every transfer task, giving up after `limit`.
///
/// Blocking transfer tasks cannot be aborted; anything still running when the
/// limit elapses is counted as abandoned and left to finish on its own.
pub async fn drain_transfers(handles: Vec<JoinHandle<()>>, limit: Duration) -> DrainReport {
    let total = handles.len();
    if total == 0 {
        return DrainReport::default();
    }
    info!("Waiting for {total} in-flight transfer(s) (timeout: {limit:?})");

    let mut report = DrainReport::default();
    let drain = async {
        for handle in handles {
            match handle.await {
                Ok(()) => report.completed += 1,
                Err(e) => {
                    error!("Transfer task failed: {e}");
                    report.panicked += 1;
                }
            }
        }
    };

    let timed_out = timeout(limit, drain).await.is_err();
    if timed_out {
        report.abandoned = total - report.completed - report.panicked;
        warn!(
            "{} transfer(s) still running after {:?}, not waiting further",
            report.abandoned, limit
        );
    }
    report
}
