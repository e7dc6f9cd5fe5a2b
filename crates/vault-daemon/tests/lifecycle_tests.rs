//! Daemon lifecycle: startup validation, both strategies end to end, stop.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::{Duration, Instant, sleep};
use vault_core::config::{Config, Strategy};
use vault_core::intake::{DirectoryRole, TracingObserver};
use vault_daemon::daemon::{Daemon, DaemonError};

fn vault(temp_dir: &TempDir) -> &Path {
    fs::create_dir_all(temp_dir.path().join("Inbox")).unwrap();
    fs::create_dir_all(temp_dir.path().join("Needs_Action")).unwrap();
    temp_dir.path()
}

fn fast_config(root: &Path, strategy: Strategy) -> Config {
    let mut config = Config::default();
    config.vault.root = root.to_path_buf();
    config.watcher.strategy = strategy;
    config.watcher.poll_interval_secs = 1;
    config.watcher.settle_delay_ms = 20;
    config.watcher.stability_window_ms = 20;
    config.watcher.shutdown_timeout_secs = 2;
    config
}

async fn wait_for(path: &Path, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    path.exists()
}

#[tokio::test]
async fn test_start_fails_when_inbox_missing() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("Needs_Action")).unwrap();
    let daemon = Daemon::new(
        fast_config(temp_dir.path(), Strategy::Polling),
        Arc::new(TracingObserver),
    );

    let result = daemon.start().await;

    match result {
        Err(DaemonError::PathMissing(missing)) => {
            assert_eq!(missing.role, DirectoryRole::Inbox);
            assert!(missing.to_string().starts_with("Inbox folder not found"));
        }
        other => panic!("expected PathMissing, got {other:?}"),
    }
    assert!(!daemon.is_running());
}

#[tokio::test]
async fn test_start_fails_when_vault_missing() {
    let temp_dir = TempDir::new().unwrap();
    let daemon = Daemon::new(
        fast_config(&temp_dir.path().join("nope"), Strategy::Event),
        Arc::new(TracingObserver),
    );

    let result = daemon.start().await;

    assert!(matches!(
        result,
        Err(DaemonError::PathMissing(ref m)) if m.role == DirectoryRole::VaultRoot
    ));
}

#[tokio::test]
async fn test_stop_before_start_returns_immediately() {
    let daemon = Daemon::new(Config::default(), Arc::new(TracingObserver));
    let handle = daemon.handle();

    assert!(handle.stop().await);
    assert!(!handle.is_running());
    assert!(handle.cancel_token().is_cancelled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_polling_daemon_moves_new_files_only() {
    let temp_dir = TempDir::new().unwrap();
    let root = vault(&temp_dir);
    fs::write(root.join("Inbox/existing.txt"), "old").unwrap();

    let daemon = Arc::new(Daemon::new(
        fast_config(root, Strategy::Polling),
        Arc::new(TracingObserver),
    ));
    let handle = daemon.handle();
    let runner = Arc::clone(&daemon);
    let task = tokio::spawn(async move { runner.start().await });

    let deadline = Instant::now() + Duration::from_secs(2);
    while !handle.is_running() && Instant::now() < deadline {
        sleep(Duration::from_millis(10)).await;
    }
    assert!(handle.is_running());

    fs::write(root.join("Inbox/new.txt"), "new").unwrap();
    assert!(wait_for(&root.join("Needs_Action/new.txt"), Duration::from_secs(5)).await);

    assert!(handle.stop().await);
    assert!(task.await.unwrap().is_ok());
    assert!(!daemon.is_running());
    assert!(root.join("Inbox/existing.txt").exists());
    assert!(!root.join("Needs_Action/existing.txt").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_event_daemon_moves_arriving_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = vault(&temp_dir);

    let daemon = Arc::new(Daemon::new(
        fast_config(root, Strategy::Event),
        Arc::new(TracingObserver),
    ));
    let handle = daemon.handle();
    let runner = Arc::clone(&daemon);
    let task = tokio::spawn(async move { runner.start().await });

    let deadline = Instant::now() + Duration::from_secs(2);
    while !handle.is_running() && Instant::now() < deadline {
        sleep(Duration::from_millis(10)).await;
    }
    // Give the watcher time to subscribe
    sleep(Duration::from_millis(300)).await;

    fs::write(root.join("Inbox/report.pdf"), "pdf").unwrap();
    assert!(wait_for(&root.join("Needs_Action/report.pdf"), Duration::from_secs(5)).await);
    assert!(!root.join("Inbox/report.pdf").exists());

    assert!(handle.stop().await);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_event_daemon_ignores_hidden_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = vault(&temp_dir);

    let daemon = Arc::new(Daemon::new(
        fast_config(root, Strategy::Event),
        Arc::new(TracingObserver),
    ));
    let handle = daemon.handle();
    let runner = Arc::clone(&daemon);
    let task = tokio::spawn(async move { runner.start().await });
    sleep(Duration::from_millis(300)).await;

    fs::write(root.join("Inbox/.DS_Store"), "x").unwrap();
    fs::write(root.join("Inbox/visible.txt"), "x").unwrap();
    assert!(wait_for(&root.join("Needs_Action/visible.txt"), Duration::from_secs(5)).await);

    assert!(root.join("Inbox/.DS_Store").exists());
    assert!(handle.stop().await);
    assert!(task.await.unwrap().is_ok());
}
