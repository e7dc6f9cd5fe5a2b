//! Exit-code contract of the vault-watcher binary

use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Keep config discovery inside the scratch directory.
fn isolate(cmd: &mut assert_cmd::Command, temp_dir: &TempDir) {
    cmd.current_dir(temp_dir.path())
        .env("VAULT_HOME", temp_dir.path())
        .env_remove("VAULT_ROOT")
        .env_remove("VAULT_STRATEGY")
        .env_remove("VAULT_POLL_INTERVAL");
}

#[test]
fn test_missing_inbox_exits_with_one() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(vault.join("Needs_Action")).unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("vault-watcher");
    isolate(&mut cmd, &temp_dir);
    cmd.arg(&vault)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Inbox folder not found"));

    assert!(!vault.join("Inbox").exists());
}

#[test]
fn test_missing_vault_exits_with_one_without_creating_it() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("absent");

    let mut cmd = cargo::cargo_bin_cmd!("vault-watcher");
    isolate(&mut cmd, &temp_dir);
    cmd.arg(&vault)
        .args(["--strategy", "polling"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Vault folder not found"));

    assert!(!vault.exists());
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(vault.join("Inbox")).unwrap();
    fs::create_dir_all(vault.join("Needs_Action")).unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("vault-watcher");
    isolate(&mut cmd, &temp_dir);
    cmd.arg(&vault).arg("0").assert().failure();

    assert!(!vault.join("filesystem_watcher.log").exists());
}
