//! Integration tests for the append command

use assert_cmd::cargo;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_log(path: &Path) -> Vec<Value> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_append_creates_log_and_parents() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("Logs").join("2026-02-18.json");

    let mut cmd = cargo::cargo_bin_cmd!("vault");
    cmd.arg("append")
        .arg(&log)
        .arg(r#"{"action":"file_moved","source":"Inbox/a.txt"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("(1 entries)"));

    let entries = read_log(&log);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "file_moved");
}

#[test]
fn test_append_preserves_order() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("log.json");

    for n in 1..=3 {
        let mut cmd = cargo::cargo_bin_cmd!("vault");
        cmd.arg("append")
            .arg(&log)
            .arg(format!(r#"{{"n":{n}}}"#))
            .assert()
            .success();
    }

    let ns: Vec<i64> = read_log(&log)
        .iter()
        .map(|e| e["n"].as_i64().unwrap())
        .collect();
    assert_eq!(ns, vec![1, 2, 3]);
    assert!(!temp_dir.path().join("log.json.tmp").exists());
}

#[test]
fn test_append_from_stdin_with_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("log.json");
    fs::write(&log, r#"[{"n":1}]"#).unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("vault");
    let output = cmd
        .arg("append")
        .arg(&log)
        .arg("-")
        .arg("--json")
        .write_stdin(r#"{"n":2}"#)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["totalEntries"], 2);
    assert_eq!(report["quarantined"], Value::Null);
}

#[test]
fn test_invalid_entry_fails_without_touching_log() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("log.json");
    fs::write(&log, r#"[{"n":1}]"#).unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("vault");
    cmd.arg("append")
        .arg(&log)
        .arg("{not json")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Entry is not valid JSON"));

    assert_eq!(fs::read_to_string(&log).unwrap(), r#"[{"n":1}]"#);
}

#[test]
fn test_corrupted_log_is_quarantined() {
    let temp_dir = TempDir::new().unwrap();
    let log = temp_dir.path().join("log.json");
    fs::write(&log, "[{\"n\":1},").unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("vault");
    cmd.arg("append")
        .arg(&log)
        .arg(r#"{"n":2}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("was corrupted"));

    assert_eq!(read_log(&log).len(), 1);
    let quarantined = fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".corrupted."))
        .count();
    assert_eq!(quarantined, 1);
}

#[test]
fn test_log_path_is_directory_fails() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = cargo::cargo_bin_cmd!("vault");
    cmd.arg("append")
        .arg(temp_dir.path())
        .arg(r#"{"n":1}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to append"));
}
