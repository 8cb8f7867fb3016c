#![cfg(not(target_arch = "wasm32"))]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

// Usage Page (Generic Desktop) x2, Usage (Mouse), Collection (Application), End Collection.
const BLOATED: &[u8] = &[0x05, 0x01, 0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];
const TRIMMED: &[u8] = &[0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];

fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hid_descriptor"));
    cmd.env_remove("HID_DESCRIPTOR_MAX_STACK_DEPTH");
    cmd
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn items_lists_names_and_payloads() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "mouse.bin", BLOATED);

    cmd()
        .args(["items", path_arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Global 0x00 Usage Page (0x1)"))
        .stdout(predicate::str::contains("Local 0x00 Usage (0x2)"))
        .stdout(predicate::str::contains("Main 0x0c End Collection"));
}

#[test]
fn items_prints_prefix_before_truncation_error() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "truncated.bin", &[0x05, 0x01, 0x26, 0xff]);

    cmd()
        .args(["items", path_arg(&file)])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Usage Page"))
        .stderr(predicate::str::contains("ended inside item 1"));
}

#[test]
fn items_json_keeps_prefix_before_truncation_error() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "truncated.bin", &[0x05, 0x01, 0x26, 0xff]);

    let output = cmd()
        .args(["--json", "items", path_arg(&file)])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["bytes"], serde_json::json!([5, 1]));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ended inside item 1"));
}

#[test]
fn importance_flags_redundant_item() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "mouse.bin", BLOATED);

    cmd()
        .args(["importance", path_arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("0: 05 01 true\n"))
        .stdout(predicate::str::contains("1: 05 01 false (redundant)\n"))
        .stdout(predicate::str::contains("4: c0 true\n"));
}

#[test]
fn importance_json_is_machine_readable() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "mouse.bin", BLOATED);

    let output = cmd()
        .args(["--json", "importance", path_arg(&file)])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keep: Vec<bool> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["keep"].as_bool().unwrap())
        .collect();
    assert_eq!(keep, vec![true, false, true, true, true]);
}

#[test]
fn states_prints_table_per_main_item() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "mouse.bin", TRIMMED);

    cmd()
        .args(["states", path_arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2: a1 01 {Global 0x00 Usage Page: [01], Local 0x00 Usage: [02]}",
        ))
        .stdout(predicate::str::contains("3: c0 {Global 0x00 Usage Page: [01]}"));
}

#[test]
fn compare_accepts_trimmed_descriptor() {
    let dir = tempdir().unwrap();
    let left = write_fixture(&dir, "left.bin", BLOATED);
    let right = write_fixture(&dir, "right.bin", TRIMMED);

    cmd()
        .args(["compare", path_arg(&left), path_arg(&right)])
        .assert()
        .success()
        .stdout("Descriptors are equivalent\n");
}

#[test]
fn compare_reports_state_difference() {
    let dir = tempdir().unwrap();
    let left = write_fixture(&dir, "left.bin", TRIMMED);
    let right = write_fixture(
        &dir,
        "right.bin",
        &[0x05, 0x01, 0x09, 0x06, 0xa1, 0x01, 0xc0],
    );

    cmd()
        .args(["compare", path_arg(&left), path_arg(&right)])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("States differ at indices 2/2"))
        .stdout(predicate::str::contains("Local 0x00 (Usage): [02] vs [06]"));
}

#[test]
fn compare_reports_count_mismatch() {
    let dir = tempdir().unwrap();
    let left = write_fixture(&dir, "left.bin", TRIMMED);
    let right = write_fixture(&dir, "right.bin", &TRIMMED[..TRIMMED.len() - 1]);

    cmd()
        .args(["compare", path_arg(&left), path_arg(&right)])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Main item counts differ: 2 vs 1"));
}

#[test]
fn stack_underflow_is_an_error() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "pop.bin", &[0x05, 0x01, 0xb4]);

    cmd()
        .args(["importance", path_arg(&file)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Pop at item 1"));
}

#[test]
fn max_stack_depth_flag_limits_push() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "push.bin", &[0xa4, 0xa4, 0xb4, 0xb4]);

    cmd()
        .args(["states", path_arg(&file)])
        .assert()
        .success();

    cmd()
        .args(["--max-stack-depth", "2", "states", path_arg(&file)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("maximum stack depth of 2"));

    cmd()
        .env("HID_DESCRIPTOR_MAX_STACK_DEPTH", "2")
        .args(["states", path_arg(&file)])
        .assert()
        .code(2);
}

#[test]
fn invalid_depth_env_is_rejected() {
    let dir = tempdir().unwrap();
    let file = write_fixture(&dir, "mouse.bin", TRIMMED);

    cmd()
        .env("HID_DESCRIPTOR_MAX_STACK_DEPTH", "zero")
        .args(["states", path_arg(&file)])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("HID_DESCRIPTOR_MAX_STACK_DEPTH"));
}
