// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary-level specs for the result envelope and exit-code contract.
//!
//! These run against state in a temp directory and never touch the platform
//! CLI: every exercised path fails or succeeds before a remote call.

use assert_cmd::Command;

fn bb_bin_path() -> std::path::PathBuf {
    // `bb` lives in a separate workspace member, so Cargo does not export
    // `CARGO_BIN_EXE_bb` for this package's test binary; fall back to it
    // when present (e.g. future single-package test setups) and otherwise
    // resolve the shared workspace target directory directly.
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_bb") {
        return std::path::PathBuf::from(path);
    }
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join(profile)
        .join("bb")
}

fn bb(state_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(bb_bin_path());
    cmd.env("BB_STATE_DIR", state_dir);
    cmd.env_remove("BB_LOG");
    cmd
}

#[test]
fn validation_error_exits_2_with_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let output = bb(dir.path())
        .args(["events", "list", "--limit=-1", "--json"])
        .assert()
        .failure()
        .code(2)
        .get_output()
        .clone();

    let envelope: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is an envelope");
    assert_eq!(envelope["version"], "v1");
    assert_eq!(envelope["command"], "events");
    assert_eq!(envelope["error"]["code"], "VALIDATION_ERROR");
    assert!(envelope["error"]["trace_id"].is_string());
}

#[test]
fn empty_fleet_dispatch_is_remote_state_error() {
    let dir = tempfile::tempdir().unwrap();
    // No registry: the candidate list is empty, so every dispatch is a
    // fleet-busy rejection before any remote call.
    let output = bb(dir.path())
        .args(["dispatch", "--issue", "1", "--repo", "misty-step/oakheart", "--json"])
        .assert()
        .failure()
        .code(5)
        .get_output()
        .clone();

    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["error"]["code"], "REMOTE_STATE_ERROR");
}

#[test]
fn tasks_on_empty_state_succeeds_with_data() {
    let dir = tempfile::tempdir().unwrap();
    let output = bb(dir.path())
        .args(["tasks", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();

    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["version"], "v1");
    assert_eq!(envelope["command"], "tasks");
    assert_eq!(envelope["data"], serde_json::json!([]));
    assert!(envelope.get("error").is_none());
}

#[test]
fn events_append_then_list_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    bb(dir.path())
        .args([
            "events",
            "append",
            "--sprite",
            "bramble",
            "--task",
            "issue-42",
            "--kind",
            "blocked",
            "--reason",
            "needs token",
            "--json",
        ])
        .assert()
        .success();

    let output = bb(dir.path())
        .args(["events", "list", "--sprite", "bramble", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["data"]["count"], 1);
    assert_eq!(envelope["data"]["events"][0]["kind"], "blocked");
    assert_eq!(envelope["data"]["events"][0]["reason"], "needs token");
}

#[test]
fn registry_show_on_empty_state_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = bb(dir.path())
        .args(["registry", "show", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["command"], "registry");
    assert!(envelope["data"]["sprites"].is_object());
}

#[test]
fn unreserving_an_unknown_sprite_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    bb(dir.path())
        .args(["registry", "unreserve", "holly", "--json"])
        .assert()
        .failure()
        .code(5);
}

#[test]
fn corrupt_registry_is_remote_state_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("registry.toml"), "not = [ valid").unwrap();
    let output = bb(dir.path())
        .args(["registry", "show", "--json"])
        .assert()
        .failure()
        .code(5)
        .get_output()
        .clone();
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["error"]["code"], "REMOTE_STATE_ERROR");
    assert!(envelope["error"]["remediation"].is_string());
}
