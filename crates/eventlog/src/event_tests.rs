// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

#[test]
fn serde_round_trip_with_all_fields() {
    let event = TaskEvent::new("evt-1", "bramble", "task-42", EventKind::DispatchStarted)
        .at(ts(1_700_000_000))
        .with_repo("misty-step/bitterblossom")
        .with_branch("sprite/bramble/issue-42")
        .with_issue(42)
        .with_reason("kickoff")
        .with_commits(3)
        .with_detail("probe_status", "success");
    let json = serde_json::to_string(&event).unwrap();
    let back: TaskEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn empty_optionals_are_omitted_from_json() {
    let event = TaskEvent::new("evt-1", "bramble", "task-42", EventKind::Heartbeat).at(ts(0));
    let json = serde_json::to_string(&event).unwrap();
    assert!(!json.contains("repo"));
    assert!(!json.contains("branch"));
    assert!(!json.contains("issue"));
    assert!(!json.contains("reason"));
    assert!(!json.contains("commits"));
    assert!(!json.contains("details"));
}

#[test]
fn unknown_kind_deserializes_to_other() {
    let json = r#"{"id":"e","sprite":"s","task_id":"t","kind":"teleported","timestamp":"2026-07-01T00:00:00Z"}"#;
    let event: TaskEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.kind, EventKind::Other);
}

#[yare::parameterized(
    dispatch_started = { EventKind::DispatchStarted, "dispatch_started" },
    repo_setup_started = { EventKind::RepoSetupStarted, "repo_setup_started" },
    agent_started = { EventKind::AgentStarted, "agent_started" },
    heartbeat = { EventKind::Heartbeat, "heartbeat" },
    blocked = { EventKind::Blocked, "blocked" },
    completed = { EventKind::Completed, "completed" },
    failed = { EventKind::Failed, "failed" },
)]
fn kind_wire_names(kind: EventKind, name: &str) {
    assert_eq!(kind.as_str(), name);
    assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{name}\""));
}

#[test]
fn missing_timestamp_sorts_as_epoch() {
    let event = TaskEvent::new("e", "s", "t", EventKind::Heartbeat);
    assert_eq!(event.effective_timestamp(), ts(0));
}
