// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event log specs: state derivation, staleness override, and append
//! monotonicity through the on-disk store.

use bb_eventlog::{EventKind, EventLog, EventQuery, TaskEvent, TaskState};
use chrono::{Duration, TimeZone, Utc};

fn ts(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

fn seed_blocked_task(log: &EventLog, t0: i64) {
    log.append(
        TaskEvent::new("e1", "bramble", "task-42", EventKind::DispatchStarted)
            .at(ts(t0))
            .with_repo("misty-step/bitterblossom")
            .with_issue(42),
    )
    .unwrap();
    log.append(
        TaskEvent::new("e2", "bramble", "task-42", EventKind::AgentStarted).at(ts(t0 + 60)),
    )
    .unwrap();
    log.append(
        TaskEvent::new("e3", "bramble", "task-42", EventKind::Heartbeat)
            .at(ts(t0 + 120))
            .with_commits(3),
    )
    .unwrap();
    log.append(
        TaskEvent::new("e4", "bramble", "task-42", EventKind::Blocked)
            .at(ts(t0 + 180))
            .with_reason("needs token"),
    )
    .unwrap();
}

#[test]
fn snapshot_derives_blocked_state_with_dispatch_fields() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path().join("events"));
    let t0 = 1_700_000_000;
    seed_blocked_task(&log, t0);

    let snapshots = log.snapshot(ts(t0 + 200), Duration::zero()).unwrap();
    assert_eq!(snapshots.len(), 1);
    let s = &snapshots[0];
    assert_eq!(s.state, TaskState::Blocked);
    assert_eq!(s.blocked_reason, "needs token");
    assert_eq!(s.repo, "misty-step/bitterblossom");
    assert_eq!(s.issue, 42);
    assert_eq!(s.started_at, ts(t0));
    assert_eq!(s.last_seen_at, ts(t0 + 180));
    assert_eq!(s.event_count, 4);
}

#[test]
fn staleness_overrides_state_but_keeps_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path().join("events"));
    let t0 = 1_700_000_000;
    seed_blocked_task(&log, t0);

    // Last event is three hours old against a one-hour threshold.
    let now = ts(t0 + 180 + 3 * 3600);
    let snapshots = log.snapshot(now, Duration::hours(1)).unwrap();
    let s = &snapshots[0];
    assert_eq!(s.state, TaskState::Stale);
    assert_eq!(s.blocked_reason, "needs token");
    assert_eq!(s.last_seen_at, ts(t0 + 180));
}

#[test]
fn append_is_monotonic_for_a_task() {
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new(dir.path().join("events"));
    log.append(
        TaskEvent::new("e1", "bramble", "task-1", EventKind::AgentStarted)
            .at(ts(1_700_000_000)),
    )
    .unwrap();

    let before = log.query(&EventQuery::default()).unwrap();
    let prev_max = before.iter().map(TaskEvent::effective_timestamp).max().unwrap();

    let event =
        TaskEvent::new("e2", "bramble", "task-1", EventKind::Heartbeat).at(ts(1_700_000_060));
    log.append(event.clone()).unwrap();

    let after = log.query(&EventQuery::default()).unwrap();
    let occurrences = after.iter().filter(|e| e.id == "e2").count();
    assert_eq!(occurrences, 1);
    let appended = after.iter().find(|e| e.id == "e2").unwrap();
    assert!(appended.effective_timestamp() >= prev_max);
}
