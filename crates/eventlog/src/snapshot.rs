// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Latest-state materialization over the raw event stream.

use crate::event::{EventKind, TaskEvent};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Derived task state. `Stale` overrides whatever the last event said once
/// the freshness age crosses the caller's threshold; the underlying kind is
/// intentionally lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    SettingUp,
    Running,
    Blocked,
    Completed,
    Failed,
    Unknown,
    Stale,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::SettingUp => "setting_up",
            TaskState::Running => "running",
            TaskState::Blocked => "blocked",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Unknown => "unknown",
            TaskState::Stale => "stale",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the most recent reachability probe overlaid on a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    #[default]
    Unknown,
    Success,
    Failed,
    Degraded,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Unknown => "unknown",
            ProbeStatus::Success => "success",
            ProbeStatus::Failed => "failed",
            ProbeStatus::Degraded => "degraded",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "success" => ProbeStatus::Success,
            "failed" => ProbeStatus::Failed,
            "degraded" => ProbeStatus::Degraded,
            _ => ProbeStatus::Unknown,
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Materialized latest state of one (sprite, task) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub sprite: String,
    pub task_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default)]
    pub issue: u64,
    pub state: TaskState,
    pub last_seen_at: DateTime<Utc>,
    /// Seconds since the last event.
    pub freshness_age_secs: i64,
    pub probe_status: ProbeStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub blocked_reason: String,
    pub event_count: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

fn state_for(kind: EventKind) -> TaskState {
    match kind {
        EventKind::DispatchStarted => TaskState::Pending,
        EventKind::RepoSetupStarted => TaskState::SettingUp,
        EventKind::AgentStarted | EventKind::Heartbeat => TaskState::Running,
        EventKind::Blocked => TaskState::Blocked,
        EventKind::Completed => TaskState::Completed,
        EventKind::Failed => TaskState::Failed,
        EventKind::Other => TaskState::Unknown,
    }
}

/// Group events by (sprite, task) and derive each group's snapshot.
///
/// The first event is the dispatch record: its repo/branch/issue carry
/// forward because later events may omit them. The last event determines the
/// state. Output is sorted by (sprite, task).
pub fn materialize(
    events: &[TaskEvent],
    now: DateTime<Utc>,
    stale_threshold: Duration,
) -> Vec<TaskSnapshot> {
    let mut groups: BTreeMap<(String, String), Vec<&TaskEvent>> = BTreeMap::new();
    for event in events {
        groups
            .entry((event.sprite.clone(), event.task_id.clone()))
            .or_default()
            .push(event);
    }

    let mut snapshots = Vec::with_capacity(groups.len());
    for ((sprite, task_id), mut group) in groups {
        group.sort_by_key(|e| e.effective_timestamp());
        let Some(first) = group.first() else { continue };
        let Some(last) = group.last() else { continue };

        let mut snapshot = TaskSnapshot {
            sprite,
            task_id,
            repo: first.repo.clone(),
            branch: first.branch.clone(),
            issue: first.issue,
            state: state_for(last.kind),
            last_seen_at: last.effective_timestamp(),
            freshness_age_secs: (now - last.effective_timestamp()).num_seconds(),
            probe_status: ProbeStatus::Unknown,
            error: String::new(),
            blocked_reason: String::new(),
            event_count: group.len(),
            started_at: first.effective_timestamp(),
            completed_at: None,
        };

        match last.kind {
            EventKind::Blocked => snapshot.blocked_reason = last.reason.clone(),
            EventKind::Completed => snapshot.completed_at = Some(last.effective_timestamp()),
            EventKind::Failed => snapshot.error = last.reason.clone(),
            _ => {}
        }

        // Probe overlays ride on synthetic heartbeats; the newest one wins.
        for event in &group {
            if let Some(status) = event.details.get("probe_status") {
                snapshot.probe_status = ProbeStatus::parse(status);
            }
        }

        if stale_threshold > Duration::zero()
            && now - snapshot.last_seen_at >= stale_threshold
        {
            snapshot.state = TaskState::Stale;
        }

        snapshots.push(snapshot);
    }
    snapshots
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
