// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quick liveness report: latest event-log row merged with exec probes.
//!
//! This path is for fast interactive listings. It does not materialize the
//! full snapshot; the event row wins while fresh, otherwise the first
//! transport to answer is consulted and labelled as the source.

use crate::transport::FleetTransport;
use bb_eventlog::{EventKind, EventLog, EventLogError, TaskEvent};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Default freshness window for trusting the event log over a probe.
pub const DEFAULT_MAX_AGE_SECS: i64 = 20 * 60;

const LIVENESS_COMMAND: &str = "bb-agent status";
const LIVENESS_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Normalized liveness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessState {
    Completed,
    Blocked,
    Running,
    Idle,
    Unknown,
}

impl LivenessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivenessState::Completed => "completed",
            LivenessState::Blocked => "blocked",
            LivenessState::Running => "running",
            LivenessState::Idle => "idle",
            LivenessState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One sprite's row in the quick report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessRow {
    pub sprite: String,
    pub state: LivenessState,
    /// "event-log", or the label of the transport that answered.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

fn state_from_event(kind: EventKind) -> LivenessState {
    match kind {
        EventKind::Completed => LivenessState::Completed,
        EventKind::Blocked => LivenessState::Blocked,
        EventKind::DispatchStarted
        | EventKind::RepoSetupStarted
        | EventKind::AgentStarted
        | EventKind::Heartbeat => LivenessState::Running,
        EventKind::Failed | EventKind::Other => LivenessState::Unknown,
    }
}

/// Normalize free-form probe output to the report vocabulary.
fn normalize_probe_output(output: &str) -> LivenessState {
    let line = output.trim().to_ascii_lowercase();
    if line.contains("completed") || line.contains("done") {
        LivenessState::Completed
    } else if line.contains("blocked") {
        LivenessState::Blocked
    } else if line.contains("running") || line.contains("working") {
        LivenessState::Running
    } else if line.contains("idle") {
        LivenessState::Idle
    } else {
        LivenessState::Unknown
    }
}

/// Build the quick report for the given sprites.
///
/// `transports` is an ordered list of (label, transport) fallbacks, e.g.
/// `[("sprite-exec", ...), ("fly-ssh", ...)]`; the first one to answer for a
/// sprite labels that row's source. With a configured event log, a row whose
/// latest event is at most `max_age` old short-circuits the probes entirely.
pub async fn liveness_report(
    cancel: &CancellationToken,
    transports: &[(&str, &dyn FleetTransport)],
    event_log: Option<&EventLog>,
    sprites: &[String],
    max_age: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<LivenessRow>, EventLogError> {
    let latest = match event_log {
        Some(log) => log.latest_per_sprite()?,
        None => Default::default(),
    };

    let mut names: Vec<&String> = sprites.iter().collect();
    names.sort();
    names.dedup();

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        if let Some(event) = latest.get(name.as_str()) {
            let age = now - event.effective_timestamp();
            if age <= max_age {
                rows.push(row_from_event(name, event, age));
                continue;
            }
        }
        rows.push(probe_row(cancel, transports, name).await);
    }
    Ok(rows)
}

fn row_from_event(name: &str, event: &TaskEvent, age: Duration) -> LivenessRow {
    LivenessRow {
        sprite: name.to_string(),
        state: state_from_event(event.kind),
        source: "event-log".to_string(),
        age_secs: Some(age.num_seconds()),
        detail: event.reason.clone(),
    }
}

async fn probe_row(
    cancel: &CancellationToken,
    transports: &[(&str, &dyn FleetTransport)],
    name: &str,
) -> LivenessRow {
    for (label, transport) in transports {
        match transport.exec(cancel, name, LIVENESS_COMMAND, LIVENESS_TIMEOUT).await {
            Ok(output) => {
                return LivenessRow {
                    sprite: name.to_string(),
                    state: normalize_probe_output(&output),
                    source: (*label).to_string(),
                    age_secs: None,
                    detail: output.trim().to_string(),
                };
            }
            Err(e) => {
                tracing::debug!(sprite = name, transport = label, error = %e, "liveness probe failed");
            }
        }
    }
    LivenessRow {
        sprite: name.to_string(),
        state: LivenessState::Unknown,
        source: "unreachable".to_string(),
        age_secs: None,
        detail: String::new(),
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
