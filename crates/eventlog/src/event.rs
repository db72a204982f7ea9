// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task events as they appear on the wire, one JSON object per line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What happened. Unknown kinds written by newer workers deserialize to
/// [`EventKind::Other`] instead of failing the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DispatchStarted,
    RepoSetupStarted,
    AgentStarted,
    Heartbeat,
    Blocked,
    Completed,
    Failed,
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DispatchStarted => "dispatch_started",
            EventKind::RepoSetupStarted => "repo_setup_started",
            EventKind::AgentStarted => "agent_started",
            EventKind::Heartbeat => "heartbeat",
            EventKind::Blocked => "blocked",
            EventKind::Completed => "completed",
            EventKind::Failed => "failed",
            EventKind::Other => "other",
        }
    }

    /// Forward-compatible parse: anything unrecognized is `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "dispatch_started" => EventKind::DispatchStarted,
            "repo_setup_started" => EventKind::RepoSetupStarted,
            "agent_started" => EventKind::AgentStarted,
            "heartbeat" => EventKind::Heartbeat,
            "blocked" => EventKind::Blocked,
            "completed" => EventKind::Completed,
            "failed" => EventKind::Failed,
            _ => EventKind::Other,
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventKind::parse(&s))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// One append-only task event. Never modified after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub id: String,
    pub sprite: String,
    pub task_id: String,
    pub kind: EventKind,
    /// Filled with now-UTC by the appender when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub issue: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub commits: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl TaskEvent {
    pub fn new(
        id: impl Into<String>,
        sprite: impl Into<String>,
        task_id: impl Into<String>,
        kind: EventKind,
    ) -> Self {
        Self {
            id: id.into(),
            sprite: sprite.into(),
            task_id: task_id.into(),
            kind,
            timestamp: None,
            repo: String::new(),
            branch: String::new(),
            issue: 0,
            reason: String::new(),
            commits: 0,
            details: BTreeMap::new(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_issue(mut self, issue: u64) -> Self {
        self.issue = issue;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_commits(mut self, commits: u64) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Timestamp for ordering; a (malformed) missing timestamp sorts first
    /// as the Unix epoch.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
