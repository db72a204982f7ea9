// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort liveness snapshot returned by a status probe.

use serde::{Deserialize, Serialize};

/// Result of probing one sprite. All fields are free-form strings reported by
/// the remote side; empty means "not reported".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub blocked_reason: String,
}

impl LiveStatus {
    /// Whether this status makes the sprite ineligible for dispatch.
    pub fn is_busy(&self) -> bool {
        is_busy_state(&self.state)
    }
}

/// The scheduler treats "running" and "blocked" (case-insensitive, trimmed)
/// as busy; any other state is eligible.
pub fn is_busy_state(state: &str) -> bool {
    let state = state.trim();
    state.eq_ignore_ascii_case("running") || state.eq_ignore_ascii_case("blocked")
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
