// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet status overview.

use crate::transport::{FleetTransport, SpriteDetail, TransportError};
use bb_eventlog::EventLogError;
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Default staleness threshold when the caller supplies none.
const DEFAULT_STALE_THRESHOLD_SECS: i64 = 2 * 60 * 60;

/// Default per-sprite reachability probe timeout.
const DEFAULT_PROBE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Command used for reachability probes.
const PROBE_COMMAND: &str = "echo ok";

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    EventLog(#[from] EventLogError),
}

/// What to gather beyond the bare listing.
#[derive(Debug, Clone)]
pub struct StatusOptions {
    /// Copy sprite metadata (checkpoint markers and the like) into the
    /// report entries.
    pub include_checkpoints: bool,
    pub include_tasks: bool,
    pub include_probe: bool,
    pub probe_timeout: std::time::Duration,
    /// None = staleness not requested; the default threshold applies when
    /// detail is being fetched anyway.
    pub stale_threshold: Option<Duration>,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            include_checkpoints: false,
            include_tasks: false,
            include_probe: false,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            stale_threshold: None,
        }
    }
}

/// Rolled-up display state of one sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Idle,
    Busy,
    Offline,
    /// Transitional: the machine exists but its transport is not ready.
    Operational,
    Unknown,
}

impl DisplayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayState::Idle => "idle",
            DisplayState::Busy => "busy",
            DisplayState::Offline => "offline",
            DisplayState::Operational => "operational",
            DisplayState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a reachability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

/// One sprite's row in the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteOverview {
    pub name: String,
    pub status: String,
    pub display_state: DisplayState,
    /// Present in the declared composition.
    pub declared: bool,
    /// Live but not declared.
    pub orphan: bool,
    pub stale: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_task: String,
    #[serde(default)]
    pub queue_depth: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uptime: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub total: usize,
    pub idle: usize,
    pub busy: usize,
    pub offline: usize,
    /// Includes transitional (operational) sprites.
    pub unknown: usize,
    pub orphaned: usize,
    pub stale: usize,
    pub with_tasks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetOverview {
    /// Sorted by name.
    pub sprites: Vec<SpriteOverview>,
    /// Declared sprites with no live counterpart, sorted.
    pub missing: Vec<String>,
    pub summary: FleetSummary,
}

fn is_ready(status: &str) -> bool {
    matches!(status, "running" | "warm")
}

fn derive_display_state(status: &str, detail: Option<&SpriteDetail>) -> DisplayState {
    match status {
        "stopped" | "error" | "dead" => return DisplayState::Offline,
        _ => {}
    }
    if let Some(detail) = detail {
        match detail.state.as_str() {
            "idle" => return DisplayState::Idle,
            "working" => return DisplayState::Busy,
            "dead" => return DisplayState::Offline,
            _ => {}
        }
    }
    match status {
        // Conservative: idle unless the detail says otherwise.
        "running" | "warm" => DisplayState::Idle,
        "starting" | "provisioning" => DisplayState::Operational,
        _ => DisplayState::Unknown,
    }
}

/// Correlate the declared composition against the live fleet.
///
/// Detail fetches and probes are restricted to sprites whose transport is
/// ready (running/warm); transitional and offline sprites would only produce
/// noise failures. Probes run in parallel, each under its own timeout.
pub async fn fleet_overview<T: FleetTransport>(
    cancel: &CancellationToken,
    transport: &T,
    declared: &[String],
    options: &StatusOptions,
) -> Result<FleetOverview, FleetError> {
    let listing = transport.list(cancel).await?;

    let want_detail = options.include_tasks || options.stale_threshold.is_some();
    let stale_threshold = options
        .stale_threshold
        .unwrap_or_else(|| Duration::seconds(DEFAULT_STALE_THRESHOLD_SECS));

    // Per-sprite detail, ready sprites only.
    let mut details: BTreeMap<String, SpriteDetail> = BTreeMap::new();
    if want_detail {
        for sprite in listing.iter().filter(|s| is_ready(&s.status)) {
            match transport.detail(cancel, &sprite.name).await {
                Ok(detail) => {
                    details.insert(sprite.name.clone(), detail);
                }
                Err(e) => {
                    tracing::warn!(sprite = %sprite.name, error = %e, "detail fetch failed");
                }
            }
        }
    }

    // Parallel reachability probes, each bounded by its own timeout.
    let mut probes: BTreeMap<String, ProbeOutcome> = BTreeMap::new();
    if options.include_probe {
        let probeable: Vec<&str> = listing
            .iter()
            .filter(|s| is_ready(&s.status))
            .map(|s| s.name.as_str())
            .collect();
        let outcomes = join_all(probeable.iter().map(|name| async move {
            let result = tokio::time::timeout(
                options.probe_timeout,
                transport.exec(cancel, name, PROBE_COMMAND, options.probe_timeout),
            )
            .await;
            match result {
                Ok(Ok(output)) => ProbeOutcome { ok: true, detail: output.trim().to_string() },
                Ok(Err(e)) => ProbeOutcome { ok: false, detail: e.to_string() },
                Err(_) => ProbeOutcome { ok: false, detail: "probe timed out".to_string() },
            }
        }))
        .await;
        for (name, outcome) in probeable.into_iter().zip(outcomes) {
            probes.insert(name.to_string(), outcome);
        }
    }

    let declared_set: BTreeMap<&str, ()> = declared.iter().map(|n| (n.as_str(), ())).collect();
    let now = Utc::now();

    let mut sprites: Vec<SpriteOverview> = Vec::with_capacity(listing.len());
    for live in &listing {
        let detail = details.get(&live.name);
        let display_state = derive_display_state(&live.status, detail);
        let is_declared = declared_set.contains_key(live.name.as_str());

        let stale = detail
            .and_then(|d| d.last_activity)
            .is_some_and(|at| is_ready(&live.status) && now - at > stale_threshold);

        sprites.push(SpriteOverview {
            name: live.name.clone(),
            status: live.status.clone(),
            display_state,
            declared: is_declared,
            orphan: !is_declared,
            stale,
            current_task: detail.map(|d| d.current_task.clone()).unwrap_or_default(),
            queue_depth: detail.map(|d| d.queue_depth).unwrap_or(0),
            last_activity: detail.and_then(|d| d.last_activity),
            uptime: detail.map(|d| d.uptime.clone()).unwrap_or_default(),
            metadata: if options.include_checkpoints {
                detail.map(|d| d.metadata.clone()).unwrap_or_default()
            } else {
                BTreeMap::new()
            },
            probe: probes.get(&live.name).cloned(),
        });
    }
    sprites.sort_by(|a, b| a.name.cmp(&b.name));

    let live_names: BTreeMap<&str, ()> =
        listing.iter().map(|s| (s.name.as_str(), ())).collect();
    let mut missing: Vec<String> = declared
        .iter()
        .filter(|name| !live_names.contains_key(name.as_str()))
        .cloned()
        .collect();
    missing.sort();
    missing.dedup();

    let mut summary = FleetSummary { total: sprites.len(), ..Default::default() };
    for sprite in &sprites {
        match sprite.display_state {
            DisplayState::Idle => summary.idle += 1,
            DisplayState::Busy => summary.busy += 1,
            DisplayState::Offline => summary.offline += 1,
            DisplayState::Operational | DisplayState::Unknown => summary.unknown += 1,
        }
        if sprite.orphan {
            summary.orphaned += 1;
        }
        if sprite.stale {
            summary.stale += 1;
        }
        if !sprite.current_task.is_empty() {
            summary.with_tasks += 1;
        }
    }

    Ok(FleetOverview { sprites, missing, summary })
}

#[cfg(test)]
#[path = "overview_tests.rs"]
mod tests;
