// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch failures, including the structured fleet-busy rejection.

use bb_registry::RegistryError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why one candidate was rejected during a dispatch scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyCandidate {
    pub name: String,
    /// Probe-reported state, or empty when the probe failed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime: String,
    #[serde(default)]
    pub assigned_issue: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assigned_repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_error: Option<String>,
}

impl fmt::Display for BusyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        if let Some(err) = &self.probe_error {
            write!(f, " probe failed: {err}")?;
        } else {
            write!(f, " state={}", self.state)?;
            if !self.task.is_empty() {
                write!(f, " task={:?}", self.task)?;
            }
            if !self.runtime.is_empty() {
                write!(f, " runtime={}", self.runtime)?;
            }
        }
        if let Some(at) = self.assigned_at {
            write!(
                f,
                " reserved issue={} repo={} since={}",
                self.assigned_issue,
                self.assigned_repo,
                at.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }
        Ok(())
    }
}

/// Every candidate was rejected. Non-fatal: the fleet is simply occupied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub struct FleetBusyError {
    /// Sorted by name.
    pub candidates: Vec<BusyCandidate>,
}

impl FleetBusyError {
    pub fn new(mut candidates: Vec<BusyCandidate>) -> Self {
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        Self { candidates }
    }
}

impl fmt::Display for FleetBusyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "no eligible sprite: all {} candidate(s) busy", self.candidates.len())?;
        for candidate in &self.candidates {
            writeln!(f, "  {candidate}")?;
        }
        write!(f, "hint: reservations expire after the TTL; retry shortly or free a sprite with unreserve")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("sprite {0} not found in registry")]
    NotFound(String),
    #[error(transparent)]
    Busy(#[from] FleetBusyError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
