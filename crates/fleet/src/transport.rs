// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote fleet transport contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Transport failures, bucketed for the error taxonomy at the surface.
/// Retries with backoff happen inside transport implementations; what
/// arrives here is already final.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("remote state error: {0}")]
    Remote(String),
}

/// One entry in the live fleet listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSprite {
    pub name: String,
    /// Raw platform status, e.g. "running", "stopped", "starting".
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub machine_id: String,
}

/// Per-sprite detail, fetched only for sprites whose transport is ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteDetail {
    /// Agent-reported state: "idle", "working", "dead", or empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
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
}

/// Remote operations the overview needs. Implementations own their own
/// retry policy and must not be called under any registry lock.
#[async_trait]
pub trait FleetTransport: Send + Sync {
    /// List the live fleet.
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<LiveSprite>, TransportError>;

    /// Fetch one sprite's detail.
    async fn detail(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<SpriteDetail, TransportError>;

    /// Run a lightweight command on a sprite and return its stdout.
    async fn exec(
        &self,
        cancel: &CancellationToken,
        name: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}
