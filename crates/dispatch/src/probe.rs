// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status probe contract.

use async_trait::async_trait;
use bb_core::LiveStatus;
use tokio_util::sync::CancellationToken;

/// A probe failure. Probe errors never fail the scheduler; they mark the
/// candidate busy and are carried verbatim into the busy report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProbeError(pub String);

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Best-effort liveness check against one machine.
///
/// Cancellation must surface as an error: a cancelled caller is treated as
/// "busy" so it can never silently reserve.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn check(
        &self,
        cancel: &CancellationToken,
        machine_id: &str,
    ) -> Result<LiveStatus, ProbeError>;
}
