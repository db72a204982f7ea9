// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the planner's observed-fleet input from the live transport.

use crate::exit_error::ExitError;
use bb_core::{SpriteState, SpriteStatus};
use bb_fleet::FleetTransport;
use tokio_util::sync::CancellationToken;

fn state_from_platform(status: &str) -> SpriteState {
    match status {
        "stopped" | "dead" | "error" => SpriteState::Dead,
        "starting" | "provisioning" => SpriteState::Provisioned,
        _ => SpriteState::Idle,
    }
}

/// Observe every live sprite. Detail fetches are best-effort: a sprite whose
/// agent is unreachable still appears, with platform-derived state and blank
/// persona/config fields (which the planner reports as `<unknown>`).
pub async fn observed_fleet<T: FleetTransport>(
    cancel: &CancellationToken,
    transport: &T,
) -> Result<Vec<SpriteStatus>, ExitError> {
    let listing = transport.list(cancel).await?;
    let mut observed = Vec::with_capacity(listing.len());
    for live in listing {
        let mut persona = String::new();
        let mut config_version = String::new();
        let mut state = state_from_platform(&live.status);

        if matches!(live.status.as_str(), "running" | "warm") {
            match transport.detail(cancel, &live.name).await {
                Ok(detail) => {
                    persona = detail.metadata.get("persona").cloned().unwrap_or_default();
                    config_version =
                        detail.metadata.get("config_version").cloned().unwrap_or_default();
                    if let Some(agent_state) = SpriteState::parse(&detail.state) {
                        state = agent_state;
                    }
                }
                Err(e) => {
                    tracing::warn!(sprite = %live.name, error = %e, "agent detail unavailable");
                }
            }
        }

        observed.push(SpriteStatus {
            name: live.name,
            machine_id: live.machine_id,
            persona,
            config_version,
            state,
        });
    }
    Ok(observed)
}

#[cfg(test)]
#[path = "observe_tests.rs"]
mod tests;
