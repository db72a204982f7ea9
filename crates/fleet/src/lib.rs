// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb-fleet: live fleet introspection.
//!
//! Answers "what is the fleet doing right now?" by correlating the declared
//! composition against a live listing from the transport, optionally
//! enriched with per-sprite detail, staleness flags, and reachability
//! probes. A lighter event-log-merged liveness report is available for
//! quick interactive listings.

mod liveness;
mod overview;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use liveness::{
    liveness_report, LivenessRow, LivenessState, DEFAULT_MAX_AGE_SECS,
};
pub use overview::{
    fleet_overview, DisplayState, FleetError, FleetOverview, FleetSummary, ProbeOutcome,
    SpriteOverview, StatusOptions,
};
pub use transport::{FleetTransport, LiveSprite, SpriteDetail, TransportError};
