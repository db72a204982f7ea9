// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb-dispatch: routes a work request to an eligible sprite and durably
//! reserves it in the registry.
//!
//! The scheduler probes candidates outside the registry lock, re-checks
//! reservation state inside it, and re-probes after committing so a sprite
//! that picked up work between probe and reserve is released again.

mod error;
mod probe;
mod scheduler;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{BusyCandidate, DispatchError, FleetBusyError};
pub use probe::{ProbeError, StatusProbe};
pub use scheduler::{Assignment, DispatchRequest, Dispatcher, DEFAULT_RESERVATION_TTL_SECS};
