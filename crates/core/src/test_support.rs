// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and helpers shared by other crates' tests.
//!
//! Only compiled with the `test-support` feature (or this crate's own tests).

#![allow(clippy::unwrap_used)]

use crate::{LiveStatus, SpriteName, SpriteSpec, SpriteState, SpriteStatus};
use std::path::PathBuf;

/// Desired spec with the persona conventionally named after the sprite.
pub fn spec(name: &str) -> SpriteSpec {
    SpriteSpec {
        name: SpriteName::parse(name).unwrap(),
        persona: name.to_string(),
        definition: PathBuf::from(format!("personas/{name}.md")),
        fallback: false,
    }
}

/// Observed status with explicit persona/config/state.
pub fn status(
    name: &str,
    machine_id: &str,
    persona: &str,
    config_version: &str,
    state: SpriteState,
) -> SpriteStatus {
    SpriteStatus {
        name: name.to_string(),
        machine_id: machine_id.to_string(),
        persona: persona.to_string(),
        config_version: config_version.to_string(),
        state,
    }
}

/// Probe result carrying only a state string.
pub fn live(state: &str) -> LiveStatus {
    LiveStatus { state: state.to_string(), ..Default::default() }
}
