// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable probe for tests.
//!
//! Only compiled with the `test-support` feature (or this crate's own tests).

#![allow(clippy::unwrap_used)]

use crate::probe::{ProbeError, StatusProbe};
use async_trait::async_trait;
use bb_core::LiveStatus;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio_util::sync::CancellationToken;

type ProbeResult = Result<LiveStatus, ProbeError>;

/// A probe that replays scripted responses per machine id. The last scripted
/// response repeats; unscripted machines report "idle". Every call is
/// recorded for assertion.
#[derive(Default)]
pub struct FakeProbe {
    scripts: Mutex<HashMap<String, VecDeque<ProbeResult>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for a machine. Multiple pushes build a sequence;
    /// the final entry repeats forever.
    pub fn push(&self, machine_id: &str, state: &str) {
        self.scripts
            .lock()
            .entry(machine_id.to_string())
            .or_default()
            .push_back(Ok(LiveStatus { state: state.to_string(), ..Default::default() }));
    }

    /// Queue a full status (task/runtime populated).
    pub fn push_status(&self, machine_id: &str, status: LiveStatus) {
        self.scripts.lock().entry(machine_id.to_string()).or_default().push_back(Ok(status));
    }

    /// Queue a probe failure.
    pub fn push_error(&self, machine_id: &str, message: &str) {
        self.scripts
            .lock()
            .entry(machine_id.to_string())
            .or_default()
            .push_back(Err(ProbeError::new(message)));
    }

    /// Machine ids probed, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StatusProbe for FakeProbe {
    async fn check(
        &self,
        cancel: &CancellationToken,
        machine_id: &str,
    ) -> Result<LiveStatus, ProbeError> {
        self.calls.lock().push(machine_id.to_string());
        if cancel.is_cancelled() {
            return Err(ProbeError::new("probe cancelled"));
        }
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(machine_id) {
            Some(seq) if seq.len() > 1 => seq.pop_front().unwrap(),
            Some(seq) => seq.front().cloned().unwrap_or_else(|| {
                Ok(LiveStatus { state: "idle".into(), ..Default::default() })
            }),
            None => Ok(LiveStatus { state: "idle".into(), ..Default::default() }),
        }
    }
}
