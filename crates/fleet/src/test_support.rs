// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable transport for tests.
//!
//! Only compiled with the `test-support` feature (or this crate's own tests).

#![allow(clippy::unwrap_used)]

use crate::transport::{FleetTransport, LiveSprite, SpriteDetail, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A transport answering from in-memory tables. Unscripted exec calls return
/// "ok"; unscripted detail calls fail like an unreachable agent would.
#[derive(Default)]
pub struct FakeTransport {
    listing: Mutex<Vec<LiveSprite>>,
    details: Mutex<HashMap<String, SpriteDetail>>,
    exec_outputs: Mutex<HashMap<String, Result<String, TransportError>>>,
    exec_calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sprite(&self, name: &str, status: &str) {
        self.listing.lock().push(LiveSprite {
            name: name.to_string(),
            status: status.to_string(),
            machine_id: format!("m-{name}"),
        });
    }

    pub fn set_detail(&self, name: &str, detail: SpriteDetail) {
        self.details.lock().insert(name.to_string(), detail);
    }

    pub fn set_exec(&self, name: &str, output: &str) {
        self.exec_outputs.lock().insert(name.to_string(), Ok(output.to_string()));
    }

    pub fn fail_exec(&self, name: &str, error: TransportError) {
        self.exec_outputs.lock().insert(name.to_string(), Err(error));
    }

    /// Sprites exec'd against, in call order.
    pub fn exec_calls(&self) -> Vec<String> {
        self.exec_calls.lock().clone()
    }
}

#[async_trait]
impl FleetTransport for FakeTransport {
    async fn list(&self, _cancel: &CancellationToken) -> Result<Vec<LiveSprite>, TransportError> {
        Ok(self.listing.lock().clone())
    }

    async fn detail(
        &self,
        _cancel: &CancellationToken,
        name: &str,
    ) -> Result<SpriteDetail, TransportError> {
        self.details
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::Remote(format!("no agent detail for {name}")))
    }

    async fn exec(
        &self,
        _cancel: &CancellationToken,
        name: &str,
        _command: &str,
        _timeout: Duration,
    ) -> Result<String, TransportError> {
        self.exec_calls.lock().push(name.to_string());
        match self.exec_outputs.lock().get(name) {
            Some(result) => result.clone(),
            None => Ok("ok".to_string()),
        }
    }
}
