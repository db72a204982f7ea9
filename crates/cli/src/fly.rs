// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fly.io transport binding: fleet listing, remote exec, and the runtime
//! used by `bb reconcile`. Everything shells out to the platform CLI; the
//! orchestration crates only ever see the trait contracts.

use async_trait::async_trait;
use bb_core::LiveStatus;
use bb_dispatch::{ProbeError, StatusProbe};
use bb_fleet::{FleetTransport, LiveSprite, SpriteDetail, TransportError};
use bb_planner::{
    ProvisionAction, RedispatchAction, Runtime, RuntimeError, TeardownAction, UpdateAction,
};
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default remote command timeout; individual probes pass tighter ones.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Agent entry point on the sprite.
const AGENT_BIN: &str = "bb-agent";

fn sprite_image() -> String {
    std::env::var("BB_SPRITE_IMAGE")
        .unwrap_or_else(|_| "registry.fly.io/bitterblossom:latest".to_string())
}

#[derive(Debug, Deserialize)]
struct MachineRow {
    id: String,
    name: String,
    state: String,
}

/// Transport over the `fly` CLI.
pub struct FlyTransport {
    app: String,
    bin: String,
}

impl FlyTransport {
    pub fn new(app: impl Into<String>) -> Self {
        let bin = std::env::var("BB_FLY_BIN").unwrap_or_else(|_| "fly".to_string());
        Self { app: app.into(), bin }
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, TransportError> {
        tracing::debug!(bin = %self.bin, ?args, "running platform command");
        let mut child = tokio::process::Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Network(format!("failed to spawn {}: {e}", self.bin)))?;

        let output = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(TransportError::Network("cancelled".to_string()));
            }
            result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    return Err(TransportError::Network(format!("{} failed: {e}", self.bin)));
                }
                Err(_) => {
                    return Err(TransportError::Network(format!(
                        "{} timed out after {}s",
                        self.bin,
                        timeout.as_secs()
                    )));
                }
            },
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let lower = stderr.to_ascii_lowercase();
        if lower.contains("auth") || lower.contains("unauthorized") || lower.contains("token") {
            Err(TransportError::Auth(stderr.trim().to_string()))
        } else {
            Err(TransportError::Remote(stderr.trim().to_string()))
        }
    }

    async fn machine_id_for(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<String, TransportError> {
        let listing = self.list(cancel).await?;
        listing
            .into_iter()
            .find(|s| s.name == name)
            .map(|s| s.machine_id)
            .ok_or_else(|| TransportError::Remote(format!("no machine named {name}")))
    }

    async fn exec_machine(
        &self,
        cancel: &CancellationToken,
        machine_id: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        self.run(
            cancel,
            &["ssh", "console", "-a", &self.app, "--machine", machine_id, "-C", command],
            timeout,
        )
        .await
    }
}

#[async_trait]
impl FleetTransport for FlyTransport {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<LiveSprite>, TransportError> {
        let json = self
            .run(cancel, &["machines", "list", "-a", &self.app, "--json"], DEFAULT_TIMEOUT)
            .await?;
        let rows: Vec<MachineRow> = serde_json::from_str(&json)
            .map_err(|e| TransportError::Remote(format!("unparseable machine listing: {e}")))?;
        Ok(rows
            .into_iter()
            .map(|row| LiveSprite { name: row.name, status: row.state, machine_id: row.id })
            .collect())
    }

    async fn detail(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<SpriteDetail, TransportError> {
        let machine_id = self.machine_id_for(cancel, name).await?;
        let json = self
            .exec_machine(
                cancel,
                &machine_id,
                &format!("{AGENT_BIN} status --json"),
                DEFAULT_TIMEOUT,
            )
            .await?;
        serde_json::from_str(&json)
            .map_err(|e| TransportError::Remote(format!("unparseable agent detail: {e}")))
    }

    async fn exec(
        &self,
        cancel: &CancellationToken,
        name: &str,
        command: &str,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let machine_id = self.machine_id_for(cancel, name).await?;
        self.exec_machine(cancel, &machine_id, command, timeout).await
    }
}

#[async_trait]
impl StatusProbe for FlyTransport {
    async fn check(
        &self,
        cancel: &CancellationToken,
        machine_id: &str,
    ) -> Result<LiveStatus, ProbeError> {
        let json = self
            .exec_machine(
                cancel,
                machine_id,
                &format!("{AGENT_BIN} status --json"),
                Duration::from_secs(15),
            )
            .await
            .map_err(|e| ProbeError::new(e.to_string()))?;
        serde_json::from_str(&json)
            .map_err(|e| ProbeError::new(format!("unparseable status payload: {e}")))
    }
}

/// Runtime executing reconciliation actions against the platform.
pub struct FlyRuntime {
    transport: FlyTransport,
    app: String,
}

impl FlyRuntime {
    pub fn new(app: impl Into<String>) -> Self {
        let app = app.into();
        Self { transport: FlyTransport::new(&app), app }
    }
}

#[async_trait]
impl Runtime for FlyRuntime {
    async fn provision(
        &self,
        cancel: &CancellationToken,
        action: &ProvisionAction,
    ) -> Result<(), RuntimeError> {
        let image = sprite_image();
        let persona_env = format!("BB_PERSONA={}", action.spec.persona);
        let config_env = format!("BB_CONFIG_VERSION={}", action.config_version);
        self.transport
            .run(
                cancel,
                &[
                    "machines",
                    "run",
                    &image,
                    "-a",
                    &self.app,
                    "--name",
                    action.spec.name.as_str(),
                    "-e",
                    &persona_env,
                    "-e",
                    &config_env,
                ],
                DEFAULT_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn teardown(
        &self,
        cancel: &CancellationToken,
        action: &TeardownAction,
    ) -> Result<(), RuntimeError> {
        self.transport
            .run(
                cancel,
                &["machines", "destroy", &action.machine_id, "-a", &self.app, "--force"],
                DEFAULT_TIMEOUT,
            )
            .await?;
        Ok(())
    }

    async fn update(
        &self,
        cancel: &CancellationToken,
        action: &UpdateAction,
    ) -> Result<(), RuntimeError> {
        let command = format!(
            "{AGENT_BIN} configure --persona {} --config-version {}",
            action.desired_spec.persona, action.desired_config
        );
        self.transport
            .exec(cancel, action.desired_spec.name.as_str(), &command, DEFAULT_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn redispatch(
        &self,
        cancel: &CancellationToken,
        action: &RedispatchAction,
    ) -> Result<(), RuntimeError> {
        self.transport
            .exec(cancel, &action.name, &format!("{AGENT_BIN} redispatch"), DEFAULT_TIMEOUT)
            .await?;
        Ok(())
    }
}
