// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sprite selection and reservation.

use crate::error::{BusyCandidate, DispatchError, FleetBusyError};
use crate::probe::StatusProbe;
use bb_core::{Clock, LiveStatus};
use bb_registry::{with_lock, Registry, RegistryEntry};
use chrono::Duration;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Default reservation time-to-live. Bounds how long a crashed caller can
/// strand a sprite.
pub const DEFAULT_RESERVATION_TTL_SECS: i64 = 120;

/// An incoming work request: an issue in a repo, optionally pinned to one
/// sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub issue: u64,
    pub repo: String,
    pub sprite: Option<String>,
}

/// A successful selection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    pub sprite: String,
    pub machine_id: String,
    pub issue: u64,
    pub repo: String,
}

/// Outcome of the locked reserve attempt.
enum Reserve {
    Committed,
    LostRace(RegistryEntry),
    Missing,
}

/// The dispatch scheduler. Probes run outside the registry lock; reservation
/// state is re-checked inside it.
pub struct Dispatcher<P, C> {
    registry_path: PathBuf,
    probe: P,
    clock: C,
    ttl: Duration,
}

impl<P: StatusProbe, C: Clock> Dispatcher<P, C> {
    pub fn new(registry_path: impl Into<PathBuf>, probe: P, clock: C) -> Self {
        Self {
            registry_path: registry_path.into(),
            probe,
            clock,
            ttl: Duration::seconds(DEFAULT_RESERVATION_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Select an eligible sprite without mutating the registry.
    pub async fn plan(
        &self,
        cancel: &CancellationToken,
        request: &DispatchRequest,
    ) -> Result<Assignment, DispatchError> {
        self.select(cancel, request, false).await
    }

    /// Select an eligible sprite and durably reserve it.
    pub async fn dispatch(
        &self,
        cancel: &CancellationToken,
        request: &DispatchRequest,
    ) -> Result<Assignment, DispatchError> {
        self.select(cancel, request, true).await
    }

    /// Explicitly release a reservation. Returns false when the sprite is
    /// not registered.
    pub async fn unreserve(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<bool, DispatchError> {
        let path = self.registry_path.clone();
        let name = name.to_string();
        let released = with_lock(cancel, &self.registry_path, move || {
            let mut registry = Registry::load(&path)?;
            if registry.release(&name) {
                registry.save(&path)?;
                Ok(true)
            } else {
                Ok(false)
            }
        })
        .await?;
        Ok(released)
    }

    async fn select(
        &self,
        cancel: &CancellationToken,
        request: &DispatchRequest,
        commit: bool,
    ) -> Result<Assignment, DispatchError> {
        // Read-through load; the authoritative check happens under the lock.
        let registry = Registry::load(&self.registry_path)?;

        let targeted = request.sprite.is_some();
        let candidates: Vec<String> = match &request.sprite {
            Some(name) => vec![name.clone()],
            None => registry.names(),
        };

        let mut busy: Vec<BusyCandidate> = Vec::new();

        for name in candidates {
            let machine_id = match registry.lookup_machine(&name) {
                Some(id) => id.to_string(),
                None if targeted => return Err(DispatchError::NotFound(name)),
                None => continue,
            };

            // Probe outside the lock. Errors and cancellation count as busy:
            // a cancelled caller must never silently reserve.
            let live = match self.probe.check(cancel, &machine_id).await {
                Ok(live) if live.is_busy() => {
                    busy.push(busy_from_live(&name, &live, registry.sprites.get(&name)));
                    continue;
                }
                Ok(live) => live,
                Err(e) => {
                    busy.push(BusyCandidate {
                        name: name.clone(),
                        probe_error: Some(e.to_string()),
                        ..Default::default()
                    });
                    continue;
                }
            };

            if let Some(entry) = registry.sprites.get(&name) {
                if entry.is_reserved(self.clock.now(), self.ttl) {
                    busy.push(busy_from_entry(&name, &live, entry));
                    continue;
                }
            }

            if !commit {
                return Ok(Assignment {
                    sprite: name,
                    machine_id,
                    issue: request.issue,
                    repo: request.repo.trim().to_string(),
                });
            }

            match self.try_reserve(cancel, &name, &machine_id, request).await? {
                Reserve::Missing => {
                    if targeted {
                        return Err(DispatchError::NotFound(name));
                    }
                    continue;
                }
                Reserve::LostRace(entry) => {
                    busy.push(busy_from_entry(&name, &live, &entry));
                    continue;
                }
                Reserve::Committed => {}
            }

            // Close the probe-to-reserve gap: the sprite may have picked up
            // work in between. If it did, hand the reservation back.
            match self.probe.check(cancel, &machine_id).await {
                Ok(live) if !live.is_busy() => {
                    tracing::info!(sprite = %name, issue = request.issue, "dispatch reserved");
                    return Ok(Assignment {
                        sprite: name,
                        machine_id,
                        issue: request.issue,
                        repo: request.repo.trim().to_string(),
                    });
                }
                Ok(live) => {
                    busy.push(busy_from_live(&name, &live, None));
                }
                Err(e) => {
                    busy.push(BusyCandidate {
                        name: name.clone(),
                        probe_error: Some(e.to_string()),
                        ..Default::default()
                    });
                }
            }
            tracing::debug!(sprite = %name, "sprite became busy after reserve, releasing");
            self.release_under_lock(cancel, &name).await?;
        }

        Err(FleetBusyError::new(busy).into())
    }

    async fn try_reserve(
        &self,
        cancel: &CancellationToken,
        name: &str,
        machine_id: &str,
        request: &DispatchRequest,
    ) -> Result<Reserve, DispatchError> {
        let path = self.registry_path.clone();
        let name = name.to_string();
        let machine_id = machine_id.to_string();
        let issue = request.issue;
        let repo = request.repo.clone();
        let now_clock = self.clock.clone();
        let ttl = self.ttl;

        let outcome = with_lock(cancel, &self.registry_path, move || {
            let mut registry = Registry::load(&path)?;
            let entry = match registry.sprites.get(&name) {
                Some(entry) if entry.machine_id == machine_id => entry,
                // Renamed or re-registered since the unlocked read.
                _ => return Ok(Reserve::Missing),
            };
            let now = now_clock.now();
            if entry.is_reserved(now, ttl) {
                return Ok(Reserve::LostRace(entry.clone()));
            }
            registry.reserve(&name, issue, &repo, now);
            registry.save(&path)?;
            Ok(Reserve::Committed)
        })
        .await?;
        Ok(outcome)
    }

    async fn release_under_lock(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<(), DispatchError> {
        let path = self.registry_path.clone();
        let name = name.to_string();
        with_lock(cancel, &self.registry_path, move || {
            let mut registry = Registry::load(&path)?;
            if registry.release(&name) {
                registry.save(&path)?;
            }
            Ok(())
        })
        .await?;
        Ok(())
    }
}

fn busy_from_live(name: &str, live: &LiveStatus, entry: Option<&RegistryEntry>) -> BusyCandidate {
    BusyCandidate {
        name: name.to_string(),
        state: live.state.trim().to_string(),
        task: live.task.clone(),
        runtime: live.runtime.clone(),
        assigned_issue: entry.map(|e| e.assigned_issue).unwrap_or(0),
        assigned_repo: entry.map(|e| e.assigned_repo.clone()).unwrap_or_default(),
        assigned_at: entry.and_then(|e| e.assigned_at),
        probe_error: None,
    }
}

fn busy_from_entry(name: &str, live: &LiveStatus, entry: &RegistryEntry) -> BusyCandidate {
    BusyCandidate {
        name: name.to_string(),
        state: live.state.trim().to_string(),
        task: live.task.clone(),
        runtime: live.runtime.clone(),
        assigned_issue: entry.assigned_issue,
        assigned_repo: entry.assigned_repo.clone(),
        assigned_at: entry.assigned_at,
        probe_error: None,
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
