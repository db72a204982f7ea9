// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation actions and their canonical execution order.

use bb_core::{SpriteSpec, SpriteStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Create a sprite that should exist but does not (or is dead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionAction {
    pub spec: SpriteSpec,
    pub config_version: String,
    pub reason: String,
}

/// Destroy a sprite machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownAction {
    pub name: String,
    pub machine_id: String,
    pub reason: String,
}

/// Bring a drifted sprite back in line with its desired spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAction {
    pub desired_spec: SpriteSpec,
    pub desired_config: String,
    pub current_status: SpriteStatus,
    /// Human-readable `<field> "old" -> "new"` change lines.
    pub changes: Vec<String>,
    pub reason: String,
}

/// Re-route the in-flight work of an updated sprite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedispatchAction {
    pub name: String,
    pub reason: String,
}

/// One planned step. Plain data: binding to a runtime happens in the
/// executor, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Teardown(TeardownAction),
    Update(UpdateAction),
    Provision(ProvisionAction),
    Redispatch(RedispatchAction),
}

/// Action kinds in canonical priority order: free capacity before consuming
/// it, mutate existing sprites before adding new ones, re-route in-flight
/// work last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Teardown,
    Update,
    Provision,
    Redispatch,
}

impl ActionKind {
    pub fn priority(&self) -> u8 {
        match self {
            ActionKind::Teardown => 0,
            ActionKind::Update => 1,
            ActionKind::Provision => 2,
            ActionKind::Redispatch => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Teardown => "teardown",
            ActionKind::Update => "update",
            ActionKind::Provision => "provision",
            ActionKind::Redispatch => "redispatch",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Teardown(_) => ActionKind::Teardown,
            Action::Update(_) => ActionKind::Update,
            Action::Provision(_) => ActionKind::Provision,
            Action::Redispatch(_) => ActionKind::Redispatch,
        }
    }

    /// The sprite the action applies to.
    pub fn sprite(&self) -> &str {
        match self {
            Action::Teardown(a) => &a.name,
            Action::Update(a) => a.desired_spec.name.as_str(),
            Action::Provision(a) => a.spec.name.as_str(),
            Action::Redispatch(a) => &a.name,
        }
    }

    /// One-line description used for logging, dry-run output, and as the
    /// final sort tiebreaker.
    pub fn description(&self) -> String {
        match self {
            Action::Teardown(a) => {
                format!("teardown {} (machine {}): {}", a.name, a.machine_id, a.reason)
            }
            Action::Update(a) => format!(
                "update {} ({}): {}",
                a.desired_spec.name,
                a.changes.join(", "),
                a.reason
            ),
            Action::Provision(a) => format!(
                "provision {} (persona {}, config {:?}): {}",
                a.spec.name, a.spec.persona, a.config_version, a.reason
            ),
            Action::Redispatch(a) => format!("redispatch {}: {}", a.name, a.reason),
        }
    }

    pub fn dry_run_line(&self) -> String {
        format!("[dry-run] {}", self.description())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Machine-readable projection of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionView {
    pub kind: ActionKind,
    pub sprite: String,
    pub description: String,
    pub dry_run: String,
}

impl From<&Action> for ActionView {
    fn from(action: &Action) -> Self {
        Self {
            kind: action.kind(),
            sprite: action.sprite().to_string(),
            description: action.description(),
            dry_run: action.dry_run_line(),
        }
    }
}

/// Sort into the canonical execution order: kind priority, then sprite name,
/// then description. Total and deterministic, so sorting is idempotent.
pub fn sort_actions(actions: &mut [Action]) {
    actions.sort_by_cached_key(|a| {
        (a.kind().priority(), a.sprite().to_string(), a.description())
    });
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
