// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciliation planner: a pure diff from desired to observed fleet.

use crate::action::{
    sort_actions, Action, ProvisionAction, RedispatchAction, TeardownAction, UpdateAction,
};
use bb_core::{SpriteSpec, SpriteState, SpriteStatus};
use std::collections::BTreeMap;

/// Marker rendered in change summaries when one side is blank.
const UNKNOWN: &str = "<unknown>";

/// Broken-out reconciliation sets for reporting. Each list is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReconcilePlan {
    /// Desired sprites with no live counterpart (includes dead sprites being
    /// replaced).
    pub missing: Vec<String>,
    /// Live sprites not present in the desired composition.
    pub extra: Vec<String>,
    /// Sprites whose persona or config version disagrees with the desired
    /// spec.
    pub drift: Vec<String>,
    /// Machine ids of duplicate observations targeted for teardown.
    pub duplicates: Vec<String>,
}

fn change_line(field: &str, old: &str, new: &str) -> String {
    let render = |s: &str| {
        let s = s.trim();
        if s.is_empty() {
            UNKNOWN.to_string()
        } else {
            s.to_string()
        }
    };
    format!("{} \"{}\" -> \"{}\"", field, render(old), render(new))
}

/// Compute the actions that bring the observed fleet into agreement with the
/// desired composition.
///
/// Pure and infallible: all failure in reconciliation originates from the
/// I/O that produced the inputs or from executing the result. Returns the
/// canonically-ordered actions plus the broken-out plan sets.
pub fn plan(
    desired: &[SpriteSpec],
    desired_config: &str,
    observed: &[SpriteStatus],
) -> (Vec<Action>, ReconcilePlan) {
    // First observation per name is canonical; the rest are duplicates.
    let mut canonical: BTreeMap<&str, &SpriteStatus> = BTreeMap::new();
    let mut duplicates: Vec<&SpriteStatus> = Vec::new();
    for status in observed {
        if canonical.contains_key(status.name.as_str()) {
            duplicates.push(status);
        } else {
            canonical.insert(status.name.as_str(), status);
        }
    }

    let mut sorted_desired: Vec<&SpriteSpec> = desired.iter().collect();
    sorted_desired.sort_by(|a, b| a.name.cmp(&b.name));

    let mut actions = Vec::new();
    let mut report = ReconcilePlan::default();

    for spec in &sorted_desired {
        match canonical.get(spec.name.as_str()) {
            None => {
                report.missing.push(spec.name.to_string());
                actions.push(Action::Provision(ProvisionAction {
                    spec: (*spec).clone(),
                    config_version: desired_config.to_string(),
                    reason: "missing from actual fleet".to_string(),
                }));
            }
            Some(status) if status.state == SpriteState::Dead => {
                report.missing.push(spec.name.to_string());
                actions.push(Action::Provision(ProvisionAction {
                    spec: (*spec).clone(),
                    config_version: desired_config.to_string(),
                    reason: "sprite reported dead".to_string(),
                }));
            }
            Some(status) => {
                let persona_mismatch = spec.persona.trim() != status.persona.trim();
                let config_mismatch = desired_config.trim() != status.config_version.trim();
                if !persona_mismatch && !config_mismatch {
                    continue;
                }

                let mut changes = Vec::new();
                if persona_mismatch {
                    changes.push(change_line("persona", &status.persona, &spec.persona));
                }
                if config_mismatch {
                    changes.push(change_line(
                        "config_version",
                        &status.config_version,
                        desired_config,
                    ));
                }

                report.drift.push(spec.name.to_string());
                actions.push(Action::Update(UpdateAction {
                    desired_spec: (*spec).clone(),
                    desired_config: desired_config.to_string(),
                    current_status: (*status).clone(),
                    changes,
                    reason: "drifted from desired composition".to_string(),
                }));

                if status.state.is_active() {
                    actions.push(Action::Redispatch(RedispatchAction {
                        name: spec.name.to_string(),
                        reason: format!("updated while {}", status.state),
                    }));
                }
            }
        }
    }

    let desired_names: BTreeMap<&str, ()> =
        sorted_desired.iter().map(|s| (s.name.as_str(), ())).collect();
    for (name, status) in &canonical {
        if !desired_names.contains_key(name) {
            report.extra.push((*name).to_string());
            actions.push(Action::Teardown(TeardownAction {
                name: (*name).to_string(),
                machine_id: status.machine_id.clone(),
                reason: "not present in desired composition".to_string(),
            }));
        }
    }

    for dup in &duplicates {
        report.duplicates.push(dup.machine_id.clone());
        actions.push(Action::Teardown(TeardownAction {
            name: dup.name.clone(),
            machine_id: dup.machine_id.clone(),
            reason: "duplicate sprite instance".to_string(),
        }));
    }

    sort_actions(&mut actions);
    report.missing.sort();
    report.extra.sort();
    report.drift.sort();
    report.duplicates.sort();

    tracing::debug!(
        missing = report.missing.len(),
        extra = report.extra.len(),
        drift = report.drift.len(),
        duplicates = report.duplicates.len(),
        actions = actions.len(),
        "reconciliation planned"
    );

    (actions, report)
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
