// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binds planned actions to a runtime and executes them in canonical order.

use crate::action::{
    sort_actions, Action, ProvisionAction, RedispatchAction, TeardownAction, UpdateAction,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Errors produced by a runtime implementation.
pub type RuntimeError = Box<dyn std::error::Error + Send + Sync>;

/// The four capabilities a runtime must provide. Implementations perform the
/// actual remote side effects; the executor only sequences them.
#[async_trait]
pub trait Runtime: Send + Sync {
    async fn provision(
        &self,
        cancel: &CancellationToken,
        action: &ProvisionAction,
    ) -> Result<(), RuntimeError>;

    async fn teardown(
        &self,
        cancel: &CancellationToken,
        action: &TeardownAction,
    ) -> Result<(), RuntimeError>;

    async fn update(
        &self,
        cancel: &CancellationToken,
        action: &UpdateAction,
    ) -> Result<(), RuntimeError>;

    async fn redispatch(
        &self,
        cancel: &CancellationToken,
        action: &RedispatchAction,
    ) -> Result<(), RuntimeError>;
}

/// An action failed; carries the failing action's description.
#[derive(Debug, thiserror::Error)]
#[error("{description}: {source}")]
pub struct ExecuteError {
    pub description: String,
    #[source]
    pub source: RuntimeError,
}

/// Sequential action executor.
pub struct Executor;

impl Executor {
    /// Run the actions in canonical order, aborting on the first error.
    ///
    /// Sorting here is idempotent with the planner's output, so callers may
    /// pass an already-sorted or hand-assembled list.
    pub async fn execute<R: Runtime>(
        cancel: &CancellationToken,
        runtime: &R,
        mut actions: Vec<Action>,
    ) -> Result<(), ExecuteError> {
        sort_actions(&mut actions);
        for action in &actions {
            tracing::info!(kind = %action.kind(), sprite = action.sprite(), "executing action");
            let result = match action {
                Action::Provision(a) => runtime.provision(cancel, a).await,
                Action::Teardown(a) => runtime.teardown(cancel, a).await,
                Action::Update(a) => runtime.update(cancel, a).await,
                Action::Redispatch(a) => runtime.redispatch(cancel, a).await,
            };
            result.map_err(|source| ExecuteError { description: action.description(), source })?;
        }
        Ok(())
    }

    /// Render the dry-run lines in canonical order. Never touches a runtime.
    pub fn dry_run(mut actions: Vec<Action>) -> Vec<String> {
        sort_actions(&mut actions);
        actions.iter().map(Action::dry_run_line).collect()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
