// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb dispatch` — route an issue to an eligible sprite.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::output;
use bb_core::SystemClock;
use bb_dispatch::{DispatchRequest, Dispatcher};
use bb_eventlog::{EventKind, TaskEvent};
use chrono::Duration;
use clap::Args;

#[derive(Args)]
pub struct DispatchArgs {
    /// Issue number to work on
    #[arg(long)]
    pub issue: u64,

    /// Repository the issue lives in, e.g. misty-step/bitterblossom
    #[arg(long)]
    pub repo: String,

    /// Pin the dispatch to a specific sprite instead of auto-assigning
    #[arg(long)]
    pub sprite: Option<String>,

    /// Select only; do not reserve or notify the sprite
    #[arg(long)]
    pub plan: bool,

    /// Reservation time-to-live in seconds
    #[arg(long, default_value_t = bb_dispatch::DEFAULT_RESERVATION_TTL_SECS)]
    pub ttl_secs: i64,
}

pub async fn handle(args: DispatchArgs, ctx: &AppContext) -> Result<(), ExitError> {
    if args.repo.trim().is_empty() {
        return Err(ExitError::validation("--repo must not be empty"));
    }
    if args.ttl_secs <= 0 {
        return Err(ExitError::validation("--ttl-secs must be positive"));
    }

    let dispatcher = Dispatcher::new(&ctx.registry_path, ctx.transport(), SystemClock)
        .with_ttl(Duration::seconds(args.ttl_secs));
    let request = DispatchRequest {
        issue: args.issue,
        repo: args.repo.clone(),
        sprite: args.sprite.clone(),
    };

    let assignment = if args.plan {
        dispatcher.plan(&ctx.cancel, &request).await?
    } else {
        let assignment = dispatcher.dispatch(&ctx.cancel, &request).await?;
        // Record the dispatch in the event log; the sprite's own events for
        // this task key off the same task id.
        let event = TaskEvent::new(
            uuid::Uuid::new_v4().to_string(),
            &assignment.sprite,
            format!("issue-{}", assignment.issue),
            EventKind::DispatchStarted,
        )
        .with_repo(&assignment.repo)
        .with_issue(assignment.issue);
        if let Err(e) = ctx.event_log().append(event) {
            tracing::warn!(error = %e, "dispatch reserved but event append failed");
        }
        assignment
    };

    if ctx.format.is_json() {
        output::emit_success(
            "dispatch",
            serde_json::json!({
                "planned": args.plan,
                "assignment": assignment,
            }),
        );
    } else if args.plan {
        println!(
            "Would dispatch issue {} in {} to {} (machine {})",
            assignment.issue, assignment.repo, assignment.sprite, assignment.machine_id
        );
    } else {
        println!(
            "Dispatched issue {} in {} to {} (machine {})",
            assignment.issue, assignment.repo, assignment.sprite, assignment.machine_id
        );
    }
    Ok(())
}
