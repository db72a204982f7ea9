// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb tasks` — materialized task snapshots.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::output;
use bb_core::format_elapsed;
use chrono::{Duration, Utc};
use clap::Args;

#[derive(Args)]
pub struct TasksArgs {
    /// Restrict to one sprite
    #[arg(long)]
    pub sprite: Option<String>,

    /// Mark tasks stale after this many seconds of silence (0 disables)
    #[arg(long, default_value_t = 0)]
    pub stale_threshold_secs: i64,
}

pub async fn handle(args: TasksArgs, ctx: &AppContext) -> Result<(), ExitError> {
    if args.stale_threshold_secs < 0 {
        return Err(ExitError::validation("--stale-threshold-secs must be non-negative"));
    }

    let log = ctx.event_log();
    let now = Utc::now();
    let threshold = Duration::seconds(args.stale_threshold_secs);
    let snapshots = match &args.sprite {
        Some(sprite) => log.sprite_snapshot(sprite, now, threshold)?,
        None => log.snapshot(now, threshold)?,
    };

    if ctx.format.is_json() {
        output::emit_success("tasks", serde_json::to_value(&snapshots).unwrap_or_default());
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("No task events recorded");
        return Ok(());
    }
    for s in &snapshots {
        let mut line = format!(
            "{:<12} {:<16} {:<10} seen {} ago",
            s.sprite,
            s.task_id,
            s.state.as_str(),
            format_elapsed(s.freshness_age_secs)
        );
        if !s.repo.is_empty() {
            line.push_str(&format!(" repo={}", s.repo));
        }
        if s.issue > 0 {
            line.push_str(&format!(" issue={}", s.issue));
        }
        if !s.blocked_reason.is_empty() {
            line.push_str(&format!(" blocked: {}", s.blocked_reason));
        }
        if !s.error.is_empty() {
            line.push_str(&format!(" error: {}", s.error));
        }
        println!("{line}");
    }
    Ok(())
}
