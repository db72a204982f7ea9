// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb status` — fleet overview.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::output;
use bb_compose::Composition;
use bb_core::format_elapsed;
use bb_fleet::{fleet_overview, StatusOptions};
use chrono::{Duration, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct StatusArgs {
    /// Composition to cross-reference; missing file means no declared fleet
    #[arg(long, default_value = "fleet.toml")]
    pub composition: PathBuf,

    /// Fetch per-sprite task detail
    #[arg(long)]
    pub tasks: bool,

    /// Probe reachability of every ready sprite
    #[arg(long)]
    pub probe: bool,

    /// Copy checkpoint metadata into the report
    #[arg(long)]
    pub checkpoints: bool,

    /// Staleness threshold in seconds (implies fetching detail)
    #[arg(long)]
    pub stale_threshold_secs: Option<i64>,

    /// Per-sprite probe timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub probe_timeout_secs: u64,
}

pub async fn handle(args: StatusArgs, ctx: &AppContext) -> Result<(), ExitError> {
    if args.stale_threshold_secs.is_some_and(|s| s < 0) {
        return Err(ExitError::validation("--stale-threshold-secs must be non-negative"));
    }

    let declared: Vec<String> = match Composition::load(&args.composition) {
        Ok(composition) => composition.sprites.iter().map(|s| s.name.clone()).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "composition unavailable; reporting live fleet only");
            Vec::new()
        }
    };

    let options = StatusOptions {
        include_checkpoints: args.checkpoints,
        include_tasks: args.tasks,
        include_probe: args.probe,
        probe_timeout: std::time::Duration::from_secs(args.probe_timeout_secs),
        stale_threshold: args.stale_threshold_secs.map(Duration::seconds),
    };

    let transport = ctx.transport();
    let overview = fleet_overview(&ctx.cancel, &transport, &declared, &options).await?;

    if ctx.format.is_json() {
        output::emit_success("status", serde_json::to_value(&overview).unwrap_or_default());
        return Ok(());
    }

    let now = Utc::now();
    for sprite in &overview.sprites {
        let mut line = format!("{:<12} {:<12}", sprite.name, sprite.display_state.as_str());
        if sprite.orphan {
            line.push_str(" [orphan]");
        }
        if sprite.stale {
            line.push_str(" [stale]");
        }
        if !sprite.current_task.is_empty() {
            line.push_str(&format!(" task={}", sprite.current_task));
        }
        if let Some(at) = sprite.last_activity {
            line.push_str(&format!(" active {} ago", format_elapsed((now - at).num_seconds())));
        }
        if let Some(probe) = &sprite.probe {
            line.push_str(if probe.ok { " probe=ok" } else { " probe=FAILED" });
        }
        println!("{line}");
    }
    for name in &overview.missing {
        println!("{name:<12} missing (declared but not provisioned)");
    }
    let s = &overview.summary;
    println!(
        "\n{} sprite(s): {} idle, {} busy, {} offline, {} unknown, {} orphaned, {} stale, {} with tasks",
        s.total, s.idle, s.busy, s.offline, s.unknown, s.orphaned, s.stale, s.with_tasks
    );
    Ok(())
}
