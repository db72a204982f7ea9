// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb liveness` — quick per-sprite liveness listing.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::output;
use bb_core::format_elapsed;
use bb_fleet::{liveness_report, DEFAULT_MAX_AGE_SECS};
use bb_registry::Registry;
use chrono::{Duration, Utc};
use clap::Args;

#[derive(Args)]
pub struct LivenessArgs {
    /// Sprites to report on; defaults to every registered sprite
    #[arg(long)]
    pub sprite: Vec<String>,

    /// Trust event-log rows at most this old before probing
    #[arg(long, default_value_t = DEFAULT_MAX_AGE_SECS)]
    pub max_age_secs: i64,
}

pub async fn handle(args: LivenessArgs, ctx: &AppContext) -> Result<(), ExitError> {
    if args.max_age_secs < 0 {
        return Err(ExitError::validation("--max-age-secs must be non-negative"));
    }

    let sprites = if args.sprite.is_empty() {
        Registry::load(&ctx.registry_path)?.names()
    } else {
        args.sprite.clone()
    };

    let transport = ctx.transport();
    let event_log = ctx.event_log();
    let rows = liveness_report(
        &ctx.cancel,
        &[("sprite-exec", &transport)],
        Some(&event_log),
        &sprites,
        Duration::seconds(args.max_age_secs),
        Utc::now(),
    )
    .await?;

    if ctx.format.is_json() {
        output::emit_success(
            "liveness",
            serde_json::to_value(&rows).unwrap_or_default(),
        );
        return Ok(());
    }

    for row in &rows {
        let age = row
            .age_secs
            .map(|s| format!(" ({} ago)", format_elapsed(s)))
            .unwrap_or_default();
        let detail = if row.detail.is_empty() {
            String::new()
        } else {
            format!(" — {}", row.detail)
        };
        println!("{:<12} {:<10} via {}{}{}", row.sprite, row.state.as_str(), row.source, age, detail);
    }
    Ok(())
}
