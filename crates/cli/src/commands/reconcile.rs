// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb reconcile` — diff the live fleet against the composition and act.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::fly::FlyRuntime;
use crate::observe::observed_fleet;
use crate::output;
use bb_compose::Composition;
use bb_planner::{plan, ActionView, Executor};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct ReconcileArgs {
    /// Composition file declaring the desired fleet
    #[arg(long, default_value = "fleet.toml")]
    pub composition: PathBuf,

    /// Print the plan without executing it
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle(args: ReconcileArgs, ctx: &AppContext) -> Result<(), ExitError> {
    let composition = Composition::load(&args.composition)?;
    let specs = composition.sprite_specs()?;
    let transport = ctx.transport();
    let observed = observed_fleet(&ctx.cancel, &transport).await?;

    let (actions, report) = plan(&specs, &composition.config_version(), &observed);
    let views: Vec<ActionView> = actions.iter().map(ActionView::from).collect();

    if args.dry_run {
        let lines = Executor::dry_run(actions);
        if ctx.format.is_json() {
            output::emit_success(
                "reconcile",
                serde_json::json!({
                    "dry_run": true,
                    "plan": report,
                    "actions": views,
                }),
            );
        } else {
            if lines.is_empty() {
                println!("Fleet matches the composition; nothing to do");
            }
            for line in lines {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let count = views.len();
    let runtime = FlyRuntime::new(&ctx.app);
    Executor::execute(&ctx.cancel, &runtime, actions).await?;

    if ctx.format.is_json() {
        output::emit_success(
            "reconcile",
            serde_json::json!({
                "dry_run": false,
                "plan": report,
                "actions": views,
                "executed": count,
            }),
        );
    } else if count == 0 {
        println!("Fleet matches the composition; nothing to do");
    } else {
        for view in &views {
            println!("{}", view.description);
        }
        println!("\n{count} action(s) executed");
    }
    Ok(())
}
