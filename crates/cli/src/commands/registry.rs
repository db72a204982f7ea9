// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb registry` — registry administration.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::output;
use bb_core::ErrorCode;
use bb_fleet::FleetTransport;
use bb_registry::{with_locked_registry, Registry};
use chrono::Utc;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

#[derive(Subcommand)]
pub enum RegistryCommand {
    /// Print the registry
    Show,
    /// Discover live machines and register their names
    Init,
    /// Release a sprite's reservation
    Unreserve {
        /// Sprite name
        name: String,
    },
}

pub async fn handle(args: RegistryArgs, ctx: &AppContext) -> Result<(), ExitError> {
    match args.command {
        RegistryCommand::Show => {
            let registry = Registry::load(&ctx.registry_path)?;
            if ctx.format.is_json() {
                output::emit_success(
                    "registry",
                    serde_json::to_value(&registry).unwrap_or_default(),
                );
                return Ok(());
            }
            if registry.sprites.is_empty() {
                println!("Registry is empty; run `bb registry init`");
                return Ok(());
            }
            for (name, entry) in &registry.sprites {
                let mut line = format!("{:<12} machine={}", name, entry.machine_id);
                if entry.assigned_at.is_some() {
                    line.push_str(&format!(
                        " reserved issue={} repo={}",
                        entry.assigned_issue, entry.assigned_repo
                    ));
                }
                println!("{line}");
            }
            Ok(())
        }
        RegistryCommand::Init => {
            let transport = ctx.transport();
            let listing = transport.list(&ctx.cancel).await?;
            let count = listing.len();
            let registered = with_locked_registry(&ctx.cancel, &ctx.registry_path, move |registry| {
                let now = Utc::now();
                for sprite in &listing {
                    if sprite.name.is_empty() || sprite.machine_id.is_empty() {
                        continue;
                    }
                    registry.register(&sprite.name, &sprite.machine_id, now);
                }
                Ok(registry.sprites.len())
            })
            .await?;

            if ctx.format.is_json() {
                output::emit_success(
                    "registry",
                    serde_json::json!({ "discovered": count, "registered": registered }),
                );
            } else {
                println!("Discovered {count} machine(s); registry now holds {registered}");
            }
            Ok(())
        }
        RegistryCommand::Unreserve { name } => {
            let released =
                with_locked_registry(&ctx.cancel, &ctx.registry_path, move |registry| {
                    Ok(registry.release(&name))
                })
                .await?;
            if !released {
                return Err(ExitError::new(
                    ErrorCode::RemoteState,
                    "sprite not found in registry",
                )
                .with_remediation("run `bb registry show` to list known sprites"));
            }
            if ctx.format.is_json() {
                output::emit_success("registry", serde_json::json!({ "released": true }));
            } else {
                println!("Reservation released");
            }
            Ok(())
        }
    }
}
