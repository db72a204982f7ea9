// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb: the bitterblossom fleet controller CLI.

mod commands;
mod context;
mod exit_error;
mod fly;
mod observe;
mod output;

use clap::{Parser, Subcommand};
use context::AppContext;
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "bb", about = "Controller for a fleet of sprite worker VMs", version)]
struct Cli {
    /// Emit the machine-readable result envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    /// State directory (registry, event log). Defaults to ~/.bitterblossom
    #[arg(long, global = true, env = "BB_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Platform app the sprite machines live in
    #[arg(long, global = true, env = "BB_APP", default_value = "bitterblossom")]
    app: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the live fleet against a composition
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Dispatch an issue to an eligible sprite
    Dispatch(commands::dispatch::DispatchArgs),
    /// Fleet status overview
    Status(commands::status::StatusArgs),
    /// Quick per-sprite liveness listing
    Liveness(commands::liveness::LivenessArgs),
    /// Materialized task snapshots from the event log
    Tasks(commands::tasks::TasksArgs),
    /// Query or append task events
    Events(commands::events::EventsArgs),
    /// Inspect and administer the sprite registry
    Registry(commands::registry::RegistryArgs),
}

impl Commands {
    /// Envelope command name.
    fn name(&self) -> &'static str {
        match self {
            Commands::Reconcile(_) => "reconcile",
            Commands::Dispatch(_) => "dispatch",
            Commands::Status(_) => "status",
            Commands::Liveness(_) => "liveness",
            Commands::Tasks(_) => "tasks",
            Commands::Events(_) => "events",
            Commands::Registry(_) => "registry",
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("BB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands, ctx: &AppContext) -> Result<(), ExitError> {
    match command {
        Commands::Reconcile(args) => commands::reconcile::handle(args, ctx).await,
        Commands::Dispatch(args) => commands::dispatch::handle(args, ctx).await,
        Commands::Status(args) => commands::status::handle(args, ctx).await,
        Commands::Liveness(args) => commands::liveness::handle(args, ctx).await,
        Commands::Tasks(args) => commands::tasks::handle(args, ctx).await,
        Commands::Events(args) => commands::events::handle(args, ctx).await,
        Commands::Registry(args) => commands::registry::handle(args, ctx).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let ctx = AppContext::new(
        cli.state_dir,
        cli.app,
        OutputFormat::from_json_flag(cli.json),
        cancel.clone(),
    );
    let command_name = cli.command.name();

    let outcome = tokio::select! {
        outcome = run(cli.command, &ctx) => outcome,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            eprintln!("interrupted");
            std::process::exit(bb_core::EXIT_INTERRUPTED);
        }
    };

    match outcome {
        Ok(()) => {}
        Err(error) => {
            if ctx.format.is_json() {
                output::emit_failure(command_name, &error, &ctx.trace_id);
            } else {
                eprintln!("error: {error}");
                if let Some(remediation) = &error.remediation {
                    eprintln!("  {remediation}");
                }
            }
            std::process::exit(error.exit_code());
        }
    }
}
