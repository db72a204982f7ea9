// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bb events` — event log access.

use crate::context::AppContext;
use crate::exit_error::ExitError;
use crate::output;
use bb_eventlog::{EventKind, EventQuery, TaskEvent};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events, newest window first
    List {
        #[arg(long)]
        sprite: Option<String>,
        #[arg(long)]
        task: Option<String>,
        /// Event kind, e.g. heartbeat or completed
        #[arg(long)]
        kind: Option<String>,
        /// RFC3339 lower bound (inclusive)
        #[arg(long)]
        since: Option<String>,
        /// RFC3339 upper bound (inclusive)
        #[arg(long)]
        until: Option<String>,
        /// Maximum rows; 0 means no limit
        #[arg(long, default_value_t = 0)]
        limit: i64,
    },
    /// Append one event (normally done by sprites, useful for repair)
    Append {
        #[arg(long)]
        sprite: String,
        #[arg(long)]
        task: String,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        repo: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        issue: Option<u64>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        commits: Option<u64>,
        /// Extra key=value detail pairs
        #[arg(long)]
        detail: Vec<String>,
    },
}

fn parse_kind(kind: &str) -> Result<EventKind, ExitError> {
    // Strict here, unlike the scan path: a typo should not silently become
    // a catch-all event.
    match kind {
        "dispatch_started" => Ok(EventKind::DispatchStarted),
        "repo_setup_started" => Ok(EventKind::RepoSetupStarted),
        "agent_started" => Ok(EventKind::AgentStarted),
        "heartbeat" => Ok(EventKind::Heartbeat),
        "blocked" => Ok(EventKind::Blocked),
        "completed" => Ok(EventKind::Completed),
        "failed" => Ok(EventKind::Failed),
        _ => Err(ExitError::validation(format!("unknown event kind {kind:?}"))),
    }
}

fn parse_rfc3339(label: &str, value: &str) -> Result<DateTime<Utc>, ExitError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ExitError::validation(format!("--{label} is not RFC3339: {e}")))
}

pub async fn handle(args: EventsArgs, ctx: &AppContext) -> Result<(), ExitError> {
    match args.command {
        EventsCommand::List { sprite, task, kind, since, until, limit } => {
            if limit < 0 {
                return Err(ExitError::validation("--limit must be non-negative"));
            }
            let query = EventQuery {
                sprite,
                task_id: task,
                kind: kind.as_deref().map(parse_kind).transpose()?,
                since: since.as_deref().map(|s| parse_rfc3339("since", s)).transpose()?,
                until: until.as_deref().map(|s| parse_rfc3339("until", s)).transpose()?,
                limit: limit as usize,
            };
            let events = ctx.event_log().query(&query)?;

            if ctx.format.is_json() {
                output::emit_success(
                    "events",
                    serde_json::json!({ "events": events, "count": events.len() }),
                );
                return Ok(());
            }
            for event in &events {
                let ts = event
                    .timestamp
                    .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                    .unwrap_or_else(|| "-".to_string());
                let mut line =
                    format!("{ts} {:<12} {:<16} {}", event.sprite, event.task_id, event.kind);
                if !event.reason.is_empty() {
                    line.push_str(&format!(" — {}", event.reason));
                }
                println!("{line}");
            }
            Ok(())
        }
        EventsCommand::Append {
            sprite,
            task,
            kind,
            repo,
            branch,
            issue,
            reason,
            commits,
            detail,
        } => {
            let kind = parse_kind(&kind)?;
            let mut event =
                TaskEvent::new(uuid::Uuid::new_v4().to_string(), sprite, task, kind);
            if let Some(repo) = repo {
                event = event.with_repo(repo);
            }
            if let Some(branch) = branch {
                event = event.with_branch(branch);
            }
            if let Some(issue) = issue {
                event = event.with_issue(issue);
            }
            if let Some(reason) = reason {
                event = event.with_reason(reason);
            }
            if let Some(commits) = commits {
                event = event.with_commits(commits);
            }
            for pair in detail {
                let Some((key, value)) = pair.split_once('=') else {
                    return Err(ExitError::validation(format!(
                        "--detail expects key=value, got {pair:?}"
                    )));
                };
                event = event.with_detail(key, value);
            }

            let written = ctx.event_log().append(event)?;
            if ctx.format.is_json() {
                output::emit_success(
                    "events",
                    serde_json::to_value(&written).unwrap_or_default(),
                );
            } else {
                println!("Appended {} for {}/{}", written.kind, written.sprite, written.task_id);
            }
            Ok(())
        }
    }
}
