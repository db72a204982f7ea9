// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared per-invocation context: paths, output format, cancellation.

use crate::fly::FlyTransport;
use crate::output::OutputFormat;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub struct AppContext {
    pub registry_path: PathBuf,
    pub events_dir: PathBuf,
    pub app: String,
    pub format: OutputFormat,
    pub cancel: CancellationToken,
    pub trace_id: String,
}

impl AppContext {
    pub fn new(
        state_dir: Option<PathBuf>,
        app: String,
        format: OutputFormat,
        cancel: CancellationToken,
    ) -> Self {
        let state_dir = state_dir.unwrap_or_else(default_state_dir);
        tracing::debug!(state_dir = %state_dir.display(), "using state directory");
        Self {
            registry_path: state_dir.join("registry.toml"),
            events_dir: state_dir.join("events"),
            app,
            format,
            cancel,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn transport(&self) -> FlyTransport {
        FlyTransport::new(&self.app)
    }

    pub fn event_log(&self) -> bb_eventlog::EventLog {
        bb_eventlog::EventLog::new(&self.events_dir)
    }
}

fn default_state_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".bitterblossom")
}
