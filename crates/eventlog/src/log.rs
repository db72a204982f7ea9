// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Day-file storage: locked append and shared-lock scans.

use crate::event::{EventKind, TaskEvent};
use crate::snapshot::{materialize, TaskSnapshot};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upper bound on rows returned by a single query. Historically a buried
/// constant; configurable via [`EventLog::with_max_scan`].
pub const DEFAULT_MAX_SCAN: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("event log i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

fn io_err(path: &Path, source: std::io::Error) -> EventLogError {
    EventLogError::Io { path: path.to_path_buf(), source }
}

/// `YYYY-MM-DD.jsonl` for the event's UTC day.
pub fn day_file_name(timestamp: DateTime<Utc>) -> String {
    format!("{}.jsonl", timestamp.format("%Y-%m-%d"))
}

fn parse_day_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(".jsonl")?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Predicates for an event scan. `limit = 0` means "no limit" (still bounded
/// by the log's max scan).
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub sprite: Option<String>,
    pub task_id: Option<String>,
    pub kind: Option<EventKind>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl EventQuery {
    fn matches(&self, event: &TaskEvent) -> bool {
        if let Some(sprite) = &self.sprite {
            if &event.sprite != sprite {
                return false;
            }
        }
        if let Some(task_id) = &self.task_id {
            if &event.task_id != task_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if event.kind != kind {
                return false;
            }
        }
        let ts = event.effective_timestamp();
        if let Some(since) = self.since {
            if ts < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if ts > until {
                return false;
            }
        }
        true
    }
}

/// Append-only NDJSON event log under a single directory.
pub struct EventLog {
    dir: PathBuf,
    max_scan: usize,
}

impl EventLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), max_scan: DEFAULT_MAX_SCAN }
    }

    pub fn with_max_scan(mut self, max_scan: usize) -> Self {
        self.max_scan = max_scan;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one event under the day's exclusive lock. A missing timestamp
    /// is filled with now-UTC. Returns the event as written.
    pub fn append(&self, mut event: TaskEvent) -> Result<TaskEvent, EventLogError> {
        if event.id.trim().is_empty() {
            return Err(EventLogError::InvalidEvent("empty id".into()));
        }
        if event.sprite.trim().is_empty() {
            return Err(EventLogError::InvalidEvent("empty sprite".into()));
        }
        if event.task_id.trim().is_empty() {
            return Err(EventLogError::InvalidEvent("empty task_id".into()));
        }
        let timestamp = event.timestamp.unwrap_or_else(Utc::now);
        event.timestamp = Some(timestamp);

        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        let path = self.dir.join(day_file_name(timestamp));
        let line = serde_json::to_string(&event)?;

        let lock = self.open_lock(&path)?;
        lock.lock_exclusive().map_err(|e| io_err(&path, e))?;
        let result = (|| {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| io_err(&path, e))?;
            writeln!(file, "{line}").map_err(|e| io_err(&path, e))?;
            file.sync_all().map_err(|e| io_err(&path, e))
        })();
        let _ = FileExt::unlock(&lock);
        result?;

        tracing::debug!(
            sprite = %event.sprite,
            task = %event.task_id,
            kind = %event.kind,
            "event appended"
        );
        Ok(event)
    }

    /// Scan the day files overlapping the query window and return matching
    /// events sorted by timestamp ascending (append order for ties).
    ///
    /// With `limit > 0` the scan walks files newest-first, stops once the
    /// limit is met, and trims to the final `limit` entries.
    pub fn query(&self, query: &EventQuery) -> Result<Vec<TaskEvent>, EventLogError> {
        let mut days = self.day_files(query)?;
        if days.is_empty() {
            return Ok(Vec::new());
        }

        let effective_limit = if query.limit > 0 {
            query.limit.min(self.max_scan)
        } else {
            self.max_scan
        };

        let mut results: Vec<TaskEvent> = Vec::new();
        if query.limit > 0 {
            days.reverse();
        }
        for (_, path) in &days {
            let batch = self.scan_file(path, query)?;
            results.extend(batch);
            if query.limit > 0 && results.len() >= effective_limit {
                break;
            }
            if results.len() >= self.max_scan {
                tracing::warn!(max_scan = self.max_scan, "event scan hit the configured bound");
                break;
            }
        }

        results.sort_by_key(TaskEvent::effective_timestamp);
        if results.len() > effective_limit {
            results.drain(..results.len() - effective_limit);
        }
        Ok(results)
    }

    /// Materialize latest state per (sprite, task). `stale_threshold` of zero
    /// disables the staleness override.
    pub fn snapshot(
        &self,
        now: DateTime<Utc>,
        stale_threshold: Duration,
    ) -> Result<Vec<TaskSnapshot>, EventLogError> {
        let events = self.query(&EventQuery::default())?;
        Ok(materialize(&events, now, stale_threshold))
    }

    /// Snapshots for one sprite only.
    pub fn sprite_snapshot(
        &self,
        sprite: &str,
        now: DateTime<Utc>,
        stale_threshold: Duration,
    ) -> Result<Vec<TaskSnapshot>, EventLogError> {
        let events =
            self.query(&EventQuery { sprite: Some(sprite.to_string()), ..Default::default() })?;
        Ok(materialize(&events, now, stale_threshold))
    }

    /// Latest event per sprite across all tasks, for quick liveness listings.
    pub fn latest_per_sprite(&self) -> Result<BTreeMap<String, TaskEvent>, EventLogError> {
        let events = self.query(&EventQuery::default())?;
        let mut latest: BTreeMap<String, TaskEvent> = BTreeMap::new();
        for event in events {
            // Query order is timestamp-ascending, so later wins.
            latest.insert(event.sprite.clone(), event);
        }
        Ok(latest)
    }

    /// Overlay a probe result as a synthetic heartbeat event. Snapshots are
    /// never mutated in place; consumers see the overlay through normal
    /// materialization. The id is derived from its inputs so repeated
    /// overlays within one second coalesce at the consumer.
    pub fn update_probe_status(
        &self,
        sprite: &str,
        task_id: &str,
        status: crate::snapshot::ProbeStatus,
        now: DateTime<Utc>,
    ) -> Result<TaskEvent, EventLogError> {
        let event = TaskEvent::new(
            format!("probe-{sprite}-{task_id}-{}", now.timestamp()),
            sprite,
            task_id,
            EventKind::Heartbeat,
        )
        .at(now)
        .with_detail("probe_status", status.as_str());
        self.append(event)
    }

    fn open_lock(&self, day_path: &Path) -> Result<std::fs::File, EventLogError> {
        let mut name = day_path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        let lock_path = day_path.with_file_name(name);
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_err(&lock_path, e))
    }

    /// Day files overlapping the query window, sorted by date ascending.
    /// An absent directory is an empty log, not an error.
    fn day_files(&self, query: &EventQuery) -> Result<Vec<(NaiveDate, PathBuf)>, EventLogError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.dir, e)),
        };
        let since_day = query.since.map(|t| t.date_naive());
        let until_day = query.until.map(|t| t.date_naive());
        let mut days = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.dir, e))?;
            let name = entry.file_name();
            let Some(date) = parse_day_file_name(&name.to_string_lossy()) else {
                continue;
            };
            if since_day.is_some_and(|d| date < d) || until_day.is_some_and(|d| date > d) {
                continue;
            }
            days.push((date, entry.path()));
        }
        days.sort_by_key(|(date, _)| *date);
        Ok(days)
    }

    /// Parse one day file under its shared lock, skipping malformed lines.
    fn scan_file(&self, path: &Path, query: &EventQuery) -> Result<Vec<TaskEvent>, EventLogError> {
        let lock = self.open_lock(path)?;
        lock.lock_shared().map_err(|e| io_err(path, e))?;
        let text = std::fs::read_to_string(path);
        let _ = FileExt::unlock(&lock);

        let text = match text {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(path, e)),
        };

        let mut events = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Malformed lines are skipped for forward compatibility.
            let Ok(event) = serde_json::from_str::<TaskEvent>(line) else {
                continue;
            };
            if query.matches(&event) {
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
