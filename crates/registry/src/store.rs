// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk registry: sprite name → machine id plus reservation metadata.
//!
//! The file is TOML so operators can read and hand-edit it:
//!
//! ```toml
//! [meta]
//! app = "bitterblossom"
//! init_at = "2026-07-01T09:00:00Z"
//!
//! [sprites.bramble]
//! machine_id = "d8d1a2f3"
//! created_at = "2026-07-01T09:00:02Z"
//! assigned_issue = 186
//! assigned_repo = "misty-step/bitterblossom"
//! assigned_at = "2026-07-30T17:12:44Z"
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("registry file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("registry lock cancelled for {0}")]
    Cancelled(PathBuf),
}

/// App name stamped into freshly-created registries.
pub const DEFAULT_APP: &str = "bitterblossom";

fn io_err(path: &Path, source: std::io::Error) -> RegistryError {
    RegistryError::Io { path: path.to_path_buf(), source }
}

/// Top-level registry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMeta {
    pub app: String,
    pub init_at: DateTime<Utc>,
}

/// One sprite's durable identity and reservation state.
///
/// Reservation state is the triple (assigned_issue, assigned_repo,
/// assigned_at); `assigned_at = None` and `assigned_issue = 0` both mean
/// "unreserved" and survive round-trip without a separate presence flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub machine_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assigned_issue: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assigned_repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
}

impl RegistryEntry {
    /// Whether this entry holds a live reservation: `now - assigned_at` must
    /// be strictly less than the TTL. A reservation aged exactly TTL is free.
    pub fn is_reserved(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.assigned_at {
            Some(at) => now - at < ttl,
            None => false,
        }
    }
}

/// Persistent mapping from sprite name to registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub meta: RegistryMeta,
    #[serde(default)]
    pub sprites: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new(app: impl Into<String>, init_at: DateTime<Utc>) -> Self {
        Self {
            meta: RegistryMeta { app: app.into(), init_at },
            sprites: BTreeMap::new(),
        }
    }

    /// Load the registry, or an empty one if the file does not exist.
    /// A corrupt file is an error; callers decide whether to start fresh.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::new(DEFAULT_APP, Utc::now()));
            }
            Err(e) => return Err(io_err(path, e)),
        };
        toml::from_str(&text).map_err(|source| RegistryError::Corrupt {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Atomically replace the registry file: write a temporary sibling,
    /// fsync, rename over the destination. The registry lock must be held.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let text = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        {
            let mut file = std::fs::File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
            file.write_all(text.as_bytes()).map_err(|e| io_err(&tmp, e))?;
            file.sync_all().map_err(|e| io_err(&tmp, e))?;
        }
        std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
        Ok(())
    }

    /// Create or overwrite an entry, preserving `created_at` when the name
    /// is already registered.
    pub fn register(&mut self, name: impl Into<String>, machine_id: impl Into<String>, now: DateTime<Utc>) {
        let name = name.into();
        let machine_id = machine_id.into();
        match self.sprites.get_mut(&name) {
            Some(entry) => entry.machine_id = machine_id,
            None => {
                self.sprites.insert(
                    name,
                    RegistryEntry {
                        machine_id,
                        created_at: now,
                        assigned_issue: 0,
                        assigned_repo: String::new(),
                        assigned_at: None,
                    },
                );
            }
        }
    }

    pub fn lookup_machine(&self, name: &str) -> Option<&str> {
        self.sprites.get(name).map(|e| e.machine_id.as_str())
    }

    pub fn lookup_name(&self, machine_id: &str) -> Option<&str> {
        self.sprites
            .iter()
            .find(|(_, e)| e.machine_id == machine_id)
            .map(|(name, _)| name.as_str())
    }

    /// Sorted sprite names. The order is the dispatch scan order, so it must
    /// be stable across invocations.
    pub fn names(&self) -> Vec<String> {
        self.sprites.keys().cloned().collect()
    }

    /// Write a reservation onto an entry. Returns false when the name is not
    /// registered.
    pub fn reserve(&mut self, name: &str, issue: u64, repo: &str, now: DateTime<Utc>) -> bool {
        match self.sprites.get_mut(name) {
            Some(entry) => {
                entry.assigned_issue = issue;
                entry.assigned_repo = repo.trim().to_string();
                entry.assigned_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Zero out an entry's reservation. Returns false when the name is not
    /// registered.
    pub fn release(&mut self, name: &str) -> bool {
        match self.sprites.get_mut(name) {
            Some(entry) => {
                entry.assigned_issue = 0;
                entry.assigned_repo = String::new();
                entry.assigned_at = None;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
