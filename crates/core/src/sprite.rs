// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sprite identity, desired spec, and observed status.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

/// Validation failure for a sprite name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpriteNameError {
    #[error("sprite name is empty")]
    Empty,
    #[error("sprite name {0:?} must begin with a lowercase letter")]
    BadFirstChar(String),
    #[error("sprite name {0:?} may only contain lowercase letters, digits, and hyphens")]
    BadChar(String),
}

/// Logical name of a sprite: lowercase alphanumeric plus hyphens, beginning
/// with a letter. Validated at parse so the rest of the controller can treat
/// names as well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpriteName(String);

impl SpriteName {
    pub fn parse(name: impl Into<String>) -> Result<Self, SpriteNameError> {
        let name = name.into();
        let mut chars = name.chars();
        match chars.next() {
            None => return Err(SpriteNameError::Empty),
            Some(c) if !c.is_ascii_lowercase() => {
                return Err(SpriteNameError::BadFirstChar(name));
            }
            Some(_) => {}
        }
        if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(SpriteNameError::BadChar(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpriteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SpriteName {
    type Error = SpriteNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<SpriteName> for String {
    fn from(name: SpriteName) -> Self {
        name.0
    }
}

impl PartialEq<str> for SpriteName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SpriteName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for SpriteName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Desired configuration of one sprite, loaded from the composition.
/// Immutable during a planning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSpec {
    pub name: SpriteName,
    /// Behavior profile the sprite should run. Conventionally the file stem
    /// of `definition`.
    pub persona: String,
    /// Path to the persona definition asset.
    pub definition: PathBuf,
    /// Whether this sprite may absorb work when its preferred peers are busy.
    #[serde(default)]
    pub fallback: bool,
}

/// Observed lifecycle state of a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpriteState {
    Provisioned,
    Idle,
    Working,
    Done,
    Blocked,
    Dead,
}

impl SpriteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpriteState::Provisioned => "provisioned",
            SpriteState::Idle => "idle",
            SpriteState::Working => "working",
            SpriteState::Done => "done",
            SpriteState::Blocked => "blocked",
            SpriteState::Dead => "dead",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "provisioned" => Some(SpriteState::Provisioned),
            "idle" => Some(SpriteState::Idle),
            "working" => Some(SpriteState::Working),
            "done" => Some(SpriteState::Done),
            "blocked" => Some(SpriteState::Blocked),
            "dead" => Some(SpriteState::Dead),
            _ => None,
        }
    }

    /// A sprite mid-task. Drift on such a sprite needs a redispatch after the
    /// update lands.
    pub fn is_active(&self) -> bool {
        matches!(self, SpriteState::Working | SpriteState::Blocked)
    }
}

impl fmt::Display for SpriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observation of a live sprite. Multiple observations may share a name;
/// the first is canonical and the rest are duplicates targeted for teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteStatus {
    pub name: String,
    pub machine_id: String,
    pub persona: String,
    pub config_version: String,
    pub state: SpriteState,
}

#[cfg(test)]
#[path = "sprite_tests.rs"]
mod tests;
