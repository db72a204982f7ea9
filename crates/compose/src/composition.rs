// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition file parsing and validation.

use crate::provider::ProviderConfig;
use bb_core::{SpriteName, SpriteNameError, SpriteSpec};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("failed to read composition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse composition {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("composition version must be a positive integer")]
    BadVersion,
    #[error("composition name must not be empty")]
    EmptyName,
    #[error("invalid sprite name: {0}")]
    BadSpriteName(#[from] SpriteNameError),
    #[error("sprite {0}: definition path must not be empty")]
    EmptyDefinition(String),
}

/// Declared configuration of one sprite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpriteDef {
    /// Sprite name (injected from map key)
    #[serde(skip)]
    pub name: String,
    /// Path to the persona definition asset.
    pub definition: PathBuf,
    /// Free-form routing preference, e.g. which repos this sprite favors.
    #[serde(default)]
    pub preference: Option<String>,
    /// Free-form working-style note surfaced to the agent.
    #[serde(default)]
    pub philosophy: Option<String>,
    /// Whether this sprite absorbs work when its preferred peers are busy.
    #[serde(default)]
    pub fallback: bool,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawComposition {
    version: u64,
    name: String,
    #[serde(default)]
    sprites: BTreeMap<String, SpriteDef>,
}

/// Desired fleet state, parsed from a composition file.
#[derive(Debug, Clone)]
pub struct Composition {
    pub version: u64,
    pub name: String,
    pub source_path: PathBuf,
    /// Sorted by sprite name.
    pub sprites: Vec<SpriteDef>,
}

impl Composition {
    /// Load and validate a composition file.
    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ComposeError::Read { path: path.to_path_buf(), source })?;
        let raw: RawComposition = toml::from_str(&text).map_err(|source| ComposeError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        if raw.version == 0 {
            return Err(ComposeError::BadVersion);
        }
        if raw.name.trim().is_empty() {
            return Err(ComposeError::EmptyName);
        }

        let mut sprites = Vec::with_capacity(raw.sprites.len());
        for (name, mut def) in raw.sprites {
            SpriteName::parse(name.as_str())?;
            if def.definition.as_os_str().is_empty() {
                return Err(ComposeError::EmptyDefinition(name));
            }
            def.name = name;
            sprites.push(def);
        }
        // BTreeMap iteration already yields name order; keep the invariant
        // explicit for programmatically-built values.
        sprites.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            path = %path.display(),
            version = raw.version,
            sprites = sprites.len(),
            "loaded composition"
        );

        Ok(Self { version: raw.version, name: raw.name, source_path: path.to_path_buf(), sprites })
    }

    /// Desired config version as a string. A zero/absent version renders as
    /// the empty string so blank-vs-blank never counts as drift.
    pub fn config_version(&self) -> String {
        config_version_string(self.version)
    }

    /// Desired specs for the planner, sorted by name.
    ///
    /// The persona defaults to the definition asset's file stem, so
    /// `personas/bramble.md` yields persona `bramble`.
    pub fn sprite_specs(&self) -> Result<Vec<SpriteSpec>, SpriteNameError> {
        self.sprites
            .iter()
            .map(|def| {
                let persona = def
                    .definition
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| def.name.clone());
                Ok(SpriteSpec {
                    name: SpriteName::parse(def.name.as_str())?,
                    persona,
                    definition: def.definition.clone(),
                    fallback: def.fallback,
                })
            })
            .collect()
    }
}

/// Render a composition version for drift comparison. Zero means "unversioned"
/// and renders as the empty string.
pub fn config_version_string(version: u64) -> String {
    if version == 0 {
        String::new()
    } else {
        version.to_string()
    }
}

#[cfg(test)]
#[path = "composition_tests.rs"]
mod tests;
