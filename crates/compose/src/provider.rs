// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Model-provider configuration for a sprite.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Provider selection, either inline (`provider = "anthropic"`) or a block
/// with provider-specific settings:
///
/// ```toml
/// [sprites.fern.provider]
/// name = "bedrock"
/// region = "us-east-1"
/// ```
///
/// Unrecognized block keys land in `additional` rather than a free-form map
/// at the call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), additional: BTreeMap::new() }
    }
}

impl<'de> Deserialize<'de> for ProviderConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Short(String),
            Block {
                name: String,
                #[serde(flatten)]
                additional: BTreeMap<String, String>,
            },
        }

        match Helper::deserialize(deserializer)? {
            Helper::Short(name) => Ok(ProviderConfig { name, additional: BTreeMap::new() }),
            Helper::Block { name, additional } => Ok(ProviderConfig { name, additional }),
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
