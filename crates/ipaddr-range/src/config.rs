//! Trie configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How an address trie treats keys that are neither single addresses nor prefix blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonBlockPolicy {
    /// Fail with [`Error::NotPrefixBlock`]
    #[default]
    Reject,
    /// Add every prefix block of the key's span
    Span,
}

/// Address trie configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieConfig {
    /// Treatment of keys that are not prefix blocks
    pub non_block_policy: NonBlockPolicy,
    /// Largest number of blocks a single spanned key may add
    pub max_span_blocks: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            non_block_policy: NonBlockPolicy::Reject,
            max_span_blocks: 256,
        }
    }
}

impl TrieConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrieConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_span_blocks == 0 {
            return Err(Error::InvalidConfig(
                "Maximum span blocks must be greater than 0".to_string(),
            ));
        }
        tracing::debug!(policy = ?self.non_block_policy, "Trie configuration validation passed");
        Ok(())
    }
}
