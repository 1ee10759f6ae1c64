//! Address trie: a set of prefix blocks and addresses

use super::key::TrieKey;
use super::map::AssociativeAddressTrie;
use crate::config::{NonBlockPolicy, TrieConfig};
use crate::{Error, Result};
use tracing::debug;

/// Set of prefix blocks and single addresses in trie order
#[derive(Debug, Clone)]
pub struct AddressTrie<K> {
    inner: AssociativeAddressTrie<K, ()>,
    config: TrieConfig,
}

impl<K> Default for AddressTrie<K> {
    fn default() -> Self {
        Self {
            inner: AssociativeAddressTrie::default(),
            config: TrieConfig::default(),
        }
    }
}

impl<K: TrieKey> AddressTrie<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrieConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: AssociativeAddressTrie::new(),
            config,
        })
    }

    pub fn config(&self) -> &TrieConfig {
        &self.config
    }

    /// Add `key`, returning whether the trie changed
    ///
    /// A range that is no single prefix block is rejected, or with
    /// [`NonBlockPolicy::Span`] replaced by the prefix blocks spanning it.
    pub fn add(&mut self, key: K) -> Result<bool> {
        if key.to_block_or_address().is_some() {
            return Ok(self.inner.put(key, ())?.is_none());
        }
        if self.config.non_block_policy == NonBlockPolicy::Reject {
            return Err(Error::NotPrefixBlock(format!("{:?}", key)));
        }
        if let Some(bits) = self.inner.bit_count() {
            if bits != key.bit_count() {
                return Err(Error::BitCountMismatch(bits, key.bit_count()));
            }
        }
        let blocks = key.span_with_prefix_blocks();
        if blocks.len() > self.config.max_span_blocks {
            debug!(
                blocks = blocks.len(),
                limit = self.config.max_span_blocks,
                "span exceeds block limit"
            );
            return Err(Error::NotPrefixBlock(format!(
                "{:?} spans {} blocks, limit is {}",
                key,
                blocks.len(),
                self.config.max_span_blocks
            )));
        }
        let mut changed = false;
        for block in blocks {
            changed |= self.inner.put(block, ())?.is_none();
        }
        Ok(changed)
    }

    /// Remove `key`, returning whether it was present
    pub fn remove(&mut self, key: &K) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    pub fn longest_prefix_match(&self, key: &K) -> Option<&K> {
        self.inner.longest_prefix_match(key).map(|(k, _)| k)
    }

    pub fn elements_containing(&self, key: &K) -> Vec<&K> {
        keys(self.inner.elements_containing(key))
    }

    pub fn elements_contain(&self, key: &K) -> bool {
        self.inner.elements_contain(key)
    }

    pub fn elements_contained_by(&self, key: &K) -> Vec<&K> {
        keys(self.inner.elements_contained_by(key))
    }

    pub fn floor(&self, key: &K) -> Option<&K> {
        self.inner.floor(key).map(|(k, _)| k)
    }

    pub fn lower(&self, key: &K) -> Option<&K> {
        self.inner.lower(key).map(|(k, _)| k)
    }

    pub fn ceiling(&self, key: &K) -> Option<&K> {
        self.inner.ceiling(key).map(|(k, _)| k)
    }

    pub fn higher(&self, key: &K) -> Option<&K> {
        self.inner.higher(key).map(|(k, _)| k)
    }

    pub fn first(&self) -> Option<&K> {
        self.inner.first().map(|(k, _)| k)
    }

    pub fn last(&self) -> Option<&K> {
        self.inner.last().map(|(k, _)| k)
    }

    /// Keys in trie order
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.inner.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

fn keys<'a, K>(entries: Vec<(&'a K, &'a ())>) -> Vec<&'a K> {
    entries.into_iter().map(|(k, _)| k).collect()
}
