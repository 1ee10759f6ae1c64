//! Associative address trie: prefix blocks and addresses mapped to values

use super::iter::Iter;
use super::key::TrieKey;
use super::node::{Link, TrieNode};
use crate::{Error, Result};
use tracing::{debug, trace};

/// Binary trie of prefix blocks and single addresses, each with a value
///
/// Keys are kept in trie order (see [`TrieKey::trie_compare`]), so every
/// block's subtree holds exactly the stored keys inside the block. The root is
/// the zero-length block, created by the first insertion and never removed.
/// Mutation needs `&mut self`; share across threads behind a lock.
#[derive(Debug, Clone)]
pub struct AssociativeAddressTrie<K, V> {
    root: Link<K, V>,
    len: usize,
}

impl<K, V> Default for AssociativeAddressTrie<K, V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<K: TrieKey, V> AssociativeAddressTrie<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of added keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Bit count of the keys this trie holds, once a key was added
    pub fn bit_count(&self) -> Option<u32> {
        self.root.as_ref().map(|root| root.key.bit_count())
    }

    /// Key as stored: an unprefixed single address or an exact prefix block
    fn normalize(key: &K) -> Result<K> {
        key.to_block_or_address()
            .ok_or_else(|| Error::NotPrefixBlock(format!("{:?}", key)))
    }

    fn check_size(&self, key: &K) -> Result<()> {
        match self.bit_count() {
            Some(bits) if bits != key.bit_count() => {
                Err(Error::BitCountMismatch(bits, key.bit_count()))
            }
            _ => Ok(()),
        }
    }

    /// Normalised query key, if it can match anything in this trie
    fn query(&self, key: &K) -> Option<(&TrieNode<K, V>, K)> {
        let root = self.root.as_deref()?;
        if root.key.bit_count() != key.bit_count() {
            return None;
        }
        Some((root, key.to_block_or_address()?))
    }

    /// Map `key` to `value`, returning the value it replaced
    ///
    /// Prefixed single addresses are stored unprefixed. Keys that are neither
    /// an address nor a single prefix block fail with [`Error::NotPrefixBlock`].
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        self.check_size(&key)?;
        let key = Self::normalize(&key).inspect_err(|e| debug!(error = %e, "rejected trie key"))?;
        let root = self
            .root
            .get_or_insert_with(|| Box::new(TrieNode::structural(key.to_prefix_block_key(0))));
        let replaced = root.put(key, value);
        if replaced.is_none() {
            self.len += 1;
        }
        Ok(replaced)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let (root, key) = self.query(key)?;
        root.find(&key)?.value.as_ref()
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let root = self.root.as_deref_mut()?;
        if root.key.bit_count() != key.bit_count() {
            return None;
        }
        let key = key.to_block_or_address()?;
        root.find_mut(&key)?.value.as_mut()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning its value
    ///
    /// Structural nodes left with fewer than two children are collapsed.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let root = self.root.as_deref_mut()?;
        if root.key.bit_count() != key.bit_count() {
            return None;
        }
        let key = key.to_block_or_address()?;
        let removed = if key.trie_prefix_len() == 0 {
            root.value.take()
        } else {
            let side = root.side(&key);
            TrieNode::remove_from(&mut root.children[side], &key)
        };
        if removed.is_some() {
            trace!(key = ?key, "removed trie key");
            self.len -= 1;
        }
        removed
    }

    /// The most specific added block or address containing `key`
    pub fn longest_prefix_match(&self, key: &K) -> Option<(&K, &V)> {
        self.elements_containing(key).pop()
    }

    /// Added blocks and addresses containing `key`, from the shortest prefix down
    pub fn elements_containing(&self, key: &K) -> Vec<(&K, &V)> {
        let Some((root, key)) = self.query(key) else {
            return Vec::new();
        };
        root.path_to(&key)
            .into_iter()
            .filter_map(|node| node.value.as_ref().map(|v| (&node.key, v)))
            .collect()
    }

    /// Whether some added block or address contains `key`
    pub fn elements_contain(&self, key: &K) -> bool {
        !self.elements_containing(key).is_empty()
    }

    /// Added blocks and addresses inside `key`'s block, in trie order
    pub fn elements_contained_by(&self, key: &K) -> Vec<(&K, &V)> {
        let Some((root, key)) = self.query(key) else {
            return Vec::new();
        };
        Iter::new(root.subtree_within(&key), None).collect()
    }

    /// Greatest added key less than or equal to `key` in trie order
    pub fn floor(&self, key: &K) -> Option<(&K, &V)> {
        self.nearest(key, true, true)
    }

    /// Greatest added key strictly less than `key` in trie order
    pub fn lower(&self, key: &K) -> Option<(&K, &V)> {
        self.nearest(key, true, false)
    }

    /// Least added key greater than or equal to `key` in trie order
    pub fn ceiling(&self, key: &K) -> Option<(&K, &V)> {
        self.nearest(key, false, true)
    }

    /// Least added key strictly greater than `key` in trie order
    pub fn higher(&self, key: &K) -> Option<(&K, &V)> {
        self.nearest(key, false, false)
    }

    fn nearest(&self, key: &K, below: bool, inclusive: bool) -> Option<(&K, &V)> {
        let (root, key) = self.query(key)?;
        let node = root.nearest(&key, below, inclusive)?;
        node.value.as_ref().map(|v| (&node.key, v))
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        let node = self.root.as_deref()?.first_added()?;
        node.value.as_ref().map(|v| (&node.key, v))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        let node = self.root.as_deref()?.last_added()?;
        node.value.as_ref().map(|v| (&node.key, v))
    }

    /// Added entries in trie order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.root.as_deref(), Some(self.len))
    }
}

impl<'a, K: TrieKey, V> IntoIterator for &'a AssociativeAddressTrie<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
