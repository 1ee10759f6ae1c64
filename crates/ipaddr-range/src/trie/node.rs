//! Binary trie nodes and the structural insert/remove algorithms

use super::key::TrieKey;
use std::cmp::Ordering;
use tracing::trace;

pub(crate) type Link<K, V> = Option<Box<TrieNode<K, V>>>;

/// Trie node; `value` is `Some` exactly when the key was added
///
/// Children split the node's block on the first host bit: `children[0]` holds
/// keys with that bit clear, `children[1]` keys with it set.
#[derive(Debug, Clone)]
pub(crate) struct TrieNode<K, V> {
    pub(crate) key: K,
    pub(crate) value: Option<V>,
    pub(crate) children: [Link<K, V>; 2],
}

impl<K: TrieKey, V> TrieNode<K, V> {
    pub(crate) fn structural(key: K) -> Self {
        Self {
            key,
            value: None,
            children: [None, None],
        }
    }

    fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            value: Some(value),
            children: [None, None],
        }
    }

    pub(crate) fn is_added(&self) -> bool {
        self.value.is_some()
    }

    /// Whether `key` lies within this node's block
    pub(crate) fn covers(&self, key: &K) -> bool {
        let prefix = self.key.trie_prefix_len();
        key.trie_prefix_len() >= prefix && key.matching_bits(&self.key, prefix) == prefix
    }

    /// Child slot on `key`'s side of this node's first host bit
    pub(crate) fn side(&self, key: &K) -> usize {
        usize::from(key.is_one_bit(self.key.trie_prefix_len()))
    }

    /// Add `key` below this node, which must cover it; returns the replaced value
    pub(crate) fn put(&mut self, key: K, value: V) -> Option<V> {
        let own = self.key.trie_prefix_len();
        let wanted = key.trie_prefix_len();
        if wanted == own {
            return self.value.replace(value);
        }
        let side = self.side(&key);
        let Some(mut child) = self.children[side].take() else {
            self.children[side] = Some(Box::new(TrieNode::leaf(key, value)));
            return None;
        };
        let child_prefix = child.key.trie_prefix_len();
        let matched = key.matching_bits(&child.key, child_prefix.min(wanted));
        if matched == child_prefix {
            let replaced = child.put(key, value);
            self.children[side] = Some(child);
            return replaced;
        }
        if matched == wanted {
            // the new key is a block containing the child
            let mut node = TrieNode::leaf(key, value);
            let child_side = node.side(&child.key);
            node.children[child_side] = Some(child);
            self.children[side] = Some(Box::new(node));
            return None;
        }
        let mut branch = TrieNode::structural(key.to_prefix_block_key(matched));
        trace!(key = ?branch.key, "created branch node");
        let key_side = usize::from(key.is_one_bit(matched));
        branch.children[key_side] = Some(Box::new(TrieNode::leaf(key, value)));
        branch.children[1 - key_side] = Some(child);
        self.children[side] = Some(Box::new(branch));
        None
    }

    /// Remove `key` from the subtree in `slot`, collapsing emptied structure
    pub(crate) fn remove_from(slot: &mut Link<K, V>, key: &K) -> Option<V> {
        let node = slot.as_mut()?;
        if !node.covers(key) {
            return None;
        }
        let removed = if key.trie_prefix_len() == node.key.trie_prefix_len() {
            node.value.take()?
        } else {
            let side = node.side(key);
            Self::remove_from(&mut node.children[side], key)?
        };
        Self::collapse(slot);
        Some(removed)
    }

    /// Replace a non-added node that has at most one child by that child
    fn collapse(slot: &mut Link<K, V>) {
        let Some(node) = slot.as_mut() else {
            return;
        };
        if node.is_added() {
            return;
        }
        match (node.children[0].is_some(), node.children[1].is_some()) {
            (true, true) => {}
            _ => {
                trace!(key = ?node.key, "collapsed structural node");
                let only = node.children[0].take().or_else(|| node.children[1].take());
                *slot = only;
            }
        }
    }

    pub(crate) fn find(&self, key: &K) -> Option<&TrieNode<K, V>> {
        let mut node = self;
        loop {
            if !node.covers(key) {
                return None;
            }
            if key.trie_prefix_len() == node.key.trie_prefix_len() {
                return Some(node);
            }
            node = node.children[node.side(key)].as_deref()?;
        }
    }

    pub(crate) fn find_mut(&mut self, key: &K) -> Option<&mut TrieNode<K, V>> {
        if !self.covers(key) {
            return None;
        }
        if key.trie_prefix_len() == self.key.trie_prefix_len() {
            return Some(self);
        }
        let side = self.side(key);
        self.children[side].as_deref_mut()?.find_mut(key)
    }

    /// Added nodes whose blocks contain `key`, from the root down
    pub(crate) fn path_to<'a>(&'a self, key: &K) -> Vec<&'a TrieNode<K, V>> {
        let mut path = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            if !node.covers(key) {
                break;
            }
            if node.is_added() {
                path.push(node);
            }
            if key.trie_prefix_len() == node.key.trie_prefix_len() {
                break;
            }
            current = node.children[node.side(key)].as_deref();
        }
        path
    }

    /// Topmost node whose block lies within `key`'s block
    pub(crate) fn subtree_within(&self, key: &K) -> Option<&TrieNode<K, V>> {
        let limit = key.trie_prefix_len();
        let mut node = self;
        loop {
            let prefix = node.key.trie_prefix_len();
            if node.key.matching_bits(key, prefix.min(limit)) < prefix.min(limit) {
                return None;
            }
            if prefix >= limit {
                return Some(node);
            }
            node = node.children[node.side(key)].as_deref()?;
        }
    }

    /// Nearest added node on one side of `key` in trie order
    ///
    /// `below` searches for keys less than `key`, otherwise greater. `inclusive`
    /// also accepts an equal key.
    pub(crate) fn nearest(&self, key: &K, below: bool, inclusive: bool) -> Option<&TrieNode<K, V>> {
        let mut best = None;
        let mut current = Some(self);
        while let Some(node) = current {
            let order = key.trie_compare(&node.key);
            if order == Ordering::Equal && inclusive && node.is_added() {
                return Some(node);
            }
            let go_right = match order {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => !below,
            };
            let candidate = match order {
                Ordering::Greater => below,
                Ordering::Less => !below,
                Ordering::Equal => false,
            };
            if candidate {
                // a structural node stands in for the nearest end of its far subtree
                let found = if node.is_added() {
                    Some(node)
                } else if below {
                    node.children[0].as_deref().and_then(TrieNode::last_added)
                } else {
                    node.children[1].as_deref().and_then(TrieNode::first_added)
                };
                if found.is_some() {
                    best = found;
                }
            }
            current = node.children[usize::from(go_right)].as_deref();
        }
        best
    }

    /// First added node of this subtree in trie order
    pub(crate) fn first_added(&self) -> Option<&TrieNode<K, V>> {
        self.children[0]
            .as_deref()
            .and_then(TrieNode::first_added)
            .or_else(|| self.is_added().then_some(self))
            .or_else(|| self.children[1].as_deref().and_then(TrieNode::first_added))
    }

    /// Last added node of this subtree in trie order
    pub(crate) fn last_added(&self) -> Option<&TrieNode<K, V>> {
        self.children[1]
            .as_deref()
            .and_then(TrieNode::last_added)
            .or_else(|| self.is_added().then_some(self))
            .or_else(|| self.children[0].as_deref().and_then(TrieNode::last_added))
    }
}
