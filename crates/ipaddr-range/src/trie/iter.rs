//! In-order trie traversal

use super::node::TrieNode;

/// Added entries of a trie subtree in trie order
pub struct Iter<'a, K, V> {
    stack: Vec<&'a TrieNode<K, V>>,
    remaining: Option<usize>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(root: Option<&'a TrieNode<K, V>>, remaining: Option<usize>) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining,
        };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut node: Option<&'a TrieNode<K, V>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.children[0].as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.push_left(node.children[1].as_deref());
            if let Some(value) = node.value.as_ref() {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining = remaining.saturating_sub(1);
                }
                return Some((&node.key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => (n, Some(n)),
            None => (0, None),
        }
    }
}
