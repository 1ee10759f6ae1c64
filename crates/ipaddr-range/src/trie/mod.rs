//! Binary address tries
//!
//! Keys are single addresses and prefix blocks of one bit count. Each node
//! splits its block on the first host bit, and an in-order walk visits keys
//! in [`TrieKey::trie_compare`] order. That order is consistent with
//! containment: a block sorts between the two halves of its own range. The
//! order queries (`floor`, `lower`, `ceiling`, `higher`) are therefore plain
//! binary search tree descents.

mod iter;
mod key;
mod map;
mod node;
mod set;

pub use iter::Iter;
pub use key::TrieKey;
pub use map::AssociativeAddressTrie;
pub use set::AddressTrie;
