//! Prefix-block engine
//!
//! Derives the prefix lengths for which a section is a block, converts
//! sections to blocks, and decomposes value ranges into prefix blocks or
//! sequential blocks.

mod block;
mod sequential;
mod span;

pub use sequential::BlockIter;
