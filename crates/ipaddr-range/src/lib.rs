//! IP and MAC Address Ranges
//!
//! Address sections are sequences of segments, each segment a contiguous range
//! of values, optionally carrying a prefix length. IPv4 sections have four
//! 8-bit segments, IPv6 eight 16-bit segments, MAC six or eight 8-bit segments.
//!
//! Features:
//! - Masking and bitwise OR of ranges, with detection of non-contiguous results
//! - Increment arithmetic across the values of a range
//! - Prefix block derivation, covering and spanning
//! - Binary tries of prefix blocks with longest-prefix and order queries

pub mod config;
pub mod error;
pub mod increment;
pub mod masking;
pub mod models;
pub mod prefix;
pub mod reverse;
pub mod set_ops;
pub mod trie;

// Re-export core types
pub use config::{NonBlockPolicy, TrieConfig};
pub use error::{Error, RangeOperation, Result};
pub use increment::IncrementRegime;
pub use masking::{bitwise_or_range, mask_range, MaskOp, Masker};
pub use models::{
    Address, AddressFamily, BitCount, Ipv4Address, Ipv6Address, MacAddress, SegInt, Section,
    Segment, Zone, MAX_SEGMENT_BITS,
};
pub use prefix::BlockIter;
pub use trie::{AddressTrie, AssociativeAddressTrie, Iter, TrieKey};
