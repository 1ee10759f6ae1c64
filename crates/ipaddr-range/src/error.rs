//! Error types for address range operations

use crate::models::{AddressFamily, BitCount, SegInt};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for address range operations
pub type Result<T> = std::result::Result<T, Error>;

/// The transformation that produced a non-contiguous segment range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOperation {
    /// Bitwise AND with a mask
    Mask,
    /// Bitwise OR with a mask
    BitwiseOr,
    /// Zeroing the host bits beyond a prefix length
    ZeroHost,
    /// Setting the host bits beyond a prefix length to ones
    MaxHost,
    /// Zeroing the network bits
    ZeroNetwork,
    /// Reversing the bits of a segment
    ReverseBits,
    /// Reversing the bytes of a segment
    ReverseBytes,
}

impl fmt::Display for RangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RangeOperation::Mask => "mask",
            RangeOperation::BitwiseOr => "bitwise or",
            RangeOperation::ZeroHost => "zero host",
            RangeOperation::MaxHost => "max host",
            RangeOperation::ZeroNetwork => "zero network",
            RangeOperation::ReverseBits => "reverse bits",
            RangeOperation::ReverseBytes => "reverse bytes",
        };
        f.write_str(name)
    }
}

/// Address range errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Range errors
    #[error("{operation} of segment {index} with range {lower}-{upper} is not a sequential range")]
    IncompatibleRange {
        operation: RangeOperation,
        index: usize,
        lower: SegInt,
        upper: SegInt,
    },

    #[error("Segment count mismatch: {0} vs {1}")]
    SizeMismatch(usize, usize),

    #[error("Address family mismatch: {0:?} vs {1:?}")]
    FamilyMismatch(AddressFamily, AddressFamily),

    #[error("Prefix length {prefix_len} exceeds bit count {bit_count}")]
    PrefixLenOutOfRange {
        prefix_len: BitCount,
        bit_count: BitCount,
    },

    // Construction errors
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    #[error("Invalid section: {0}")]
    InvalidSection(String),

    // Trie errors
    #[error("Bit count mismatch: trie holds {0}-bit keys, got {1}")]
    BitCountMismatch(BitCount, BitCount),

    #[error("Not a prefix block or single address: {0}")]
    NotPrefixBlock(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether this error reports a non-contiguous result rather than bad input
    pub fn is_incompatible_range(&self) -> bool {
        matches!(self, Error::IncompatibleRange { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
