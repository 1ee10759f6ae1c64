//! Range segment: the leaf value type of every section

use super::{BitCount, SegInt};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest segment bit width supported
pub const MAX_SEGMENT_BITS: BitCount = 32;

/// Largest value representable in `bit_count` bits
#[inline]
pub(crate) fn max_value_for(bit_count: BitCount) -> SegInt {
    ((1u64 << bit_count) - 1) as SegInt
}

/// Mask with the top `prefix_len` of `bit_count` bits set
#[inline]
pub(crate) fn segment_network_mask(bit_count: BitCount, prefix_len: BitCount) -> SegInt {
    max_value_for(bit_count) & !segment_host_mask(bit_count, prefix_len)
}

/// Mask with the bits after the first `prefix_len` of `bit_count` bits set
#[inline]
pub(crate) fn segment_host_mask(bit_count: BitCount, prefix_len: BitCount) -> SegInt {
    max_value_for(bit_count - prefix_len.min(bit_count))
}

/// Prefix length of segment `index` for a section-wide prefix length
///
/// `None` when the section has no prefix length or the prefix extends past the
/// segment's last bit. `Some(0)` when the prefix ends before the segment, and
/// `Some(bits_per_segment)` when it ends exactly at the segment's last bit.
pub(crate) fn segment_prefix_len(
    bits_per_segment: BitCount,
    prefix_len: Option<BitCount>,
    index: usize,
) -> Option<BitCount> {
    let prefix_len = prefix_len?;
    let preceding = bits_per_segment * index as BitCount;
    if prefix_len <= preceding {
        Some(0)
    } else if prefix_len - preceding <= bits_per_segment {
        Some(prefix_len - preceding)
    } else {
        None
    }
}

/// Inclusive `[lower, upper]` range of values of a fixed bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SegmentParts", into = "SegmentParts")]
pub struct Segment {
    lower: SegInt,
    upper: SegInt,
    bit_count: BitCount,
    prefix_len: Option<BitCount>,
}

/// Unvalidated serialized form of a segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SegmentParts {
    lower: SegInt,
    upper: SegInt,
    bit_count: BitCount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix_len: Option<BitCount>,
}

impl TryFrom<SegmentParts> for Segment {
    type Error = Error;

    fn try_from(parts: SegmentParts) -> Result<Self> {
        Segment::new_range(parts.lower, parts.upper, parts.bit_count)?.with_prefix_len(parts.prefix_len)
    }
}

impl From<Segment> for SegmentParts {
    fn from(seg: Segment) -> Self {
        SegmentParts {
            lower: seg.lower,
            upper: seg.upper,
            bit_count: seg.bit_count,
            prefix_len: seg.prefix_len,
        }
    }
}

impl Segment {
    /// Create a single-valued segment
    pub fn new(value: SegInt, bit_count: BitCount) -> Result<Self> {
        Self::new_range(value, value, bit_count)
    }

    /// Create a segment spanning `lower..=upper`; reversed bounds are swapped
    pub fn new_range(lower: SegInt, upper: SegInt, bit_count: BitCount) -> Result<Self> {
        if bit_count == 0 || bit_count > MAX_SEGMENT_BITS {
            return Err(Error::InvalidSegment(format!(
                "bit count {} must be between 1 and {}",
                bit_count, MAX_SEGMENT_BITS
            )));
        }
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        let max = max_value_for(bit_count);
        if upper > max {
            return Err(Error::InvalidSegment(format!(
                "value {} exceeds maximum {} for {} bits",
                upper, max, bit_count
            )));
        }
        Ok(Self {
            lower,
            upper,
            bit_count,
            prefix_len: None,
        })
    }

    /// Attach or clear the segment prefix length
    pub fn with_prefix_len(self, prefix_len: Option<BitCount>) -> Result<Self> {
        if let Some(p) = prefix_len {
            if p > self.bit_count {
                return Err(Error::PrefixLenOutOfRange {
                    prefix_len: p,
                    bit_count: self.bit_count,
                });
            }
        }
        Ok(Self { prefix_len, ..self })
    }

    /// Segment from already validated bounds
    pub(crate) fn from_bounds(
        lower: SegInt,
        upper: SegInt,
        bit_count: BitCount,
        prefix_len: Option<BitCount>,
    ) -> Self {
        debug_assert!(lower <= upper && upper <= max_value_for(bit_count));
        Self {
            lower,
            upper,
            bit_count,
            prefix_len,
        }
    }

    pub fn lower(&self) -> SegInt {
        self.lower
    }

    pub fn upper(&self) -> SegInt {
        self.upper
    }

    pub fn bit_count(&self) -> BitCount {
        self.bit_count
    }

    pub fn prefix_len(&self) -> Option<BitCount> {
        self.prefix_len
    }

    pub fn max_value(&self) -> SegInt {
        max_value_for(self.bit_count)
    }

    /// Whether the segment holds more than one value
    pub fn is_multiple(&self) -> bool {
        self.lower != self.upper
    }

    /// Whether the segment spans every value of its bit width
    pub fn is_full_range(&self) -> bool {
        self.lower == 0 && self.upper == self.max_value()
    }

    /// Number of values in the range
    pub fn count(&self) -> u64 {
        u64::from(self.upper - self.lower) + 1
    }

    pub fn contains_value(&self, value: SegInt) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn contains(&self, other: &Segment) -> bool {
        self.lower <= other.lower && other.upper <= self.upper
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }

    /// Smallest prefix length whose blocks exactly tile this range
    ///
    /// The range is a union of blocks of this length: the lower bound has that
    /// many trailing zeros and the upper bound that many trailing ones.
    pub fn min_prefix_len_for_block(&self) -> BitCount {
        min_prefix_len_for_block(self.lower, self.upper, self.bit_count)
    }

    /// Prefix length whose single block equals this range, if any
    pub fn prefix_len_for_single_block(&self) -> Option<BitCount> {
        let prefix_len = self.min_prefix_len_for_block();
        if prefix_len == self.bit_count {
            return (self.lower == self.upper).then_some(prefix_len);
        }
        let shift = self.bit_count - prefix_len;
        (u64::from(self.lower) >> shift == u64::from(self.upper) >> shift).then_some(prefix_len)
    }

    /// Whether every host bit beyond `prefix_len` spans its full range
    pub fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
        let host = segment_host_mask(self.bit_count, prefix_len);
        self.lower & host == 0 && self.upper & host == host
    }

    /// Whether the range is exactly one block of `prefix_len`
    pub fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
        let network = segment_network_mask(self.bit_count, prefix_len);
        self.contains_prefix_block(prefix_len) && self.lower & network == self.upper & network
    }

    /// Expand the host bits beyond `prefix_len` to their full range
    pub(crate) fn to_prefix_block(self, prefix_len: BitCount) -> Self {
        let host = segment_host_mask(self.bit_count, prefix_len);
        Self {
            lower: self.lower & !host,
            upper: self.upper | host,
            ..self
        }
    }

    /// Bit-reversed segment; `None` when a multi-valued range would not stay sequential
    pub(crate) fn reverse_bits(&self, per_byte: bool) -> Option<Self> {
        self.reverse_with(|value| {
            if per_byte && self.bit_count % 8 == 0 {
                let bytes = (self.bit_count / 8) as usize;
                let mut reversed = value.to_be_bytes();
                for b in reversed.iter_mut().skip(4 - bytes) {
                    *b = b.reverse_bits();
                }
                SegInt::from_be_bytes(reversed)
            } else {
                value.reverse_bits() >> (MAX_SEGMENT_BITS - self.bit_count)
            }
        })
    }

    /// Byte-swapped segment; `None` when a multi-valued range would not stay sequential
    pub(crate) fn reverse_bytes(&self) -> Option<Self> {
        let bytes = (self.bit_count / 8) as usize;
        if self.bit_count % 8 != 0 || bytes <= 1 {
            return Some(self.without_prefix_len());
        }
        self.reverse_with(|value| value.swap_bytes() >> (MAX_SEGMENT_BITS - self.bit_count))
    }

    fn reverse_with(&self, reverse: impl Fn(SegInt) -> SegInt) -> Option<Self> {
        if !self.is_multiple() {
            let value = reverse(self.lower);
            return Some(Self::from_bounds(value, value, self.bit_count, None));
        }
        self.is_full_range().then(|| self.without_prefix_len())
    }

    pub(crate) fn without_prefix_len(&self) -> Self {
        Self {
            prefix_len: None,
            ..*self
        }
    }
}

pub(crate) fn min_prefix_len_for_block(lower: SegInt, upper: SegInt, bit_count: BitCount) -> BitCount {
    if lower == upper {
        return bit_count;
    }
    if lower == 0 && upper == max_value_for(bit_count) {
        return 0;
    }
    let lower_zeros = lower.trailing_zeros();
    let upper_ones = upper.trailing_ones();
    bit_count - lower_zeros.min(upper_ones).min(bit_count)
}
