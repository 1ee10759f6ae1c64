//! Address sections
//!
//! A section is an ordered run of equal-width segments of one address family
//! plus an optional section-wide prefix length. Sections are immutable; every
//! transformation returns a new section. Derived values are memoised in a
//! publish-once cache shared by clones.

use super::segment::{max_value_for, segment_prefix_len};
use super::{AddressFamily, BitCount, SegInt, Segment};
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Largest section bit count; whole-section values always fit in a `u128`
pub const MAX_SECTION_BITS: BitCount = 128;

/// Mask of the low `bit_count` bits of a section value
#[inline]
fn full_value_mask(bit_count: BitCount) -> u128 {
    if bit_count >= MAX_SECTION_BITS {
        u128::MAX
    } else {
        (1u128 << bit_count) - 1
    }
}

/// Memoised values derived from an immutable section
#[derive(Default)]
struct SectionCache {
    values: OnceCell<(u128, u128)>,
    bounds: OnceCell<(Section, Section)>,
    min_prefix_len: OnceCell<BitCount>,
}

/// Ordered sequence of segments of one address family
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "SectionParts", into = "SectionParts")]
pub struct Section {
    family: AddressFamily,
    segments: Vec<Segment>,
    prefix_len: Option<BitCount>,
    cache: Arc<SectionCache>,
}

/// Unvalidated serialized form of a section
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SectionParts {
    family: AddressFamily,
    segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix_len: Option<BitCount>,
}

impl TryFrom<SectionParts> for Section {
    type Error = Error;

    fn try_from(parts: SectionParts) -> Result<Self> {
        Section::new_prefixed(parts.family, parts.segments, parts.prefix_len)
    }
}

impl From<Section> for SectionParts {
    fn from(section: Section) -> Self {
        SectionParts {
            family: section.family,
            prefix_len: section.prefix_len,
            segments: section.segments,
        }
    }
}

impl Section {
    /// Create a section, taking the prefix length from the first prefixed segment
    pub fn new(family: AddressFamily, segments: Vec<Segment>) -> Result<Self> {
        let bits = family.bits_per_segment();
        let prefix_len = segments
            .iter()
            .enumerate()
            .find_map(|(i, seg)| seg.prefix_len().map(|p| i as BitCount * bits + p));
        Self::new_prefixed(family, segments, prefix_len)
    }

    /// Create a section with an explicit section-wide prefix length
    pub fn new_prefixed(
        family: AddressFamily,
        segments: Vec<Segment>,
        prefix_len: Option<BitCount>,
    ) -> Result<Self> {
        Self::check_segment_count(family, segments.len())?;
        let bits = family.bits_per_segment();
        if let Some(bad) = segments.iter().find(|seg| seg.bit_count() != bits) {
            return Err(Error::InvalidSection(format!(
                "{:?} segments have {} bits, found a segment of {} bits",
                family,
                bits,
                bad.bit_count()
            )));
        }
        let bit_count = bits * segments.len() as BitCount;
        if let Some(p) = prefix_len {
            if p > bit_count {
                return Err(Error::PrefixLenOutOfRange {
                    prefix_len: p,
                    bit_count,
                });
            }
        }
        Ok(Self::from_parts(family, segments, prefix_len))
    }

    /// Create a section of single values
    pub fn from_values(family: AddressFamily, values: &[SegInt]) -> Result<Self> {
        let bits = family.bits_per_segment();
        let segments = values
            .iter()
            .map(|&v| Segment::new(v, bits))
            .collect::<Result<Vec<_>>>()?;
        Self::new_prefixed(family, segments, None)
    }

    /// Create a section of `(lower, upper)` segment ranges
    pub fn from_ranges(family: AddressFamily, ranges: &[(SegInt, SegInt)]) -> Result<Self> {
        let bits = family.bits_per_segment();
        let segments = ranges
            .iter()
            .map(|&(lower, upper)| Segment::new_range(lower, upper, bits))
            .collect::<Result<Vec<_>>>()?;
        Self::new_prefixed(family, segments, None)
    }

    /// Create a single-valued section from its integer value
    pub fn from_value(
        family: AddressFamily,
        segment_count: usize,
        value: u128,
        prefix_len: Option<BitCount>,
    ) -> Result<Self> {
        Self::check_segment_count(family, segment_count)?;
        let bit_count = family.bits_per_segment() * segment_count as BitCount;
        if value & !full_value_mask(bit_count) != 0 {
            return Err(Error::InvalidSection(format!(
                "value {:#x} does not fit in {} bits",
                value, bit_count
            )));
        }
        if let Some(p) = prefix_len {
            if p > bit_count {
                return Err(Error::PrefixLenOutOfRange {
                    prefix_len: p,
                    bit_count,
                });
            }
        }
        Ok(Self::from_value_range_unchecked(
            family,
            segment_count,
            value,
            value,
            prefix_len,
        ))
    }

    /// Create the section spanning `lower..=upper`, if that range is sequential
    pub fn from_value_range(
        family: AddressFamily,
        segment_count: usize,
        lower: u128,
        upper: u128,
    ) -> Result<Option<Self>> {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        let low = Self::from_value(family, segment_count, lower, None)?;
        let high = Self::from_value(family, segment_count, upper, None)?;
        let segments = low.segments.iter().zip(high.segments.iter());
        let mut varied = false;
        for (lo, hi) in segments {
            if varied && !(lo.lower() == 0 && hi.upper() == hi.max_value()) {
                return Ok(None);
            }
            varied |= lo.lower() != hi.lower();
        }
        Ok(Some(Self::from_value_range_unchecked(
            family,
            segment_count,
            lower,
            upper,
            None,
        )))
    }

    /// Section from bounds already known to be sequential and in range
    pub(crate) fn from_value_range_unchecked(
        family: AddressFamily,
        segment_count: usize,
        lower: u128,
        upper: u128,
        prefix_len: Option<BitCount>,
    ) -> Self {
        let bits = family.bits_per_segment();
        let seg_mask = u128::from(max_value_for(bits));
        let segments = (0..segment_count)
            .map(|i| {
                let shift = bits * (segment_count - 1 - i) as BitCount;
                let lo = ((lower >> shift) & seg_mask) as SegInt;
                let hi = ((upper >> shift) & seg_mask) as SegInt;
                Segment::from_bounds(lo, hi, bits, None)
            })
            .collect();
        Self::from_parts(family, segments, prefix_len)
    }

    /// Section from validated segments; segment prefix lengths are re-derived
    pub(crate) fn from_parts(
        family: AddressFamily,
        mut segments: Vec<Segment>,
        prefix_len: Option<BitCount>,
    ) -> Self {
        let bits = family.bits_per_segment();
        for (i, seg) in segments.iter_mut().enumerate() {
            *seg = Segment::from_bounds(
                seg.lower(),
                seg.upper(),
                bits,
                segment_prefix_len(bits, prefix_len, i),
            );
        }
        Self {
            family,
            segments,
            prefix_len,
            cache: Arc::default(),
        }
    }

    fn check_segment_count(family: AddressFamily, count: usize) -> Result<()> {
        if count > family.max_segment_count() {
            return Err(Error::InvalidSection(format!(
                "{:?} sections hold at most {} segments, got {}",
                family,
                family.max_segment_count(),
                count
            )));
        }
        Ok(())
    }

    /// Fail unless `other` has the same family and segment count
    pub(crate) fn check_compatible(&self, other: &Section) -> Result<()> {
        if self.family != other.family {
            return Err(Error::FamilyMismatch(self.family, other.family));
        }
        if self.segments.len() != other.segments.len() {
            return Err(Error::SizeMismatch(
                self.segments.len(),
                other.segments.len(),
            ));
        }
        Ok(())
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Segment at `index`; panics when out of bounds like slice indexing
    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index]
    }

    pub fn segment_value(&self, index: usize) -> SegInt {
        self.segments[index].lower()
    }

    pub fn upper_segment_value(&self, index: usize) -> SegInt {
        self.segments[index].upper()
    }

    pub fn bits_per_segment(&self) -> BitCount {
        self.family.bits_per_segment()
    }

    pub fn bit_count(&self) -> BitCount {
        self.bits_per_segment() * self.segments.len() as BitCount
    }

    pub fn byte_count(&self) -> usize {
        self.family.bytes_per_segment() * self.segments.len()
    }

    pub fn prefix_len(&self) -> Option<BitCount> {
        self.prefix_len
    }

    /// Whether the section represents more than one value
    pub fn is_multiple(&self) -> bool {
        self.segments.iter().any(Segment::is_multiple)
    }

    /// Whether every segment spans its full range; true for an empty section
    pub fn is_full_range(&self) -> bool {
        self.segments.iter().all(Segment::is_full_range)
    }

    /// Whether the represented values form one contiguous run
    ///
    /// Holds when every segment after the first multi-valued one is full range.
    pub fn is_sequential(&self) -> bool {
        match self.segments.iter().position(Segment::is_multiple) {
            Some(first) => self.segments[first + 1..]
                .iter()
                .all(Segment::is_full_range),
            None => true,
        }
    }

    /// Integer value of the lowest address
    pub fn value(&self) -> u128 {
        self.values().0
    }

    /// Integer value of the highest address
    pub fn upper_value(&self) -> u128 {
        self.values().1
    }

    fn values(&self) -> (u128, u128) {
        *self.cache.values.get_or_init(|| {
            let bits = self.bits_per_segment();
            self.segments.iter().fold((0u128, 0u128), |(lo, hi), seg| {
                (
                    (lo << bits) | u128::from(seg.lower()),
                    (hi << bits) | u128::from(seg.upper()),
                )
            })
        })
    }

    /// Largest value a section of this shape can hold
    pub fn max_value(&self) -> u128 {
        full_value_mask(self.bit_count())
    }

    /// Number of values represented; `None` only for the full 128-bit space
    pub fn count(&self) -> Option<u128> {
        self.count_minus_one().checked_add(1)
    }

    /// Number of values represented, minus one; never overflows
    pub(crate) fn count_minus_one(&self) -> u128 {
        self.segments
            .iter()
            .try_fold(1u128, |acc, seg| acc.checked_mul(u128::from(seg.count())))
            .map_or(u128::MAX, |count| count - 1)
    }

    /// Lowest single value, keeping the prefix length
    pub fn lower(&self) -> Section {
        self.bounds().0
    }

    /// Highest single value, keeping the prefix length
    pub fn upper(&self) -> Section {
        self.bounds().1
    }

    fn bounds(&self) -> (Section, Section) {
        if !self.is_multiple() {
            return (self.clone(), self.clone());
        }
        self.cache
            .bounds
            .get_or_init(|| {
                let single = |pick: fn(&Segment) -> SegInt| {
                    let segments = self
                        .segments
                        .iter()
                        .map(|seg| {
                            let v = pick(seg);
                            Segment::from_bounds(v, v, seg.bit_count(), None)
                        })
                        .collect();
                    Section::from_parts(self.family, segments, self.prefix_len)
                };
                (single(Segment::lower), single(Segment::upper))
            })
            .clone()
    }

    /// Cached minimum prefix length for which this section is a union of blocks
    pub(crate) fn cached_min_prefix_len(&self, compute: impl FnOnce() -> BitCount) -> BitCount {
        *self.cache.min_prefix_len.get_or_init(compute)
    }

    /// Big-endian bytes of the lowest value
    pub fn bytes(&self) -> Vec<u8> {
        self.to_be_bytes(self.value())
    }

    /// Big-endian bytes of the highest value
    pub fn upper_bytes(&self) -> Vec<u8> {
        self.to_be_bytes(self.upper_value())
    }

    fn to_be_bytes(&self, value: u128) -> Vec<u8> {
        let bytes = value.to_be_bytes();
        bytes[bytes.len() - self.byte_count()..].to_vec()
    }

    /// Fail unless `prefix_len` is within this section's bit count
    pub(crate) fn check_prefix_len(&self, prefix_len: BitCount) -> Result<()> {
        if prefix_len > self.bit_count() {
            return Err(Error::PrefixLenOutOfRange {
                prefix_len,
                bit_count: self.bit_count(),
            });
        }
        Ok(())
    }

    /// Same values with the given prefix length
    pub fn set_prefix_len(&self, prefix_len: BitCount) -> Result<Section> {
        self.check_prefix_len(prefix_len)?;
        Ok(self.with_prefix_len(Some(prefix_len)))
    }

    /// Same values with no prefix length
    pub fn without_prefix_len(&self) -> Section {
        if self.prefix_len.is_none() {
            return self.clone();
        }
        self.with_prefix_len(None)
    }

    pub(crate) fn with_prefix_len(&self, prefix_len: Option<BitCount>) -> Section {
        Section::from_parts(self.family, self.segments.clone(), prefix_len)
    }

    /// Same shape with different segments, keeping family and applying `prefix_len`
    pub(crate) fn with_segments(
        &self,
        segments: Vec<Segment>,
        prefix_len: Option<BitCount>,
    ) -> Section {
        debug_assert_eq!(segments.len(), self.segments.len());
        Section::from_parts(self.family, segments, prefix_len)
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranges: Vec<_> = self
            .segments
            .iter()
            .map(|seg| {
                if seg.is_multiple() {
                    format!("{:#x}-{:#x}", seg.lower(), seg.upper())
                } else {
                    format!("{:#x}", seg.lower())
                }
            })
            .collect();
        f.debug_struct("Section")
            .field("family", &self.family)
            .field("segments", &ranges)
            .field("prefix_len", &self.prefix_len)
            .finish()
    }
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.prefix_len == other.prefix_len
            && self.segments == other.segments
    }
}

impl Eq for Section {}

impl Hash for Section {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.segments.hash(state);
        self.prefix_len.hash(state);
    }
}

impl PartialOrd for Section {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Section {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family
            .cmp(&other.family)
            .then(self.segments.len().cmp(&other.segments.len()))
            .then(self.value().cmp(&other.value()))
            .then(self.upper_value().cmp(&other.upper_value()))
            .then_with(|| {
                let bounds = |s: &Section| -> Vec<(SegInt, SegInt)> {
                    s.segments.iter().map(|seg| (seg.lower(), seg.upper())).collect()
                };
                bounds(self).cmp(&bounds(other))
            })
            .then(self.prefix_len.cmp(&other.prefix_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4(values: &[SegInt]) -> Section {
        Section::from_values(AddressFamily::Ipv4, values).unwrap()
    }

    #[test]
    fn test_section_values() {
        let section = ipv4(&[1, 2, 3, 4]);
        assert_eq!(section.value(), 0x01020304);
        assert_eq!(section.upper_value(), 0x01020304);
        assert_eq!(section.bit_count(), 32);
        assert_eq!(section.bytes(), vec![1, 2, 3, 4]);
        assert_eq!(section.count(), Some(1));
        assert!(!section.is_multiple());
    }

    #[test]
    fn test_section_prefix_inference() {
        let bits = 8;
        let segments = vec![
            Segment::new(1, bits).unwrap(),
            Segment::new(2, bits).unwrap(),
            Segment::new(3, bits).unwrap().with_prefix_len(Some(4)).unwrap(),
            Segment::new(0, bits).unwrap(),
        ];
        let section = Section::new(AddressFamily::Ipv4, segments).unwrap();
        assert_eq!(section.prefix_len(), Some(20));
        assert_eq!(section.segment(2).prefix_len(), Some(4));
        assert_eq!(section.segment(3).prefix_len(), Some(0));
        assert_eq!(section.segment(1).prefix_len(), None);
    }

    #[test]
    fn test_section_validation() {
        let too_many = Section::from_values(AddressFamily::Ipv4, &[1, 2, 3, 4, 5]);
        assert!(matches!(too_many, Err(Error::InvalidSection(_))));

        let mixed = Section::new(
            AddressFamily::Ipv4,
            vec![Segment::new(1, 16).unwrap()],
        );
        assert!(matches!(mixed, Err(Error::InvalidSection(_))));

        let prefix = Section::new_prefixed(
            AddressFamily::Ipv4,
            vec![Segment::new(1, 8).unwrap()],
            Some(9),
        );
        assert!(matches!(prefix, Err(Error::PrefixLenOutOfRange { .. })));
    }

    #[test]
    fn test_sequential() {
        let seq = Section::from_ranges(AddressFamily::Ipv4, &[(1, 1), (2, 3), (0, 255), (0, 255)])
            .unwrap();
        assert!(seq.is_sequential());
        assert_eq!(seq.count(), Some(2 * 256 * 256));

        let gaps = Section::from_ranges(AddressFamily::Ipv4, &[(1, 1), (2, 3), (4, 4), (0, 255)])
            .unwrap();
        assert!(!gaps.is_sequential());
    }

    #[test]
    fn test_empty_section() {
        let empty = Section::from_values(AddressFamily::Ipv6, &[]).unwrap();
        assert_eq!(empty.bit_count(), 0);
        assert_eq!(empty.count(), Some(1));
        assert!(empty.is_sequential());
        assert!(empty.is_full_range());
        assert_eq!(empty.value(), 0);
        assert!(empty.bytes().is_empty());
    }

    #[test]
    fn test_full_ipv6_count() {
        let full = Section::from_ranges(AddressFamily::Ipv6, &[(0, 0xffff); 8]).unwrap();
        assert_eq!(full.count(), None);
        assert_eq!(full.count_minus_one(), u128::MAX);
        assert_eq!(full.upper_value(), u128::MAX);
    }

    #[test]
    fn test_lower_upper_cached() {
        let range = Section::from_ranges(AddressFamily::Ipv4, &[(1, 1), (2, 2), (3, 3), (0, 255)])
            .unwrap()
            .set_prefix_len(24)
            .unwrap();
        let lower = range.lower();
        let upper = range.upper();
        assert_eq!(lower.value(), 0x01020300);
        assert_eq!(upper.value(), 0x010203ff);
        assert_eq!(upper.prefix_len(), Some(24));
        assert_eq!(range.clone().upper(), upper);
    }

    #[test]
    fn test_from_value_range() {
        let seq = Section::from_value_range(AddressFamily::Ipv4, 4, 0x01020300, 0x010203ff)
            .unwrap()
            .unwrap();
        assert_eq!(seq.segment(3).count(), 256);

        let none = Section::from_value_range(AddressFamily::Ipv4, 4, 0x010203fa, 0x01020405).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_from_value_out_of_range() {
        assert!(Section::from_value(AddressFamily::Ipv4, 4, 1u128 << 32, None).is_err());
    }

    #[test]
    fn test_ordering_and_equality() {
        let a = ipv4(&[1, 2, 3, 4]);
        let b = ipv4(&[1, 2, 3, 5]);
        assert!(a < b);
        assert_eq!(a, ipv4(&[1, 2, 3, 4]));
        assert_ne!(a, a.set_prefix_len(32).unwrap());
    }

    #[test]
    fn test_section_serde_roundtrip() {
        let section = ipv4(&[10, 0, 0, 1]).set_prefix_len(8).unwrap();
        let json = serde_json::to_string(&section).unwrap();
        let back: Section = serde_json::from_str(&json).unwrap();
        assert_eq!(back, section);
    }
}
