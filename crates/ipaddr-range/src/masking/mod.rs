//! Masking engine
//!
//! Section-level AND/OR masking built on the per-segment [`Masker`]. A masking
//! operation either yields a section whose every segment is still a range or
//! fails as a whole with [`Error::IncompatibleRange`]; partially masked
//! results are never returned.

mod masker;

pub use masker::{bitwise_or_range, mask_range, MaskOp, Masker};

use crate::error::RangeOperation;
use crate::models::{
    segment_host_mask, segment_network_mask, segment_prefix_len, AddressFamily, BitCount, SegInt,
    Section, Segment,
};
use crate::{Error, Result};
use tracing::debug;

/// Network mask value of segment `index` for a section prefix length
fn network_mask_value(bits: BitCount, prefix_len: BitCount, index: usize) -> SegInt {
    let seg_prefix = segment_prefix_len(bits, Some(prefix_len), index).unwrap_or(bits);
    segment_network_mask(bits, seg_prefix)
}

/// Host mask value of segment `index` for a section prefix length
fn host_mask_value(bits: BitCount, prefix_len: BitCount, index: usize) -> SegInt {
    let seg_prefix = segment_prefix_len(bits, Some(prefix_len), index).unwrap_or(bits);
    segment_host_mask(bits, seg_prefix)
}

impl Section {
    /// Network mask section (ones then zeros) carrying `prefix_len`
    pub fn network_mask(
        family: AddressFamily,
        segment_count: usize,
        prefix_len: BitCount,
    ) -> Result<Section> {
        let bits = family.bits_per_segment();
        let values: Vec<SegInt> = (0..segment_count)
            .map(|i| network_mask_value(bits, prefix_len, i))
            .collect();
        Section::from_values(family, &values)?.set_prefix_len(prefix_len)
    }

    /// Host mask section (zeros then ones) carrying `prefix_len`
    pub fn host_mask(
        family: AddressFamily,
        segment_count: usize,
        prefix_len: BitCount,
    ) -> Result<Section> {
        let bits = family.bits_per_segment();
        let values: Vec<SegInt> = (0..segment_count)
            .map(|i| host_mask_value(bits, prefix_len, i))
            .collect();
        Section::from_values(family, &values)?.set_prefix_len(prefix_len)
    }

    /// AND every value with `mask`; the prefix length is removed
    ///
    /// When `mask` has a prefix length and this section spans every host bit
    /// beyond it, the host range is kept and only the network bits are masked.
    pub fn mask(&self, mask: &Section) -> Result<Section> {
        self.mask_prefixed(mask, false)
    }

    /// AND every value with `mask`
    ///
    /// With `retain_prefix` the prefix length is kept, and a prefix block stays
    /// the prefix block of its masked network.
    pub fn mask_prefixed(&self, mask: &Section, retain_prefix: bool) -> Result<Section> {
        self.check_compatible(mask)?;
        self.masked_with(mask, MaskOp::And, RangeOperation::Mask, retain_prefix)
    }

    /// OR every value with `mask`; the prefix length is removed
    pub fn bitwise_or(&self, mask: &Section) -> Result<Section> {
        self.bitwise_or_prefixed(mask, false)
    }

    /// OR every value with `mask`, optionally keeping the prefix length
    pub fn bitwise_or_prefixed(&self, mask: &Section, retain_prefix: bool) -> Result<Section> {
        self.check_compatible(mask)?;
        self.masked_with(mask, MaskOp::Or, RangeOperation::BitwiseOr, retain_prefix)
    }

    fn masked_with(
        &self,
        mask: &Section,
        op: MaskOp,
        operation: RangeOperation,
        retain_prefix: bool,
    ) -> Result<Section> {
        let prefix_len = if retain_prefix { self.prefix_len() } else { None };
        let bits = self.bits_per_segment();
        let host_block = mask
            .prefix_len()
            .filter(|&p| self.contains_prefix_block(p));
        let masked = self.combine(
            op,
            operation,
            |i| {
                let value = mask.segment_value(i);
                match (host_block, op) {
                    (Some(p), MaskOp::And) => value | host_mask_value(bits, p, i),
                    (Some(p), MaskOp::Or) => value & network_mask_value(bits, p, i),
                    (None, _) => value,
                }
            },
            prefix_len,
        )?;
        if retain_prefix && self.is_prefix_block() {
            return Ok(masked.to_prefix_block());
        }
        Ok(masked)
    }

    /// Zero the host bits beyond the prefix length; every bit when unprefixed
    pub fn to_zero_host(&self) -> Result<Section> {
        match self.prefix_len() {
            Some(p) => self.to_zero_host_len(p),
            None => self.combine(MaskOp::And, RangeOperation::ZeroHost, |_| 0, None),
        }
    }

    /// Zero the host bits beyond `prefix_len`, keeping this section's prefix length
    pub fn to_zero_host_len(&self, prefix_len: BitCount) -> Result<Section> {
        self.check_prefix_len(prefix_len)?;
        let bits = self.bits_per_segment();
        self.combine(
            MaskOp::And,
            RangeOperation::ZeroHost,
            |i| network_mask_value(bits, prefix_len, i),
            self.prefix_len(),
        )
    }

    /// Set the host bits beyond the prefix length to ones; every bit when unprefixed
    pub fn to_max_host(&self) -> Result<Section> {
        match self.prefix_len() {
            Some(p) => self.to_max_host_len(p),
            None => {
                let max = self.family().max_segment_value();
                self.combine(MaskOp::Or, RangeOperation::MaxHost, |_| max, None)
            }
        }
    }

    /// Set the host bits beyond `prefix_len` to ones, keeping this section's prefix length
    pub fn to_max_host_len(&self, prefix_len: BitCount) -> Result<Section> {
        self.check_prefix_len(prefix_len)?;
        let bits = self.bits_per_segment();
        self.combine(
            MaskOp::Or,
            RangeOperation::MaxHost,
            |i| host_mask_value(bits, prefix_len, i),
            self.prefix_len(),
        )
    }

    /// Zero the network bits, keeping the host bits and prefix length
    ///
    /// Without a prefix length every bit is a network bit.
    pub fn to_zero_network(&self) -> Result<Section> {
        let prefix_len = self.prefix_len().unwrap_or_else(|| self.bit_count());
        let bits = self.bits_per_segment();
        self.combine(
            MaskOp::And,
            RangeOperation::ZeroNetwork,
            |i| host_mask_value(bits, prefix_len, i),
            self.prefix_len(),
        )
    }

    /// Apply `op` with a per-segment mask value
    ///
    /// Segments before the first one the mask changes are kept as they are. A
    /// segment counts as changed when its masker is not direct, even if both
    /// bounds survive the mask.
    pub(crate) fn combine(
        &self,
        op: MaskOp,
        operation: RangeOperation,
        mask_value: impl Fn(usize) -> SegInt,
        prefix_len: Option<BitCount>,
    ) -> Result<Section> {
        let max_value = u64::from(self.family().max_segment_value());
        let mut segments = self.segments().to_vec();
        let pivot = segments.iter().enumerate().position(|(i, seg)| {
            let mask = u64::from(mask_value(i));
            let (lower, upper) = (u64::from(seg.lower()), u64::from(seg.upper()));
            op.masker(lower, upper, mask, max_value) != Masker::Direct
                || op.apply(lower, mask) != lower
                || op.apply(upper, mask) != upper
        });
        let Some(pivot) = pivot else {
            return Ok(if prefix_len == self.prefix_len() {
                self.clone()
            } else {
                self.with_prefix_len(prefix_len)
            });
        };
        for (index, seg) in segments.iter_mut().enumerate().skip(pivot) {
            let mask = u64::from(mask_value(index));
            let (lower, upper) = (u64::from(seg.lower()), u64::from(seg.upper()));
            let masker = op.masker(lower, upper, mask, max_value);
            match masker.apply(op, lower, upper, mask) {
                Some((lo, hi)) => {
                    *seg = Segment::from_bounds(lo as SegInt, hi as SegInt, seg.bit_count(), None)
                }
                None => {
                    debug!(
                        %operation,
                        index,
                        lower,
                        upper,
                        mask,
                        "masked segment range is not sequential"
                    );
                    return Err(Error::IncompatibleRange {
                        operation,
                        index,
                        lower: seg.lower(),
                        upper: seg.upper(),
                    });
                }
            }
        }
        Ok(self.with_segments(segments, prefix_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_range(ranges: &[(SegInt, SegInt)]) -> Section {
        Section::from_ranges(AddressFamily::Ipv4, ranges).unwrap()
    }

    fn ipv4(values: &[SegInt]) -> Section {
        Section::from_values(AddressFamily::Ipv4, values).unwrap()
    }

    #[test]
    fn test_network_and_host_masks() {
        let net = Section::network_mask(AddressFamily::Ipv4, 4, 20).unwrap();
        assert_eq!(net.value(), 0xffff_f000);
        assert_eq!(net.prefix_len(), Some(20));
        let host = Section::host_mask(AddressFamily::Ipv4, 4, 20).unwrap();
        assert_eq!(host.value(), 0x0000_0fff);

        let v6 = Section::network_mask(AddressFamily::Ipv6, 8, 64).unwrap();
        assert_eq!(v6.value(), 0xffff_ffff_ffff_ffff_0000_0000_0000_0000);
    }

    #[test]
    fn test_mask_block_with_network_mask() {
        let block = ipv4_range(&[(1, 1), (2, 2), (3, 3), (0, 255)])
            .set_prefix_len(24)
            .unwrap();
        let mask = Section::network_mask(AddressFamily::Ipv4, 4, 24).unwrap();

        let retained = block.mask_prefixed(&mask, true).unwrap();
        assert_eq!(retained, block);

        let plain = block.mask(&mask).unwrap();
        assert_eq!(plain, block.without_prefix_len());

        let longer = Section::network_mask(AddressFamily::Ipv4, 4, 28).unwrap();
        assert_eq!(block.mask(&longer).unwrap(), block.without_prefix_len());
    }

    #[test]
    fn test_mask_keeps_host_range_of_unprefixed_block() {
        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (0, 255)]);
        let mask = Section::network_mask(AddressFamily::Ipv4, 4, 24).unwrap();
        assert_eq!(range.mask(&mask).unwrap(), range);

        let prefixed_mask = ipv4(&[255, 0, 255, 0]).set_prefix_len(24).unwrap();
        assert_eq!(
            range.mask(&prefixed_mask).unwrap(),
            ipv4_range(&[(1, 1), (0, 0), (3, 3), (0, 255)])
        );

        // host bits not full range: plain masking
        let partial = ipv4_range(&[(1, 1), (2, 2), (3, 3), (0, 15)]);
        assert_eq!(partial.mask(&mask).unwrap(), ipv4(&[1, 2, 3, 0]));
    }

    #[test]
    fn test_bitwise_or_keeps_host_range_of_block() {
        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (0, 255)]);
        let mask = ipv4(&[0, 0x80, 0, 0xff]).set_prefix_len(24).unwrap();
        assert_eq!(
            range.bitwise_or(&mask).unwrap(),
            ipv4_range(&[(1, 1), (0x82, 0x82), (3, 3), (0, 255)])
        );
    }

    #[test]
    fn test_mask_non_prefix_mask_fails() {
        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (2, 4)]);
        let mask = ipv4(&[255, 255, 255, 0xfe]);
        let err = range.mask(&mask).unwrap_err();
        assert_eq!(
            err,
            Error::IncompatibleRange {
                operation: RangeOperation::Mask,
                index: 3,
                lower: 2,
                upper: 4,
            }
        );
    }

    #[test]
    fn test_mask_gap_between_unchanged_bounds_fails() {
        // 1.2.3.2-4 & 0xfe keeps both bounds but maps 3 onto 2
        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (2, 4)]);
        assert_eq!(range.lower().mask(&ipv4(&[255, 255, 255, 0xfe])).unwrap(), range.lower());
        assert!(range
            .mask(&ipv4(&[255, 255, 255, 0xfe]))
            .unwrap_err()
            .is_incompatible_range());

        // 0x10 and 0x20 survive a /28 zero-host, 0x11-0x1f do not
        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (0x10, 0x20)]);
        let err = range.to_zero_host_len(28).unwrap_err();
        assert_eq!(
            err,
            Error::IncompatibleRange {
                operation: RangeOperation::ZeroHost,
                index: 3,
                lower: 0x10,
                upper: 0x20,
            }
        );

        // 1 | 1 = 1, 2 | 1 = 3, 3 | 1 = 3
        let range = ipv4_range(&[(1, 1), (1, 3), (3, 3), (4, 4)]);
        let err = range.bitwise_or(&ipv4(&[0, 1, 0, 0])).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompatibleRange {
                operation: RangeOperation::BitwiseOr,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_mask_size_mismatch() {
        let a = ipv4(&[1, 2, 3, 4]);
        let b = ipv4(&[255, 255, 255]);
        assert_eq!(a.mask(&b).unwrap_err(), Error::SizeMismatch(4, 3));

        let mac = Section::from_values(AddressFamily::Mac, &[1, 2, 3, 4]).unwrap();
        assert!(matches!(a.mask(&mac), Err(Error::FamilyMismatch(_, _))));
    }

    #[test]
    fn test_mask_idempotent() {
        let range = ipv4_range(&[(10, 10), (0, 255), (0, 255), (0, 255)]);
        let mask = ipv4(&[255, 0, 255, 0]);
        let once = range.mask(&mask).unwrap();
        let twice = once.mask(&mask).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, ipv4_range(&[(10, 10), (0, 0), (0, 255), (0, 0)]));
    }

    #[test]
    fn test_bitwise_or() {
        let addr = ipv4(&[10, 1, 2, 3]);
        let or = addr.bitwise_or(&ipv4(&[0, 0, 0, 0xf0])).unwrap();
        assert_eq!(or, ipv4(&[10, 1, 2, 0xf3]));

        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (2, 4)]);
        let err = range.bitwise_or(&ipv4(&[0, 0, 0, 1])).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompatibleRange {
                operation: RangeOperation::BitwiseOr,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_and_max_host() {
        let addr = ipv4(&[192, 168, 7, 9]).set_prefix_len(20).unwrap();
        let zero = addr.to_zero_host().unwrap();
        assert_eq!(zero.value(), 0xc0a8_0000);
        assert_eq!(zero.prefix_len(), Some(20));
        let max = addr.to_max_host().unwrap();
        assert_eq!(max.value(), 0xc0a8_0fff);

        let unprefixed = ipv4(&[1, 2, 3, 4]);
        assert_eq!(unprefixed.to_zero_host().unwrap(), ipv4(&[0, 0, 0, 0]));
        assert_eq!(unprefixed.to_max_host().unwrap(), ipv4(&[255, 255, 255, 255]));
    }

    #[test]
    fn test_zero_host_of_partial_range_fails() {
        let range = ipv4_range(&[(1, 1), (2, 2), (3, 3), (10, 31)]);
        let err = range.to_zero_host_len(28).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompatibleRange {
                operation: RangeOperation::ZeroHost,
                index: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_network() {
        let addr = ipv4(&[192, 168, 7, 9]).set_prefix_len(16).unwrap();
        let host = addr.to_zero_network().unwrap();
        assert_eq!(host.value(), 0x0000_0709);
        assert_eq!(host.prefix_len(), Some(16));
    }

    #[test]
    fn test_unchanged_mask_returns_same_section() {
        let addr = ipv4(&[1, 2, 3, 4]);
        let all_ones = ipv4(&[255, 255, 255, 255]);
        assert_eq!(addr.mask(&all_ones).unwrap(), addr);
    }
}
