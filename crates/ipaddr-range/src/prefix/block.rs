//! Prefix lengths for which a section is a block, and conversion to blocks

use crate::models::{segment_prefix_len, BitCount, Section};
use crate::Result;

impl Section {
    /// Smallest prefix length for which this section is a union of prefix blocks
    ///
    /// Single values give the full bit count. The result is memoised.
    pub fn min_prefix_len_for_block(&self) -> BitCount {
        self.cached_min_prefix_len(|| {
            let bits = self.bits_per_segment();
            let mut total = self.bit_count();
            for seg in self.segments().iter().rev() {
                let seg_prefix = seg.min_prefix_len_for_block();
                if seg_prefix == bits {
                    break;
                }
                total -= bits - seg_prefix;
                if seg_prefix != 0 {
                    break;
                }
            }
            total
        })
    }

    /// Prefix length whose single block is exactly this section, if one exists
    pub fn prefix_len_for_single_block(&self) -> Option<BitCount> {
        let bits = self.bits_per_segment();
        let mut total = 0;
        let mut segments = self.segments().iter();
        while let Some(seg) = segments.next() {
            let seg_prefix = seg.prefix_len_for_single_block()?;
            total += seg_prefix;
            if seg_prefix < bits {
                return segments
                    .all(|later| later.is_full_range())
                    .then_some(total);
            }
        }
        Some(total)
    }

    /// Same values with the prefix length of [`Section::min_prefix_len_for_block`]
    pub fn assign_min_prefix_for_block(&self) -> Section {
        self.with_prefix_len(Some(self.min_prefix_len_for_block()))
    }

    /// Same values with the prefix length of the single block equal to them
    ///
    /// `None` when no single prefix block reproduces this exact range.
    pub fn assign_prefix_for_single_block(&self) -> Option<Section> {
        self.prefix_len_for_single_block()
            .map(|p| self.with_prefix_len(Some(p)))
    }

    /// Expand to the block of the current prefix length; unprefixed sections are returned as is
    pub fn to_prefix_block(&self) -> Section {
        match self.prefix_len() {
            Some(p) => self.prefix_block(p),
            None => self.clone(),
        }
    }

    /// Expand the host bits beyond `prefix_len` to their full range, assigning `prefix_len`
    pub fn to_prefix_block_len(&self, prefix_len: BitCount) -> Result<Section> {
        self.check_prefix_len(prefix_len)?;
        Ok(self.prefix_block(prefix_len))
    }

    pub(crate) fn prefix_block(&self, prefix_len: BitCount) -> Section {
        let bits = self.bits_per_segment();
        let segments = self
            .segments()
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                let seg_prefix = segment_prefix_len(bits, Some(prefix_len), i).unwrap_or(bits);
                seg.to_prefix_block(seg_prefix)
            })
            .collect();
        self.with_segments(segments, Some(prefix_len))
    }

    /// Whether the section has a prefix length and spans whole blocks of it
    pub fn is_prefix_block(&self) -> bool {
        self.prefix_len()
            .is_some_and(|p| self.contains_prefix_block(p))
    }

    /// Whether the section has a prefix length and is exactly one block of it
    pub fn is_single_prefix_block(&self) -> bool {
        self.prefix_len()
            .is_some_and(|p| self.contains_single_prefix_block(p))
    }

    /// Whether every host bit beyond `prefix_len` spans its full range
    ///
    /// Prefix lengths beyond the bit count are clamped to it.
    pub fn contains_prefix_block(&self, prefix_len: BitCount) -> bool {
        match self.boundary(prefix_len) {
            Some((index, seg_prefix)) => {
                self.segment(index).contains_prefix_block(seg_prefix)
                    && self.segments()[index + 1..]
                        .iter()
                        .all(|seg| seg.is_full_range())
            }
            None => true,
        }
    }

    /// Whether the section is exactly one block of `prefix_len`
    pub fn contains_single_prefix_block(&self, prefix_len: BitCount) -> bool {
        match self.boundary(prefix_len) {
            Some((index, seg_prefix)) => {
                self.segments()[..index].iter().all(|seg| !seg.is_multiple())
                    && self.segment(index).contains_single_prefix_block(seg_prefix)
                    && self.segments()[index + 1..]
                        .iter()
                        .all(|seg| seg.is_full_range())
            }
            None => !self.is_multiple(),
        }
    }

    /// Segment holding the first host bit of `prefix_len`, with its in-segment prefix
    fn boundary(&self, prefix_len: BitCount) -> Option<(usize, BitCount)> {
        if prefix_len >= self.bit_count() {
            return None;
        }
        let bits = self.bits_per_segment();
        let index = (prefix_len / bits) as usize;
        Some((index, prefix_len % bits))
    }
}
