//! Segment, bit and byte reversal of sections
//!
//! Reversal maps each value separately, so a multi-valued segment survives
//! only when it is full range. Results carry no prefix length.

use crate::error::RangeOperation;
use crate::models::{Section, Segment};
use crate::{Error, Result};
use tracing::debug;

impl Section {
    /// Segments in reverse order
    pub fn reverse_segments(&self) -> Section {
        let segments = self
            .segments()
            .iter()
            .rev()
            .map(Segment::without_prefix_len)
            .collect();
        self.with_segments(segments, None)
    }

    /// Reverse the bits of the whole section, or of each byte when `per_byte`
    pub fn reverse_bits(&self, per_byte: bool) -> Result<Section> {
        let reversed = self.reverse_each(RangeOperation::ReverseBits, |seg| {
            seg.reverse_bits(per_byte)
        })?;
        if per_byte {
            return Ok(self.with_segments(reversed, None));
        }
        Ok(self.with_segments(reversed.into_iter().rev().collect(), None))
    }

    /// Reverse the byte order of the whole section
    pub fn reverse_bytes(&self) -> Result<Section> {
        let reversed = self.reverse_each(RangeOperation::ReverseBytes, Segment::reverse_bytes)?;
        Ok(self.with_segments(reversed.into_iter().rev().collect(), None))
    }

    fn reverse_each(
        &self,
        operation: RangeOperation,
        reverse: impl Fn(&Segment) -> Option<Segment>,
    ) -> Result<Vec<Segment>> {
        self.segments()
            .iter()
            .enumerate()
            .map(|(index, seg)| {
                reverse(seg).ok_or_else(|| {
                    debug!(%operation, index, "reversed segment range is not sequential");
                    Error::IncompatibleRange {
                        operation,
                        index,
                        lower: seg.lower(),
                        upper: seg.upper(),
                    }
                })
            })
            .collect()
    }
}
