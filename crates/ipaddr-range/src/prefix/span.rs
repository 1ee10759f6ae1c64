//! Spanning and covering value ranges with prefix blocks and sequential blocks

use crate::models::{BitCount, Section};
use crate::Result;
use tracing::instrument;

/// Mask of the host bits beyond `prefix_len` in a `bit_count`-bit value
fn host_bits(bit_count: BitCount, prefix_len: BitCount) -> u128 {
    let host = bit_count - prefix_len;
    if host >= u128::BITS {
        u128::MAX
    } else {
        (1u128 << host) - 1
    }
}

/// Prefix blocks exactly covering `lower..=upper`, in ascending order
///
/// Bisects the block `block_start/block_prefix` and recurses only into the
/// halves intersecting the target, stopping at halves fully inside it.
fn bisect(
    lower: u128,
    upper: u128,
    block_start: u128,
    block_prefix: BitCount,
    bit_count: BitCount,
    blocks: &mut Vec<(u128, BitCount)>,
) {
    let block_end = block_start | host_bits(bit_count, block_prefix);
    if lower == block_start && upper == block_end {
        blocks.push((block_start, block_prefix));
        return;
    }
    let half = block_prefix + 1;
    let mid = block_start | (1u128 << (bit_count - half));
    if lower < mid {
        bisect(lower, upper.min(mid - 1), block_start, half, bit_count, blocks);
    }
    if upper >= mid {
        bisect(lower.max(mid), upper, mid, half, bit_count, blocks);
    }
}

pub(crate) fn span_values(lower: u128, upper: u128, bit_count: BitCount) -> Vec<(u128, BitCount)> {
    let mut blocks = Vec::new();
    bisect(lower, upper, 0, 0, bit_count, &mut blocks);
    blocks
}

/// Sort and coalesce overlapping or adjacent intervals
pub(crate) fn merge_intervals(mut intervals: Vec<(u128, u128)>) -> Vec<(u128, u128)> {
    intervals.sort_unstable();
    let mut merged: Vec<(u128, u128)> = Vec::with_capacity(intervals.len());
    for (lower, upper) in intervals {
        match merged.last_mut() {
            Some(last) if last.1 == u128::MAX || lower <= last.1 + 1 => {
                last.1 = last.1.max(upper);
            }
            _ => merged.push((lower, upper)),
        }
    }
    merged
}

impl Section {
    /// Prefix block of `value` at `prefix_len` with this section's shape
    fn block_of(&self, value: u128, prefix_len: BitCount) -> Section {
        let host = host_bits(self.bit_count(), prefix_len);
        Section::from_value_range_unchecked(
            self.family(),
            self.segment_count(),
            value & !host,
            value | host,
            Some(prefix_len),
        )
    }

    /// Unprefixed sequential section spanning `lower..=upper` with this section's shape
    fn sequential_of(&self, lower: u128, upper: u128) -> Section {
        Section::from_value_range_unchecked(
            self.family(),
            self.segment_count(),
            lower,
            upper,
            None,
        )
    }

    /// Minimal prefix blocks exactly covering `lower..=upper`
    fn prefix_blocks_of(&self, lower: u128, upper: u128) -> Vec<Section> {
        span_values(lower, upper, self.bit_count())
            .into_iter()
            .map(|(start, prefix)| self.block_of(start, prefix))
            .collect()
    }

    /// Sequential sections exactly covering `lower..=upper`
    ///
    /// Adjacent prefix blocks are joined while the joined range stays
    /// representable as one sequential section.
    fn sequential_blocks_of(&self, lower: u128, upper: u128) -> Vec<Section> {
        let family = self.family();
        let count = self.segment_count();
        let mut runs: Vec<(u128, u128)> = Vec::new();
        for (start, prefix) in span_values(lower, upper, self.bit_count()) {
            let end = start | host_bits(self.bit_count(), prefix);
            if let Some(last) = runs.last_mut() {
                let joinable = matches!(
                    Section::from_value_range(family, count, last.0, end),
                    Ok(Some(_))
                );
                if joinable {
                    last.1 = end;
                    continue;
                }
            }
            runs.push((start, end));
        }
        runs.into_iter()
            .map(|(lo, hi)| self.sequential_of(lo, hi))
            .collect()
    }

    /// Value intervals of this section, one per sequential block
    fn intervals(&self) -> Vec<(u128, u128)> {
        if self.is_sequential() {
            return vec![(self.value(), self.upper_value())];
        }
        self.sequential_blocks()
            .map(|block| (block.value(), block.upper_value()))
            .collect()
    }

    /// Smallest single prefix block containing every value of this section
    pub fn cover_with_prefix_block(&self) -> Section {
        self.cover_values(self.value(), self.upper_value())
    }

    /// Smallest single prefix block containing both sections
    pub fn cover_with_prefix_block_to(&self, other: &Section) -> Result<Section> {
        self.check_compatible(other)?;
        Ok(self.cover_values(
            self.value().min(other.value()),
            self.upper_value().max(other.upper_value()),
        ))
    }

    fn cover_values(&self, lower: u128, upper: u128) -> Section {
        let bit_count = self.bit_count();
        let differing = u128::BITS - (lower ^ upper).leading_zeros();
        self.block_of(lower, bit_count - differing.min(bit_count))
    }

    /// Minimal ordered prefix blocks whose union is exactly this section
    #[instrument(level = "trace", skip(self), fields(bit_count = self.bit_count()))]
    pub fn span_with_prefix_blocks(&self) -> Vec<Section> {
        if self.is_single_prefix_block() {
            return vec![self.clone()];
        }
        merge_intervals(self.intervals())
            .into_iter()
            .flat_map(|(lower, upper)| self.prefix_blocks_of(lower, upper))
            .collect()
    }

    /// Minimal ordered prefix blocks spanning from the lowest to the highest value of both sections
    #[instrument(level = "trace", skip(self, other))]
    pub fn span_with_prefix_blocks_to(&self, other: &Section) -> Result<Vec<Section>> {
        self.check_compatible(other)?;
        Ok(self.prefix_blocks_of(
            self.value().min(other.value()),
            self.upper_value().max(other.upper_value()),
        ))
    }

    /// Ordered sequential sections whose union is exactly this section
    #[instrument(level = "trace", skip(self), fields(bit_count = self.bit_count()))]
    pub fn span_with_sequential_blocks(&self) -> Vec<Section> {
        if self.is_sequential() {
            return vec![self.without_prefix_len()];
        }
        merge_intervals(self.intervals())
            .into_iter()
            .flat_map(|(lower, upper)| self.sequential_blocks_of(lower, upper))
            .collect()
    }

    /// Ordered sequential sections spanning from the lowest to the highest value of both sections
    #[instrument(level = "trace", skip(self, other))]
    pub fn span_with_sequential_blocks_to(&self, other: &Section) -> Result<Vec<Section>> {
        self.check_compatible(other)?;
        Ok(self.sequential_blocks_of(
            self.value().min(other.value()),
            self.upper_value().max(other.upper_value()),
        ))
    }

    /// Union of `sections` as minimal ordered prefix blocks
    ///
    /// Every section must share the family and segment count of the first.
    #[instrument(level = "trace", skip(sections), fields(count = sections.len()))]
    pub fn merge_to_prefix_blocks(sections: &[Section]) -> Result<Vec<Section>> {
        let Some(first) = sections.first() else {
            return Ok(Vec::new());
        };
        let intervals = Self::union_intervals(first, sections)?;
        Ok(intervals
            .into_iter()
            .flat_map(|(lower, upper)| first.prefix_blocks_of(lower, upper))
            .collect())
    }

    /// Union of `sections` as ordered sequential sections
    #[instrument(level = "trace", skip(sections), fields(count = sections.len()))]
    pub fn merge_to_sequential_blocks(sections: &[Section]) -> Result<Vec<Section>> {
        let Some(first) = sections.first() else {
            return Ok(Vec::new());
        };
        let intervals = Self::union_intervals(first, sections)?;
        Ok(intervals
            .into_iter()
            .flat_map(|(lower, upper)| first.sequential_blocks_of(lower, upper))
            .collect())
    }

    fn union_intervals(first: &Section, sections: &[Section]) -> Result<Vec<(u128, u128)>> {
        let mut intervals = Vec::new();
        for section in sections {
            first.check_compatible(section)?;
            intervals.extend(section.intervals());
        }
        Ok(merge_intervals(intervals))
    }
}
