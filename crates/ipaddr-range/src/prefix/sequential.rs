//! Sequential-block decomposition and value iteration

use crate::models::{SegInt, Section, Segment};

impl Section {
    /// Index of the segment from which the section splits into sequential blocks
    ///
    /// Every segment after the index is full range. Segments before it are
    /// enumerated one value at a time by [`Section::sequential_blocks`].
    pub fn sequential_block_index(&self) -> usize {
        let segments = self.segments();
        let mut index = segments.len().saturating_sub(1);
        while index > 0 && segments[index].is_full_range() {
            index -= 1;
        }
        index
    }

    /// Number of sequential blocks yielded by [`Section::sequential_blocks`]
    pub fn sequential_block_count(&self) -> u128 {
        self.segments()[..self.sequential_block_index()]
            .iter()
            .fold(1u128, |acc, seg| acc.saturating_mul(u128::from(seg.count())))
    }

    /// Sequential sections whose union is this section, in ascending order
    pub fn sequential_blocks(&self) -> BlockIter {
        BlockIter::new(self.clone(), self.sequential_block_index())
    }

    /// Every individual value of this section, in ascending order
    pub fn iter(&self) -> BlockIter {
        BlockIter::new(self.clone(), self.segment_count())
    }
}

/// Iterator enumerating the leading segments of a section value by value
///
/// Segments from `fixed` onward keep their ranges.
#[derive(Debug, Clone)]
pub struct BlockIter {
    section: Section,
    fixed: usize,
    current: Option<Vec<SegInt>>,
}

impl BlockIter {
    fn new(section: Section, fixed: usize) -> Self {
        let current = section.segments()[..fixed]
            .iter()
            .map(Segment::lower)
            .collect();
        Self {
            section,
            fixed,
            current: Some(current),
        }
    }

    fn advance(&self, mut values: Vec<SegInt>) -> Option<Vec<SegInt>> {
        let segments = self.section.segments();
        for index in (0..self.fixed).rev() {
            if values[index] < segments[index].upper() {
                values[index] += 1;
                return Some(values);
            }
            values[index] = segments[index].lower();
        }
        None
    }
}

impl Iterator for BlockIter {
    type Item = Section;

    fn next(&mut self) -> Option<Section> {
        let values = self.current.take()?;
        let segments = self
            .section
            .segments()
            .iter()
            .enumerate()
            .map(|(i, seg)| match values.get(i) {
                Some(&v) => Segment::from_bounds(v, v, seg.bit_count(), None),
                None => *seg,
            })
            .collect();
        let block = self.section.with_segments(segments, self.section.prefix_len());
        self.current = self.advance(values);
        Some(block)
    }
}
