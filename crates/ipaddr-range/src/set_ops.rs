//! Containment, overlap, intersection and subtraction of sections

use crate::models::{Section, Segment};
use crate::Result;

impl Section {
    /// Whether every value of `other` is a value of this section
    ///
    /// Sections of a different family or segment count are never contained.
    pub fn contains(&self, other: &Section) -> bool {
        self.check_compatible(other).is_ok()
            && self
                .segments()
                .iter()
                .zip(other.segments())
                .all(|(a, b)| a.contains(b))
    }

    /// Whether the two sections share at least one value
    pub fn overlaps(&self, other: &Section) -> bool {
        self.check_compatible(other).is_ok()
            && self
                .segments()
                .iter()
                .zip(other.segments())
                .all(|(a, b)| a.overlaps(b))
    }

    /// Values in both sections, or `None` when they are disjoint
    ///
    /// The result has no prefix length.
    pub fn intersect(&self, other: &Section) -> Result<Option<Section>> {
        self.check_compatible(other)?;
        if !self.overlaps(other) {
            return Ok(None);
        }
        let segments = self
            .segments()
            .iter()
            .zip(other.segments())
            .map(|(a, b)| intersect_segments(a, b))
            .collect();
        Ok(Some(self.with_segments(segments, None)))
    }

    /// Values of this section not in `other`, as disjoint sections in ascending order
    ///
    /// Empty when `other` contains this section. The results have no prefix length.
    pub fn subtract(&self, other: &Section) -> Result<Vec<Section>> {
        self.check_compatible(other)?;
        if !self.overlaps(other) {
            return Ok(vec![self.without_prefix_len()]);
        }
        if other.contains(self) {
            return Ok(Vec::new());
        }
        let ours = self.segments();
        let theirs = other.segments();
        let mut remainders = Vec::new();
        let mut shared: Vec<Segment> = Vec::with_capacity(ours.len());
        for (index, (a, b)) in ours.iter().zip(theirs).enumerate() {
            let bits = a.bit_count();
            let mut piece = |lower, upper| {
                let mut segments = shared.clone();
                segments.push(Segment::from_bounds(lower, upper, bits, None));
                segments.extend_from_slice(&ours[index + 1..]);
                remainders.push(self.with_segments(segments, None));
            };
            if a.lower() < b.lower() {
                piece(a.lower(), b.lower() - 1);
            }
            if a.upper() > b.upper() {
                piece(b.upper() + 1, a.upper());
            }
            shared.push(intersect_segments(a, b));
        }
        remainders.sort();
        Ok(remainders)
    }
}

fn intersect_segments(a: &Segment, b: &Segment) -> Segment {
    Segment::from_bounds(
        a.lower().max(b.lower()),
        a.upper().min(b.upper()),
        a.bit_count(),
        None,
    )
}
