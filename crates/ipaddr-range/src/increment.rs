//! Increment engine
//!
//! Moves a section through the ordered enumeration of its values. Index `0` is
//! the lowest value; indices past the range continue from the highest value and
//! negative indices walk below the lowest value. Running off either end of the
//! address space yields `None`.
//!
//! Arithmetic runs on `u64` while both the upper value and the range count fit
//! in 64 bits, and on `u128` otherwise.

use crate::models::{SegInt, Section, Segment};
use std::ops::{Div, Rem};
use tracing::trace;

/// Integer width used for an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementRegime {
    /// Upper value and count minus one fit in 64 bits
    Fixed,
    /// Values need up to 128 bits
    Wide,
}

/// Unsigned word the odometer walk runs on
trait Word: Copy + PartialEq + Div<Output = Self> + Rem<Output = Self> + From<u64> {
    const ZERO: Self;

    fn low_segment(self) -> SegInt;
}

impl Word for u64 {
    const ZERO: Self = 0;

    fn low_segment(self) -> SegInt {
        self as SegInt
    }
}

impl Word for u128 {
    const ZERO: Self = 0;

    fn low_segment(self) -> SegInt {
        self as SegInt
    }
}

/// Whether moving `increment` steps leaves the address space
///
/// Negative increments start at `lower`. Positive increments past the range
/// continue from `upper`.
fn is_overflow(increment: i64, lower: u128, upper: u128, count_minus_one: u128, max: u128) -> bool {
    let magnitude = u128::from(increment.unsigned_abs());
    if increment < 0 {
        return lower < magnitude;
    }
    if magnitude <= count_minus_one {
        return false;
    }
    magnitude - count_minus_one > max - upper
}

/// Mixed-radix walk from the least-significant segment
///
/// Each segment takes `lower + increment % count` and carries the quotient to
/// the next more-significant segment. Segments the carry never reaches stay at
/// their lower value.
fn odometer<W: Word>(segments: &[Segment], mut increment: W) -> Vec<Segment> {
    let mut result: Vec<Segment> = segments
        .iter()
        .map(|seg| Segment::from_bounds(seg.lower(), seg.lower(), seg.bit_count(), None))
        .collect();
    for (index, seg) in segments.iter().enumerate().rev() {
        if increment == W::ZERO {
            break;
        }
        let count = W::from(seg.count());
        let value = seg.lower() + (increment % count).low_segment();
        increment = increment / count;
        result[index] = Segment::from_bounds(value, value, seg.bit_count(), None);
    }
    result
}

impl Section {
    /// Integer width an increment of this section runs on
    pub fn increment_regime(&self) -> IncrementRegime {
        let fits = |v: u128| v <= u128::from(u64::MAX);
        if fits(self.upper_value()) && fits(self.count_minus_one()) {
            IncrementRegime::Fixed
        } else {
            IncrementRegime::Wide
        }
    }

    /// Section at position `increment` of this range's enumeration
    ///
    /// `0` is the lowest value and `count - 1` the highest. Returns `None` when
    /// the position lies outside the address space. The prefix length is kept.
    pub fn increment(&self, increment: i64) -> Option<Section> {
        let count_minus_one = self.count_minus_one();
        if is_overflow(
            increment,
            self.value(),
            self.upper_value(),
            count_minus_one,
            self.max_value(),
        ) {
            trace!(increment, value = %self.value(), "increment leaves the address space");
            return None;
        }
        let regime = self.increment_regime();
        if !self.is_multiple() || increment <= 0 {
            return Some(self.offset_value(regime, self.value(), increment));
        }
        let magnitude = u128::from(increment.unsigned_abs());
        if magnitude == count_minus_one {
            return Some(self.upper());
        }
        if magnitude < count_minus_one {
            let segments = match regime {
                IncrementRegime::Fixed => odometer(self.segments(), magnitude as u64),
                IncrementRegime::Wide => odometer(self.segments(), magnitude),
            };
            return Some(self.with_segments(segments, self.prefix_len()));
        }
        let beyond = (magnitude - count_minus_one) as i64;
        Some(self.offset_value(regime, self.upper_value(), beyond))
    }

    /// Move `increment` steps from the nearer boundary
    ///
    /// Positive increments start at the upper value, negative ones at the lower
    /// value; zero returns the section unchanged.
    pub fn increment_boundary(&self, increment: i64) -> Option<Section> {
        match increment {
            0 => Some(self.clone()),
            i if i < 0 => self.lower().increment(i),
            i => self.upper().increment(i),
        }
    }

    /// Position of the single value `other` in this range's enumeration
    ///
    /// The inverse of [`Section::increment`]. `None` when `other` is not a
    /// single value of the same shape, falls in a gap of this range, or its
    /// position does not fit in an `i128`.
    pub fn enumerate(&self, other: &Section) -> Option<i128> {
        if self.check_compatible(other).is_err() || other.is_multiple() {
            return None;
        }
        let value = other.value();
        if value < self.value() {
            return i128::try_from(self.value() - value).ok().map(|d| -d);
        }
        if value > self.upper_value() {
            let beyond = i128::try_from(value - self.upper_value()).ok()?;
            return i128::try_from(self.count_minus_one()).ok()?.checked_add(beyond);
        }
        let mut index = 0u128;
        for (seg, target) in self.segments().iter().zip(other.segments()) {
            if !seg.contains_value(target.lower()) {
                return None;
            }
            index = index * u128::from(seg.count()) + u128::from(target.lower() - seg.lower());
        }
        i128::try_from(index).ok()
    }

    /// Single value `base + offset`; the caller has ruled out overflow
    fn offset_value(&self, regime: IncrementRegime, base: u128, offset: i64) -> Section {
        let value = match regime {
            IncrementRegime::Fixed => {
                let base = base as u64;
                let moved = if offset < 0 {
                    Some(base - offset.unsigned_abs())
                } else {
                    base.checked_add(offset as u64)
                };
                // sums past 64 bits continue in the wide regime
                match moved {
                    Some(v) => u128::from(v),
                    None => u128::from(base) + offset as u128,
                }
            }
            IncrementRegime::Wide => {
                if offset < 0 {
                    base - u128::from(offset.unsigned_abs())
                } else {
                    base + offset as u128
                }
            }
        };
        Section::from_value_range_unchecked(
            self.family(),
            self.segment_count(),
            value,
            value,
            self.prefix_len(),
        )
    }
}
