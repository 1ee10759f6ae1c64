//! Per-segment range masking
//!
//! Masking every value of a range `[lower, upper]` does not always produce a
//! contiguous set. The functions here decide once, from the bounds and the
//! mask, which of the [`Masker`] variants applies, so callers never test
//! individual values.

/// Bitwise operation applied by a mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskOp {
    And,
    Or,
}

impl MaskOp {
    /// Select the masker for applying this operation to `[lower, upper]`
    pub fn masker(self, lower: u64, upper: u64, mask: u64, max_value: u64) -> Masker {
        match self {
            MaskOp::And => mask_range(lower, upper, mask, max_value),
            MaskOp::Or => bitwise_or_range(lower, upper, mask, max_value),
        }
    }

    #[inline]
    pub(crate) fn apply(self, value: u64, mask: u64) -> u64 {
        match self {
            MaskOp::And => value & mask,
            MaskOp::Or => value | mask,
        }
    }
}

/// How a masked range maps onto new bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Masker {
    /// Sequential; the new bounds are the masked bounds
    Direct,
    /// Sequential; the bits of `full_range_bits` span every value after masking,
    /// so the bounds are widened over them
    FullRange { full_range_bits: u64 },
    /// The masked values have gaps and cannot be expressed as one range
    Incompatible,
}

impl Masker {
    pub fn is_sequential(&self) -> bool {
        !matches!(self, Masker::Incompatible)
    }

    /// New `(lower, upper)` bounds, or `None` when the result is not sequential
    pub fn apply(&self, op: MaskOp, lower: u64, upper: u64, mask: u64) -> Option<(u64, u64)> {
        match *self {
            Masker::Direct => Some((op.apply(lower, mask), op.apply(upper, mask))),
            Masker::FullRange { full_range_bits } => Some((
                op.apply(lower, mask) & !full_range_bits,
                op.apply(upper, mask) | full_range_bits,
            )),
            Masker::Incompatible => None,
        }
    }
}

#[inline]
fn low_ones(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Masker for ANDing every value in `[lower, upper]` with `mask`
///
/// Bits above the highest bit where the bounds differ are shared by every value
/// and stay constant. Below it, the highest mask bit still set decides: every
/// mask bit beneath it must be set, and when the highest varying bit itself is
/// masked off, the range must be wide enough to cover every combination of
/// the surviving low bits.
pub fn mask_range(lower: u64, upper: u64, mask: u64, max_value: u64) -> Masker {
    if lower == upper || mask == 0 || mask & max_value == max_value {
        return Masker::Direct;
    }
    let top = u64::BITS - 1 - (lower ^ upper).leading_zeros();
    let covering = mask & low_ones(top + 1);
    if covering == 0 {
        return Masker::Direct;
    }
    let highest = u64::BITS - 1 - covering.leading_zeros();
    let below = low_ones(highest + 1);
    if covering != below {
        return Masker::Incompatible;
    }
    if highest == top {
        return Masker::Direct;
    }
    if upper - lower >= below {
        Masker::FullRange {
            full_range_bits: below,
        }
    } else {
        Masker::Incompatible
    }
}

/// Masker for ORing every value in `[lower, upper]` with `mask`
///
/// OR is AND on complemented values: `v | m == !(!v & !m)`, and complementing
/// maps the range `[lower, upper]` onto `[!upper, !lower]`.
pub fn bitwise_or_range(lower: u64, upper: u64, mask: u64, max_value: u64) -> Masker {
    mask_range(
        max_value ^ upper,
        max_value ^ lower,
        !mask & max_value,
        max_value,
    )
}
