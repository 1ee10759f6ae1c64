//! Trie keys: bit access and the containment-consistent trie order

use crate::models::{
    Address, BitCount, Ipv4Address, Ipv6Address, MacAddress, Section,
};
use std::cmp::Ordering;
use std::fmt;

/// A single address or prefix block usable as an address trie key
///
/// Bits are numbered from the most significant, and are read from the lowest
/// value. Implementors memoise the lowest value so repeated comparisons during
/// trie descent stay cheap.
pub trait TrieKey: Clone + fmt::Debug {
    fn bit_count(&self) -> BitCount;

    fn prefix_len(&self) -> Option<BitCount>;

    /// Integer value of the lowest address
    fn lower_value(&self) -> u128;

    fn is_multiple(&self) -> bool;

    fn is_single_prefix_block(&self) -> bool;

    fn without_prefix_len(&self) -> Self;

    /// Block of `prefix_len` around the lowest value; lengths past the bit count are clamped
    fn to_prefix_block_key(&self, prefix_len: BitCount) -> Self;

    /// Unprefixed single address of this key's shape
    fn single_value_key(&self, value: u128) -> Self;

    fn assign_prefix_for_single_block(&self) -> Option<Self>;

    fn span_with_prefix_blocks(&self) -> Vec<Self>;

    /// Prefix length used for trie ordering; addresses count as full-length prefixes
    fn trie_prefix_len(&self) -> BitCount {
        self.prefix_len()
            .map_or(self.bit_count(), |p| p.min(self.bit_count()))
    }

    /// Bit `index` of the lowest value, most significant first
    fn is_one_bit(&self, index: BitCount) -> bool {
        debug_assert!(index < self.bit_count());
        (self.lower_value() >> (self.bit_count() - 1 - index)) & 1 == 1
    }

    /// Length of the run of ones (or zeros) ending the lowest value
    fn trailing_bit_count(&self, ones: bool) -> BitCount {
        let value = self.lower_value();
        let run = if ones {
            value.trailing_ones()
        } else {
            value.trailing_zeros()
        };
        run.min(self.bit_count())
    }

    /// Number of equal leading bits of the two lowest values, at most `limit`
    fn matching_bits(&self, other: &Self, limit: BitCount) -> BitCount {
        let bit_count = self.bit_count();
        if bit_count == 0 {
            return 0;
        }
        let differing = (self.lower_value() ^ other.lower_value()) << (u128::BITS - bit_count);
        differing.leading_zeros().min(limit)
    }

    /// Trie order: a block sorts after the keys of its lower half and before those of its upper half
    ///
    /// With `m` the shorter prefix length, the first `m` bits decide. When they
    /// agree, equal prefix lengths mean equal keys; otherwise bit `m` of the
    /// longer key places it below (0) or above (1) the shorter one.
    fn trie_compare(&self, other: &Self) -> Ordering {
        let (own, theirs) = (self.trie_prefix_len(), other.trie_prefix_len());
        let shorter = own.min(theirs);
        let matched = self.matching_bits(other, shorter);
        if matched < shorter {
            return if self.is_one_bit(matched) {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        match own.cmp(&theirs) {
            Ordering::Equal => Ordering::Equal,
            Ordering::Less if other.is_one_bit(shorter) => Ordering::Less,
            Ordering::Less => Ordering::Greater,
            Ordering::Greater if self.is_one_bit(shorter) => Ordering::Greater,
            Ordering::Greater => Ordering::Less,
        }
    }

    /// Highest address of the lower half of this block
    ///
    /// The first host bit is 0 and the rest are 1. A single address maps to itself.
    fn to_max_lower(&self) -> Self {
        let host = self.bit_count() - self.trie_prefix_len();
        if host == 0 {
            return self.without_prefix_len();
        }
        let network = self.lower_value() & !low_bits(host);
        self.single_value_key(network | low_bits(host - 1))
    }

    /// Lowest address of the upper half of this block
    ///
    /// The first host bit is 1 and the rest are 0. A single address maps to itself.
    fn to_min_upper(&self) -> Self {
        let host = self.bit_count() - self.trie_prefix_len();
        if host == 0 {
            return self.without_prefix_len();
        }
        let network = self.lower_value() & !low_bits(host);
        self.single_value_key(network | (1u128 << (host - 1)))
    }

    /// Normalise to an unprefixed single address or an exact prefix block
    ///
    /// `None` when the key is a range no single prefix block reproduces.
    fn to_block_or_address(&self) -> Option<Self> {
        if !self.is_multiple() {
            return Some(self.without_prefix_len());
        }
        if self.is_single_prefix_block() {
            return Some(self.clone());
        }
        self.assign_prefix_for_single_block()
    }
}

fn low_bits(bits: BitCount) -> u128 {
    if bits >= u128::BITS {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

impl TrieKey for Section {
    fn bit_count(&self) -> BitCount {
        Section::bit_count(self)
    }

    fn prefix_len(&self) -> Option<BitCount> {
        Section::prefix_len(self)
    }

    fn lower_value(&self) -> u128 {
        self.value()
    }

    fn is_multiple(&self) -> bool {
        Section::is_multiple(self)
    }

    fn is_single_prefix_block(&self) -> bool {
        Section::is_single_prefix_block(self)
    }

    fn without_prefix_len(&self) -> Self {
        Section::without_prefix_len(self)
    }

    fn to_prefix_block_key(&self, prefix_len: BitCount) -> Self {
        self.prefix_block(prefix_len.min(Section::bit_count(self)))
    }

    fn single_value_key(&self, value: u128) -> Self {
        Section::from_value_range_unchecked(self.family(), self.segment_count(), value, value, None)
    }

    fn assign_prefix_for_single_block(&self) -> Option<Self> {
        Section::assign_prefix_for_single_block(self)
    }

    fn span_with_prefix_blocks(&self) -> Vec<Self> {
        Section::span_with_prefix_blocks(self)
    }
}

macro_rules! delegate_trie_key {
    ($name:ty) => {
        impl TrieKey for $name {
            fn bit_count(&self) -> BitCount {
                self.section().bit_count()
            }

            fn prefix_len(&self) -> Option<BitCount> {
                self.section().prefix_len()
            }

            fn lower_value(&self) -> u128 {
                self.section().value()
            }

            fn is_multiple(&self) -> bool {
                self.section().is_multiple()
            }

            fn is_single_prefix_block(&self) -> bool {
                self.section().is_single_prefix_block()
            }

            fn without_prefix_len(&self) -> Self {
                self.rewrap(self.section().without_prefix_len())
            }

            fn to_prefix_block_key(&self, prefix_len: BitCount) -> Self {
                self.rewrap(TrieKey::to_prefix_block_key(self.section(), prefix_len))
            }

            fn single_value_key(&self, value: u128) -> Self {
                self.rewrap(self.section().single_value_key(value))
            }

            fn assign_prefix_for_single_block(&self) -> Option<Self> {
                self.section()
                    .assign_prefix_for_single_block()
                    .map(|s| self.rewrap(s))
            }

            fn span_with_prefix_blocks(&self) -> Vec<Self> {
                self.section()
                    .span_with_prefix_blocks()
                    .into_iter()
                    .map(|s| self.rewrap(s))
                    .collect()
            }
        }
    };
}

delegate_trie_key!(Ipv4Address);
delegate_trie_key!(Ipv6Address);
delegate_trie_key!(MacAddress);
delegate_trie_key!(Address);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressFamily, SegInt};

    fn ipv4(values: &[SegInt]) -> Section {
        Section::from_values(AddressFamily::Ipv4, values).unwrap()
    }

    fn block(values: &[SegInt], prefix_len: BitCount) -> Section {
        ipv4(values).to_prefix_block_len(prefix_len).unwrap()
    }

    #[test]
    fn test_bit_access() {
        let addr = ipv4(&[0x80, 0, 0, 0x03]);
        assert!(addr.is_one_bit(0));
        assert!(!addr.is_one_bit(1));
        assert!(addr.is_one_bit(31));
        assert_eq!(addr.trailing_bit_count(true), 2);
        assert_eq!(addr.trailing_bit_count(false), 0);
        assert_eq!(ipv4(&[0, 0, 0, 0]).trailing_bit_count(false), 32);
        assert_eq!(addr.matching_bits(&ipv4(&[0x80, 0, 0, 0x02]), 32), 31);
        assert_eq!(addr.matching_bits(&ipv4(&[0x80, 0, 0, 0x02]), 8), 8);
    }

    #[test]
    fn test_trie_order() {
        let a = ipv4(&[1, 2, 3, 4]);
        let b = block(&[1, 2, 3, 0], 24);
        let c = block(&[1, 2, 4, 0], 24);
        // 1.2.3.4 has bit 24 clear, so it sorts in the lower half of b
        assert_eq!(a.trie_compare(&b), Ordering::Less);
        assert_eq!(b.trie_compare(&a), Ordering::Greater);
        assert_ne!(a.trie_compare(&c), Ordering::Equal);
        assert_eq!(b.trie_compare(&c), Ordering::Less);

        let upper_half = ipv4(&[1, 2, 3, 200]);
        assert_eq!(upper_half.trie_compare(&b), Ordering::Greater);
    }

    #[test]
    fn test_full_length_prefix_equals_address() {
        let addr = ipv4(&[1, 2, 3, 4]);
        let prefixed = addr.set_prefix_len(32).unwrap();
        assert_eq!(addr.trie_compare(&prefixed), Ordering::Equal);
        assert_eq!(prefixed.to_block_or_address().unwrap(), addr);
    }

    #[test]
    fn test_max_lower_and_min_upper() {
        let b = block(&[10, 0, 0, 0], 8);
        let max_lower = b.to_max_lower();
        let min_upper = b.to_min_upper();
        assert_eq!(max_lower, ipv4(&[10, 127, 255, 255]));
        assert_eq!(min_upper, ipv4(&[10, 128, 0, 0]));
        assert_eq!(max_lower.trie_compare(&b), Ordering::Less);
        assert_eq!(min_upper.trie_compare(&b), Ordering::Greater);

        let addr = ipv4(&[10, 0, 0, 1]);
        assert_eq!(addr.to_max_lower(), addr);
    }

    #[test]
    fn test_to_block_or_address() {
        let range = Section::from_ranges(AddressFamily::Ipv4, &[(10, 10), (0, 0), (4, 7), (0, 255)])
            .unwrap();
        let normalised = range.to_block_or_address().unwrap();
        assert_eq!(normalised.prefix_len(), Some(22));

        let gapped = Section::from_ranges(AddressFamily::Ipv4, &[(10, 10), (0, 0), (0, 0), (1, 6)])
            .unwrap();
        assert!(gapped.to_block_or_address().is_none());

        let host = ipv4(&[10, 0, 0, 9]).set_prefix_len(24).unwrap();
        assert_eq!(host.to_block_or_address().unwrap(), ipv4(&[10, 0, 0, 9]));
    }

    #[test]
    fn test_address_keys() {
        let v4 = Ipv4Address::new(ipv4(&[192, 168, 0, 1])).unwrap();
        let net = TrieKey::to_prefix_block_key(&v4, 16);
        assert_eq!(net.prefix_len(), Some(16));
        assert_eq!(v4.trie_compare(&net), Ordering::Less);

        let any = Address::from(v4.clone());
        assert_eq!(any.lower_value(), 0xc0a8_0001);
    }
}
