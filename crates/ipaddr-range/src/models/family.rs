//! Address family constants

use super::{BitCount, SegInt};
use serde::{Deserialize, Serialize};

/// Address family of a section or address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFamily {
    /// IPv4: four 8-bit segments
    Ipv4,
    /// IPv6: eight 16-bit segments
    Ipv6,
    /// MAC: six (EUI-48) or eight (EUI-64) 8-bit segments
    Mac,
}

impl AddressFamily {
    /// Bits in each segment
    pub const fn bits_per_segment(self) -> BitCount {
        match self {
            AddressFamily::Ipv4 | AddressFamily::Mac => 8,
            AddressFamily::Ipv6 => 16,
        }
    }

    /// Bytes in each segment
    pub const fn bytes_per_segment(self) -> usize {
        match self {
            AddressFamily::Ipv4 | AddressFamily::Mac => 1,
            AddressFamily::Ipv6 => 2,
        }
    }

    /// Largest value a segment can hold
    pub const fn max_segment_value(self) -> SegInt {
        match self {
            AddressFamily::Ipv4 | AddressFamily::Mac => 0xff,
            AddressFamily::Ipv6 => 0xffff,
        }
    }

    /// Segment count of a full address
    pub const fn segment_count(self) -> usize {
        match self {
            AddressFamily::Ipv4 => 4,
            AddressFamily::Ipv6 => 8,
            AddressFamily::Mac => 6,
        }
    }

    /// Largest segment count a section of this family may have
    pub const fn max_segment_count(self) -> usize {
        match self {
            AddressFamily::Ipv4 => 4,
            AddressFamily::Ipv6 | AddressFamily::Mac => 8,
        }
    }

    /// Bit count of a full address
    pub const fn bit_count(self) -> BitCount {
        self.bits_per_segment() * self.segment_count() as BitCount
    }

    pub const fn is_ip(self) -> bool {
        !matches!(self, AddressFamily::Mac)
    }
}
