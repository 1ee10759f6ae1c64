//! Addresses: full-width sections of one family
//!
//! Each family has its own address type wrapping a [`Section`]; [`Address`]
//! is the closed sum of them. IPv6 addresses may carry a [`Zone`].

use super::{AddressFamily, BitCount, Section};
use crate::{Error, Result};
use ipnet::{Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Interface scope of a link-local IPv6 address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(String);

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn check_shape(section: &Section, family: AddressFamily, counts: &[usize]) -> Result<()> {
    if section.family() != family {
        return Err(Error::FamilyMismatch(family, section.family()));
    }
    if !counts.contains(&section.segment_count()) {
        return Err(Error::InvalidSection(format!(
            "{:?} addresses have {:?} segments, got {}",
            family,
            counts,
            section.segment_count()
        )));
    }
    Ok(())
}

/// Operations shared by every address type, delegated to the section
///
/// Results keep the family and segment count, so they are rewrapped without
/// validation.
macro_rules! address_ops {
    ($name:ident) => {
        impl $name {
            pub fn section(&self) -> &Section {
                &self.section
            }

            pub fn into_section(self) -> Section {
                self.section
            }

            pub fn prefix_len(&self) -> Option<BitCount> {
                self.section.prefix_len()
            }

            pub fn bit_count(&self) -> BitCount {
                self.section.bit_count()
            }

            pub fn is_multiple(&self) -> bool {
                self.section.is_multiple()
            }

            pub fn is_sequential(&self) -> bool {
                self.section.is_sequential()
            }

            pub fn is_prefix_block(&self) -> bool {
                self.section.is_prefix_block()
            }

            pub fn count(&self) -> Option<u128> {
                self.section.count()
            }

            pub fn lower(&self) -> Self {
                self.rewrap(self.section.lower())
            }

            pub fn upper(&self) -> Self {
                self.rewrap(self.section.upper())
            }

            pub fn contains(&self, other: &Self) -> bool {
                self.section.contains(&other.section)
            }

            pub fn overlaps(&self, other: &Self) -> bool {
                self.section.overlaps(&other.section)
            }

            pub fn mask(&self, mask: &Self) -> Result<Self> {
                self.section.mask(&mask.section).map(|s| self.rewrap(s))
            }

            pub fn bitwise_or(&self, mask: &Self) -> Result<Self> {
                self.section.bitwise_or(&mask.section).map(|s| self.rewrap(s))
            }

            pub fn to_zero_host(&self) -> Result<Self> {
                self.section.to_zero_host().map(|s| self.rewrap(s))
            }

            pub fn to_max_host(&self) -> Result<Self> {
                self.section.to_max_host().map(|s| self.rewrap(s))
            }

            pub fn increment(&self, increment: i64) -> Option<Self> {
                self.section.increment(increment).map(|s| self.rewrap(s))
            }

            pub fn increment_boundary(&self, increment: i64) -> Option<Self> {
                self.section
                    .increment_boundary(increment)
                    .map(|s| self.rewrap(s))
            }

            pub fn set_prefix_len(&self, prefix_len: BitCount) -> Result<Self> {
                self.section.set_prefix_len(prefix_len).map(|s| self.rewrap(s))
            }

            pub fn without_prefix_len(&self) -> Self {
                self.rewrap(self.section.without_prefix_len())
            }

            pub fn to_prefix_block(&self) -> Self {
                self.rewrap(self.section.to_prefix_block())
            }

            pub fn to_prefix_block_len(&self, prefix_len: BitCount) -> Result<Self> {
                self.section
                    .to_prefix_block_len(prefix_len)
                    .map(|s| self.rewrap(s))
            }

            pub fn assign_prefix_for_single_block(&self) -> Option<Self> {
                self.section
                    .assign_prefix_for_single_block()
                    .map(|s| self.rewrap(s))
            }

            pub fn cover_with_prefix_block(&self) -> Self {
                self.rewrap(self.section.cover_with_prefix_block())
            }

            pub fn span_with_prefix_blocks(&self) -> Vec<Self> {
                self.section
                    .span_with_prefix_blocks()
                    .into_iter()
                    .map(|s| self.rewrap(s))
                    .collect()
            }

            pub fn span_with_prefix_blocks_to(&self, other: &Self) -> Result<Vec<Self>> {
                Ok(self
                    .section
                    .span_with_prefix_blocks_to(&other.section)?
                    .into_iter()
                    .map(|s| self.rewrap(s))
                    .collect())
            }

            /// Every individual address in ascending order
            pub fn iter(&self) -> impl Iterator<Item = Self> + '_ {
                self.section.iter().map(move |s| self.rewrap(s))
            }
        }
    };
}

/// IPv4 address or range of addresses
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Section", into = "Section")]
pub struct Ipv4Address {
    section: Section,
}

impl Ipv4Address {
    /// Wrap a four-segment IPv4 section
    pub fn new(section: Section) -> Result<Self> {
        check_shape(&section, AddressFamily::Ipv4, &[4])?;
        Ok(Self { section })
    }

    pub(crate) fn rewrap(&self, section: Section) -> Self {
        Self { section }
    }
}

address_ops!(Ipv4Address);

/// IPv6 address or range of addresses with an optional zone
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Ipv6Parts", into = "Ipv6Parts")]
pub struct Ipv6Address {
    section: Section,
    zone: Option<Zone>,
}

#[derive(Serialize, Deserialize)]
struct Ipv6Parts {
    section: Section,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zone: Option<Zone>,
}

impl TryFrom<Ipv6Parts> for Ipv6Address {
    type Error = Error;

    fn try_from(parts: Ipv6Parts) -> Result<Self> {
        Ok(Ipv6Address::new(parts.section)?.with_zone(parts.zone))
    }
}

impl From<Ipv6Address> for Ipv6Parts {
    fn from(addr: Ipv6Address) -> Self {
        Ipv6Parts {
            section: addr.section,
            zone: addr.zone,
        }
    }
}

impl Ipv6Address {
    /// Wrap an eight-segment IPv6 section
    pub fn new(section: Section) -> Result<Self> {
        check_shape(&section, AddressFamily::Ipv6, &[8])?;
        Ok(Self {
            section,
            zone: None,
        })
    }

    pub fn with_zone(self, zone: Option<Zone>) -> Self {
        Self { zone, ..self }
    }

    pub fn zone(&self) -> Option<&Zone> {
        self.zone.as_ref()
    }

    pub(crate) fn rewrap(&self, section: Section) -> Self {
        Self {
            section,
            zone: self.zone.clone(),
        }
    }
}

address_ops!(Ipv6Address);

/// MAC address (EUI-48 or EUI-64) or range of addresses
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Section", into = "Section")]
pub struct MacAddress {
    section: Section,
}

impl MacAddress {
    /// Wrap a six- or eight-segment MAC section
    pub fn new(section: Section) -> Result<Self> {
        check_shape(&section, AddressFamily::Mac, &[6, 8])?;
        Ok(Self { section })
    }

    /// Whether this is a 64-bit extended identifier
    pub fn is_extended(&self) -> bool {
        self.section.segment_count() == 8
    }

    pub(crate) fn rewrap(&self, section: Section) -> Self {
        Self { section }
    }
}

address_ops!(MacAddress);

macro_rules! section_conversions {
    ($name:ident) => {
        impl TryFrom<Section> for $name {
            type Error = Error;

            fn try_from(section: Section) -> Result<Self> {
                $name::new(section)
            }
        }

        impl From<$name> for Section {
            fn from(addr: $name) -> Self {
                addr.section
            }
        }
    };
}

section_conversions!(Ipv4Address);
section_conversions!(MacAddress);

impl From<Ipv6Address> for Section {
    fn from(addr: Ipv6Address) -> Self {
        addr.section
    }
}

fn single(family: AddressFamily, segment_count: usize, value: u128) -> Section {
    Section::from_value_range_unchecked(family, segment_count, value, value, None)
}

impl From<Ipv4Addr> for Ipv4Address {
    fn from(addr: Ipv4Addr) -> Self {
        Self {
            section: single(AddressFamily::Ipv4, 4, u128::from(u32::from(addr))),
        }
    }
}

impl From<Ipv4Net> for Ipv4Address {
    /// The prefix block of the network
    fn from(net: Ipv4Net) -> Self {
        let addr = Ipv4Address::from(net.addr());
        addr.rewrap(addr.section.prefix_block(BitCount::from(net.prefix_len())))
    }
}

impl From<Ipv6Addr> for Ipv6Address {
    fn from(addr: Ipv6Addr) -> Self {
        Self {
            section: single(AddressFamily::Ipv6, 8, u128::from(addr)),
            zone: None,
        }
    }
}

impl From<Ipv6Net> for Ipv6Address {
    /// The prefix block of the network
    fn from(net: Ipv6Net) -> Self {
        let addr = Ipv6Address::from(net.addr());
        addr.rewrap(addr.section.prefix_block(BitCount::from(net.prefix_len())))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        let value = bytes.iter().fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
        Self {
            section: single(AddressFamily::Mac, 6, value),
        }
    }
}

impl From<[u8; 8]> for MacAddress {
    fn from(bytes: [u8; 8]) -> Self {
        Self {
            section: single(AddressFamily::Mac, 8, u128::from(u64::from_be_bytes(bytes))),
        }
    }
}

fn require_single(section: &Section) -> Result<()> {
    if section.is_multiple() {
        return Err(Error::InvalidSection(format!(
            "{:?} is a range, not a single address",
            section
        )));
    }
    Ok(())
}

/// Prefix length of a single block or single address, for network conversion
fn network_prefix(section: &Section) -> Result<u8> {
    if !section.is_multiple() {
        return Ok(section.prefix_len().unwrap_or(section.bit_count()) as u8);
    }
    if section.is_single_prefix_block() {
        if let Some(p) = section.prefix_len() {
            return Ok(p as u8);
        }
    }
    Err(Error::NotPrefixBlock(format!("{:?}", section)))
}

impl TryFrom<&Ipv4Address> for Ipv4Addr {
    type Error = Error;

    fn try_from(addr: &Ipv4Address) -> Result<Self> {
        require_single(&addr.section)?;
        Ok(Ipv4Addr::from(addr.section.value() as u32))
    }
}

impl TryFrom<&Ipv4Address> for Ipv4Net {
    type Error = Error;

    fn try_from(addr: &Ipv4Address) -> Result<Self> {
        let prefix = network_prefix(&addr.section)?;
        Ipv4Net::new(Ipv4Addr::from(addr.section.value() as u32), prefix)
            .map_err(|e| Error::InvalidSection(e.to_string()))
    }
}

impl TryFrom<&Ipv6Address> for Ipv6Addr {
    type Error = Error;

    fn try_from(addr: &Ipv6Address) -> Result<Self> {
        require_single(&addr.section)?;
        Ok(Ipv6Addr::from(addr.section.value()))
    }
}

impl TryFrom<&Ipv6Address> for Ipv6Net {
    type Error = Error;

    fn try_from(addr: &Ipv6Address) -> Result<Self> {
        let prefix = network_prefix(&addr.section)?;
        Ipv6Net::new(Ipv6Addr::from(addr.section.value()), prefix)
            .map_err(|e| Error::InvalidSection(e.to_string()))
    }
}

/// Address of any family
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Address {
    Ipv4(Ipv4Address),
    Ipv6(Ipv6Address),
    Mac(MacAddress),
}

impl Address {
    /// Wrap a section as the address of its family
    pub fn new(section: Section) -> Result<Self> {
        match section.family() {
            AddressFamily::Ipv4 => Ipv4Address::new(section).map(Address::Ipv4),
            AddressFamily::Ipv6 => Ipv6Address::new(section).map(Address::Ipv6),
            AddressFamily::Mac => MacAddress::new(section).map(Address::Mac),
        }
    }

    pub fn family(&self) -> AddressFamily {
        self.section().family()
    }

    pub fn section(&self) -> &Section {
        match self {
            Address::Ipv4(a) => a.section(),
            Address::Ipv6(a) => a.section(),
            Address::Mac(a) => a.section(),
        }
    }

    pub fn zone(&self) -> Option<&Zone> {
        match self {
            Address::Ipv6(a) => a.zone(),
            _ => None,
        }
    }

    pub fn as_ipv4(&self) -> Option<&Ipv4Address> {
        match self {
            Address::Ipv4(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_ipv6(&self) -> Option<&Ipv6Address> {
        match self {
            Address::Ipv6(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_mac(&self) -> Option<&MacAddress> {
        match self {
            Address::Mac(a) => Some(a),
            _ => None,
        }
    }

    /// Same address around a transformed section of the same shape
    pub(crate) fn rewrap(&self, section: Section) -> Self {
        match self {
            Address::Ipv4(a) => Address::Ipv4(a.rewrap(section)),
            Address::Ipv6(a) => Address::Ipv6(a.rewrap(section)),
            Address::Mac(a) => Address::Mac(a.rewrap(section)),
        }
    }
}

impl From<Ipv4Address> for Address {
    fn from(addr: Ipv4Address) -> Self {
        Address::Ipv4(addr)
    }
}

impl From<Ipv6Address> for Address {
    fn from(addr: Ipv6Address) -> Self {
        Address::Ipv6(addr)
    }
}

impl From<MacAddress> for Address {
    fn from(addr: MacAddress) -> Self {
        Address::Mac(addr)
    }
}

impl From<IpAddr> for Address {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Address::Ipv4(v4.into()),
            IpAddr::V6(v6) => Address::Ipv6(v6.into()),
        }
    }
}
