//! End-to-end tests for address range workflows
//!
//! Covers prefix derivation, masking failures, carry across segments and trie
//! lookups through the public API.

use ipaddr_range::{
    Address, AddressFamily, AddressTrie, AssociativeAddressTrie, Error, Ipv4Address, Ipv6Address,
    MacAddress, NonBlockPolicy, RangeOperation, Section, TrieConfig,
};
use ipnet::{Ipv4Net, Ipv6Net};
use pretty_assertions::assert_eq;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Helper to build an IPv4 section of single values
fn ipv4(values: [u32; 4]) -> Section {
    Section::from_values(AddressFamily::Ipv4, &values).unwrap()
}

/// Helper to build an IPv4 section of segment ranges
fn ipv4_ranges(ranges: [(u32, u32); 4]) -> Section {
    Section::from_ranges(AddressFamily::Ipv4, &ranges).unwrap()
}

fn net4(s: &str) -> Ipv4Address {
    Ipv4Address::from(Ipv4Net::from_str(s).unwrap())
}

// ============================================================================
// Prefix Block Tests
// ============================================================================

#[test]
fn test_single_address_prefix_block() {
    let addr = ipv4([1, 2, 3, 4]);
    assert_eq!(addr.min_prefix_len_for_block(), 32);
    assert_eq!(addr.prefix_len_for_single_block(), Some(32));

    let block = addr.to_prefix_block_len(24).unwrap();
    assert_eq!(block.prefix_len(), Some(24));
    assert_eq!(block.lower().value(), 0x0102_0300);
    assert_eq!(block.upper().value(), 0x0102_03ff);
    assert!(block.is_single_prefix_block());
    assert_eq!(block.count(), Some(256));
}

#[test]
fn test_prefix_block_from_ipnet() {
    let addr = net4("10.1.0.0/16");
    assert!(addr.is_prefix_block());
    assert_eq!(addr.count(), Some(65_536));
    assert_eq!(Ipv4Net::try_from(&addr).unwrap(), Ipv4Net::from_str("10.1.0.0/16").unwrap());

    let v6 = Ipv6Address::from(Ipv6Net::from_str("2001:db8::/32").unwrap());
    assert_eq!(v6.prefix_len(), Some(32));
    assert_eq!(Ipv6Net::try_from(&v6).unwrap().to_string(), "2001:db8::/32");
}

#[test]
fn test_span_and_cover() {
    let range = ipv4_ranges([(10, 10), (0, 0), (0, 0), (1, 6)]);
    let cover = range.cover_with_prefix_block();
    assert_eq!(cover.prefix_len(), Some(29));
    assert!(cover.contains(&range));

    let blocks = range.span_with_prefix_blocks();
    let counts: Vec<_> = blocks.iter().map(|b| b.count().unwrap()).collect();
    assert_eq!(counts, vec![1, 2, 2, 1]);
    assert_eq!(blocks.first().unwrap().value(), 0x0a00_0001);
    assert_eq!(blocks.last().unwrap().upper_value(), 0x0a00_0006);
}

// ============================================================================
// Masking Tests
// ============================================================================

#[test]
fn test_mask_full_segment_range() {
    let range = ipv4_ranges([(1, 1), (2, 2), (3, 3), (0, 255)]);
    let mask = Section::network_mask(AddressFamily::Ipv4, 4, 24).unwrap();
    assert_eq!(range.mask(&mask).unwrap(), range);
}

#[test]
fn test_mask_partial_range_is_incompatible() {
    let range = ipv4_ranges([(1, 1), (2, 2), (3, 3), (2, 4)]);
    let mask = ipv4([255, 255, 255, 0xfe]);
    let err = range.mask(&mask).unwrap_err();
    assert_eq!(
        err,
        Error::IncompatibleRange {
            operation: RangeOperation::Mask,
            index: 3,
            lower: 2,
            upper: 4,
        }
    );
    assert!(err.is_incompatible_range());
}

#[test]
fn test_zero_and_max_host() {
    let addr = ipv4([192, 168, 7, 9]).set_prefix_len(20).unwrap();
    let network = addr.to_zero_host().unwrap();
    assert_eq!(network.value(), 0xc0a8_0000);
    assert_eq!(network.prefix_len(), Some(20));
    let broadcast = addr.to_max_host().unwrap();
    assert_eq!(broadcast.value(), 0xc0a8_0fff);
}

// ============================================================================
// Increment Tests
// ============================================================================

#[test]
fn test_increment_carries_across_segments() {
    let addr = Ipv4Address::from(Ipv4Addr::new(1, 2, 3, 4));
    let next = addr.increment(300).unwrap();
    assert_eq!(Ipv4Addr::try_from(&next).unwrap(), Ipv4Addr::new(1, 2, 4, 48));
    assert_eq!(next.increment(-300).unwrap(), addr);
}

#[test]
fn test_increment_overflow_is_none() {
    let top = Ipv4Address::from(Ipv4Addr::new(255, 255, 255, 255));
    assert!(top.increment(1).is_none());
    let bottom = Ipv4Address::from(Ipv4Addr::UNSPECIFIED);
    assert!(bottom.increment(-1).is_none());
}

#[test]
fn test_increment_ipv6_wide() {
    let addr = Ipv6Address::from(Ipv6Addr::from(u128::from(u64::MAX)));
    let next = addr.increment(1).unwrap();
    assert_eq!(Ipv6Addr::try_from(&next).unwrap(), Ipv6Addr::from(1u128 << 64));
}

#[test]
fn test_mac_increment() {
    let mac = MacAddress::from([0x00, 0x1b, 0x44, 0x11, 0x3a, 0xff]);
    let next = mac.increment(1).unwrap();
    assert_eq!(next.section().value(), 0x001b_4411_3b00);
    assert!(!next.is_extended());
}

// ============================================================================
// Trie Tests
// ============================================================================

#[test]
fn test_routing_table_lookup() {
    let mut routes = AssociativeAddressTrie::new();
    routes.put(net4("0.0.0.0/0"), "default").unwrap();
    routes.put(net4("10.0.0.0/8"), "corp").unwrap();
    routes.put(net4("10.20.0.0/16"), "lab").unwrap();
    routes.put(net4("10.20.30.0/24"), "rack").unwrap();

    let lookup = |ip: Ipv4Addr| *routes.longest_prefix_match(&Ipv4Address::from(ip)).unwrap().1;
    assert_eq!(lookup(Ipv4Addr::new(10, 20, 30, 40)), "rack");
    assert_eq!(lookup(Ipv4Addr::new(10, 20, 31, 1)), "lab");
    assert_eq!(lookup(Ipv4Addr::new(10, 99, 0, 1)), "corp");
    assert_eq!(lookup(Ipv4Addr::new(8, 8, 8, 8)), "default");

    let chain: Vec<_> = routes
        .elements_containing(&Ipv4Address::from(Ipv4Addr::new(10, 20, 30, 40)))
        .into_iter()
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(chain, vec!["default", "corp", "lab", "rack"]);
}

#[test]
fn test_mixed_family_trie() {
    let mut trie = AddressTrie::new();
    trie.add(Address::from(net4("10.0.0.0/8"))).unwrap();
    let v6 = Address::from(Ipv6Address::from(Ipv6Addr::LOCALHOST));
    assert!(matches!(trie.add(v6), Err(Error::BitCountMismatch(32, 128))));
    assert_eq!(trie.len(), 1);
}

#[test]
fn test_span_policy_from_json_config() {
    let config = TrieConfig::from_json(r#"{"non_block_policy": "span"}"#).unwrap();
    assert_eq!(config.non_block_policy, NonBlockPolicy::Span);

    let mut trie = AddressTrie::with_config(config).unwrap();
    let range = ipv4_ranges([(10, 10), (0, 0), (0, 0), (1, 6)]);
    assert!(trie.add(range).unwrap());
    assert_eq!(trie.len(), 4);
    assert!(trie.elements_contain(&ipv4([10, 0, 0, 3])));
    assert!(trie.longest_prefix_match(&ipv4([10, 0, 0, 0])).is_none());
}
