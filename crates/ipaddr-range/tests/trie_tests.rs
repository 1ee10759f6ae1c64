//! Trie tests over IPv6 and MAC keys

use ipaddr_range::{AddressTrie, AssociativeAddressTrie, Ipv6Address, MacAddress, TrieKey};
use ipnet::Ipv6Net;
use pretty_assertions::assert_eq;
use std::net::Ipv6Addr;
use std::str::FromStr;

fn net6(s: &str) -> Ipv6Address {
    Ipv6Address::from(Ipv6Net::from_str(s).unwrap())
}

fn addr6(s: &str) -> Ipv6Address {
    Ipv6Address::from(Ipv6Addr::from_str(s).unwrap())
}

// ============================================================================
// IPv6 Tests
// ============================================================================

#[test]
fn test_ipv6_allocation_lookup() {
    let mut trie = AssociativeAddressTrie::new();
    trie.put(net6("2001:db8::/32"), 1).unwrap();
    trie.put(net6("2001:db8:aa::/48"), 2).unwrap();
    trie.put(net6("2001:db8:bb::/48"), 3).unwrap();

    assert_eq!(trie.longest_prefix_match(&addr6("2001:db8:aa::1")).unwrap().1, &2);
    assert_eq!(trie.longest_prefix_match(&addr6("2001:db8:cc::1")).unwrap().1, &1);
    assert!(trie.longest_prefix_match(&addr6("2001:db9::1")).is_none());

    let subnets: Vec<_> = trie
        .elements_contained_by(&net6("2001:db8::/32"))
        .into_iter()
        .map(|(_, v)| *v)
        .collect();
    assert_eq!(subnets, vec![2, 3, 1]);
}

#[test]
fn test_ipv6_zone_is_kept_on_keys() {
    let mut trie = AddressTrie::new();
    let scoped = addr6("fe80::1").with_zone(Some(ipaddr_range::Zone::new("eth0")));
    trie.add(scoped.clone()).unwrap();
    assert_eq!(trie.first().unwrap().zone().unwrap().as_str(), "eth0");
    assert!(trie.contains(&scoped));
}

#[test]
fn test_ipv6_ordering_queries() {
    let mut trie = AddressTrie::new();
    for s in ["2001:db8::/32", "2001:db8:8000::/33", "2001:db8::1"] {
        let key = if s.contains('/') { net6(s) } else { addr6(s) };
        trie.add(key).unwrap();
    }
    let order: Vec<_> = trie.iter().map(|k| k.trie_prefix_len()).collect();
    assert_eq!(order, vec![128, 32, 33]);

    let block = net6("2001:db8::/32");
    assert_eq!(trie.lower(&block).unwrap().trie_prefix_len(), 128);
    assert_eq!(trie.higher(&block).unwrap().trie_prefix_len(), 33);
    assert_eq!(
        trie.floor(&block.to_max_lower()).map(|k| k.trie_prefix_len()),
        Some(128)
    );
    assert_eq!(
        trie.ceiling(&block.to_min_upper()).map(|k| k.trie_prefix_len()),
        Some(33)
    );
}

// ============================================================================
// MAC Tests
// ============================================================================

#[test]
fn test_mac_vendor_prefixes() {
    let vendor = MacAddress::from([0x00, 0x1b, 0x44, 0, 0, 0])
        .to_prefix_block_len(24)
        .unwrap();
    let device = MacAddress::from([0x00, 0x1b, 0x44, 0x11, 0x3a, 0xb7]);
    let other = MacAddress::from([0x3c, 0x22, 0xfb, 0x01, 0x02, 0x03]);

    let mut trie = AddressTrie::new();
    assert!(trie.add(vendor.clone()).unwrap());
    assert!(trie.elements_contain(&device));
    assert!(!trie.elements_contain(&other));
    assert_eq!(trie.longest_prefix_match(&device), Some(&vendor));

    assert!(trie.remove(&vendor));
    assert!(trie.is_empty());
}
