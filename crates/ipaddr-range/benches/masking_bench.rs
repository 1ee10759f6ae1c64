//! Performance benchmarks for section masking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ipaddr_range::{mask_range, AddressFamily, Section};

/// Benchmark network masks of increasing length over an IPv6 /32 block
fn bench_network_mask(c: &mut Criterion) {
    let block = Section::from_values(AddressFamily::Ipv6, &[0x2001, 0x0db8, 0, 0, 0, 0, 0, 0])
        .unwrap()
        .to_prefix_block_len(32)
        .unwrap();

    let mut group = c.benchmark_group("mask_ipv6_block");
    for prefix_len in [16u32, 32, 48, 64].iter() {
        let mask = Section::network_mask(AddressFamily::Ipv6, 8, *prefix_len).unwrap();
        group.bench_with_input(BenchmarkId::new("prefix", prefix_len), &mask, |b, mask| {
            b.iter(|| black_box(block.mask(black_box(mask))));
        });
    }
    group.finish();
}

/// Benchmark the per-segment masker with an arbitrary mask
fn bench_segment_masker(c: &mut Criterion) {
    c.bench_function("mask_range_arbitrary", |b| {
        b.iter(|| black_box(mask_range(black_box(0x1234), black_box(0xfedc), 0xa5a5, 0xffff)));
    });
}

/// Benchmark zeroing host bits of prefixed IPv4 ranges
fn bench_zero_host(c: &mut Criterion) {
    let range = Section::from_ranges(AddressFamily::Ipv4, &[(10, 10), (0, 255), (0, 255), (0, 255)])
        .unwrap()
        .set_prefix_len(20)
        .unwrap();

    c.bench_function("to_zero_host_ipv4", |b| {
        b.iter(|| black_box(range.to_zero_host()));
    });
}

criterion_group!(benches, bench_network_mask, bench_segment_masker, bench_zero_host);
criterion_main!(benches);
