//! Criterion micro-benchmarks for the chained hash map: growth, lookup and
//! churn, against `std::collections::HashMap` as a baseline.

use std::collections::HashMap;
use std::hint::black_box;

use coffer_bench::key_stream;
use coffer_list::{MapConfig, UnorderedMap};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_insert");
    for n in [1_000usize, 50_000] {
        let keys = key_stream(42, n, n as u64 * 4);
        group.bench_with_input(BenchmarkId::new("coffer", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = UnorderedMap::new();
                for &k in keys {
                    map.insert(k, k);
                }
                black_box(map.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("coffer_reserved", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = UnorderedMap::new();
                map.reserve(keys.len());
                for &k in keys {
                    map.insert(k, k);
                }
                black_box(map.len())
            });
        });
        group.bench_with_input(BenchmarkId::new("std", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = HashMap::new();
                for &k in keys {
                    map.entry(k).or_insert(k);
                }
                black_box(map.len())
            });
        });
    }
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let keys = key_stream(1, 20_000, 40_000);
    let probes = key_stream(2, 20_000, 40_000);
    let mut group = c.benchmark_group("map_lookup_20k");
    for load in [0.5f32, 1.0, 2.0] {
        let config = MapConfig::default().with_max_load_factor(load);
        let mut map = UnorderedMap::with_config(config).unwrap();
        for &k in &keys {
            map.insert(k, ());
        }
        group.bench_with_input(BenchmarkId::new("max_load", load), &probes, |b, probes| {
            b.iter(|| probes.iter().filter(|&k| map.contains_key(k)).count());
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let inserts = key_stream(3, 10_000, 2_000);
    let removes = key_stream(4, 10_000, 2_000);
    c.bench_function("map_churn_10k", |b| {
        b.iter(|| {
            let mut map = UnorderedMap::new();
            for (&k, &r) in inserts.iter().zip(&removes) {
                map.insert(k, k);
                black_box(map.remove(&r));
            }
            black_box(map.len())
        });
    });
}

criterion_group!(benches, bench_insert, bench_lookup, bench_churn);
criterion_main!(benches);
