//! Criterion micro-benchmarks for list construction and cursor edits,
//! under the global allocator and under a bump arena.

use std::hint::black_box;

use coffer_arena::{Arena, ArenaAlloc};
use coffer_bench::positions;
use coffer_list::List;
use criterion::{criterion_group, criterion_main, Criterion};

const N: usize = 10_000;

fn bench_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_push_back_10k");
    group.bench_function("global", |b| {
        b.iter(|| {
            let mut list = List::new();
            for i in 0..N {
                list.push_back(i);
            }
            black_box(list.len())
        });
    });
    group.bench_function("arena", |b| {
        let mut arena = Arena::with_capacity(1 << 20).unwrap();
        b.iter(|| {
            arena.reset();
            let mut list = List::new_in(ArenaAlloc::<usize>::new(&arena));
            for i in 0..N {
                list.push_back(i);
            }
            black_box(list.len())
        });
    });
    group.finish();
}

fn bench_cursor_insert(c: &mut Criterion) {
    // Cursor steps forward by the gap between consecutive positions, so the
    // walk cost is bounded by the list length per insertion.
    let at = positions(5, 100, 1_000);
    c.bench_function("list_cursor_insert_1k", |b| {
        b.iter(|| {
            let mut list: List<usize> = (0..100).collect();
            for (v, &i) in at.iter().enumerate() {
                let mut cursor = list.cursor_front_mut();
                for _ in 0..i {
                    cursor.move_next();
                }
                cursor.insert_before(v);
            }
            black_box(list.len())
        });
    });
}

fn bench_clone(c: &mut Criterion) {
    let list: List<String> = (0..N).map(|i| i.to_string()).collect();
    c.bench_function("list_clone_10k_strings", |b| {
        b.iter(|| black_box(list.clone()));
    });
}

criterion_group!(benches, bench_push_back, bench_cursor_insert, bench_clone);
criterion_main!(benches);
