//! Criterion micro-benchmarks for shared-pointer construction and counting.

use std::hint::black_box;
use std::rc::Rc;

use coffer_core::Global;
use coffer_shared::SharedPtr;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_construct");
    group.bench_function("value_block", |b| {
        b.iter(|| black_box(SharedPtr::allocate_in(black_box(7u64), Global)));
    });
    group.bench_function("from_box", |b| {
        b.iter(|| black_box(SharedPtr::from_box(Box::new(black_box(7u64)))));
    });
    group.bench_function("std_rc", |b| {
        b.iter(|| black_box(Rc::new(black_box(7u64))));
    });
    group.finish();
}

fn bench_clone_drop(c: &mut Criterion) {
    let sp = SharedPtr::new(String::from("shared"));
    c.bench_function("shared_clone_drop_1k", |b| {
        b.iter(|| {
            for _ in 0..1_000 {
                black_box(sp.clone());
            }
            sp.use_count()
        });
    });
}

fn bench_lock(c: &mut Criterion) {
    let sp = SharedPtr::new(0u64);
    let wp = sp.downgrade();
    c.bench_function("weak_lock_1k", |b| {
        b.iter(|| {
            let mut hits = 0;
            for _ in 0..1_000 {
                hits += usize::from(!black_box(wp.lock()).is_null());
            }
            hits
        });
    });
}

criterion_group!(benches, bench_construct, bench_clone_drop, bench_lock);
criterion_main!(benches);
