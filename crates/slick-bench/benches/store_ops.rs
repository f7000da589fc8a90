//! Criterion micro-benchmarks for particle store append, select and compact.

use criterion::{criterion_group, criterion_main, Criterion};
use slick_core::{FateFlags, LeStatus, SpillId, SubstanceId};
use slick_store::{ArrayDef, ParticleStore, Selector};

const N: usize = 10_000;

/// A store of `N` three-component particles with windage columns declared.
fn make_store_10k() -> ParticleStore {
    let mut store = ParticleStore::new(3);
    for def in [ArrayDef::windages(), ArrayDef::windage_range(), ArrayDef::windage_persist()] {
        store.declare(&def).unwrap();
    }
    store.append(N, SpillId(0), SubstanceId(0));
    for (i, m) in store.mass_mut().iter_mut().enumerate() {
        *m = 1.0 + i as f64 * 1e-3;
    }
    store
}

/// Benchmark: append 10K rows to an empty store with optional columns.
fn bench_append_10k(c: &mut Criterion) {
    c.bench_function("store_append_10k", |b| {
        b.iter(|| {
            let store = make_store_10k();
            std::hint::black_box(store.len());
        });
    });
}

/// Benchmark: select in-water rows carrying a cleanup flag.
fn bench_select_10k(c: &mut Criterion) {
    let mut store = make_store_10k();
    for (i, f) in store.fate_mut().iter_mut().enumerate() {
        if i % 3 == 0 {
            *f = FateFlags::SKIM;
        }
    }
    let selector = Selector::in_water().with_fate(FateFlags::SKIM);
    c.bench_function("store_select_10k", |b| {
        b.iter(|| {
            let sel = store.select(&selector);
            std::hint::black_box(sel.len());
        });
    });
}

/// Benchmark: retire every tenth row and compact.
fn bench_compact_10k(c: &mut Criterion) {
    c.bench_function("store_compact_10k", |b| {
        b.iter_batched(
            || {
                let mut store = make_store_10k();
                for (i, s) in store.status_mut().iter_mut().enumerate() {
                    if i % 10 == 0 {
                        *s = LeStatus::ToBeRemoved;
                    }
                }
                store
            },
            |mut store| {
                let removed = store.compact_removed();
                std::hint::black_box(removed);
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_append_10k,
    bench_select_10k,
    bench_compact_10k
);
criterion_main!(benches);
