//! # Capture Benchmarks
//!
//! Run with: `cargo bench -p immcheck`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use immcheck::core::{Snapshot, SnapshotPool};
use immcheck::{capture_snapshot, capture_snapshot_into, compare, release, Options};
use immcheck_testkit::{Ring, TestFixture};

fn bench_scalar_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalar_run");

    for size in [64usize, 4096, 262_144].iter() {
        let values: Vec<u64> = (0..*size as u64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            let mut dst = Snapshot::new();
            b.iter(|| {
                capture_snapshot_into(values, &mut dst, Options::default()).unwrap();
                black_box(dst.len())
            });
        });
    }

    group.finish();
}

fn bench_nested_strings(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_strings");

    for size in [16usize, 256, 4096].iter() {
        let values: Vec<String> = (0..*size).map(|i| format!("item-{}", i)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| {
                let snapshot = capture_snapshot(values).unwrap();
                let len = snapshot.len();
                release(snapshot);
                black_box(len)
            });
        });
    }

    group.finish();
}

fn bench_profiles(c: &mut Criterion) {
    let mut fixture = TestFixture::with_seed(9);
    let profiles: Vec<_> = (0..128).map(|_| fixture.profile()).collect();

    c.bench_function("profiles_capture_compare", |b| {
        b.iter(|| {
            let before = capture_snapshot(&profiles).unwrap();
            let after = capture_snapshot(&profiles).unwrap();
            let unchanged = compare(&before, &after).unwrap().is_unchanged();
            release(before);
            release(after);
            black_box(unchanged)
        });
    });
}

fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");

    for size in [8usize, 512].iter() {
        let ring = Ring::new(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &ring, |b, ring| {
            let pool = SnapshotPool::global();
            b.iter(|| {
                let snapshot = capture_snapshot(ring.head()).unwrap();
                let len = snapshot.len();
                pool.release(snapshot);
                black_box(len)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_scalar_run,
    bench_nested_strings,
    bench_profiles,
    bench_ring
);
criterion_main!(benches);
