//! Criterion micro-benchmarks for host/device synchronization.

use std::hint::black_box;

use altgpu_bench::{device_dirty_vector, ramp_vector, BENCH_LENGTHS};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

/// Benchmark: one element read that has to pull the device copy back.
fn bench_pull_from_device(c: &mut Criterion) {
    let mut group = c.benchmark_group("pull_from_device");
    for len in BENCH_LENGTHS {
        group.throughput(Throughput::Bytes((len * 8) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || device_dirty_vector(len).unwrap(),
                |mut vector| black_box(vector.elt(0).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

/// Benchmark: writable materialization followed by a push to the device.
fn bench_push_to_device(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_to_device");
    for len in BENCH_LENGTHS {
        let mut vector = ramp_vector(len).unwrap();
        group.throughput(Throughput::Bytes((len * 8) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                vector.as_mut_slice().unwrap()[0] += 1.0;
                vector.synchronize().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark: element read on an already-synced vector (no transfer).
fn bench_synced_elt(c: &mut Criterion) {
    let mut vector = ramp_vector(10_000).unwrap();
    c.bench_function("synced_elt", |b| {
        b.iter(|| black_box(vector.elt(black_box(4_321)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_pull_from_device,
    bench_push_to_device,
    bench_synced_elt
);
criterion_main!(benches);
