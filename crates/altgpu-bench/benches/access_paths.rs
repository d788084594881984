//! Criterion micro-benchmarks comparing element-wise, region and
//! materialized reads of a synced vector.

use std::hint::black_box;

use altgpu_bench::{ramp_vector, BENCH_LENGTHS};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark: sum every element through `elt`.
fn bench_elt_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("elt_scan");
    for len in BENCH_LENGTHS {
        let mut vector = ramp_vector(len).unwrap();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let mut sum = 0.0;
                for i in 0..len {
                    sum += vector.elt(i).unwrap();
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

/// Benchmark: sum every element through 512-element `get_region` chunks.
fn bench_region_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_scan");
    let mut chunk = [0.0f64; 512];
    for len in BENCH_LENGTHS {
        let mut vector = ramp_vector(len).unwrap();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let mut sum = 0.0;
                let mut start = 0;
                while start < len {
                    let n = vector.get_region(start, &mut chunk).unwrap();
                    sum += chunk[..n].iter().sum::<f64>();
                    start += n;
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

/// Benchmark: materialize once and sum the slice.
fn bench_materialized_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialized_scan");
    for len in BENCH_LENGTHS {
        let mut vector = ramp_vector(len).unwrap();
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| black_box(vector.as_slice().unwrap().iter().sum::<f64>()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_elt_scan,
    bench_region_scan,
    bench_materialized_scan
);
criterion_main!(benches);
