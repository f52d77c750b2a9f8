//! Range scan benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lmdbx_bench::utils::populated_db;
use lmdbx_core::RangeOptions;

/// Benchmark full forward scans.
fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");

    for count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (mut db, _) = populated_db(count, 64);
            let options = RangeOptions::new();

            b.iter(|| {
                black_box(db.get_range(&options).unwrap());
            });
        });
    }
    group.finish();
}

/// Benchmark bounded scans in both directions.
fn bench_bounded_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_scan");
    let (mut db, keys) = populated_db(10000, 64);
    let start = keys[2500].clone();
    let end = keys[2599].clone();

    group.throughput(Throughput::Elements(100));
    for reverse in [false, true] {
        let options = RangeOptions::new()
            .start(start.clone())
            .end(end.clone())
            .reverse(reverse);
        let name = if reverse { "reverse" } else { "forward" };
        group.bench_function(name, |b| {
            b.iter(|| {
                black_box(db.get_range(&options).unwrap());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_scan, bench_bounded_scan);
criterion_main!(benches);
