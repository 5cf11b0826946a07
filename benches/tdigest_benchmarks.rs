use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tdigest_sketch::TDigest;

/// Benchmark: single-sample fit
fn bench_tdigest_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_fit");

    for compression in [50.0, 100.0, 200.0] {
        group.bench_with_input(
            BenchmarkId::new("fit", compression as u64),
            &compression,
            |b, &delta| {
                let mut td = TDigest::new(delta);
                let mut counter = 0.0f64;
                b.iter(|| {
                    td.fit(black_box(counter)).unwrap();
                    counter += 1.0;
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: bulk fit via fit_slice
fn bench_tdigest_fit_slice(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_fit_slice");
    let values: Vec<f64> = (0..100_000).map(|i| i as f64).collect();

    group.bench_function("fit_slice_100k", |b| {
        b.iter(|| {
            let mut td = TDigest::new(100.0);
            td.fit_slice(black_box(&values)).unwrap();
            black_box(&td);
        });
    });

    group.finish();
}

/// Benchmark: quantile queries at varying digest sizes
fn bench_tdigest_quantile(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_quantile");

    for n in [1_000, 10_000, 100_000] {
        let mut td = TDigest::new(100.0);
        for i in 0..n {
            td.fit(i as f64).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("quantile", n), &(), |b, _| {
            b.iter(|| {
                black_box(td.quantile(0.5).unwrap());
                black_box(td.quantile(0.99).unwrap());
                black_box(td.quantile(0.999).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark: cdf queries at varying digest sizes
fn bench_tdigest_cdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_cdf");

    for n in [1_000, 10_000, 100_000] {
        let mut td = TDigest::new(100.0);
        for i in 0..n {
            td.fit(i as f64).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("cdf", n), &(), |b, _| {
            b.iter(|| {
                black_box(td.cdf((n as f64) / 2.0).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark: merging two digests of varying size
fn bench_tdigest_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_merge");

    for n in [1_000, 10_000, 100_000] {
        let mut a = TDigest::new(100.0);
        let mut b_digest = TDigest::new(100.0);
        for i in 0..n {
            a.fit(i as f64).unwrap();
            b_digest.fit((i + n) as f64).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("merge", n), &(), |bench, _| {
            bench.iter(|| {
                let mut target = a.clone();
                target.merge(black_box(&b_digest)).unwrap();
                black_box(&target);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tdigest_fit,
    bench_tdigest_fit_slice,
    bench_tdigest_quantile,
    bench_tdigest_cdf,
    bench_tdigest_merge,
);

criterion_main!(benches);
