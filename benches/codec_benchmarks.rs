use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tdigest_sketch::codec::{simple32_decode, simple64_decode, Simple32Encoder, Simple64Encoder};

fn small_values(n: usize) -> Vec<u64> {
    (0..n).map(|i| (i % 15) as u64).collect()
}

fn mixed_magnitude_values(n: usize) -> Vec<u64> {
    (0..n)
        .map(|i| if i % 100 == 0 { (i as u64) << 20 } else { (i % 15) as u64 })
        .collect()
}

/// Benchmark: Simple32 encode at varying input sizes and value distributions
fn bench_simple32_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple32_encode");

    for n in [1_000, 10_000, 100_000] {
        let small = small_values(n);
        group.bench_with_input(BenchmarkId::new("small_values", n), &small, |b, values| {
            b.iter(|| black_box(Simple32Encoder::encode(values).unwrap()));
        });

        let mixed = mixed_magnitude_values(n);
        group.bench_with_input(BenchmarkId::new("mixed_magnitude", n), &mixed, |b, values| {
            b.iter(|| black_box(Simple32Encoder::encode(values).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark: Simple32 decode
fn bench_simple32_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple32_decode");

    for n in [1_000, 10_000, 100_000] {
        let words = Simple32Encoder::encode(&small_values(n)).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", n), &words, |b, words| {
            b.iter(|| black_box(simple32_decode(words)));
        });
    }

    group.finish();
}

/// Benchmark: Simple64 encode/decode round trip
fn bench_simple64_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple64_round_trip");

    for n in [1_000, 10_000, 100_000] {
        let values = small_values(n);
        group.bench_with_input(BenchmarkId::new("round_trip", n), &values, |b, values| {
            b.iter(|| {
                let words = Simple64Encoder::encode(black_box(values)).unwrap();
                black_box(simple64_decode(&words));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_simple32_encode,
    bench_simple32_decode,
    bench_simple64_round_trip,
);

criterion_main!(benches);
