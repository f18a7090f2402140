//! Benchmarks comparing closure strategies and the row-wise product

use bitgraph::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn random_square(dim: usize, level: u32, seed: u64) -> BitMatrix {
    let spec = RandomSpec {
        seed,
        ..RandomSpec::square(dim, level)
    };
    BitMatrix::build(MatrixSource::Random(spec)).unwrap()
}

/// Benchmark every closure strategy on sparse random graphs
fn bench_closure_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");

    for dim in [32, 128, 512] {
        // About two outgoing edges per node.
        let level = (2000 / dim as u32).max(1);
        let m = random_square(dim, level, dim as u64);
        group.throughput(Throughput::Elements(dim as u64));

        let variants = [
            ("reflexive", ClosureVariant::Reflexive),
            ("matrices", ClosureVariant::Matrices),
            ("slides", ClosureVariant::Slides),
            ("optimized_none", ClosureVariant::Optimized(OptimizeMode::None)),
            ("optimized_soft", ClosureVariant::Optimized(OptimizeMode::Soft)),
            ("optimized_hard", ClosureVariant::Optimized(OptimizeMode::Hard)),
        ];
        for (name, variant) in variants {
            group.bench_with_input(BenchmarkId::new(name, dim), &m, |bencher, m| {
                bencher.iter(|| {
                    compute_closure(black_box(m), variant, ClosureOptions::default()).unwrap()
                });
            });
        }
    }

    group.finish();
}

/// Benchmark the product below and above the parallel threshold
fn bench_multiply(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply");

    for dim in [64, 255, 256, 1024] {
        let a = random_square(dim, 20, 1);
        let b = random_square(dim, 20, 2);
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dim), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| black_box(a).multiply(black_box(b)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark plan construction alone
fn bench_factor_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_plan");

    for exponent in [242u64, 2125, 1 << 40] {
        group.bench_with_input(BenchmarkId::from_parameter(exponent), &exponent, |bencher, &e| {
            bencher.iter(|| FactorPlan::decompose(black_box(e), OptimizeMode::None).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_closure_variants, bench_multiply, bench_factor_plan);
criterion_main!(benches);
