// ============================================================================
// Float Bridge Benchmarks
// ============================================================================
//
// Benchmark Categories:
// 1. Construction - Integer, double and literal sources
// 2. Arithmetic - Integer fast path against double and float operands
// 3. Rendering - Shared scratch buffer against engine-allocated strings
// 4. Lifecycle - Allocate and release churn
// ============================================================================

use apfloat_bridge::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ============================================================================
// Construction Benchmarks
// ============================================================================

fn benchmark_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    let context = FloatContext::with_soft_engine().unwrap();

    group.bench_function("int", |b| {
        b.iter(|| black_box(context.float(black_box(12345)).unwrap()));
    });

    group.bench_function("double", |b| {
        b.iter(|| black_box(context.float(black_box(0.1)).unwrap()));
    });

    group.bench_function("literal", |b| {
        b.iter(|| black_box(context.float(black_box("3.14159265358979")).unwrap()));
    });

    group.finish();
}

// ============================================================================
// Arithmetic Benchmarks
// ============================================================================

fn benchmark_multiplication(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiplication");

    for bits in [53u32, 256, 4096].iter() {
        let context = FloatContextBuilder::new()
            .with_precision_bits(*bits)
            .build_soft()
            .unwrap();
        let value = context.float("1.000001").unwrap();
        let other = context.float(7).unwrap();

        group.bench_with_input(BenchmarkId::new("int", bits), bits, |b, _| {
            b.iter(|| black_box(value.mul(black_box(7)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("double", bits), bits, |b, _| {
            b.iter(|| black_box(value.mul(black_box(7.5)).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("float", bits), bits, |b, _| {
            b.iter(|| black_box(value.mul(&other).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_division(c: &mut Criterion) {
    let mut group = c.benchmark_group("division");

    for bits in [53u32, 1024, 8000].iter() {
        let context = FloatContextBuilder::new()
            .with_precision_bits(*bits)
            .build_soft()
            .unwrap();
        let one = context.float(1).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(bits), bits, |b, _| {
            b.iter(|| black_box(one.div(black_box(3)).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Rendering Benchmarks
// 53 bits fits the shared buffer, 8000 bits falls back to an engine string
// ============================================================================

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for bits in [53u32, 8000].iter() {
        let context = FloatContextBuilder::new()
            .with_precision_bits(*bits)
            .build_soft()
            .unwrap();
        let third = context.float(1).unwrap().div(3).unwrap();

        group.bench_with_input(BenchmarkId::new("decimal", bits), bits, |b, _| {
            b.iter(|| black_box(third.to_string()));
        });

        group.bench_with_input(BenchmarkId::new("hex", bits), bits, |b, _| {
            b.iter(|| black_box(third.to_string_radix(16).unwrap()));
        });
    }

    group.finish();
}

// ============================================================================
// Lifecycle Benchmarks
// ============================================================================

fn benchmark_handle_churn(c: &mut Criterion) {
    c.bench_function("handle_churn", |b| {
        let context = FloatContext::with_soft_engine().unwrap();
        let base = context.float(2).unwrap();

        b.iter(|| {
            // Each intermediate is dropped and released before the next one
            let squared = base.mul(&base).unwrap();
            let shifted = squared.add(1).unwrap();
            black_box(shifted.sub(&base).unwrap());
        });
    });
}

criterion_group!(
    benches,
    benchmark_construction,
    benchmark_multiplication,
    benchmark_division,
    benchmark_render,
    benchmark_handle_churn,
);
criterion_main!(benches);
