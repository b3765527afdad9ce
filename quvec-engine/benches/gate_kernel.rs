//! Gate kernel benchmarks: single-bit, controlled, and oracle sweeps

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use num_complex::Complex64;
use quvec_engine::{Register, SharedRng};

fn fixed(qubit_count: usize) -> Register {
    Register::with_phase_and_rng(
        qubit_count,
        0,
        Complex64::new(1.0, 0.0),
        SharedRng::seeded(42),
    )
    .unwrap()
}

fn bench_hadamard(c: &mut Criterion) {
    let mut group = c.benchmark_group("hadamard");
    for &qubits in &[10usize, 14, 18] {
        group.bench_with_input(BenchmarkId::from_parameter(qubits), &qubits, |b, &n| {
            let mut reg = fixed(n);
            b.iter(|| {
                reg.h(black_box(n / 2)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_cnot(c: &mut Criterion) {
    let mut group = c.benchmark_group("cnot");
    for &qubits in &[10usize, 14, 18] {
        group.bench_with_input(BenchmarkId::from_parameter(qubits), &qubits, |b, &n| {
            let mut reg = fixed(n);
            b.iter(|| {
                reg.cnot(black_box(0), black_box(n - 1)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_inc(c: &mut Criterion) {
    let mut group = c.benchmark_group("inc");
    for &qubits in &[10usize, 14, 18] {
        group.bench_with_input(BenchmarkId::from_parameter(qubits), &qubits, |b, &n| {
            let mut reg = fixed(n);
            b.iter(|| {
                reg.inc(black_box(3), 0, n).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hadamard, bench_cnot, bench_inc);
criterion_main!(benches);
