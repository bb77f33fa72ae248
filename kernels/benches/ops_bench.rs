use criterion::{criterion_group, criterion_main, Criterion};
use parmat_kernels::{
    cell_coefficients, corner_samples, evaluate_block, gather_stencil, solve_lower_unit,
    solve_upper,
};
use std::hint::black_box;

fn benchmark_bicubic_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("bicubic_cell");
    let source: Vec<f64> = (0..64 * 64).map(|i| (i as f64 * 0.01).sin()).collect();

    for &factor in &[2usize, 8, 32] {
        let mut out = vec![0.0; factor * factor];
        group.bench_function(format!("{}x{}", factor, factor), |b| {
            b.iter(|| {
                let g = gather_stencil(black_box(&source), 64, 64, 31, 17).unwrap();
                let a = cell_coefficients(&corner_samples(&g));
                evaluate_block(&a, factor, factor, &mut out, factor).unwrap();
            })
        });
    }
    group.finish();
}

fn benchmark_substitution(c: &mut Criterion) {
    let mut group = c.benchmark_group("substitution");

    for &n in &[64usize, 256, 1024] {
        // Diagonally dominant upper part keeps the solve finite.
        let lu: Vec<f64> = (0..n * n)
            .map(|k| if k / n == k % n { n as f64 } else { 0.5 / n as f64 })
            .collect();
        let rhs = vec![1.0; n];

        group.bench_function(format!("n={}", n), |b| {
            b.iter(|| {
                let mut x = rhs.clone();
                solve_lower_unit(black_box(&lu), n, &mut x).unwrap();
                solve_upper(black_box(&lu), n, &mut x).unwrap();
                x
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_bicubic_cell, benchmark_substitution);
criterion_main!(benches);
