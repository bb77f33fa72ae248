use criterion::{criterion_group, criterion_main, Criterion};
use parmat::comm::{SelfComm, ThreadWorld};
use parmat::{ContiguousMatrix, Interpolator};
use std::hint::black_box;

fn benchmark_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");
    let field = |r: usize, c: usize| ((r as f64) * 0.1).sin() * ((c as f64) * 0.07).cos();

    // 64x64 source, upsampled by 2, 4 and 8.
    for &factor in &[2usize, 4, 8] {
        let size = 64 * factor;
        let comm = SelfComm::new();
        let source = ContiguousMatrix::from_fn(&comm, 64, 64, 1.0, 1.0, field);
        let mut result = ContiguousMatrix::new(&comm, size, size, 1.0, 1.0, 0.0);
        let mut interpolator = Interpolator::new(&result, &source).unwrap();

        group.bench_function(format!("single_x{}", factor), |b| {
            b.iter(|| {
                interpolator.interpolate(&mut result, black_box(&source)).unwrap();
            })
        });
    }

    group.bench_function("threads4_x4", |b| {
        b.iter(|| {
            ThreadWorld::run(4, |comm| {
                let source = ContiguousMatrix::from_fn(comm, 64, 64, 1.0, 1.0, field);
                let mut result = ContiguousMatrix::new(comm, 256, 256, 1.0, 1.0, 0.0);
                let mut interpolator = Interpolator::new(&result, &source).unwrap();
                interpolator.interpolate(&mut result, &source).unwrap();
                black_box(result.as_slice()[0])
            })
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_interpolation);
criterion_main!(benches);
