mod common;

use common::{init_test_subscriber, PROCESS_COUNTS};
use parmat::comm::{Communicator, ThreadWorld};
use parmat::{ContiguousMatrix, Interpolator, Matrix};

const SIGMA: f64 = 0.25;

fn gaussian(x: f64, y: f64) -> f64 {
    (-(x * x + y * y) / (2.0 * SIGMA * SIGMA)).exp()
}

/// Samples the gaussian on a `points x points` grid spanning `[-1, 1]²`.
fn gaussian_grid<'c, C: Communicator>(comm: &'c C, points: usize) -> ContiguousMatrix<'c, C> {
    let step = 2.0 / (points - 1) as f64;
    ContiguousMatrix::from_fn(comm, points, points, 2.0, 2.0, |r, c| {
        gaussian(-1.0 + c as f64 * step, 1.0 - r as f64 * step)
    })
}

#[test]
fn test_identity_upsampling_copies_the_source() {
    init_test_subscriber();
    for n in PROCESS_COUNTS {
        let results = ThreadWorld::run(n, |comm| {
            let source = ContiguousMatrix::from_fn(comm, 5, 4, 5.0, 4.0, |r, c| {
                ((r * 31 + c * 17) % 11) as f64 * 0.37
            });
            let mut result = ContiguousMatrix::new(comm, 5, 4, 5.0, 4.0, f64::NAN);
            let mut interpolator = Interpolator::new(&result, &source).unwrap();
            assert_eq!((interpolator.nx(), interpolator.ny()), (1, 1));
            interpolator.interpolate(&mut result, &source).unwrap();
            (source.as_slice().to_vec(), result.as_slice().to_vec())
        });
        for (source, result) in results {
            assert_eq!(source, result, "{} processes", n);
        }
    }
}

/// Upsamples a 3x3 grid 1:1 with `special` in the centre cell and returns
/// every process's result.
fn upsample_identity_with_centre(special: f64, processes: usize) -> Vec<Vec<f64>> {
    ThreadWorld::run(processes, |comm| {
        let source = ContiguousMatrix::from_fn(comm, 3, 3, 3.0, 3.0, |r, c| {
            if (r, c) == (1, 1) {
                special
            } else {
                (r * 3 + c) as f64 + 0.5
            }
        });
        let mut result = ContiguousMatrix::new(comm, 3, 3, 3.0, 3.0, 0.0);
        let mut interpolator = Interpolator::new(&result, &source).unwrap();
        interpolator.interpolate(&mut result, &source).unwrap();
        result.as_slice().to_vec()
    })
}

#[test]
fn test_identity_upsampling_keeps_negative_zero() {
    for result in upsample_identity_with_centre(-0.0, 2) {
        assert_eq!(result[4].to_bits(), (-0.0f64).to_bits());
    }
}

#[test]
fn test_identity_upsampling_keeps_infinite_cell() {
    init_test_subscriber();
    for result in upsample_identity_with_centre(f64::INFINITY, 2) {
        for (idx, value) in result.iter().enumerate() {
            let expected = if idx == 4 {
                f64::INFINITY
            } else {
                idx as f64 + 0.5
            };
            assert_eq!(value.to_bits(), expected.to_bits(), "cell {}", idx);
        }
    }
}

#[test]
fn test_result_is_independent_of_process_count() {
    let reference = ThreadWorld::run(1, |comm| {
        let source = gaussian_grid(comm, 9);
        let mut result = ContiguousMatrix::new(comm, 27, 18, 2.0, 2.0, 0.0);
        let mut interpolator = Interpolator::new(&result, &source).unwrap();
        interpolator.interpolate(&mut result, &source).unwrap();
        result.as_slice().to_vec()
    })
    .remove(0);

    for n in [2, 3, 4, 7, 12] {
        let results = ThreadWorld::run(n, |comm| {
            let source = gaussian_grid(comm, 9);
            let mut result = ContiguousMatrix::new(comm, 27, 18, 2.0, 2.0, 0.0);
            let mut interpolator = Interpolator::new(&result, &source).unwrap();
            interpolator.interpolate(&mut result, &source).unwrap();
            result.as_slice().to_vec()
        });
        assert!(results.iter().all(|r| *r == reference), "{} processes", n);
    }
}

#[test]
fn test_interpolator_is_reusable() {
    let results = ThreadWorld::run(2, |comm| {
        let mut result = ContiguousMatrix::new(comm, 8, 8, 1.0, 1.0, 0.0);
        let ones = ContiguousMatrix::new(comm, 4, 4, 1.0, 1.0, 1.0);
        let twos = ContiguousMatrix::new(comm, 4, 4, 1.0, 1.0, 2.0);
        let mut interpolator = Interpolator::new(&result, &ones).unwrap();

        interpolator.interpolate(&mut result, &ones).unwrap();
        let first = result.max().unwrap();
        interpolator.interpolate(&mut result, &twos).unwrap();
        (first, result.min().unwrap(), result.max().unwrap())
    });
    for (first, min, max) in results {
        assert!((first - 1.0).abs() < 1e-12);
        assert!((min - 2.0).abs() < 1e-12 && (max - 2.0).abs() < 1e-12);
    }
}

/// Upsamples coarse gaussian grids by 4 in both directions and compares
/// every result cell with the exact function at its position.
#[test]
fn test_gaussian_error_decreases_with_resolution() {
    init_test_subscriber();
    let factor = 4;
    let mut errors = Vec::new();
    for points in [8, 16, 32] {
        let step = 2.0 / (points - 1) as f64;
        let results = ThreadWorld::run(3, |comm| {
            let source = gaussian_grid(comm, points);
            let size = points * factor;
            let mut result = ContiguousMatrix::new(comm, size, size, 2.0, 2.0, 0.0);
            let mut interpolator = Interpolator::new(&result, &source).unwrap();
            interpolator.interpolate(&mut result, &source).unwrap();

            // Only cells inside the sampled square are compared; the blocks of
            // the last source row and column extrapolate past it.
            let inner = (points - 1) * factor;
            let mut max_error: f64 = 0.0;
            for row in 0..=inner {
                for col in 0..=inner {
                    let x = -1.0 + col as f64 / factor as f64 * step;
                    let y = 1.0 - row as f64 / factor as f64 * step;
                    let value = result.value(row, col).unwrap();
                    max_error = max_error.max((value - gaussian(x, y)).abs());
                }
            }
            max_error
        });
        assert!(results.iter().all(|e| *e == results[0]));
        errors.push(results[0]);
    }

    assert!(errors[0] < 0.2, "coarse error {}", errors[0]);
    assert!(errors[1] < errors[0], "{:?}", errors);
    assert!(errors[2] < errors[1], "{:?}", errors);
    assert!(errors[2] < 2e-3, "fine error {}", errors[2]);
}
