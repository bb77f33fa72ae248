#![allow(dead_code)]

use parmat::comm::Communicator;
use parmat::ContiguousMatrix;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Installs a global subscriber printing through the test harness and
/// respecting `RUST_LOG` ("warn" when unset).
///
/// Simulated processes run on their own threads, so a thread-local default
/// would miss their events. Installing twice is a no-op.
pub fn init_test_subscriber() {
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();

    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}

/// Process counts every multi-process test runs with.
pub const PROCESS_COUNTS: [usize; 4] = [1, 2, 3, 4];

/// Row-major square matrix from nested rows, fresh on every process.
pub fn square<'c, C: Communicator>(comm: &'c C, rows: &[Vec<f64>]) -> ContiguousMatrix<'c, C> {
    let n = rows.len();
    ContiguousMatrix::from_fn(comm, n, n, n as f64, n as f64, |r, c| rows[r][c])
}

/// `(A·B)(row, col)` of two row-major `n x n` slices.
pub fn product(a: &[f64], b: &[f64], n: usize, row: usize, col: usize) -> f64 {
    (0..n).map(|k| a[row * n + k] * b[k * n + col]).sum()
}
