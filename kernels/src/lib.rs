//! Numeric kernels behind `parmat`.
//!
//! Everything here works on plain slices and knows nothing about processes,
//! partitions or communicators. The matrix crate decides *which* rows or
//! cells a process handles and calls into these kernels to do the arithmetic.

use thiserror::Error;

pub mod bicubic;
pub mod triangular;

pub use bicubic::{cell_coefficients, corner_samples, evaluate_block, gather_stencil, BASIS};
pub use triangular::{eliminate_row, solve_lower_unit, solve_upper, upper_entry};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    #[error("Cell ({row}, {col}) lies outside a {height}x{width} grid")]
    CellOutOfGrid {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },
}

pub type Result<T> = std::result::Result<T, KernelError>;

pub(crate) fn check_len(got: usize, expected: usize) -> Result<()> {
    if got < expected {
        return Err(KernelError::ShapeMismatch {
            expected: vec![expected],
            got: vec![got],
        });
    }
    Ok(())
}
