//! Error taxonomy of the matrix layer.
//!
//! Every error is a local, per-process condition. Nothing here is forwarded
//! to the other processes: if an error fires on a subset of ranks, the rest
//! will block on their next collective call. Callers are expected to log
//! the error and abort the run.

use parmat_kernels::KernelError;
use thiserror::Error;

/// Error type for matrix operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// The index is outside `[0, size)`.
    #[error("Index {index} is out of range for a matrix of {size} elements")]
    OutOfRange { index: usize, size: usize },

    /// The index is inside the matrix but outside the part stored by this
    /// process (local matrices only).
    #[error("Index {index} is outside the responsibility zone {start}..{finish} of this process")]
    MissedData {
        index: usize,
        start: usize,
        finish: usize,
    },

    /// The storage kind cannot exchange data between processes.
    #[error("Matrix synchronization is not supported for local matrices")]
    SynchronizationError,

    /// Shapes of the operands are inconsistent.
    #[error("Matrix dimensions mismatch: expected {expected:?}, got {got:?}")]
    DimensionsMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A rectangular matrix was passed where a square one is required.
    #[error("Square matrix is required, got {height}x{width}")]
    SquareMatrixRequired { width: usize, height: usize },

    /// Magic squares exist for every order except 2.
    #[error("There is no magic square of order {order}")]
    NoMagicSquare { order: usize },

    /// Move-assignment between matrices bound to different process groups.
    #[error("Can't move a matrix working under a different communicator")]
    MoveError,

    /// The communicator failed to complete a collective call.
    #[error("Communication error: {0}")]
    Communication(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

pub type Result<T> = std::result::Result<T, MatrixError>;

impl MatrixError {
    /// `DimensionsMismatch` between two `[height, width]` shapes.
    pub fn dimensions(expected: [usize; 2], got: [usize; 2]) -> Self {
        MatrixError::DimensionsMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}
