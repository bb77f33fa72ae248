//! Parallel bicubic upsampling.
//!
//! A `source` grid is upsampled into a `result` grid whose dimensions are
//! integer multiples of it: every source cell becomes an `ny x nx` block of
//! the result, filled by the bicubic patch through the cell's four corners
//! (see [`parmat_kernels::bicubic`]).
//!
//! # Work split
//!
//! Source rows are block-partitioned across the processes. Each process
//! fills the result rows of its block into a send buffer, and one
//! all-gather assembles the complete result on every process:
//!
//! ```text
//! source rows  | rank 0 | rank 1 | rank 2 |
//! result rows  | 0 .. ny*b | ny*b .. 2*ny*b | ... |   (b = ceil(height / n))
//! ```
//!
//! The last processes may own fewer rows (or none); their send buffers are
//! padded to the common slot size and the padding is dropped on receipt.

use crate::comm::Communicator;
use crate::contiguous::ContiguousMatrix;
use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;
use crate::partition::{block_len, block_range};
use parmat_kernels::{cell_coefficients, corner_samples, evaluate_block, gather_stencil};
use tracing::{debug, trace};

/// Bicubic interpolator bound to a pair of shapes.
///
/// ```rust
/// use parmat::comm::ThreadWorld;
/// use parmat::{ContiguousMatrix, Interpolator, Matrix};
///
/// let results = ThreadWorld::run(2, |comm| {
///     let source = ContiguousMatrix::from_fn(comm, 3, 3, 3.0, 3.0, |r, c| (r + c) as f64);
///     let mut result = ContiguousMatrix::new(comm, 6, 6, 3.0, 3.0, 0.0);
///     let mut interpolator = Interpolator::new(&result, &source).unwrap();
///     interpolator.interpolate(&mut result, &source).unwrap();
///     result.value(1, 1).unwrap()
/// });
/// assert!((results[0] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Interpolator {
    source_shape: [usize; 2],
    result_shape: [usize; 2],
    nx: usize,
    ny: usize,
    send: Vec<f64>,
    recv: Vec<f64>,
}

impl Interpolator {
    /// Validates the shapes of all future `result` and `source` matrices.
    ///
    /// # Errors
    ///
    /// `DimensionsMismatch` if the source has a single row or column, or if
    /// the result dimensions are not positive integer multiples of the
    /// source ones.
    pub fn new<R: Matrix, S: Matrix>(result: &R, source: &S) -> Result<Self> {
        let [sh, sw] = source.layout().shape();
        let [rh, rw] = result.layout().shape();
        if sw < 2 || sh < 2 {
            return Err(MatrixError::dimensions([2, 2], [sh, sw]));
        }
        if rw < sw || rh < sh || rw % sw != 0 || rh % sh != 0 {
            return Err(MatrixError::dimensions([sh, sw], [rh, rw]));
        }
        Ok(Self {
            source_shape: [sh, sw],
            result_shape: [rh, rw],
            nx: rw / sw,
            ny: rh / sh,
            send: Vec::new(),
            recv: Vec::new(),
        })
    }

    /// Horizontal upsampling factor.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Vertical upsampling factor.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Fills `result` from `source`. Collective.
    ///
    /// `source` must be synchronized beforehand; `result` is fully
    /// synchronized afterwards.
    pub fn interpolate<C, D>(
        &mut self,
        result: &mut ContiguousMatrix<'_, C>,
        source: &ContiguousMatrix<'_, D>,
    ) -> Result<()>
    where
        C: Communicator,
        D: Communicator,
    {
        if source.layout().shape() != self.source_shape {
            return Err(MatrixError::dimensions(
                self.source_shape,
                source.layout().shape(),
            ));
        }
        if result.layout().shape() != self.result_shape {
            return Err(MatrixError::dimensions(
                self.result_shape,
                result.layout().shape(),
            ));
        }

        let [sh, sw] = self.source_shape;
        let rw = self.result_shape[1];
        let (nx, ny) = (self.nx, self.ny);
        let (rank, processes) = (result.communicator().rank(), result.communicator().size());

        let rows = block_range(sh, processes, rank);
        let row_stride = ny * rw;
        let slot = block_len(sh, processes) * row_stride;
        self.send.resize(slot, 0.0);
        self.recv.resize(slot * processes, 0.0);

        let values = source.as_slice();
        for i0 in rows.clone() {
            let line = (i0 - rows.start) * row_stride;
            for j0 in 0..sw {
                let stencil = gather_stencil(values, sw, sh, i0, j0)?;
                let a = cell_coefficients(&corner_samples(&stencil));
                evaluate_block(&a, ny, nx, &mut self.send[line + j0 * nx..], rw)?;
            }
            trace!(rank, row = i0, "interpolated source row");
        }
        debug!(rank, ?rows, nx, ny, "gathering interpolated rows");

        result.communicator().all_gather(&self.send, &mut self.recv)?;
        let size = result.size();
        result.window_mut().data.copy_from_slice(&self.recv[..size]);
        Ok(())
    }
}
