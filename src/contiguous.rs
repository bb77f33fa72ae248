//! Matrix replicated at full size on every process.

use crate::comm::Communicator;
use crate::error::{MatrixError, Result};
use crate::matrix::{Layout, Matrix, Window, WindowMut};
use std::fmt;
use tracing::debug;

/// Full-size replica of the matrix on every process.
///
/// Every cell is readable, but only the responsibility zone is guaranteed
/// fresh. Cells of other zones hold the values of the last
/// [`synchronize`](Matrix::synchronize) (or of construction).
///
/// Both buffers are `chunk * processes` long so that every process can
/// contribute a slot of the same size to a synchronization; the padding
/// past `size` is never visible.
pub struct ContiguousMatrix<'c, C> {
    comm: &'c C,
    layout: Layout,
    data: Vec<f64>,
    scratch: Vec<f64>,
}

impl<'c, C: Communicator> ContiguousMatrix<'c, C> {
    /// Creates a matrix with every cell set to `filler`.
    pub fn new(
        comm: &'c C,
        width: usize,
        height: usize,
        width_um: f64,
        height_um: f64,
        filler: f64,
    ) -> Self {
        let layout = Layout::new(width, height, width_um, height_um, comm.rank(), comm.size());
        let capacity = layout.chunk() * layout.processes();
        Self {
            comm,
            layout,
            data: vec![filler; capacity],
            scratch: vec![0.0; capacity],
        }
    }

    /// Creates a matrix with cell `(row, column)` set to `f(row, column)`
    /// on every process, so the whole matrix starts fresh everywhere.
    pub fn from_fn<F>(
        comm: &'c C,
        width: usize,
        height: usize,
        width_um: f64,
        height_um: f64,
        mut f: F,
    ) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut matrix = Self::new(comm, width, height, width_um, height_um, 0.0);
        for (idx, cell) in matrix.data[..width * height].iter_mut().enumerate() {
            *cell = f(idx / width, idx % width);
        }
        matrix
    }

    /// The `n x n` magic square over a 1x1 physical area, built on every
    /// process without communication.
    ///
    /// Odd orders use the Siamese construction started from the middle of
    /// the last column, orders divisible by 4 complement the diagonals of
    /// the `4 x 4` tiles and the remaining even orders use Strachey's
    /// quadrant method.
    ///
    /// # Errors
    ///
    /// `NoMagicSquare` for `n == 2`.
    pub fn magic(comm: &'c C, n: usize) -> Result<Self> {
        let values = magic_values(n)?;
        Ok(Self::from_fn(comm, n, n, 1.0, 1.0, |row, col| {
            values[row * n + col] as f64
        }))
    }

    /// The communicator, for as long as it is borrowed by the matrix.
    pub fn comm(&self) -> &'c C {
        self.comm
    }

    /// Every cell, fresh or not.
    pub fn as_slice(&self) -> &[f64] {
        &self.data[..self.layout.size()]
    }

    /// Deep copy of `other` into `self`, taking over its geometry.
    ///
    /// # Errors
    ///
    /// `DimensionsMismatch` if the two communicators differ in size, so the
    /// zones cannot line up.
    pub fn copy_from<D: Communicator>(&mut self, other: &ContiguousMatrix<'_, D>) -> Result<()> {
        let theirs = other.layout();
        if theirs.processes() != self.layout.processes() {
            return Err(MatrixError::DimensionsMismatch {
                expected: vec![self.layout.processes()],
                got: vec![theirs.processes()],
            });
        }
        let layout = Layout::new(
            theirs.width(),
            theirs.height(),
            theirs.width_um(),
            theirs.height_um(),
            self.comm.rank(),
            self.comm.size(),
        );
        if layout.shape() != self.layout.shape() {
            let capacity = layout.chunk() * layout.processes();
            self.data = vec![0.0; capacity];
            self.scratch = vec![0.0; capacity];
        }
        self.layout = layout;
        let size = self.layout.size();
        self.data[..size].copy_from_slice(other.as_slice());
        Ok(())
    }

    /// Move-assignment: `self` becomes `other`.
    ///
    /// # Errors
    ///
    /// `MoveError` if `other` lives in a different process group.
    pub fn replace(&mut self, other: ContiguousMatrix<'c, C>) -> Result<()> {
        if other.comm.group_id() != self.comm.group_id() {
            return Err(MatrixError::MoveError);
        }
        *self = other;
        Ok(())
    }

    /// Transposes a square matrix in place, zone only.
    ///
    /// The matrix must be synchronized beforehand; the transposed zone is
    /// read from a snapshot so no process reads a cell it already rewrote.
    pub fn transpose_in_place(&mut self) -> Result<()> {
        let (w, h) = (self.layout.width(), self.layout.height());
        if w != h {
            return Err(MatrixError::SquareMatrixRequired {
                width: w,
                height: h,
            });
        }
        self.scratch.copy_from_slice(&self.data);
        let snapshot = &self.scratch;
        for idx in self.layout.zone() {
            self.data[idx] = snapshot[(idx % w) * w + idx / w];
        }
        Ok(())
    }

    fn slot(&self) -> std::ops::Range<usize> {
        let chunk = self.layout.chunk();
        let rank = self.layout.rank();
        chunk * rank..chunk * (rank + 1)
    }
}

/// Row-major cells of the magic square of order `n`.
fn magic_values(n: usize) -> Result<Vec<usize>> {
    match n {
        2 => Err(MatrixError::NoMagicSquare { order: n }),
        _ if n % 2 == 1 => Ok(siamese(n)),
        _ if n % 4 == 0 => Ok((0..n * n)
            .map(|idx| {
                let (r, c) = (idx / n % 4, idx % n % 4);
                if r == c || r + c == 3 {
                    n * n - idx
                } else {
                    idx + 1
                }
            })
            .collect()),
        _ => Ok(strachey(n)),
    }
}

fn siamese(n: usize) -> Vec<usize> {
    let mut cells = vec![0; n * n];
    let (mut i, mut j) = (n / 2, n - 1);
    for value in 1..=n * n {
        cells[i * n + j] = value;
        // Up and right; off both edges at once lands left of the corner.
        (i, j) = if i == 0 && j == n - 1 {
            (0, n.saturating_sub(2))
        } else {
            ((i + n - 1) % n, (j + 1) % n)
        };
        if cells[i * n + j] != 0 {
            (i, j) = ((i + 1) % n, (j + 2 * n - 2) % n);
        }
    }
    cells
}

/// Even orders `4k + 2`: four shifted copies of the odd square of order
/// `m = n / 2`, with `k` columns exchanged between the left quadrants and
/// `k - 1` between the right ones.
fn strachey(n: usize) -> Vec<usize> {
    let m = n / 2;
    let k = (n - 2) / 4;
    let quarter = siamese(m);
    let offsets = [[0, 2], [3, 1]];
    let mut cells = vec![0; n * n];
    for r in 0..n {
        for c in 0..n {
            cells[r * n + c] = quarter[(r % m) * m + c % m] + offsets[r / m][c / m] * m * m;
        }
    }
    for r in 0..m {
        let left = if r == m / 2 { 1..k + 1 } else { 0..k };
        let right = (0..k.saturating_sub(1)).map(|t| n - 1 - t);
        for c in left.chain(right) {
            cells.swap(r * n + c, (r + m) * n + c);
        }
    }
    cells
}

impl<'c, C: Communicator> Matrix for ContiguousMatrix<'c, C> {
    type Comm = C;

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn communicator(&self) -> &C {
        self.comm
    }

    fn window(&self) -> Window<'_> {
        Window {
            layout: &self.layout,
            data: &self.data[..self.layout.size()],
            origin: 0,
        }
    }

    fn window_mut(&mut self) -> WindowMut<'_> {
        let size = self.layout.size();
        WindowMut {
            layout: &self.layout,
            data: &mut self.data[..size],
            origin: 0,
        }
    }

    /// All-gathers every process's slot into the scratch buffer, which then
    /// becomes the data buffer.
    fn synchronize(&mut self) -> Result<()> {
        let slot = self.slot();
        self.comm.all_gather(&self.data[slot], &mut self.scratch)?;
        std::mem::swap(&mut self.data, &mut self.scratch);
        debug!(
            rank = self.layout.rank(),
            chunk = self.layout.chunk(),
            "synchronized"
        );
        Ok(())
    }

    /// Gathers every process's slot on `root`. Other processes keep their
    /// buffers untouched.
    fn synchronize_root(&mut self, root: usize) -> Result<()> {
        let slot = self.slot();
        self.comm.gather(&self.data[slot], &mut self.scratch, root)?;
        if self.layout.rank() == root {
            std::mem::swap(&mut self.data, &mut self.scratch);
        }
        debug!(rank = self.layout.rank(), root, "synchronized to root");
        Ok(())
    }
}

impl<C> Clone for ContiguousMatrix<'_, C> {
    fn clone(&self) -> Self {
        Self {
            comm: self.comm,
            layout: self.layout,
            data: self.data.clone(),
            scratch: vec![0.0; self.scratch.len()],
        }
    }
}

impl<C> fmt::Debug for ContiguousMatrix<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContiguousMatrix")
            .field("layout", &self.layout)
            .field("data", &&self.data[..self.layout.size()])
            .finish()
    }
}
