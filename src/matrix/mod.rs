//! The partitioned matrix abstraction.
//!
//! # Overview
//!
//! A matrix is a `height x width` grid of `f64` cells stored row-major and
//! split between the processes of a [`Communicator`]. Each process owns a
//! *responsibility zone*, a contiguous range of global indices it writes
//! and always sees fresh (see [`Layout`]).
//!
//! Two storage strategies implement the [`Matrix`] trait:
//!
//! - [`LocalMatrix`](crate::LocalMatrix) stores the zone only. Reading a
//!   foreign cell is an error (`MissedData`).
//! - [`ContiguousMatrix`](crate::ContiguousMatrix) stores the whole grid
//!   on every process. Foreign cells are readable but may be stale until
//!   the next [`synchronize`](Matrix::synchronize).
//!
//! Everything else (filling, elementwise transforms, arithmetic, global
//! reductions, cursors) is written once as provided methods of the trait
//! and only ever writes the zone of the receiver.
//!
//! ## Example
//!
//! ```rust
//! use parmat::comm::ThreadWorld;
//! use parmat::{ContiguousMatrix, Matrix};
//!
//! let sums = ThreadWorld::run(3, |comm| {
//!     let mut m = ContiguousMatrix::new(comm, 4, 4, 4.0, 4.0, 0.0);
//!     m.fill_with(|site| site.index() as f64);
//!     m.sum().unwrap()
//! });
//! assert_eq!(sums, vec![120.0; 3]);
//! ```
//!
//! > [!NOTE]
//! > Global reductions and synchronization are *collective*: every process
//! > of the group must call them, in the same order.

use crate::comm::{Communicator, ReduceOp};
use crate::contiguous::ContiguousMatrix;
use crate::error::{MatrixError, Result};
use tracing::debug;

pub mod cursor;
pub mod layout;
pub mod ops;

pub use cursor::{Cursor, CursorMut, Window, WindowMut};
pub use layout::{Layout, Site};

/// Capability shared by every matrix storage strategy.
///
/// Implementors provide the geometry, the communicator, the readable window
/// and the two synchronization forms. Everything else is provided.
pub trait Matrix {
    type Comm: Communicator;

    fn layout(&self) -> &Layout;

    fn communicator(&self) -> &Self::Comm;

    /// The readable part of the storage.
    fn window(&self) -> Window<'_>;

    fn window_mut(&mut self) -> WindowMut<'_>;

    /// Makes every cell fresh on every process. Collective.
    fn synchronize(&mut self) -> Result<()>;

    /// Makes every cell fresh on `root` only. Collective.
    fn synchronize_root(&mut self, root: usize) -> Result<()>;

    fn width(&self) -> usize {
        self.layout().width()
    }

    fn height(&self) -> usize {
        self.layout().height()
    }

    fn size(&self) -> usize {
        self.layout().size()
    }

    /// Reads the cell with global index `idx`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `idx >= size`, `MissedData` if the cell is not
    /// stored by this process.
    fn get(&self, idx: usize) -> Result<f64> {
        let window = self.window();
        let offset = window.locate(idx)?;
        Ok(window.data[offset])
    }

    fn get_mut(&mut self, idx: usize) -> Result<&mut f64> {
        self.window_mut().into_cell(idx)
    }

    fn set(&mut self, idx: usize, value: f64) -> Result<()> {
        *self.get_mut(idx)? = value;
        Ok(())
    }

    fn value(&self, row: usize, column: usize) -> Result<f64> {
        let idx = self.layout().index_of(row, column)?;
        self.get(idx)
    }

    fn set_value(&mut self, row: usize, column: usize, value: f64) -> Result<()> {
        let idx = self.layout().index_of(row, column)?;
        self.set(idx, value)
    }

    /// The responsibility zone of this process.
    fn local(&self) -> &[f64] {
        self.window().zone()
    }

    fn local_mut(&mut self) -> &mut [f64] {
        self.window_mut().into_zone().1
    }

    fn fill(&mut self, value: f64) {
        self.local_mut().fill(value);
    }

    /// Sets every zone cell to `generator(site)`.
    fn fill_with<F>(&mut self, mut generator: F)
    where
        F: FnMut(Site<'_>) -> f64,
    {
        let (layout, zone) = self.window_mut().into_zone();
        let start = layout.start();
        for (offset, cell) in zone.iter_mut().enumerate() {
            *cell = generator(Site::new(layout, start + offset));
        }
    }

    /// Replaces every zone cell `x` with `f(site, x)`.
    fn update<F>(&mut self, mut f: F)
    where
        F: FnMut(Site<'_>, f64) -> f64,
    {
        let (layout, zone) = self.window_mut().into_zone();
        let start = layout.start();
        for (offset, cell) in zone.iter_mut().enumerate() {
            *cell = f(Site::new(layout, start + offset), *cell);
        }
    }

    /// `self[i] = f(site, a[i])` over the zone.
    ///
    /// `a` must have the shape and the zone of `self`.
    fn calculate<A, F>(&mut self, a: &A, mut f: F) -> Result<()>
    where
        A: Matrix,
        F: FnMut(Site<'_>, f64) -> f64,
    {
        self.layout().check_compatible(a.layout())?;
        let src = a.local();
        let (layout, zone) = self.window_mut().into_zone();
        let start = layout.start();
        for (offset, (cell, &x)) in zone.iter_mut().zip(src).enumerate() {
            *cell = f(Site::new(layout, start + offset), x);
        }
        Ok(())
    }

    /// `self[i] = f(site, a[i], b[i])` over the zone.
    fn calculate2<A, B, F>(&mut self, a: &A, b: &B, mut f: F) -> Result<()>
    where
        A: Matrix,
        B: Matrix,
        F: FnMut(Site<'_>, f64, f64) -> f64,
    {
        self.layout().check_compatible(a.layout())?;
        self.layout().check_compatible(b.layout())?;
        let (lhs, rhs) = (a.local(), b.local());
        let (layout, zone) = self.window_mut().into_zone();
        let start = layout.start();
        for (offset, ((cell, &x), &y)) in zone.iter_mut().zip(lhs).zip(rhs).enumerate() {
            *cell = f(Site::new(layout, start + offset), x, y);
        }
        Ok(())
    }

    /// `self[i] = f(self[i], other[i])` over the zone.
    fn combine_with<A, F>(&mut self, other: &A, mut f: F) -> Result<()>
    where
        A: Matrix,
        F: FnMut(f64, f64) -> f64,
    {
        self.layout().check_compatible(other.layout())?;
        for (cell, &y) in self.local_mut().iter_mut().zip(other.local()) {
            *cell = f(*cell, y);
        }
        Ok(())
    }

    /// Global reduction over all cells. Collective.
    ///
    /// Every process folds `combine` over its zone starting from
    /// `op.identity()`, the partial results are combined with `op` across
    /// processes, and finally `initial` is combined into the global value
    /// with `op`. Both `combine` and `op` must be associative and
    /// commutative: the order in which partial results meet is unspecified.
    ///
    /// ```rust
    /// use parmat::comm::{ReduceOp, ThreadWorld};
    /// use parmat::{LocalMatrix, Matrix};
    ///
    /// let norms = ThreadWorld::run(2, |comm| {
    ///     let m = LocalMatrix::new(comm, 2, 2, 1.0, 1.0, 2.0);
    ///     m.reduce(0.0, ReduceOp::Sum, |acc, x| acc + x * x).unwrap()
    /// });
    /// assert_eq!(norms, vec![16.0, 16.0]);
    /// ```
    fn reduce<F>(&self, initial: f64, op: ReduceOp, mut combine: F) -> Result<f64>
    where
        F: FnMut(f64, f64) -> f64,
    {
        let partial = self
            .local()
            .iter()
            .fold(op.identity::<f64>(), |acc, &x| combine(acc, x));
        let mut global = [0.0];
        self.communicator().all_reduce(&[partial], &mut global, op)?;
        debug!(
            rank = self.layout().rank(),
            ?op,
            partial,
            global = global[0],
            "reduced"
        );
        Ok(op.apply(initial, global[0]))
    }

    fn sum(&self) -> Result<f64> {
        self.reduce(0.0, ReduceOp::Sum, |acc, x| acc + x)
    }

    fn max(&self) -> Result<f64> {
        self.reduce(f64::NEG_INFINITY, ReduceOp::Max, f64::max)
    }

    fn min(&self) -> Result<f64> {
        self.reduce(f64::INFINITY, ReduceOp::Min, f64::min)
    }

    /// `self = a + b` over the zone.
    fn add<A: Matrix, B: Matrix>(&mut self, a: &A, b: &B) -> Result<()> {
        self.calculate2(a, b, |_, x, y| x + y)
    }

    fn sub<A: Matrix, B: Matrix>(&mut self, a: &A, b: &B) -> Result<()> {
        self.calculate2(a, b, |_, x, y| x - y)
    }

    /// Elementwise product.
    fn mul<A: Matrix, B: Matrix>(&mut self, a: &A, b: &B) -> Result<()> {
        self.calculate2(a, b, |_, x, y| x * y)
    }

    fn div<A: Matrix, B: Matrix>(&mut self, a: &A, b: &B) -> Result<()> {
        self.calculate2(a, b, |_, x, y| x / y)
    }

    fn neg<A: Matrix>(&mut self, a: &A) -> Result<()> {
        self.calculate(a, |_, x| -x)
    }

    fn add_scalar<A: Matrix>(&mut self, a: &A, value: f64) -> Result<()> {
        self.calculate(a, |_, x| x + value)
    }

    /// `self = a - value`.
    fn sub_scalar<A: Matrix>(&mut self, a: &A, value: f64) -> Result<()> {
        self.calculate(a, |_, x| x - value)
    }

    /// `self = value - a`.
    fn scalar_sub<A: Matrix>(&mut self, value: f64, a: &A) -> Result<()> {
        self.calculate(a, |_, x| value - x)
    }

    fn mul_scalar<A: Matrix>(&mut self, a: &A, value: f64) -> Result<()> {
        self.calculate(a, |_, x| x * value)
    }

    /// `self = a / value`.
    fn div_scalar<A: Matrix>(&mut self, a: &A, value: f64) -> Result<()> {
        self.calculate(a, |_, x| x / value)
    }

    /// `self = value / a`.
    fn scalar_div<A: Matrix>(&mut self, value: f64, a: &A) -> Result<()> {
        self.calculate(a, |_, x| value / x)
    }

    /// Writes the zone of `aᵀ`.
    ///
    /// `a` must be synchronized beforehand. This is not checked: a stale
    /// `a` silently gives a wrong result.
    fn transpose_from<D: Communicator>(&mut self, a: &ContiguousMatrix<'_, D>) -> Result<()> {
        let (w, h) = (self.width(), self.height());
        if a.width() != h || a.height() != w {
            return Err(MatrixError::dimensions([w, h], a.layout().shape()));
        }
        let src = a.as_slice();
        self.fill_with(|site| src[site.column() * h + site.row()]);
        Ok(())
    }

    /// Writes the zone of the matrix product `a · b`.
    ///
    /// Both operands must be synchronized beforehand (not checked).
    fn dot<D, E>(&mut self, a: &ContiguousMatrix<'_, D>, b: &ContiguousMatrix<'_, E>) -> Result<()>
    where
        D: Communicator,
        E: Communicator,
    {
        let inner = a.width();
        if b.height() != inner {
            return Err(MatrixError::dimensions(
                [inner, b.width()],
                [b.height(), b.width()],
            ));
        }
        if self.height() != a.height() || self.width() != b.width() {
            return Err(MatrixError::dimensions(
                [a.height(), b.width()],
                [self.height(), self.width()],
            ));
        }
        let (lhs, rhs) = (a.as_slice(), b.as_slice());
        let w = b.width();
        self.fill_with(|site| {
            let (row, column) = (site.row(), site.column());
            (0..inner)
                .map(|k| lhs[row * inner + k] * rhs[k * w + column])
                .sum()
        });
        Ok(())
    }

    /// Exchanges the zone contents of two matrices of the same layout.
    fn swap_zone<A: Matrix>(&mut self, other: &mut A) -> Result<()> {
        self.layout().check_compatible(other.layout())?;
        self.local_mut().swap_with_slice(other.local_mut());
        Ok(())
    }

    /// Copies the zone out of a full row-major image of the matrix.
    ///
    /// Used after single-process input: every process receives the same
    /// `values` and keeps its own part.
    fn load(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.size() {
            return Err(MatrixError::DimensionsMismatch {
                expected: vec![self.size()],
                got: vec![values.len()],
            });
        }
        let zone = self.layout().zone();
        self.local_mut().copy_from_slice(&values[zone]);
        Ok(())
    }

    /// Read-only cursor at global index `idx`.
    ///
    /// `idx` must be readable, or equal to the end of the zone.
    fn cursor(&self, idx: usize) -> Result<Cursor<'_>> {
        let window = self.window();
        if idx != self.layout().finish() {
            window.locate(idx)?;
        }
        Ok(Cursor::new(window, idx))
    }

    fn cursor_at(&self, row: usize, column: usize) -> Result<Cursor<'_>> {
        let idx = self.layout().index_of(row, column)?;
        self.cursor(idx)
    }

    fn cursor_mut(&mut self, idx: usize) -> Result<CursorMut<'_>> {
        let finish = self.layout().finish();
        let window = self.window_mut();
        if idx != finish {
            window.locate(idx)?;
        }
        Ok(CursorMut::new(window, idx))
    }

    fn cursor_mut_at(&mut self, row: usize, column: usize) -> Result<CursorMut<'_>> {
        let idx = self.layout().index_of(row, column)?;
        self.cursor_mut(idx)
    }

    /// Cursor at the beginning of the zone. Iterating it visits the zone.
    fn iter(&self) -> Cursor<'_> {
        let start = self.layout().start();
        Cursor::new(self.window(), start)
    }

    /// Zone cells with their position.
    fn cells(&self) -> impl Iterator<Item = (Site<'_>, f64)> {
        let layout = self.layout();
        let start = layout.start();
        self.local()
            .iter()
            .enumerate()
            .map(move |(offset, &x)| (Site::new(layout, start + offset), x))
    }

    fn cells_mut(&mut self) -> impl Iterator<Item = (Site<'_>, &mut f64)> {
        let (layout, zone) = self.window_mut().into_zone();
        let start = layout.start();
        zone.iter_mut()
            .enumerate()
            .map(move |(offset, x)| (Site::new(layout, start + offset), x))
    }
}
