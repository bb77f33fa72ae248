//! Parallel LU decomposition with global row pivoting.
//!
//! # Algorithm
//!
//! For a square `N x N` matrix `A`, [`LuDecomposer`] finds a row
//! permutation `P`, a unit lower-triangular `L` and an upper-triangular `U`
//! such that `P·A = L·U`. Rows are finalized one at a time. For row `i`:
//!
//! 1. **Candidate scoring.** The rows still unplaced (positions `i..N` of
//!    the permutation) are block-partitioned across the processes. For each
//!    of its candidates a process runs a trial elimination against the
//!    finalized rows `0..i`, giving the trial `L(i, 0..i)` and the trial
//!    diagonal `U(i, i)`. It keeps the candidate with the largest `|U(i, i)|`.
//! 2. **Pivot choice.** The local winners (diagonal and position) are
//!    all-gathered and every process picks the same global winner: the
//!    first one in rank order, replaced only by a strictly larger
//!    magnitude. `P` swaps positions `i` and the winner, and the winning
//!    process broadcasts its `L(i, 0..i)` and `U(i, i)`.
//! 3. **Row completion.** The columns `i+1..N` are block-partitioned, each
//!    process computes its `U(i, j)` entries and one all-gather assembles
//!    the row everywhere.
//!
//! Every process ends up with the complete factorization. Ties are broken
//! by position, so the result does not depend on the number of processes.
//!
//! > [!WARNING]
//! > There is no singularity detection. When every candidate has a zero
//! > diagonal the first one is used anyway, and the division by zero shows
//! > up as `NaN`/`Inf` in the following rows.

use crate::comm::Communicator;
use crate::contiguous::ContiguousMatrix;
use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;
use crate::partition::{block_len, block_range, block_range_in};
use parmat_kernels::{eliminate_row, solve_lower_unit, solve_upper, upper_entry};
use tracing::{debug, info, trace};

/// Marks a process without candidates in the gathered positions.
const NO_CANDIDATE: u64 = u64::MAX;

/// Progress reporting of a decomposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuOptions {
    /// Name of the job in progress messages. No progress is logged without
    /// a label.
    pub label: Option<String>,
    /// Rows between two progress messages.
    pub progress_interval: usize,
}

impl Default for LuOptions {
    fn default() -> Self {
        Self {
            label: None,
            progress_interval: 10,
        }
    }
}

impl LuOptions {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }
}

/// LU decomposition of one square [`ContiguousMatrix`].
///
/// The decomposition runs in the constructor, which is therefore
/// collective. The source matrix must be synchronized beforehand (this is
/// not checked) and stays borrowed for the lifetime of the decomposer.
///
/// ```rust
/// use parmat::comm::ThreadWorld;
/// use parmat::{ContiguousMatrix, LuDecomposer};
///
/// let diagonals = ThreadWorld::run(2, |comm| {
///     let a = ContiguousMatrix::from_fn(comm, 2, 2, 1.0, 1.0, |r, c| [[1.0, 2.0], [4.0, 3.0]][r][c]);
///     let lu = LuDecomposer::new(&a).unwrap();
///     (lu.permutation().to_vec(), lu.u(0, 0), lu.l(1, 0))
/// });
/// assert_eq!(diagonals[0], (vec![1, 0], 4.0, 0.25));
/// ```
pub struct LuDecomposer<'a, 'c, C> {
    source: &'a ContiguousMatrix<'c, C>,
    n: usize,
    lu: Vec<f64>,
    perm: Vec<usize>,
    options: LuOptions,

    trial: Vec<f64>,
    best: Vec<f64>,
    diagonals: Vec<f64>,
    candidates: Vec<u64>,
    send: Vec<f64>,
    recv: Vec<f64>,
}

impl<'a, 'c, C: Communicator> LuDecomposer<'a, 'c, C> {
    pub fn new(source: &'a ContiguousMatrix<'c, C>) -> Result<Self> {
        Self::with_options(source, LuOptions::default())
    }

    /// # Errors
    ///
    /// `SquareMatrixRequired` for a rectangular source, `Communication` if
    /// a collective call fails.
    pub fn with_options(source: &'a ContiguousMatrix<'c, C>, options: LuOptions) -> Result<Self> {
        let (width, height) = (source.width(), source.height());
        if width != height {
            return Err(MatrixError::SquareMatrixRequired { width, height });
        }
        let n = width;
        let processes = source.communicator().size();

        let mut decomposer = Self {
            source,
            n,
            lu: vec![0.0; n * n],
            perm: (0..n).collect(),
            options,
            trial: vec![0.0; n],
            best: vec![0.0; n + 1],
            diagonals: vec![0.0; processes],
            candidates: vec![NO_CANDIDATE; processes],
            send: Vec::new(),
            recv: Vec::new(),
        };
        decomposer.decompose()?;
        Ok(decomposer)
    }

    fn decompose(&mut self) -> Result<()> {
        let n = self.n;
        let source = self.source;
        let comm = source.communicator();
        if let Some(label) = &self.options.label {
            info!(label = label.as_str(), row = 0, total = n, "decomposition started");
        }

        for i in 0..n {
            let pivot = self.choose_pivot(i)?;
            self.perm.swap(i, pivot);
            self.complete_row(i)?;

            trace!(rank = comm.rank(), row = i, pivot, diagonal = self.lu[i * n + i], "row finalized");
            let interval = self.options.progress_interval.max(1);
            if let Some(label) = &self.options.label {
                if i > 0 && i % interval == 0 {
                    info!(label = label.as_str(), row = i, total = n, "decomposing");
                }
            }
        }
        debug!(rank = comm.rank(), size = n, "decomposition finished");
        Ok(())
    }

    /// Scores the local candidates for row `i`, agrees on the global winner
    /// and stores its `L(i, 0..i)` and `U(i, i)`. Returns the winner's
    /// position in the permutation.
    fn choose_pivot(&mut self, i: usize) -> Result<usize> {
        let n = self.n;
        let source = self.source;
        let comm = source.communicator();
        let a = source.as_slice();

        let mut local_best: Option<(usize, f64)> = None;
        for p in block_range_in(i, n, comm.size(), comm.rank()) {
            let row = self.perm[p] * n;
            let u = eliminate_row(&self.lu, n, i, &a[row..row + n], &mut self.trial[..i])?;
            if local_best.map_or(true, |(_, best)| u.abs() > best.abs()) {
                local_best = Some((p, u));
                self.best[..i].copy_from_slice(&self.trial[..i]);
            }
        }

        let (position, diagonal) = match local_best {
            Some((p, u)) => (p as u64, u),
            None => (NO_CANDIDATE, 0.0),
        };
        comm.all_gather(&[diagonal], &mut self.diagonals)?;
        comm.all_gather(&[position], &mut self.candidates)?;

        let mut winner: Option<usize> = None;
        for k in 0..comm.size() {
            if self.candidates[k] == NO_CANDIDATE {
                continue;
            }
            if winner.map_or(true, |w| self.diagonals[k].abs() > self.diagonals[w].abs()) {
                winner = Some(k);
            }
        }
        let winner = winner.ok_or_else(|| {
            MatrixError::Communication(format!("no pivot candidate for row {}", i))
        })?;
        debug!(
            rank = comm.rank(),
            row = i,
            winner,
            pivot = self.candidates[winner],
            "pivot chosen"
        );

        self.best[i] = self.diagonals[winner];
        comm.broadcast(&mut self.best[..=i], winner)?;
        self.lu[i * n..=i * n + i].copy_from_slice(&self.best[..=i]);
        Ok(self.candidates[winner] as usize)
    }

    /// Computes `U(i, i+1..n)` in parallel over columns.
    fn complete_row(&mut self, i: usize) -> Result<()> {
        let n = self.n;
        let count = n - i - 1;
        if count == 0 {
            return Ok(());
        }

        let source = self.source;
        let comm = source.communicator();
        let a = source.as_slice();
        let processes = comm.size();
        let slot = block_len(count, processes);
        self.send.resize(slot, 0.0);
        self.recv.resize(slot * processes, 0.0);

        let row = self.perm[i] * n;
        for (k, j) in block_range_in(i + 1, n, processes, comm.rank()).enumerate() {
            self.send[k] = upper_entry(&self.lu, n, i, j, a[row + j]);
        }
        comm.all_gather(&self.send[..slot], &mut self.recv[..slot * processes])?;
        self.lu[i * n + i + 1..(i + 1) * n].copy_from_slice(&self.recv[..count]);
        Ok(())
    }

    /// Order of the decomposed matrix.
    pub fn size(&self) -> usize {
        self.n
    }

    /// `L(row, col)`: `1.0` on the diagonal, `0.0` above it.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below [`size`](Self::size).
    pub fn l(&self, row: usize, col: usize) -> f64 {
        self.check_cell(row, col);
        match row.cmp(&col) {
            std::cmp::Ordering::Greater => self.lu[row * self.n + col],
            std::cmp::Ordering::Equal => 1.0,
            std::cmp::Ordering::Less => 0.0,
        }
    }

    /// `U(row, col)`: `0.0` below the diagonal.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below [`size`](Self::size).
    pub fn u(&self, row: usize, col: usize) -> f64 {
        self.check_cell(row, col);
        if row <= col {
            self.lu[row * self.n + col]
        } else {
            0.0
        }
    }

    fn check_cell(&self, row: usize, col: usize) {
        assert!(
            row < self.n && col < self.n,
            "({}, {}) is outside a {}x{} matrix",
            row,
            col,
            self.n,
            self.n
        );
    }

    /// `(P·A)(row, col)`, read from the source matrix.
    pub fn pa(&self, row: usize, col: usize) -> f64 {
        self.check_cell(row, col);
        self.source.as_slice()[self.perm[row] * self.n + col]
    }

    /// `permutation()[i]` is the source row placed at row `i`.
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// `L` as a new matrix, fresh on every process.
    pub fn lower_triangle(&self) -> ContiguousMatrix<'c, C> {
        self.to_matrix(|r, c| self.l(r, c))
    }

    /// `U` as a new matrix, fresh on every process.
    pub fn upper_triangle(&self) -> ContiguousMatrix<'c, C> {
        self.to_matrix(|r, c| self.u(r, c))
    }

    /// `P` as a new 0/1 matrix, fresh on every process.
    pub fn permutation_matrix(&self) -> ContiguousMatrix<'c, C> {
        self.to_matrix(|r, c| if self.perm[r] == c { 1.0 } else { 0.0 })
    }

    fn to_matrix<F: FnMut(usize, usize) -> f64>(&self, f: F) -> ContiguousMatrix<'c, C> {
        let layout = self.source.layout();
        ContiguousMatrix::from_fn(self.source.comm(), self.n, self.n, layout.width_um(), layout.height_um(), f)
    }

    /// Solves `A·x = b` for `N x 1` matrices on `root` only.
    ///
    /// `b` must be fresh on `root`; `x` becomes fresh there. The other
    /// processes return right away and leave `x` untouched.
    pub fn solve<D, E>(
        &self,
        x: &mut ContiguousMatrix<'_, D>,
        b: &ContiguousMatrix<'_, E>,
        root: usize,
    ) -> Result<()>
    where
        D: Communicator,
        E: Communicator,
    {
        let column = [self.n, 1];
        if b.layout().shape() != column {
            return Err(MatrixError::dimensions(column, b.layout().shape()));
        }
        if x.layout().shape() != column {
            return Err(MatrixError::dimensions(column, x.layout().shape()));
        }
        if self.source.communicator().rank() != root {
            return Ok(());
        }

        let rhs = b.as_slice();
        let mut buf: Vec<f64> = self.perm.iter().map(|&p| rhs[p]).collect();
        solve_lower_unit(&self.lu, self.n, &mut buf)?;
        solve_upper(&self.lu, self.n, &mut buf)?;
        x.window_mut().data.copy_from_slice(&buf);
        Ok(())
    }

    /// `X = A⁻¹·B`. Collective.
    ///
    /// The columns of `B` are split between the processes; `B` must be
    /// synchronized beforehand and `X` is fully synchronized afterwards.
    pub fn divide<D, E>(
        &mut self,
        x: &mut ContiguousMatrix<'_, D>,
        b: &ContiguousMatrix<'_, E>,
    ) -> Result<()>
    where
        D: Communicator,
        E: Communicator,
    {
        let (n, m) = (self.n, b.width());
        if b.height() != n {
            return Err(MatrixError::dimensions([n, m], b.layout().shape()));
        }
        if x.layout().shape() != [n, m] {
            return Err(MatrixError::dimensions([n, m], x.layout().shape()));
        }
        let rhs = b.as_slice();
        self.solve_columns(x, m, |i, j| rhs[i * m + j])
    }

    /// `X = A⁻¹`. Collective; `X` is fully synchronized afterwards.
    pub fn inverse<D: Communicator>(&mut self, x: &mut ContiguousMatrix<'_, D>) -> Result<()> {
        let n = self.n;
        if x.layout().shape() != [n, n] {
            return Err(MatrixError::dimensions([n, n], x.layout().shape()));
        }
        self.solve_columns(x, n, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    /// Solves `A·x = rhs(·, j)` for every column `j < m`, split across the
    /// processes, and assembles the solutions into `x`.
    fn solve_columns<D, F>(&mut self, x: &mut ContiguousMatrix<'_, D>, m: usize, rhs: F) -> Result<()>
    where
        D: Communicator,
        F: Fn(usize, usize) -> f64,
    {
        let n = self.n;
        let source = self.source;
        let comm = source.communicator();
        let processes = comm.size();
        let slot = block_len(m, processes) * n;
        self.send.resize(slot, 0.0);
        self.recv.resize(slot * processes, 0.0);

        // Local block is column-major: column k of the block at k * n.
        for (k, j) in block_range(m, processes, comm.rank()).enumerate() {
            let column = &mut self.send[k * n..(k + 1) * n];
            for (i, value) in column.iter_mut().enumerate() {
                *value = rhs(self.perm[i], j);
            }
            solve_lower_unit(&self.lu, n, column)?;
            solve_upper(&self.lu, n, column)?;
        }
        comm.all_gather(&self.send, &mut self.recv)?;
        debug!(rank = comm.rank(), columns = m, "divided");

        let solutions = &self.recv;
        for (idx, cell) in x.window_mut().data.iter_mut().enumerate() {
            *cell = solutions[(idx % m) * n + idx / m];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{SelfComm, ThreadWorld};

    #[test]
    fn test_default_options_are_silent() {
        let options = LuOptions::default();
        assert_eq!(options.label, None);
        assert_eq!(options.progress_interval, 10);
        assert_eq!(LuOptions::labelled("job").label.as_deref(), Some("job"));
    }

    #[test]
    fn test_identity_is_its_own_factorization() {
        let comm = SelfComm::new();
        let a = ContiguousMatrix::from_fn(&comm, 3, 3, 1.0, 1.0, |r, c| if r == c { 1.0 } else { 0.0 });
        let lu = LuDecomposer::new(&a).unwrap();
        assert_eq!(lu.permutation(), &[0, 1, 2]);
        for r in 0..3 {
            for c in 0..3 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert_eq!(lu.l(r, c), expected);
                assert_eq!(lu.u(r, c), expected);
            }
        }
    }

    #[test]
    fn test_empty_column_blocks() {
        // 2x2 over 4 processes: most ranks get no candidates and no columns.
        let results = ThreadWorld::run(4, |comm| {
            let a = ContiguousMatrix::from_fn(comm, 2, 2, 1.0, 1.0, |r, c| [[1.0, 2.0], [3.0, 4.0]][r][c]);
            let lu = LuDecomposer::new(&a).unwrap();
            (lu.permutation().to_vec(), lu.u(0, 1), lu.u(1, 1))
        });
        for (perm, u01, u11) in results {
            assert_eq!(perm, vec![1, 0]);
            assert_eq!(u01, 4.0);
            assert!((u11 - (2.0 - 4.0 / 3.0)).abs() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "outside a 2x2 matrix")]
    fn test_accessor_bounds() {
        let comm = SelfComm::new();
        let a = ContiguousMatrix::new(&comm, 2, 2, 1.0, 1.0, 1.0);
        let lu = LuDecomposer::new(&a).unwrap();
        lu.u(0, 2);
    }

    #[test]
    #[should_panic(expected = "outside a 2x2 matrix")]
    fn test_permuted_source_bounds() {
        let comm = SelfComm::new();
        let a = ContiguousMatrix::new(&comm, 2, 2, 1.0, 1.0, 1.0);
        let lu = LuDecomposer::new(&a).unwrap();
        // Column 2 of row 0 would alias row 1 in the flat buffer.
        lu.pa(0, 2);
    }
}
