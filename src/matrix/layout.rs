use crate::error::{MatrixError, Result};
use crate::partition::{block_len, block_range};
use std::ops::Range;

/// Geometry of a matrix plus the responsibility zone of one process.
///
/// Cells are stored row-major: index `idx` is row `idx / width`, column
/// `idx % width`. The zone `start..finish` comes from the block/remainder
/// rule of [`crate::partition`] applied to all `width * height` cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    width: usize,
    height: usize,
    width_um: f64,
    height_um: f64,
    start: usize,
    finish: usize,
    rank: usize,
    processes: usize,
}

impl Layout {
    pub fn new(
        width: usize,
        height: usize,
        width_um: f64,
        height_um: f64,
        rank: usize,
        processes: usize,
    ) -> Self {
        let zone = block_range(width * height, processes, rank);
        Self {
            width,
            height,
            width_um,
            height_um,
            start: zone.start,
            finish: zone.end,
            rank,
            processes,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width_um(&self) -> f64 {
        self.width_um
    }

    pub fn height_um(&self) -> f64 {
        self.height_um
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    /// `[height, width]`, the order used in dimension errors.
    pub fn shape(&self) -> [usize; 2] {
        [self.height, self.width]
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn finish(&self) -> usize {
        self.finish
    }

    pub fn zone(&self) -> Range<usize> {
        self.start..self.finish
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    /// Nominal zone length `ceil(size / processes)`; the slot every rank
    /// contributes to a synchronization.
    pub fn chunk(&self) -> usize {
        block_len(self.size(), self.processes)
    }

    pub fn in_zone(&self, idx: usize) -> bool {
        idx >= self.start && idx < self.finish
    }

    /// Physical width of one column.
    pub fn resolution_x(&self) -> f64 {
        self.width_um / self.width as f64
    }

    /// Physical height of one row.
    pub fn resolution_y(&self) -> f64 {
        self.height_um / self.height as f64
    }

    /// Row of a flat index; 0 for a matrix without columns.
    pub fn row_of(&self, idx: usize) -> usize {
        idx.checked_div(self.width).unwrap_or(0)
    }

    pub fn column_of(&self, idx: usize) -> usize {
        idx.checked_rem(self.width).unwrap_or(0)
    }

    /// Horizontal physical coordinate of a column, zero at column
    /// `width / 2`.
    pub fn column_um(&self, column: usize) -> f64 {
        (column as f64 - (self.width / 2) as f64) * self.resolution_x()
    }

    /// Vertical physical coordinate of a row. Zero at row `height / 2`,
    /// growing upwards (towards row 0).
    pub fn row_um(&self, row: usize) -> f64 {
        ((self.height / 2) as f64 - row as f64) * self.resolution_y()
    }

    pub(crate) fn check_index(&self, idx: usize) -> Result<()> {
        if idx >= self.size() {
            return Err(MatrixError::OutOfRange {
                index: idx,
                size: self.size(),
            });
        }
        Ok(())
    }

    pub(crate) fn index_of(&self, row: usize, column: usize) -> Result<usize> {
        if row >= self.height || column >= self.width {
            return Err(MatrixError::OutOfRange {
                index: row * self.width + column,
                size: self.size(),
            });
        }
        Ok(row * self.width + column)
    }

    /// Index of the cell `drow` rows and `dcol` columns away from `idx`.
    ///
    /// Moving off the grid is reported as `OutOfRange` against `idx`.
    pub(crate) fn shift(&self, idx: usize, drow: isize, dcol: isize) -> Result<usize> {
        let off_grid = MatrixError::OutOfRange {
            index: idx,
            size: self.size(),
        };
        let row = self
            .row_of(idx)
            .checked_add_signed(drow)
            .ok_or_else(|| off_grid.clone())?;
        let column = self
            .column_of(idx)
            .checked_add_signed(dcol)
            .ok_or_else(|| off_grid.clone())?;
        self.index_of(row, column).map_err(|_| off_grid)
    }

    /// Operands of an elementwise operation must have the same shape and
    /// the same zone.
    pub(crate) fn check_compatible(&self, other: &Layout) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(MatrixError::dimensions(self.shape(), other.shape()));
        }
        if self.zone() != other.zone() {
            return Err(MatrixError::DimensionsMismatch {
                expected: vec![self.start, self.finish],
                got: vec![other.start, other.finish],
            });
        }
        Ok(())
    }
}

/// A cell of a matrix seen from a generator or transform closure.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    layout: &'a Layout,
    index: usize,
}

impl<'a> Site<'a> {
    pub(crate) fn new(layout: &'a Layout, index: usize) -> Self {
        Self { layout, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn row(&self) -> usize {
        self.layout.row_of(self.index)
    }

    pub fn column(&self) -> usize {
        self.layout.column_of(self.index)
    }

    pub fn row_um(&self) -> f64 {
        self.layout.row_um(self.row())
    }

    pub fn column_um(&self) -> f64 {
        self.layout.column_um(self.column())
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }
}
