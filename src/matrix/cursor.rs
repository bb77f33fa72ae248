//! Cursors over a matrix window.
//!
//! A cursor is a global cell index plus a borrow of the readable window of
//! a matrix. Moving a cursor never fails; reading through it checks the
//! position the same way [`Matrix::get`](super::Matrix::get) does.

use super::layout::{Layout, Site};
use crate::error::{MatrixError, Result};

/// Borrowed readable part of a matrix.
///
/// `data[0]` is the cell with global index `origin`.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    pub layout: &'a Layout,
    pub data: &'a [f64],
    pub origin: usize,
}

/// Mutable counterpart of [`Window`].
#[derive(Debug)]
pub struct WindowMut<'a> {
    pub layout: &'a Layout,
    pub data: &'a mut [f64],
    pub origin: usize,
}

fn locate(layout: &Layout, origin: usize, len: usize, idx: usize) -> Result<usize> {
    layout.check_index(idx)?;
    if idx < origin || idx >= origin + len {
        return Err(MatrixError::MissedData {
            index: idx,
            start: layout.start(),
            finish: layout.finish(),
        });
    }
    Ok(idx - origin)
}

impl<'a> Window<'a> {
    /// Offset of global index `idx` in `data`.
    pub fn locate(&self, idx: usize) -> Result<usize> {
        locate(self.layout, self.origin, self.data.len(), idx)
    }

    /// The responsibility zone.
    pub fn zone(&self) -> &'a [f64] {
        let zone = self.layout.zone();
        &self.data[zone.start - self.origin..zone.end - self.origin]
    }
}

impl<'a> WindowMut<'a> {
    pub fn locate(&self, idx: usize) -> Result<usize> {
        locate(self.layout, self.origin, self.data.len(), idx)
    }

    /// Mutable reference to the cell with global index `idx`.
    pub fn into_cell(self, idx: usize) -> Result<&'a mut f64> {
        let offset = self.locate(idx)?;
        let WindowMut { data, .. } = self;
        Ok(&mut data[offset])
    }

    /// Splits into the layout and the mutable responsibility zone.
    pub fn into_zone(self) -> (&'a Layout, &'a mut [f64]) {
        let WindowMut {
            layout,
            data,
            origin,
        } = self;
        let zone = layout.zone();
        (layout, &mut data[zone.start - origin..zone.end - origin])
    }
}

macro_rules! impl_cursor_navigation {
    ($cursor:ident) => {
        impl<'a> $cursor<'a> {
            /// Current global index.
            pub fn index(&self) -> usize {
                self.index
            }

            pub fn step(&mut self) {
                self.index += 1;
            }

            /// Moves one cell back. Stays at 0 when already there.
            pub fn step_back(&mut self) {
                self.index = self.index.saturating_sub(1);
            }

            pub fn jump(&mut self, delta: isize) {
                self.index = self.index.saturating_add_signed(delta);
            }

            /// Goes back to the index the cursor was created at.
            pub fn restart(&mut self) {
                self.index = self.begin;
            }

            pub fn site(&self) -> Site<'_> {
                Site::new(self.layout, self.index)
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

            /// Value under the cursor.
            pub fn get(&self) -> Result<f64> {
                let offset = locate(self.layout, self.origin, self.data.len(), self.index)?;
                Ok(self.data[offset])
            }

            /// Value `drow` rows and `dcol` columns away from the cursor.
            pub fn at(&self, drow: isize, dcol: isize) -> Result<f64> {
                let idx = self.layout.shift(self.index, drow, dcol)?;
                let offset = locate(self.layout, self.origin, self.data.len(), idx)?;
                Ok(self.data[offset])
            }
        }
    };
}

/// Read-only cursor.
///
/// As an [`Iterator`] it yields values from the current position up to the
/// end of the responsibility zone.
///
/// ```
/// use parmat::comm::SelfComm;
/// use parmat::{ContiguousMatrix, Matrix};
///
/// let comm = SelfComm::new();
/// let m = ContiguousMatrix::from_fn(&comm, 3, 2, 3.0, 2.0, |row, col| (row * 3 + col) as f64);
/// let cursor = m.cursor_at(1, 0).unwrap();
/// assert_eq!(cursor.at(-1, 2).unwrap(), 2.0);
/// assert_eq!(cursor.collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    layout: &'a Layout,
    data: &'a [f64],
    origin: usize,
    begin: usize,
    index: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(window: Window<'a>, index: usize) -> Self {
        Self {
            layout: window.layout,
            data: window.data,
            origin: window.origin,
            begin: index,
            index,
        }
    }
}

impl_cursor_navigation!(Cursor);

impl Iterator for Cursor<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.index >= self.layout.finish() || self.index < self.origin {
            return None;
        }
        let value = *self.data.get(self.index - self.origin)?;
        self.index += 1;
        Some(value)
    }
}

/// Read-write cursor.
#[derive(Debug)]
pub struct CursorMut<'a> {
    layout: &'a Layout,
    data: &'a mut [f64],
    origin: usize,
    begin: usize,
    index: usize,
}

impl<'a> CursorMut<'a> {
    pub(crate) fn new(window: WindowMut<'a>, index: usize) -> Self {
        Self {
            layout: window.layout,
            data: window.data,
            origin: window.origin,
            begin: index,
            index,
        }
    }

    pub fn set(&mut self, value: f64) -> Result<()> {
        let offset = locate(self.layout, self.origin, self.data.len(), self.index)?;
        self.data[offset] = value;
        Ok(())
    }

    pub fn get_mut(&mut self) -> Result<&mut f64> {
        let offset = locate(self.layout, self.origin, self.data.len(), self.index)?;
        Ok(&mut self.data[offset])
    }

    pub fn set_at(&mut self, drow: isize, dcol: isize, value: f64) -> Result<()> {
        let idx = self.layout.shift(self.index, drow, dcol)?;
        let offset = locate(self.layout, self.origin, self.data.len(), idx)?;
        self.data[offset] = value;
        Ok(())
    }
}

impl_cursor_navigation!(CursorMut);
