//! Matrix storing the responsibility zone only.

use crate::comm::Communicator;
use crate::error::{MatrixError, Result};
use crate::matrix::{Layout, Matrix, Window, WindowMut};
use std::fmt;

/// Matrix whose process keeps only its own zone: `O(size / n)` memory, but
/// no way to ever see foreign cells.
///
/// Reading or writing a cell of another zone fails with `MissedData`, and
/// both synchronization forms fail with `SynchronizationError`.
pub struct LocalMatrix<'c, C> {
    comm: &'c C,
    layout: Layout,
    data: Vec<f64>,
}

impl<'c, C: Communicator> LocalMatrix<'c, C> {
    pub fn new(
        comm: &'c C,
        width: usize,
        height: usize,
        width_um: f64,
        height_um: f64,
        filler: f64,
    ) -> Self {
        let layout = Layout::new(width, height, width_um, height_um, comm.rank(), comm.size());
        Self {
            comm,
            data: vec![filler; layout.zone().len()],
            layout,
        }
    }

    /// Move-assignment: `self` becomes `other`.
    ///
    /// # Errors
    ///
    /// `MoveError` if `other` lives in a different process group.
    pub fn replace(&mut self, other: LocalMatrix<'c, C>) -> Result<()> {
        if other.comm.group_id() != self.comm.group_id() {
            return Err(MatrixError::MoveError);
        }
        *self = other;
        Ok(())
    }
}

impl<'c, C: Communicator> Matrix for LocalMatrix<'c, C> {
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
            data: &self.data,
            origin: self.layout.start(),
        }
    }

    fn window_mut(&mut self) -> WindowMut<'_> {
        WindowMut {
            layout: &self.layout,
            data: &mut self.data,
            origin: self.layout.start(),
        }
    }

    fn synchronize(&mut self) -> Result<()> {
        Err(MatrixError::SynchronizationError)
    }

    fn synchronize_root(&mut self, _root: usize) -> Result<()> {
        Err(MatrixError::SynchronizationError)
    }
}

impl<C> Clone for LocalMatrix<'_, C> {
    fn clone(&self) -> Self {
        Self {
            comm: self.comm,
            layout: self.layout,
            data: self.data.clone(),
        }
    }
}

impl<C> fmt::Debug for LocalMatrix<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMatrix")
            .field("layout", &self.layout)
            .field("data", &self.data)
            .finish()
    }
}
