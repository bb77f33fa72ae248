//! # parmat
//!
//! `parmat` implements 2-D `f64` matrices whose storage is split between the
//! cooperating processes of a simulation, plus two parallel algorithms built
//! on top of them.
//!
//! Every process owns a contiguous *responsibility zone* of the matrix. It
//! writes only there and sees the rest of the matrix only through explicit,
//! collective synchronization.
//!
//! ## Modules
//!
//! - [`comm`]: the [`Communicator`](comm::Communicator) capability and its
//!   adapters (single process, simulated processes on threads, MPI).
//! - [`matrix`]: the [`Matrix`] trait with every generic algorithm, layouts
//!   and cursors.
//! - [`LocalMatrix`] and [`ContiguousMatrix`]: the two storage strategies.
//! - [`Interpolator`]: parallel bicubic upsampling.
//! - [`LuDecomposer`]: parallel LU decomposition with global pivoting.
//!
//! ## Example
//!
//! ```rust
//! use parmat::comm::ThreadWorld;
//! use parmat::{ContiguousMatrix, Matrix};
//!
//! let views = ThreadWorld::run(2, |comm| {
//!     let mut m = ContiguousMatrix::new(comm, 2, 2, 1.0, 1.0, 0.0);
//!     m.fill_with(|site| (site.row() * 10 + site.column()) as f64);
//!     m.synchronize().unwrap();
//!     m.as_slice().to_vec()
//! });
//! assert_eq!(views[0], vec![0.0, 1.0, 10.0, 11.0]);
//! assert_eq!(views[0], views[1]);
//! ```

pub mod comm;
pub mod contiguous;
pub mod error;
pub mod interpolator;
pub mod local;
pub mod lu;
pub mod matrix;
pub mod partition;

pub use contiguous::ContiguousMatrix;
pub use error::{MatrixError, Result};
pub use interpolator::Interpolator;
pub use local::LocalMatrix;
pub use lu::{LuDecomposer, LuOptions};
pub use matrix::{Cursor, CursorMut, Layout, Matrix, Site};
