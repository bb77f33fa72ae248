//! # Collective communication
//!
//! The matrix layer never talks to other processes directly. Everything it
//! needs (rank and group size, broadcast, gather, all-gather, all-reduce) is
//! consumed through the [`Communicator`] trait, so the same code runs on:
//!
//! * [`SelfComm`]: a world of one process. Every collective is a copy.
//! * [`ThreadComm`]: `n` simulated processes living on `n` threads of one
//!   OS process and exchanging messages over `crossbeam` channels. This is
//!   what the test-suite uses to check multi-rank behaviour.
//! * `MpiComm` (feature `mpi`): a thin adapter over an MPI communicator.
//!
//! ## The collective contract
//!
//! Execution is single-program-multiple-data. A collective call blocks until
//! every process of the group reaches the matching call, so every process
//! must issue the same collectives in the same order. Breaking that rule is
//! a caller error that usually ends in a deadlock; it is not detected here.

pub mod backend;
#[cfg(feature = "mpi")]
pub mod mpi_backend;
pub mod single;
pub mod thread_backend;

pub use backend::{CommElem, Communicator, ReduceOp, Reducible};
#[cfg(feature = "mpi")]
pub use mpi_backend::MpiComm;
pub use single::SelfComm;
pub use thread_backend::{ThreadComm, ThreadWorld};
