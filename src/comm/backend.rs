use crate::error::{MatrixError, Result};
use num_traits::Num;
use std::fmt::Debug;

/// Element types that can travel through a [`Communicator`].
///
/// With the `mpi` feature on, the element must also have an MPI datatype.
#[cfg(not(feature = "mpi"))]
pub trait CommElem: Copy + Default + Debug + Send + Sync + 'static {}

/// Element types that can travel through a [`Communicator`].
///
/// With the `mpi` feature on, the element must also have an MPI datatype.
#[cfg(feature = "mpi")]
pub trait CommElem:
    Copy + Default + Debug + Send + Sync + 'static + mpi::datatype::Equivalence
{
}

/// Element types with a total-ish order and arithmetic, usable in
/// [`Communicator::all_reduce`].
pub trait Reducible: CommElem + Num + PartialOrd {
    /// The smallest representable value, identity of [`ReduceOp::Max`].
    fn lowest() -> Self;
    /// The largest representable value, identity of [`ReduceOp::Min`].
    fn highest() -> Self;
}

macro_rules! impl_comm_elem {
    ($($t:ty),*) => {
        $(impl CommElem for $t {})*
    };
}

impl_comm_elem!(u8, i32, i64, u32, u64, f32, f64);

macro_rules! impl_reducible_int {
    ($($t:ty),*) => {
        $(
            impl Reducible for $t {
                fn lowest() -> Self {
                    <$t>::MIN
                }
                fn highest() -> Self {
                    <$t>::MAX
                }
            }
        )*
    };
}

macro_rules! impl_reducible_float {
    ($($t:ty),*) => {
        $(
            impl Reducible for $t {
                fn lowest() -> Self {
                    <$t>::NEG_INFINITY
                }
                fn highest() -> Self {
                    <$t>::INFINITY
                }
            }
        )*
    };
}

impl_reducible_int!(u8, i32, i64, u32, u64);
impl_reducible_float!(f32, f64);

/// Associative, commutative combining operation of a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Product,
    Max,
    Min,
}

impl ReduceOp {
    /// The neutral element: `apply(identity(), x) == x`.
    pub fn identity<T: Reducible>(self) -> T {
        match self {
            ReduceOp::Sum => T::zero(),
            ReduceOp::Product => T::one(),
            ReduceOp::Max => T::lowest(),
            ReduceOp::Min => T::highest(),
        }
    }

    pub fn apply<T: Reducible>(self, a: T, b: T) -> T {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Product => a * b,
            ReduceOp::Max => {
                if b > a {
                    b
                } else {
                    a
                }
            }
            ReduceOp::Min => {
                if b < a {
                    b
                } else {
                    a
                }
            }
        }
    }
}

/// Abstraction over a group of cooperating processes.
///
/// Every collective method must be called by all members of the group, in
/// the same order, with the same counts and the same `root`. Buffers are
/// plain slices: the communicator never allocates on behalf of the caller
/// except for in-flight copies.
///
/// Implementations:
/// - [`SelfComm`](super::SelfComm): single process.
/// - [`ThreadComm`](super::ThreadComm): simulated processes on threads.
/// - `MpiComm`: real processes, behind the `mpi` feature.
pub trait Communicator {
    /// Index of the calling process in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of processes in the group. Always at least 1.
    fn size(&self) -> usize;

    /// Identity of the process group. Two handles of the same group compare
    /// equal; handles of different groups don't.
    fn group_id(&self) -> usize;

    /// Replaces `buf` on every process with the contents of `buf` on `root`.
    fn broadcast<T: CommElem>(&self, buf: &mut [T], root: usize) -> Result<()>;

    /// Concatenates the equal-length `send` blocks of all processes, in rank
    /// order, into `recv` on every process.
    ///
    /// `recv.len()` must be `send.len() * size()`.
    fn all_gather<T: CommElem>(&self, send: &[T], recv: &mut [T]) -> Result<()>;

    /// Like [`all_gather`](Self::all_gather) but only `root` receives.
    /// `recv` is ignored on the other processes.
    fn gather<T: CommElem>(&self, send: &[T], recv: &mut [T], root: usize) -> Result<()>;

    /// Element-wise reduction of `send` over all processes, result in `recv`
    /// on every process.
    fn all_reduce<T: Reducible>(&self, send: &[T], recv: &mut [T], op: ReduceOp) -> Result<()>;

    /// Blocks until every process of the group has reached the barrier.
    fn barrier(&self) -> Result<()>;
}

pub(crate) fn check_root(root: usize, size: usize) -> Result<()> {
    if root >= size {
        return Err(MatrixError::Communication(format!(
            "root {} is outside a group of {} processes",
            root, size
        )));
    }
    Ok(())
}

pub(crate) fn check_count(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MatrixError::Communication(format!(
            "{} buffer holds {} elements, expected {}",
            what, got, expected
        )));
    }
    Ok(())
}
