//! Compound-assignment operators and negation.
//!
//! `+=`, `-=`, `*=`, `/=` accept either another matrix (`&M` for any
//! [`Matrix`]) or an `f64`, and touch the zone of the left-hand side only.
//! Multiplication and division are elementwise.
//!
//! ```rust
//! use parmat::comm::SelfComm;
//! use parmat::{ContiguousMatrix, Matrix};
//!
//! let comm = SelfComm::new();
//! let mut a = ContiguousMatrix::new(&comm, 2, 2, 1.0, 1.0, 3.0);
//! let b = ContiguousMatrix::new(&comm, 2, 2, 1.0, 1.0, 2.0);
//! a *= &b;
//! a -= 1.0;
//! assert_eq!(a.local(), &[5.0; 4]);
//! assert_eq!((-&a).local(), &[-5.0; 4]);
//! ```
//!
//! The operator traits cannot return errors. Use the named methods of
//! [`Matrix`] (`add`, `mul`, ...) to get a `Result` instead of a panic.

use super::Matrix;
use crate::comm::Communicator;
use crate::contiguous::ContiguousMatrix;
use crate::local::LocalMatrix;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Implements one compound-assignment trait for a storage type, with a
/// matrix and a scalar right-hand side.
///
/// # Panics
///
/// The generated matrix operator panics if the operands differ in shape or
/// zone.
macro_rules! impl_assign_op {
    ($storage:ident, $trait:ident, $method:ident, $op:tt) => {
        impl<'c, C: Communicator, M: Matrix> $trait<&M> for $storage<'c, C> {
            fn $method(&mut self, rhs: &M) {
                if let Err(err) = self.combine_with(rhs, |x, y| x $op y) {
                    panic!("{}", err);
                }
            }
        }

        impl<'c, C: Communicator> $trait<f64> for $storage<'c, C> {
            fn $method(&mut self, rhs: f64) {
                self.update(|_, x| x $op rhs);
            }
        }
    };
}

/// All operators for one storage type, plus `-&m` returning a new matrix
/// with the zone negated.
macro_rules! impl_matrix_ops {
    ($storage:ident) => {
        impl_assign_op!($storage, AddAssign, add_assign, +);
        impl_assign_op!($storage, SubAssign, sub_assign, -);
        impl_assign_op!($storage, MulAssign, mul_assign, *);
        impl_assign_op!($storage, DivAssign, div_assign, /);

        impl<'c, C: Communicator> std::ops::Neg for &$storage<'c, C> {
            type Output = $storage<'c, C>;

            fn neg(self) -> Self::Output {
                let mut out = self.clone();
                out.update(|_, x| -x);
                out
            }
        }
    };
}

impl_matrix_ops!(ContiguousMatrix);
impl_matrix_ops!(LocalMatrix);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{SelfComm, ThreadWorld};

    #[test]
    fn test_operators_touch_zone_only() {
        let results = ThreadWorld::run(2, |comm| {
            let mut a = ContiguousMatrix::from_fn(comm, 2, 2, 1.0, 1.0, |r, c| (2 * r + c) as f64);
            let b = ContiguousMatrix::new(comm, 2, 2, 1.0, 1.0, 10.0);
            a += &b;
            a /= 2.0;
            a.as_slice().to_vec()
        });
        assert_eq!(results[0], vec![5.0, 5.5, 2.0, 3.0]);
        assert_eq!(results[1], vec![0.0, 1.0, 6.0, 6.5]);
    }

    #[test]
    fn test_mixed_storage_operands() {
        let comm = SelfComm::new();
        let mut local = LocalMatrix::new(&comm, 3, 1, 1.0, 1.0, 4.0);
        let contiguous = ContiguousMatrix::from_fn(&comm, 3, 1, 1.0, 1.0, |_, c| c as f64);
        local -= &contiguous;
        local *= 2.0;
        assert_eq!(local.local(), &[8.0, 6.0, 4.0]);
        assert_eq!((-&local).local(), &[-8.0, -6.0, -4.0]);
    }

    #[test]
    #[should_panic(expected = "Matrix dimensions mismatch")]
    fn test_shape_mismatch_panics() {
        let comm = SelfComm::new();
        let mut a = LocalMatrix::new(&comm, 3, 1, 1.0, 1.0, 0.0);
        let b = LocalMatrix::new(&comm, 1, 3, 1.0, 1.0, 0.0);
        a *= &b;
    }
}
