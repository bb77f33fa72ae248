//! Row-elimination and substitution kernels over a combined L/U buffer.
//!
//! The buffer is `n x n`, row-major. Entries strictly below the diagonal
//! hold `L` (whose diagonal is implicitly `1.0`), entries on and above the
//! diagonal hold `U`.

use crate::{check_len, Result};

/// Trial elimination of a candidate pivot row.
///
/// Given the finalized rows `0..i` of `lu` and the candidate row `a_row`
/// of the (permuted) source matrix, writes the strict-lower values
/// `L(i, 0..i)` into `l_out` and returns the resulting diagonal `U(i, i)`.
pub fn eliminate_row(
    lu: &[f64],
    n: usize,
    i: usize,
    a_row: &[f64],
    l_out: &mut [f64],
) -> Result<f64> {
    check_len(lu.len(), n * n)?;
    check_len(a_row.len(), i + 1)?;
    check_len(l_out.len(), i)?;

    for j in 0..i {
        let mut l = a_row[j];
        for k in 0..j {
            l -= l_out[k] * lu[k * n + j];
        }
        l_out[j] = l / lu[j * n + j];
    }

    let mut u = a_row[i];
    for k in 0..i {
        u -= l_out[k] * lu[k * n + i];
    }
    Ok(u)
}

/// `U(i, j)` for `j > i`, given the finalized `L(i, 0..i)` in row `i` of
/// `lu` and the permuted source value `a_ij`.
pub fn upper_entry(lu: &[f64], n: usize, i: usize, j: usize, a_ij: f64) -> f64 {
    let mut u = a_ij;
    for k in 0..i {
        u -= lu[i * n + k] * lu[k * n + j];
    }
    u
}

/// Solves `L y = rhs` in place (unit lower triangle).
pub fn solve_lower_unit(lu: &[f64], n: usize, rhs: &mut [f64]) -> Result<()> {
    check_len(lu.len(), n * n)?;
    check_len(rhs.len(), n)?;
    for i in 0..n {
        let mut y = rhs[i];
        for k in 0..i {
            y -= lu[i * n + k] * rhs[k];
        }
        rhs[i] = y;
    }
    Ok(())
}

/// Solves `U x = rhs` in place.
pub fn solve_upper(lu: &[f64], n: usize, rhs: &mut [f64]) -> Result<()> {
    check_len(lu.len(), n * n)?;
    check_len(rhs.len(), n)?;
    for i in (0..n).rev() {
        let mut x = rhs[i];
        for k in i + 1..n {
            x -= lu[i * n + k] * rhs[k];
        }
        rhs[i] = x / lu[i * n + i];
    }
    Ok(())
}
