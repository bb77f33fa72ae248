//! Bicubic patch kernels.
//!
//! A coarse cell `(i0, j0)` of a row-major grid is upsampled in three steps:
//!
//! 1. [`gather_stencil`] collects the 4x4 neighbourhood of rows `i0-1..=i0+2`
//!    and columns `j0-1..=j0+2`. Neighbours that fall outside the grid are
//!    synthesized by linear extrapolation (`2*F(adjacent) - F(two-in)`),
//!    first along the row axis, then along the column axis, so corner cells
//!    missing on both axes are extrapolated from already-extrapolated values.
//! 2. [`corner_samples`] turns the stencil into the 16-element vector
//!    `[F, Fx, Fy, Fxy]` at the corners `00, 01, 10, 11` of the cell using
//!    central differences (first index: row offset, second: column offset).
//! 3. [`cell_coefficients`] multiplies that vector by [`BASIS`] and
//!    [`evaluate_block`] evaluates `sum a[p][q] * y^p * x^q` on an
//!    `ny x nx` subgrid of the normalized cell `[0,1) x [0,1)`.
//!
//! See <https://en.wikipedia.org/wiki/Bicubic_interpolation>.

use crate::{check_len, KernelError, Result};

/// Maps corner samples `[F00 F01 F10 F11 | Fx.. | Fy.. | Fxy..]` to the
/// coefficients `a[k / 4][k % 4]`, where `k / 4` is the power of the row
/// coordinate and `k % 4` the power of the column coordinate.
#[rustfmt::skip]
pub const BASIS: [[f64; 16]; 16] = [
    [ 1.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0,  1.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [-3.0,  3.0,  0.0,  0.0, -2.0, -1.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [ 2.0, -2.0,  0.0,  0.0,  1.0,  1.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  1.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  1.0,  0.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0, -3.0,  3.0,  0.0,  0.0, -2.0, -1.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  0.0,  2.0, -2.0,  0.0,  0.0,  1.0,  1.0,  0.0,  0.0],
    [-3.0,  0.0,  3.0,  0.0,  0.0,  0.0,  0.0,  0.0, -2.0,  0.0, -1.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0, -3.0,  0.0,  3.0,  0.0,  0.0,  0.0,  0.0,  0.0, -2.0,  0.0, -1.0,  0.0],
    [ 9.0, -9.0, -9.0,  9.0,  6.0,  3.0, -6.0, -3.0,  6.0, -6.0,  3.0, -3.0,  4.0,  2.0,  2.0,  1.0],
    [-6.0,  6.0,  6.0, -6.0, -3.0, -3.0,  3.0,  3.0, -4.0,  4.0, -2.0,  2.0, -2.0, -2.0, -1.0, -1.0],
    [ 2.0,  0.0, -2.0,  0.0,  0.0,  0.0,  0.0,  0.0,  1.0,  0.0,  1.0,  0.0,  0.0,  0.0,  0.0,  0.0],
    [ 0.0,  0.0,  0.0,  0.0,  2.0,  0.0, -2.0,  0.0,  0.0,  0.0,  0.0,  0.0,  1.0,  0.0,  1.0,  0.0],
    [-6.0,  6.0,  6.0, -6.0, -4.0, -2.0,  4.0,  2.0, -3.0,  3.0, -3.0,  3.0, -2.0, -1.0, -2.0, -1.0],
    [ 4.0, -4.0, -4.0,  4.0,  2.0,  2.0, -2.0, -2.0,  2.0, -2.0,  2.0, -2.0,  1.0,  1.0,  1.0,  1.0],
];

/// 4x4 neighbourhood of a cell. `stencil[r][c]` holds the value at row
/// offset `r - 1` and column offset `c - 1`.
pub type Stencil = [[f64; 4]; 4];

/// Collects the neighbourhood of cell `(row, col)` of a `height x width`
/// row-major grid, extrapolating neighbours beyond the border.
///
/// # Errors
///
/// `ShapeMismatch` if the grid has a single row or column (there is nothing
/// to extrapolate from) or `source` is shorter than the grid;
/// `CellOutOfGrid` if the cell itself is outside the grid.
pub fn gather_stencil(
    source: &[f64],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
) -> Result<Stencil> {
    if width < 2 || height < 2 {
        return Err(KernelError::ShapeMismatch {
            expected: vec![2, 2],
            got: vec![height, width],
        });
    }
    check_len(source.len(), width * height)?;
    if row >= height || col >= width {
        return Err(KernelError::CellOutOfGrid {
            row,
            col,
            height,
            width,
        });
    }

    let row_present = [row > 0, true, row + 1 < height, row + 2 < height];
    let col_present = [col > 0, true, col + 1 < width, col + 2 < width];
    let mut g = [[0.0; 4]; 4];

    for c in (0..4).filter(|&c| col_present[c]) {
        let j = col + c - 1;
        for r in (0..4).filter(|&r| row_present[r]) {
            g[r][c] = source[(row + r - 1) * width + j];
        }
        // Row `+1` can only be missing when row `-1` is present (height >= 2).
        if !row_present[2] {
            g[2][c] = 2.0 * g[1][c] - g[0][c];
        }
        if !row_present[3] {
            g[3][c] = 2.0 * g[2][c] - g[1][c];
        }
        if !row_present[0] {
            g[0][c] = 2.0 * g[1][c] - g[2][c];
        }
    }

    for line in g.iter_mut() {
        if !col_present[2] {
            line[2] = 2.0 * line[1] - line[0];
        }
        if !col_present[3] {
            line[3] = 2.0 * line[2] - line[1];
        }
        if !col_present[0] {
            line[0] = 2.0 * line[1] - line[2];
        }
    }

    Ok(g)
}

/// Function values and derivative estimates at the four cell corners, in
/// the order expected by [`BASIS`].
pub fn corner_samples(g: &Stencil) -> [f64; 16] {
    // Offsets (r, c) of the corners 00, 01, 10, 11 inside the stencil.
    const CORNERS: [(usize, usize); 4] = [(1, 1), (1, 2), (2, 1), (2, 2)];

    let fx = |r: usize, c: usize| 0.5 * (g[r][c + 1] - g[r][c - 1]);
    let fy = |r: usize, c: usize| 0.5 * (g[r + 1][c] - g[r - 1][c]);
    let fxy = |r: usize, c: usize| 0.5 * (fx(r + 1, c) - fx(r - 1, c));

    let mut samples = [0.0; 16];
    for (k, &(r, c)) in CORNERS.iter().enumerate() {
        samples[k] = g[r][c];
        samples[4 + k] = fx(r, c);
        samples[8 + k] = fy(r, c);
        samples[12 + k] = fxy(r, c);
    }
    samples
}

/// Polynomial coefficients of one cell: `a[p][q]` multiplies `y^p * x^q`.
///
/// `a[0][0]` is the cell value itself, bit for bit, even when it or a
/// neighbour is `-0.0` or non-finite.
pub fn cell_coefficients(samples: &[f64; 16]) -> [[f64; 4]; 4] {
    let mut a = [[0.0; 4]; 4];
    for (k, basis_row) in BASIS.iter().enumerate().skip(1) {
        a[k / 4][k % 4] = basis_row
            .iter()
            .zip(samples.iter())
            .map(|(m, s)| m * s)
            .sum();
    }
    // Row 0 of BASIS selects F00.
    a[0][0] = samples[0];
    a
}

/// Evaluates the cell polynomial on an `ny x nx` subgrid, writing sample
/// `(i, j)` to `out[i * stride + j]`.
pub fn evaluate_block(
    a: &[[f64; 4]; 4],
    ny: usize,
    nx: usize,
    out: &mut [f64],
    stride: usize,
) -> Result<()> {
    if ny == 0 || nx == 0 {
        return Ok(());
    }
    if stride < nx {
        return Err(KernelError::ShapeMismatch {
            expected: vec![nx],
            got: vec![stride],
        });
    }
    check_len(out.len(), (ny - 1) * stride + nx)?;

    for i in 0..ny {
        let y = i as f64 / ny as f64;
        let yp = [1.0, y, y * y, y * y * y];
        for j in 0..nx {
            if i == 0 && j == 0 {
                out[0] = a[0][0];
                continue;
            }
            let x = j as f64 / nx as f64;
            let xp = [1.0, x, x * x, x * x * x];
            let mut value = a[0][0];
            for (p, coeffs) in a.iter().enumerate() {
                for (q, coeff) in coeffs.iter().enumerate() {
                    if p + q > 0 {
                        value += coeff * yp[p] * xp[q];
                    }
                }
            }
            out[i * stride + j] = value;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(width: usize, height: usize, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        (0..height)
            .flat_map(|i| (0..width).map(move |j| (i, j)))
            .map(|(i, j)| f(i as f64, j as f64))
            .collect()
    }

    #[test]
    fn test_stencil_interior_copies_neighbours() {
        let source = grid(5, 5, |i, j| 10.0 * i + j);
        let g = gather_stencil(&source, 5, 5, 2, 2).unwrap();
        assert_eq!(g[0], [11.0, 12.0, 13.0, 14.0]);
        assert_eq!(g[3], [41.0, 42.0, 43.0, 44.0]);
    }

    #[test]
    fn test_stencil_extrapolates_linear_field_exactly() {
        // A linear field is reproduced by linear extrapolation everywhere,
        // including the corners missing on both axes.
        let f = |i: f64, j: f64| 3.0 * i - 2.0 * j + 1.0;
        let source = grid(3, 2, f);
        for (row, col) in [(0, 0), (0, 2), (1, 0), (1, 2)] {
            let g = gather_stencil(&source, 3, 2, row, col).unwrap();
            for r in 0..4 {
                for c in 0..4 {
                    let expected = f(row as f64 + r as f64 - 1.0, col as f64 + c as f64 - 1.0);
                    assert!((g[r][c] - expected).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_stencil_rejects_degenerate_grid() {
        let source = vec![1.0, 2.0, 3.0];
        let err = gather_stencil(&source, 3, 1, 0, 0);
        assert!(matches!(err, Err(KernelError::ShapeMismatch { .. })));
        let err = gather_stencil(&source, 1, 3, 0, 0);
        assert!(matches!(err, Err(KernelError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_stencil_rejects_cell_outside_grid() {
        let source = vec![0.0; 4];
        let err = gather_stencil(&source, 2, 2, 2, 0);
        assert!(matches!(err, Err(KernelError::CellOutOfGrid { .. })));
    }

    #[test]
    fn test_cubic_in_x_is_reproduced_on_interior_cell() {
        // Central differences are exact for quadratics, so a quadratic in x
        // is reproduced exactly at every subgrid point.
        let f = |_i: f64, j: f64| j * j;
        let source = grid(6, 4, f);
        let g = gather_stencil(&source, 6, 4, 1, 2).unwrap();
        let a = cell_coefficients(&corner_samples(&g));
        let mut out = vec![0.0; 16];
        evaluate_block(&a, 4, 4, &mut out, 4).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                let x = 2.0 + j as f64 / 4.0;
                assert!((out[i * 4 + j] - x * x).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_block_origin_is_the_sample() {
        let source = grid(4, 4, |i, j| (i * 0.37 + j * 1.91).sin() + 2.0);
        let g = gather_stencil(&source, 4, 4, 3, 1).unwrap();
        let a = cell_coefficients(&corner_samples(&g));
        let mut out = [0.0; 1];
        evaluate_block(&a, 1, 1, &mut out, 1).unwrap();
        assert_eq!(out[0].to_bits(), source[3 * 4 + 1].to_bits());
    }

    #[test]
    fn test_block_origin_keeps_signed_zero_and_infinity() {
        let mut source = grid(3, 3, |i, j| i + j);
        source[4] = -0.0;
        let g = gather_stencil(&source, 3, 3, 1, 1).unwrap();
        let a = cell_coefficients(&corner_samples(&g));
        let mut out = [1.0; 4];
        evaluate_block(&a, 2, 2, &mut out, 2).unwrap();
        assert_eq!(out[0].to_bits(), (-0.0f64).to_bits());

        source[4] = f64::INFINITY;
        for (row, col) in [(0, 0), (1, 1), (2, 1)] {
            let g = gather_stencil(&source, 3, 3, row, col).unwrap();
            let a = cell_coefficients(&corner_samples(&g));
            let mut out = [0.0; 1];
            evaluate_block(&a, 1, 1, &mut out, 1).unwrap();
            assert_eq!(out[0].to_bits(), source[row * 3 + col].to_bits());
        }
    }

    #[test]
    fn test_evaluate_block_checks_output_length() {
        let a = [[0.0; 4]; 4];
        let mut out = vec![0.0; 5];
        let err = evaluate_block(&a, 2, 3, &mut out, 3);
        assert!(matches!(err, Err(KernelError::ShapeMismatch { .. })));
        let err = evaluate_block(&a, 2, 3, &mut out, 2);
        assert!(matches!(err, Err(KernelError::ShapeMismatch { .. })));
    }
}
