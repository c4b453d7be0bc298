//! Sparse matrix utilities.
//!
//! Helper functions for working with nalgebra-sparse matrices. Everything
//! goes through triplets and `CooMatrix`, which sums duplicate entries on
//! conversion to CSC.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from (row, col, value) triplets.
///
/// Duplicates are summed together; out-of-range entries are dropped.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: impl IntoIterator<Item = (usize, usize, f64)>,
) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(nrows, ncols);
    for (row, col, val) in triplets {
        if row < nrows && col < ncols && val != 0.0 {
            coo.push(row, col, val);
        }
    }
    CscMatrix::from(&coo)
}

/// Add two CSC matrices of the same shape.
pub fn csc_add(a: &CscMatrix<f64>, b: &CscMatrix<f64>) -> CscMatrix<f64> {
    csc_from_triplets(
        a.nrows(),
        a.ncols(),
        a.triplet_iter()
            .chain(b.triplet_iter())
            .map(|(r, c, v)| (r, c, *v)),
    )
}

/// Scale a CSC matrix.
pub fn csc_scale(a: &CscMatrix<f64>, scalar: f64) -> CscMatrix<f64> {
    let values: Vec<f64> = a.values().iter().map(|v| v * scalar).collect();
    CscMatrix::try_from_csc_data(
        a.nrows(),
        a.ncols(),
        a.col_offsets().to_vec(),
        a.row_indices().to_vec(),
        values,
    )
    .unwrap_or_else(|_| CscMatrix::zeros(a.nrows(), a.ncols()))
}

/// Scale row `i` of a CSC matrix by `factors[i]`.
pub fn csc_scale_rows(a: &CscMatrix<f64>, factors: &[f64]) -> CscMatrix<f64> {
    csc_from_triplets(
        a.nrows(),
        a.ncols(),
        a.triplet_iter()
            .map(|(r, c, v)| (r, c, v * factors.get(r).copied().unwrap_or(0.0))),
    )
}

/// Dense-times-sparse product `m * a`, returned sparse.
pub fn dense_mul_csc(m: &DMatrix<f64>, a: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut triplets = Vec::new();
    for (k, c, v) in a.triplet_iter() {
        for i in 0..m.nrows() {
            triplets.push((i, c, m[(i, k)] * v));
        }
    }
    csc_from_triplets(m.nrows(), a.ncols(), triplets)
}

/// Sum all rows into a single row.
pub fn csc_sum_rows(a: &CscMatrix<f64>) -> CscMatrix<f64> {
    csc_from_triplets(1, a.ncols(), a.triplet_iter().map(|(_, c, v)| (0, c, *v)))
}

/// Extract a single row as a 1 x ncols matrix.
pub fn csc_row(a: &CscMatrix<f64>, row: usize) -> CscMatrix<f64> {
    csc_from_triplets(
        1,
        a.ncols(),
        a.triplet_iter()
            .filter(|(r, _, _)| *r == row)
            .map(|(_, c, v)| (0, c, *v)),
    )
}

/// Repeat a single-row matrix `times` times.
pub fn csc_repeat_rows(m: &CscMatrix<f64>, times: usize) -> CscMatrix<f64> {
    let mut triplets = Vec::new();
    for (r, c, v) in m.triplet_iter() {
        for t in 0..times {
            triplets.push((t * m.nrows() + r, c, *v));
        }
    }
    csc_from_triplets(m.nrows() * times, m.ncols(), triplets)
}

/// Place `a` at row offset `offset` inside a matrix with `nrows` rows.
pub fn csc_shift_rows(a: &CscMatrix<f64>, offset: usize, nrows: usize) -> CscMatrix<f64> {
    csc_from_triplets(
        nrows,
        a.ncols(),
        a.triplet_iter().map(|(r, c, v)| (r + offset, c, *v)),
    )
}

/// Convert CSC to a dense matrix.
pub fn csc_to_dense(sparse: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(sparse.nrows(), sparse.ncols());
    for (row, col, val) in sparse.triplet_iter() {
        dense[(row, col)] += *val;
    }
    dense
}
