//! Constant expression creation.

use nalgebra::{DMatrix, DVector};

use super::expression::{Array, Expr};

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expr {
    Expr::Constant(Array::Scalar(value))
}

/// Create a constant column vector.
pub fn constant_vec(values: impl Into<DVector<f64>>) -> Expr {
    Expr::Constant(Array::Vector(values.into()))
}

/// Create a constant matrix.
pub fn constant_matrix(matrix: DMatrix<f64>) -> Expr {
    Expr::Constant(Array::Matrix(matrix))
}

/// A vector of ones, mostly useful as a summation row.
pub fn ones(n: usize) -> Expr {
    Expr::Constant(Array::Vector(DVector::from_element(n, 1.0)))
}
