//! Linear expression representation for canonicalization.
//!
//! After canonicalization, every expression is affine in the decision and
//! auxiliary variables: sum_i(A_i * x_i) + b.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CscMatrix;

use crate::error::{CvxError, Result};
use crate::expr::ExprId;
use crate::sparse::{
    csc_add, csc_repeat_rows, csc_row, csc_scale, csc_scale_rows, csc_shift_rows, csc_sum_rows,
    dense_mul_csc,
};

/// A linear expression in standard form: sum_i(A_i * x_i) + b
///
/// Each term is a sparse coefficient matrix multiplied by a variable.
/// The output is always a flat column vector of length `size`.
#[derive(Debug, Clone)]
pub struct LinExpr {
    /// Coefficient matrices for each variable: var_id -> (size x var_size).
    pub coeffs: HashMap<ExprId, CscMatrix<f64>>,
    /// Constant term (offset).
    pub constant: DVector<f64>,
}

impl LinExpr {
    /// Create a zero linear expression of the given length.
    pub fn zeros(size: usize) -> Self {
        LinExpr {
            coeffs: HashMap::new(),
            constant: DVector::zeros(size),
        }
    }

    /// Create a linear expression for a single variable (identity coefficient).
    pub fn variable(var_id: ExprId, size: usize) -> Self {
        let mut coeffs = HashMap::new();
        coeffs.insert(var_id, CscMatrix::identity(size));
        LinExpr {
            coeffs,
            constant: DVector::zeros(size),
        }
    }

    /// Create a constant linear expression.
    pub fn constant(value: DVector<f64>) -> Self {
        LinExpr {
            coeffs: HashMap::new(),
            constant: value,
        }
    }

    /// Create a scalar constant.
    pub fn scalar(value: f64) -> Self {
        Self::constant(DVector::from_element(1, value))
    }

    /// Check if this is a constant (no variables).
    pub fn is_constant(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Output length.
    pub fn size(&self) -> usize {
        self.constant.len()
    }

    /// Broadcast a length-1 expression to length `n`.
    pub fn broadcast_to(&self, n: usize) -> Result<LinExpr> {
        if self.size() == n {
            return Ok(self.clone());
        }
        if self.size() != 1 {
            return Err(CvxError::ShapeMismatch {
                expected: format!("({},)", n),
                got: format!("({},)", self.size()),
            });
        }
        Ok(LinExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(k, v)| (*k, csc_repeat_rows(v, n)))
                .collect(),
            constant: DVector::from_element(n, self.constant[0]),
        })
    }

    /// Add two linear expressions, broadcasting length-1 operands.
    pub fn add(&self, other: &LinExpr) -> Result<LinExpr> {
        let n = self.size().max(other.size());
        let lhs = self.broadcast_to(n)?;
        let rhs = other.broadcast_to(n)?;

        let mut coeffs = lhs.coeffs;
        for (var_id, coeff) in rhs.coeffs {
            match coeffs.get_mut(&var_id) {
                Some(c) => *c = csc_add(c, &coeff),
                None => {
                    coeffs.insert(var_id, coeff);
                }
            }
        }

        Ok(LinExpr {
            coeffs,
            constant: lhs.constant + rhs.constant,
        })
    }

    /// Negate a linear expression.
    pub fn neg(&self) -> LinExpr {
        self.scale(-1.0)
    }

    /// Scale by a scalar.
    pub fn scale(&self, scalar: f64) -> LinExpr {
        LinExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(k, v)| (*k, csc_scale(v, scalar)))
                .collect(),
            constant: &self.constant * scalar,
        }
    }

    /// Elementwise product with a constant vector of the same length.
    pub fn scale_rows(&self, factors: &DVector<f64>) -> Result<LinExpr> {
        let n = self.size().max(factors.len());
        let base = self.broadcast_to(n)?;
        if factors.len() != n {
            return Err(CvxError::ShapeMismatch {
                expected: format!("({},)", n),
                got: format!("({},)", factors.len()),
            });
        }
        Ok(LinExpr {
            coeffs: base
                .coeffs
                .iter()
                .map(|(k, v)| (*k, csc_scale_rows(v, factors.as_slice())))
                .collect(),
            constant: base.constant.component_mul(factors),
        })
    }

    /// Left-multiply by a constant matrix: M * self.
    pub fn left_mul(&self, m: &DMatrix<f64>) -> Result<LinExpr> {
        if m.ncols() != self.size() {
            return Err(CvxError::ShapeMismatch {
                expected: format!("({},)", m.ncols()),
                got: format!("({},)", self.size()),
            });
        }
        Ok(LinExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(k, v)| (*k, dense_mul_csc(m, v)))
                .collect(),
            constant: m * &self.constant,
        })
    }

    /// Sum of all elements as a scalar expression.
    pub fn sum(&self) -> LinExpr {
        LinExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(k, v)| (*k, csc_sum_rows(v)))
                .collect(),
            constant: DVector::from_element(1, self.constant.sum()),
        }
    }

    /// Element `i` as a scalar expression.
    pub fn element(&self, i: usize) -> LinExpr {
        LinExpr {
            coeffs: self
                .coeffs
                .iter()
                .map(|(k, v)| (*k, csc_row(v, i)))
                .collect(),
            constant: DVector::from_element(1, self.constant.get(i).copied().unwrap_or(0.0)),
        }
    }

    /// Concatenate expressions into one vector.
    pub fn vstack(parts: &[LinExpr]) -> LinExpr {
        let total: usize = parts.iter().map(|p| p.size()).sum();
        let mut out = LinExpr::zeros(total);
        let mut offset = 0;
        for part in parts {
            for (var_id, coeff) in &part.coeffs {
                let shifted = csc_shift_rows(coeff, offset, total);
                match out.coeffs.get_mut(var_id) {
                    Some(c) => *c = csc_add(c, &shifted),
                    None => {
                        out.coeffs.insert(*var_id, shifted);
                    }
                }
            }
            out.constant
                .rows_mut(offset, part.size())
                .copy_from(&part.constant);
            offset += part.size();
        }
        out
    }

    /// Get all variable IDs in this expression.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<_> = self.coeffs.keys().copied().collect();
        vars.sort();
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::csc_to_dense;

    #[test]
    fn test_lin_expr_zeros() {
        let e = LinExpr::zeros(5);
        assert!(e.is_constant());
        assert_eq!(e.size(), 5);
    }

    #[test]
    fn test_add_merges_and_broadcasts() {
        let x = ExprId::new();
        let e = LinExpr::variable(x, 3)
            .add(&LinExpr::scalar(2.0))
            .unwrap()
            .add(&LinExpr::variable(x, 3))
            .unwrap();
        assert_eq!(e.variables(), vec![x]);
        assert_eq!(e.constant, DVector::from_element(3, 2.0));
        assert_eq!(csc_to_dense(&e.coeffs[&x])[(1, 1)], 2.0);
    }

    #[test]
    fn test_add_size_mismatch() {
        let e = LinExpr::zeros(3).add(&LinExpr::zeros(2));
        assert!(e.is_err());
    }

    #[test]
    fn test_sum_and_element() {
        let x = ExprId::new();
        let e = LinExpr::variable(x, 3)
            .scale_rows(&DVector::from_vec(vec![1.0, 2.0, 3.0]))
            .unwrap();
        let s = e.sum();
        assert_eq!(s.size(), 1);
        assert_eq!(csc_to_dense(&s.coeffs[&x])[(0, 2)], 3.0);

        let second = e.element(1);
        assert_eq!(csc_to_dense(&second.coeffs[&x])[(0, 1)], 2.0);
    }

    #[test]
    fn test_vstack() {
        let x = ExprId::new();
        let y = ExprId::new();
        let stacked = LinExpr::vstack(&[
            LinExpr::variable(x, 2),
            LinExpr::scalar(4.0),
            LinExpr::variable(y, 1),
        ]);
        assert_eq!(stacked.size(), 4);
        assert_eq!(stacked.constant[2], 4.0);
        assert_eq!(csc_to_dense(&stacked.coeffs[&y])[(3, 0)], 1.0);
        assert_eq!(csc_to_dense(&stacked.coeffs[&x]).nrows(), 4);
    }

    #[test]
    fn test_left_mul() {
        let x = ExprId::new();
        let m = DMatrix::from_row_slice(1, 2, &[3.0, 4.0]);
        let e = LinExpr::variable(x, 2).left_mul(&m).unwrap();
        assert_eq!(e.size(), 1);
        assert_eq!(csc_to_dense(&e.coeffs[&x])[(0, 1)], 4.0);
    }
}
