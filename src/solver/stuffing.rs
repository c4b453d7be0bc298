//! Matrix stuffing: converts canonicalized expressions to solver format.
//!
//! The conic form is
//!
//! ```text
//! minimize    q'x + offset
//! subject to  A x + s = b,  s in K
//! ```
//!
//! with K a product of zero, nonnegative, second-order and power cones, in
//! that order. A cone constraint `C x + d in K` is stuffed as `A = -C`,
//! `b = d`, so that `s = C x + d`.

use std::collections::HashMap;

use nalgebra_sparse::CscMatrix;

use crate::canon::{ConeConstraint, LinExpr};
use crate::error::{CvxError, Result};
use crate::expr::ExprId;
use crate::sparse::csc_from_triplets;

/// Cone dimensions of a stuffed problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConeDims {
    /// Number of zero cone (equality) rows.
    pub zero: usize,
    /// Number of nonnegative cone rows.
    pub nonneg: usize,
    /// Second-order cone dimensions (each entry is the cone dimension).
    pub soc: Vec<usize>,
    /// Power cone alpha values (each cone is 3D with its own alpha).
    pub power: Vec<f64>,
}

impl ConeDims {
    /// Total number of constraint rows.
    pub fn total(&self) -> usize {
        self.zero + self.nonneg + self.soc.iter().sum::<usize>() + self.power.len() * 3
    }
}

/// Mapping from variable IDs to column ranges in the stacked variable.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    /// Map from variable ID to (start_col, size).
    pub id_to_col: HashMap<ExprId, (usize, usize)>,
    /// Total number of optimization variables.
    pub total_vars: usize,
}

impl VariableMap {
    /// Create from a list of (variable_id, size) pairs, in column order.
    pub fn from_vars(vars: &[(ExprId, usize)]) -> Self {
        let mut id_to_col = HashMap::new();
        let mut offset = 0;
        for &(var_id, size) in vars {
            if id_to_col.contains_key(&var_id) {
                continue;
            }
            id_to_col.insert(var_id, (offset, size));
            offset += size;
        }
        VariableMap {
            id_to_col,
            total_vars: offset,
        }
    }

    /// Get the column range for a variable.
    pub fn get(&self, var_id: ExprId) -> Option<(usize, usize)> {
        self.id_to_col.get(&var_id).copied()
    }
}

/// A conic program ready to hand to a solver.
#[derive(Debug, Clone)]
pub struct StuffedProblem {
    /// Linear cost vector q (n).
    pub q: Vec<f64>,
    /// Constraint matrix A (m x n).
    pub a: CscMatrix<f64>,
    /// Constraint vector b (m).
    pub b: Vec<f64>,
    /// Cone dimensions, in row order.
    pub cone_dims: ConeDims,
    /// Variable mapping for solution recovery.
    pub var_map: VariableMap,
    /// Constant offset in the objective.
    pub objective_offset: f64,
}

impl StuffedProblem {
    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.var_map.total_vars
    }

    /// Number of constraint rows.
    pub fn num_rows(&self) -> usize {
        self.b.len()
    }

    /// Objective value q'x + offset at a stacked point.
    pub fn objective_at(&self, x: &[f64]) -> f64 {
        self.q.iter().zip(x).map(|(qi, xi)| qi * xi).sum::<f64>() + self.objective_offset
    }
}

/// Build the stuffed problem from a scalar linear objective and cone constraints.
pub fn stuff_problem(
    objective: &LinExpr,
    constraints: &[ConeConstraint],
    variables: &[(ExprId, usize)],
) -> Result<StuffedProblem> {
    if objective.size() != 1 {
        return Err(CvxError::ShapeMismatch {
            expected: "()".into(),
            got: format!("({},)", objective.size()),
        });
    }
    let var_map = VariableMap::from_vars(variables);

    let mut q = vec![0.0; var_map.total_vars];
    for (var_id, coeff) in &objective.coeffs {
        let (start, _) = column_range(&var_map, *var_id)?;
        for (_, col, val) in coeff.triplet_iter() {
            q[start + col] += *val;
        }
    }

    let (a, b, cone_dims) = stuff_constraints(constraints, &var_map)?;

    Ok(StuffedProblem {
        q,
        a,
        b,
        cone_dims,
        var_map,
        objective_offset: objective.constant[0],
    })
}

fn column_range(var_map: &VariableMap, var_id: ExprId) -> Result<(usize, usize)> {
    var_map.get(var_id).ok_or_else(|| {
        CvxError::InvalidProblem(format!("variable {} missing from the variable map", var_id.raw()))
    })
}

/// Accumulates rows of A and b.
struct RowWriter<'a> {
    var_map: &'a VariableMap,
    triplets: Vec<(usize, usize, f64)>,
    b: Vec<f64>,
}

impl RowWriter<'_> {
    /// Append `expr` as rows `s = expr`.
    fn push(&mut self, expr: &LinExpr) -> Result<()> {
        let offset = self.b.len();
        for (var_id, coeff) in &expr.coeffs {
            let (start, _) = column_range(self.var_map, *var_id)?;
            for (row, col, val) in coeff.triplet_iter() {
                self.triplets.push((offset + row, start + col, -*val));
            }
        }
        self.b.extend(expr.constant.iter());
        Ok(())
    }
}

/// Stuff constraints into A, b, and cone dims.
fn stuff_constraints(
    constraints: &[ConeConstraint],
    var_map: &VariableMap,
) -> Result<(CscMatrix<f64>, Vec<f64>, ConeDims)> {
    let mut writer = RowWriter {
        var_map,
        triplets: Vec::new(),
        b: Vec::new(),
    };
    let mut dims = ConeDims::default();

    // Rows must be grouped by cone in the order zero, nonneg, soc, power.
    for c in constraints {
        if let ConeConstraint::Zero { a } = c {
            writer.push(a)?;
            dims.zero += a.size();
        }
    }
    for c in constraints {
        if let ConeConstraint::NonNeg { a } = c {
            writer.push(a)?;
            dims.nonneg += a.size();
        }
    }
    for c in constraints {
        if let ConeConstraint::SecondOrder { t, x } = c {
            if t.size() != 1 {
                return Err(CvxError::ShapeMismatch {
                    expected: "()".into(),
                    got: format!("({},)", t.size()),
                });
            }
            writer.push(t)?;
            writer.push(x)?;
            dims.soc.push(1 + x.size());
        }
    }
    for c in constraints {
        if let ConeConstraint::Power { x, y, z, alpha } = c {
            writer.push(x)?;
            writer.push(y)?;
            writer.push(z)?;
            dims.power.push(*alpha);
        }
    }

    let rows = writer.b.len();
    debug_assert_eq!(rows, dims.total());
    let a = csc_from_triplets(rows, var_map.total_vars, writer.triplets);
    Ok((a, writer.b, dims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::csc_to_dense;
    use nalgebra::DVector;

    #[test]
    fn test_variable_map() {
        let a = ExprId::new();
        let b = ExprId::new();
        let map = VariableMap::from_vars(&[(a, 3), (b, 2), (a, 3)]);
        assert_eq!(map.total_vars, 5);
        assert_eq!(map.get(b), Some((3, 2)));
    }

    #[test]
    fn test_cone_dims() {
        let dims = ConeDims {
            zero: 2,
            nonneg: 3,
            soc: vec![4, 5],
            power: vec![0.5, 0.7],
        };
        // 2 + 3 + 4 + 5 + 6
        assert_eq!(dims.total(), 20);
    }

    #[test]
    fn test_rows_are_grouped_by_cone() {
        let x = ExprId::new();
        let lx = LinExpr::variable(x, 2);
        let constraints = vec![
            ConeConstraint::NonNeg {
                a: lx.add(&LinExpr::scalar(-1.0)).unwrap(),
            },
            ConeConstraint::Zero { a: lx.sum() },
        ];
        let objective = lx.sum();
        let stuffed = stuff_problem(&objective, &constraints, &[(x, 2)]).unwrap();

        assert_eq!(stuffed.cone_dims.zero, 1);
        assert_eq!(stuffed.cone_dims.nonneg, 2);
        assert_eq!(stuffed.q, vec![1.0, 1.0]);
        // zero row first: s = x1 + x2
        let a = csc_to_dense(&stuffed.a);
        assert_eq!(a[(0, 0)], -1.0);
        assert_eq!(a[(1, 0)], -1.0);
        assert_eq!(a[(2, 1)], -1.0);
        assert_eq!(stuffed.b, vec![0.0, -1.0, -1.0]);
        assert!((stuffed.objective_at(&[2.0, 3.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_variable_is_an_error() {
        let x = ExprId::new();
        let objective = LinExpr::variable(x, 1);
        assert!(stuff_problem(&objective, &[], &[]).is_err());
    }

    #[test]
    fn test_objective_offset() {
        let x = ExprId::new();
        let objective = LinExpr::variable(x, 1)
            .add(&LinExpr::constant(DVector::from_element(1, 2.5)))
            .unwrap();
        let stuffed = stuff_problem(&objective, &[], &[(x, 1)]).unwrap();
        assert_eq!(stuffed.objective_offset, 2.5);
    }
}
