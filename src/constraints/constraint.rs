//! Constraint types for optimization problems.
//!
//! Constraints map to cone constraints in the solver:
//! - Zero: expr = 0 (zero cone / equality)
//! - NonNeg: expr >= 0 (nonnegative orthant)
//!
//! Second-order and power cones never appear here directly; they come out
//! of canonicalizing the nonlinear atoms inside a constraint.

use std::sync::Arc;

use crate::expr::{Expr, ExprId};

/// Cone a constraint expression must lie in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// expr == 0.
    Zero,
    /// expr >= 0.
    NonNeg,
}

/// A constraint in an optimization problem.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Which cone the expression is constrained to.
    pub kind: ConstraintKind,
    /// The constrained expression.
    pub expr: Arc<Expr>,
    /// Optional label used in diagnostics.
    pub label: Option<String>,
}

impl Constraint {
    fn new(kind: ConstraintKind, expr: Expr) -> Self {
        Constraint {
            kind,
            expr: Arc::new(expr),
            label: None,
        }
    }

    /// Create an equality constraint: lhs == rhs.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::Zero, lhs - rhs)
    }

    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(lhs: Expr, rhs: Expr) -> Self {
        // lhs <= rhs  <=>  rhs - lhs >= 0
        Self::new(ConstraintKind::NonNeg, rhs - lhs)
    }

    /// Create an inequality constraint: lhs >= rhs.
    pub fn geq(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::NonNeg, lhs - rhs)
    }

    /// Attach a label shown in DCP diagnostics.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check if this constraint is DCP-compliant.
    ///
    /// - Zero: expression must be affine
    /// - NonNeg: expression must be concave (concave >= 0)
    pub fn is_dcp(&self) -> bool {
        match self.kind {
            ConstraintKind::Zero => self.expr.is_affine(),
            ConstraintKind::NonNeg => self.expr.is_concave(),
        }
    }

    /// Get all variables in this constraint.
    pub fn variables(&self) -> Vec<ExprId> {
        self.expr.variables().into_iter().map(|(id, _)| id).collect()
    }
}

/// Extension trait for creating constraints from expressions.
pub trait ConstraintExt {
    /// Create equality constraint: self == rhs.
    fn equals(&self, rhs: impl Into<Expr>) -> Constraint;

    /// Create inequality constraint: self <= rhs.
    fn leq(&self, rhs: impl Into<Expr>) -> Constraint;

    /// Create inequality constraint: self >= rhs.
    fn geq(&self, rhs: impl Into<Expr>) -> Constraint;
}

impl ConstraintExt for Expr {
    fn equals(&self, rhs: impl Into<Expr>) -> Constraint {
        Constraint::eq(self.clone(), rhs.into())
    }

    fn leq(&self, rhs: impl Into<Expr>) -> Constraint {
        Constraint::leq(self.clone(), rhs.into())
    }

    fn geq(&self, rhs: impl Into<Expr>) -> Constraint {
        Constraint::geq(self.clone(), rhs.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{norm1, norm2};
    use crate::expr::variable;

    #[test]
    fn test_equality_constraint() {
        let x = variable(5);
        let constr = x.equals(1.0);
        assert!(constr.is_dcp());
        assert_eq!(constr.kind, ConstraintKind::Zero);
    }

    #[test]
    fn test_convex_upper_bound_is_dcp() {
        let x = variable(5);
        let constr = norm1(&x).leq(2.0).labeled("leverage");
        assert!(constr.is_dcp());
        assert_eq!(constr.kind, ConstraintKind::NonNeg);
        assert_eq!(constr.label.as_deref(), Some("leverage"));
    }

    #[test]
    fn test_convex_lower_bound_is_not_dcp() {
        let x = variable(5);
        assert!(!norm2(&x).geq(1.0).is_dcp());
    }

    #[test]
    fn test_nonaffine_equality_is_not_dcp() {
        let x = variable(5);
        assert!(!norm2(&x).equals(1.0).is_dcp());
    }
}
