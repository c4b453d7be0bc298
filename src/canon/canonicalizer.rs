//! Expression canonicalization.
//!
//! Canonicalization transforms DCP expressions into standard form:
//! - Affine expressions become LinExpr
//! - Nonlinear atoms are replaced by auxiliary epigraph variables plus cone
//!   constraints on them

use nalgebra::DMatrix;

use super::lin_expr::LinExpr;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, ExprId};

/// A cone constraint in standard form: affine expression(s) in a cone K.
#[derive(Debug, Clone)]
pub enum ConeConstraint {
    /// Zero cone: a = 0 (equality).
    Zero { a: LinExpr },
    /// Nonnegative cone: a >= 0.
    NonNeg { a: LinExpr },
    /// Second-order cone: ||x||_2 <= t.
    /// Represented as [t; x] in K_soc.
    SecondOrder {
        /// The scalar t expression.
        t: LinExpr,
        /// The vector x expression.
        x: LinExpr,
    },
    /// Power cone: {(x, y, z) : x^α * y^(1-α) >= |z|, (x, y) >= 0}, α in (0, 1).
    Power {
        /// The x expression.
        x: LinExpr,
        /// The y expression.
        y: LinExpr,
        /// The z expression.
        z: LinExpr,
        /// The power α.
        alpha: f64,
    },
}

impl ConeConstraint {
    /// Number of rows this constraint occupies.
    pub fn rows(&self) -> usize {
        match self {
            ConeConstraint::Zero { a } | ConeConstraint::NonNeg { a } => a.size(),
            ConeConstraint::SecondOrder { t, x } => t.size() + x.size(),
            ConeConstraint::Power { .. } => 3,
        }
    }
}

/// Result of canonicalizing an expression.
#[derive(Debug)]
pub struct CanonResult {
    /// The canonicalized (affine) expression.
    pub expr: LinExpr,
    /// Additional cone constraints introduced during canonicalization.
    pub constraints: Vec<ConeConstraint>,
    /// Auxiliary variables introduced during canonicalization, with sizes.
    pub aux_vars: Vec<(ExprId, usize)>,
}

/// Canonicalize an expression.
///
/// The expression must already have passed the DCP check; canonicalization
/// relies on the epigraph variables being pushed against their lower bounds.
pub fn canonicalize(expr: &Expr) -> Result<CanonResult> {
    let mut ctx = CanonContext::default();
    let lin = ctx.canonicalize_expr(expr)?;
    Ok(CanonResult {
        expr: lin,
        constraints: ctx.constraints,
        aux_vars: ctx.aux_vars,
    })
}

/// Context for canonicalization, tracking auxiliary variables and constraints.
#[derive(Default)]
struct CanonContext {
    constraints: Vec<ConeConstraint>,
    aux_vars: Vec<(ExprId, usize)>,
}

impl CanonContext {
    /// Create a new non-negative auxiliary variable.
    fn new_nonneg_aux_var(&mut self, size: usize) -> LinExpr {
        let id = ExprId::new();
        self.aux_vars.push((id, size));
        let t = LinExpr::variable(id, size);
        self.constraints.push(ConeConstraint::NonNeg { a: t.clone() });
        t
    }

    fn canonicalize_expr(&mut self, expr: &Expr) -> Result<LinExpr> {
        match expr {
            Expr::Variable(v) => Ok(LinExpr::variable(v.id, v.shape.size())),
            Expr::Constant(c) => c.as_vector().map(LinExpr::constant).ok_or_else(|| {
                CvxError::InvalidProblem("matrix constant outside of a product".into())
            }),

            Expr::Add(a, b) => {
                let la = self.canonicalize_expr(a)?;
                let lb = self.canonicalize_expr(b)?;
                la.add(&lb)
            }
            Expr::Neg(a) => Ok(self.canonicalize_expr(a)?.neg()),
            Expr::Mul(a, b) => self.canonicalize_mul(a, b),
            Expr::MatMul(a, b) => self.canonicalize_matmul(a, b),
            Expr::Sum(a) => Ok(self.canonicalize_expr(a)?.sum()),
            Expr::VStack(exprs) => {
                let parts = exprs
                    .iter()
                    .map(|e| self.canonicalize_expr(e))
                    .collect::<Result<Vec<_>>>()?;
                Ok(LinExpr::vstack(&parts))
            }

            Expr::Norm1(x) => self.canonicalize_norm1(x),
            Expr::Norm2(x) => self.canonicalize_norm2(x),
            Expr::Abs(x) => self.canonicalize_abs(x),
            Expr::Pos(x) => self.canonicalize_pos(x),
            Expr::Power(x, p) => self.canonicalize_power(x, *p),
        }
    }

    fn canonicalize_mul(&mut self, a: &Expr, b: &Expr) -> Result<LinExpr> {
        let (arr, other) = match (a.constant_value(), b.constant_value()) {
            (Some(arr), _) => (arr, b),
            (None, Some(arr)) => (arr, a),
            (None, None) => {
                return Err(CvxError::NotDcp(
                    "product of two non-constant expressions".into(),
                ))
            }
        };
        let lin = self.canonicalize_expr(other)?;
        match arr {
            Array::Scalar(s) => Ok(lin.scale(*s)),
            Array::Vector(v) => lin.scale_rows(v),
            Array::Matrix(_) => Err(CvxError::InvalidProblem(
                "elementwise product with a matrix".into(),
            )),
        }
    }

    fn canonicalize_matmul(&mut self, a: &Expr, b: &Expr) -> Result<LinExpr> {
        let arr = a.constant_value().ok_or_else(|| {
            CvxError::NotDcp("matmul requires a constant left operand".into())
        })?;
        let lin = self.canonicalize_expr(b)?;
        match arr {
            Array::Matrix(m) => lin.left_mul(m),
            Array::Vector(v) => lin.left_mul(&DMatrix::from_row_slice(1, v.len(), v.as_slice())),
            Array::Scalar(s) => Ok(lin.scale(*s)),
        }
    }

    /// t >= x and t >= -x, elementwise.
    fn abs_epigraph(&mut self, cx: &LinExpr) -> Result<LinExpr> {
        let t = self.new_nonneg_aux_var(cx.size());
        self.constraints.push(ConeConstraint::NonNeg {
            a: t.add(&cx.neg())?,
        });
        self.constraints
            .push(ConeConstraint::NonNeg { a: t.add(cx)? });
        Ok(t)
    }

    fn canonicalize_norm1(&mut self, x: &Expr) -> Result<LinExpr> {
        // ||x||_1 = sum(t), |x_i| <= t_i
        let cx = self.canonicalize_expr(x)?;
        Ok(self.abs_epigraph(&cx)?.sum())
    }

    fn canonicalize_norm2(&mut self, x: &Expr) -> Result<LinExpr> {
        let cx = self.canonicalize_expr(x)?;
        let t = self.new_nonneg_aux_var(1);
        self.constraints.push(ConeConstraint::SecondOrder {
            t: t.clone(),
            x: cx,
        });
        Ok(t)
    }

    fn canonicalize_abs(&mut self, x: &Expr) -> Result<LinExpr> {
        let cx = self.canonicalize_expr(x)?;
        self.abs_epigraph(&cx)
    }

    fn canonicalize_pos(&mut self, x: &Expr) -> Result<LinExpr> {
        // pos(x) = max(x, 0): t >= 0, t >= x
        let cx = self.canonicalize_expr(x)?;
        let t = self.new_nonneg_aux_var(cx.size());
        self.constraints.push(ConeConstraint::NonNeg {
            a: t.add(&cx.neg())?,
        });
        Ok(t)
    }

    fn canonicalize_power(&mut self, x: &Expr, p: f64) -> Result<LinExpr> {
        if p < 1.0 || !p.is_finite() {
            return Err(CvxError::NotDcp(format!("power {} is not supported", p)));
        }
        // |x|^p = |x| for p = 1
        if (p - 1.0).abs() < 1e-12 {
            return self.canonicalize_abs(x);
        }

        let cx = self.canonicalize_expr(x)?;
        let t = self.new_nonneg_aux_var(cx.size());

        // t_i >= |x_i|^p  <=>  (t_i, 1, x_i) in K_pow(1/p)
        let alpha = 1.0 / p;
        for i in 0..cx.size() {
            self.constraints.push(ConeConstraint::Power {
                x: t.element(i),
                y: LinExpr::scalar(1.0),
                z: cx.element(i),
                alpha,
            });
        }
        Ok(t)
    }
}
