//! Numeric evaluation of expressions at a point.
//!
//! Every value is returned as a column vector; scalars are vectors of
//! length 1. Constant matrices can only be evaluated as the left operand of
//! a product.

use std::collections::HashMap;

use nalgebra::DVector;

use super::expression::{Array, Expr, ExprId};
use crate::error::{CvxError, Result};

impl Expr {
    /// Evaluate the expression with the given variable values.
    pub fn evaluate(&self, values: &HashMap<ExprId, DVector<f64>>) -> Result<DVector<f64>> {
        match self {
            Expr::Variable(v) => {
                let value = values.get(&v.id).ok_or_else(|| {
                    CvxError::InvalidProblem(format!(
                        "no value for variable {}",
                        v.name.as_deref().unwrap_or("<unnamed>")
                    ))
                })?;
                if value.len() != v.shape.size() {
                    return Err(CvxError::ShapeMismatch {
                        expected: v.shape.to_string(),
                        got: format!("({},)", value.len()),
                    });
                }
                Ok(value.clone())
            }
            Expr::Constant(c) => c.as_vector().ok_or_else(|| {
                CvxError::InvalidProblem("matrix constant outside of a product".into())
            }),
            Expr::Add(a, b) => {
                let (va, vb) = (a.evaluate(values)?, b.evaluate(values)?);
                zip_broadcast(&va, &vb, |x, y| x + y)
            }
            Expr::Neg(a) => Ok(-a.evaluate(values)?),
            Expr::Mul(a, b) => {
                let (va, vb) = (a.evaluate(values)?, b.evaluate(values)?);
                zip_broadcast(&va, &vb, |x, y| x * y)
            }
            Expr::MatMul(a, b) => {
                let vb = b.evaluate(values)?;
                match a.constant_value() {
                    Some(Array::Matrix(m)) if m.ncols() == vb.len() => Ok(m * vb),
                    Some(Array::Vector(v)) if v.len() == vb.len() => {
                        Ok(DVector::from_element(1, v.dot(&vb)))
                    }
                    Some(Array::Scalar(s)) => Ok(vb * *s),
                    _ => Err(CvxError::InvalidProblem(
                        "matmul requires a constant left operand of matching size".into(),
                    )),
                }
            }
            Expr::Sum(a) => Ok(DVector::from_element(1, a.evaluate(values)?.sum())),
            Expr::VStack(exprs) => {
                let mut out = Vec::new();
                for e in exprs {
                    out.extend(e.evaluate(values)?.iter().copied());
                }
                Ok(DVector::from_vec(out))
            }
            Expr::Norm1(a) => Ok(DVector::from_element(1, a.evaluate(values)?.lp_norm(1))),
            Expr::Norm2(a) => Ok(DVector::from_element(1, a.evaluate(values)?.norm())),
            Expr::Abs(a) => Ok(a.evaluate(values)?.abs()),
            Expr::Pos(a) => Ok(a.evaluate(values)?.map(|v| v.max(0.0))),
            Expr::Power(a, p) => Ok(a.evaluate(values)?.map(|v| v.abs().powf(*p))),
        }
    }

    /// Evaluate a scalar expression.
    pub fn evaluate_scalar(&self, values: &HashMap<ExprId, DVector<f64>>) -> Result<f64> {
        let v = self.evaluate(values)?;
        if v.len() != 1 {
            return Err(CvxError::ShapeMismatch {
                expected: "()".into(),
                got: format!("({},)", v.len()),
            });
        }
        Ok(v[0])
    }
}

fn zip_broadcast(
    a: &DVector<f64>,
    b: &DVector<f64>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<DVector<f64>> {
    match (a.len(), b.len()) {
        (m, n) if m == n => Ok(a.zip_map(b, f)),
        (1, _) => Ok(b.map(|y| f(a[0], y))),
        (_, 1) => Ok(a.map(|x| f(x, b[0]))),
        (m, n) => Err(CvxError::ShapeMismatch {
            expected: format!("({},)", m),
            got: format!("({},)", n),
        }),
    }
}
