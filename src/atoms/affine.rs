//! Affine atoms and operator overloading.
//!
//! Affine atoms are both convex and concave. They include addition,
//! negation, products with constants, summation and stacking.

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::expr::{constant, Expr};

// ============================================================================
// Operator overloading for Expr
// ============================================================================

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Arc::new(self))
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Arc::new(self.clone()))
    }
}

/// Implements a binary operator for every owned/borrowed pairing of `Expr`.
macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                let ($a, $b) = (Arc::new(self), Arc::new(rhs));
                $body
            }
        }

        impl $trait<&Expr> for Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                let ($a, $b) = (Arc::new(self), Arc::new(rhs.clone()));
                $body
            }
        }

        impl $trait<Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                let ($a, $b) = (Arc::new(self.clone()), Arc::new(rhs));
                $body
            }
        }

        impl $trait<&Expr> for &Expr {
            type Output = Expr;

            fn $method(self, rhs: &Expr) -> Expr {
                let ($a, $b) = (Arc::new(self.clone()), Arc::new(rhs.clone()));
                $body
            }
        }
    };
}

impl_binary_op!(Add, add, |a, b| Expr::Add(a, b));
impl_binary_op!(Sub, sub, |a, b| Expr::Add(a, Arc::new(Expr::Neg(b))));
impl_binary_op!(Mul, mul, |a, b| Expr::Mul(a, b));

// Scalar multiplication
impl Mul<f64> for Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        Expr::Mul(Arc::new(constant(rhs)), Arc::new(self))
    }
}

impl Mul<f64> for &Expr {
    type Output = Expr;

    fn mul(self, rhs: f64) -> Expr {
        Expr::Mul(Arc::new(constant(rhs)), Arc::new(self.clone()))
    }
}

impl Mul<Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Arc::new(constant(self)), Arc::new(rhs))
    }
}

impl Mul<&Expr> for f64 {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        Expr::Mul(Arc::new(constant(self)), Arc::new(rhs.clone()))
    }
}

impl Div<f64> for Expr {
    type Output = Expr;

    fn div(self, rhs: f64) -> Expr {
        Expr::Mul(Arc::new(constant(1.0 / rhs)), Arc::new(self))
    }
}

impl Div<f64> for &Expr {
    type Output = Expr;

    fn div(self, rhs: f64) -> Expr {
        Expr::Mul(Arc::new(constant(1.0 / rhs)), Arc::new(self.clone()))
    }
}

// ============================================================================
// Affine atom functions
// ============================================================================

/// Sum of all elements.
pub fn sum(expr: &Expr) -> Expr {
    Expr::Sum(Arc::new(expr.clone()))
}

/// Stack scalars and vectors into one column vector.
pub fn vstack(exprs: Vec<Expr>) -> Expr {
    Expr::VStack(exprs.into_iter().map(Arc::new).collect())
}

/// Product of a constant matrix (or row vector) with an expression.
pub fn matmul(a: &Expr, b: &Expr) -> Expr {
    Expr::MatMul(Arc::new(a.clone()), Arc::new(b.clone()))
}

/// Inner product of a constant vector with an expression.
pub fn dot(a: &Expr, b: &Expr) -> Expr {
    matmul(a, b)
}

/// Elementwise product; one side must be constant.
pub fn multiply(a: &Expr, b: &Expr) -> Expr {
    Expr::Mul(Arc::new(a.clone()), Arc::new(b.clone()))
}
