//! Curvature tracking for DCP (Disciplined Convex Programming).
//!
//! This module implements the curvature rules that determine whether an
//! expression is convex, concave, affine, or unknown. Composition through
//! the norm-like atoms uses their monotonicity: on a nonnegative argument
//! they are increasing, on a nonpositive one decreasing.

use std::sync::Arc;

use super::sign::Sign;
use crate::expr::{Array, Expr};

/// Curvature of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curvature {
    /// Constant value (most restrictive).
    Constant,
    /// Affine function (both convex and concave).
    Affine,
    /// Convex function.
    Convex,
    /// Concave function.
    Concave,
    /// Unknown curvature (not DCP-compliant).
    Unknown,
}

impl Curvature {
    /// Check if the curvature is convex (constant, affine, or convex).
    pub fn is_convex(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Convex)
    }

    /// Check if the curvature is concave (constant, affine, or concave).
    pub fn is_concave(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine | Curvature::Concave)
    }

    /// Check if the curvature is affine (constant or affine).
    pub fn is_affine(self) -> bool {
        matches!(self, Curvature::Constant | Curvature::Affine)
    }

    /// Check if this is a constant.
    pub fn is_constant(self) -> bool {
        matches!(self, Curvature::Constant)
    }

    /// Negate the curvature (convex <-> concave).
    pub fn negate(self) -> Self {
        match self {
            Curvature::Convex => Curvature::Concave,
            Curvature::Concave => Curvature::Convex,
            other => other,
        }
    }
}

/// Combine curvatures for addition: a + b.
pub fn add_curvature(a: Curvature, b: Curvature) -> Curvature {
    use Curvature::*;
    match (a, b) {
        (Constant, x) | (x, Constant) => x,
        (Affine, x) | (x, Affine) => x,
        (Convex, Convex) => Convex,
        (Concave, Concave) => Concave,
        _ => Unknown,
    }
}

/// Curvature of `c * expr` for a constant `c` with the given sign.
///
/// Mixed-sign constants keep affine expressions affine and make anything
/// else unknown.
pub fn const_mul_curvature(constant: &Array, expr_curv: Curvature) -> Curvature {
    if expr_curv.is_affine() {
        expr_curv
    } else if constant.is_nonneg() {
        expr_curv
    } else if constant.is_nonpos() {
        expr_curv.negate()
    } else {
        Curvature::Unknown
    }
}

impl Expr {
    /// Get the curvature of this expression.
    pub fn curvature(&self) -> Curvature {
        match self {
            Expr::Variable(_) => Curvature::Affine,
            Expr::Constant(_) => Curvature::Constant,

            Expr::Add(a, b) => add_curvature(a.curvature(), b.curvature()),
            Expr::Neg(a) => a.curvature().negate(),
            Expr::Mul(a, b) => mul_curvature(a, b),
            Expr::MatMul(a, b) => match a.constant_value() {
                Some(c) => const_mul_curvature(c, b.curvature()),
                None => Curvature::Unknown,
            },
            Expr::Sum(a) => a.curvature(),
            Expr::VStack(exprs) => combine_all_curvatures(exprs),

            Expr::Norm1(x) | Expr::Norm2(x) | Expr::Abs(x) => abs_like_curvature(x),
            Expr::Pos(x) => {
                let c = x.curvature();
                if c.is_constant() {
                    Curvature::Constant
                } else if c.is_convex() {
                    Curvature::Convex
                } else {
                    Curvature::Unknown
                }
            }
            Expr::Power(x, p) => {
                if *p >= 1.0 {
                    abs_like_curvature(x)
                } else if x.curvature().is_constant() {
                    Curvature::Constant
                } else {
                    Curvature::Unknown
                }
            }
        }
    }

    /// Check if this expression is convex.
    pub fn is_convex(&self) -> bool {
        self.curvature().is_convex()
    }

    /// Check if this expression is concave.
    pub fn is_concave(&self) -> bool {
        self.curvature().is_concave()
    }

    /// Check if this expression is affine.
    pub fn is_affine(&self) -> bool {
        self.curvature().is_affine()
    }
}

/// Curvature of a convex atom that is increasing on nonnegative arguments
/// and decreasing on nonpositive ones (norms, abs, |x|^p with p >= 1).
fn abs_like_curvature(x: &Expr) -> Curvature {
    let c = x.curvature();
    if c.is_constant() {
        return Curvature::Constant;
    }
    if c.is_affine() {
        return Curvature::Convex;
    }
    let s: Sign = x.sign();
    if (c.is_convex() && s.is_nonneg()) || (c.is_concave() && s.is_nonpos()) {
        Curvature::Convex
    } else {
        Curvature::Unknown
    }
}

/// Handle elementwise multiplication curvature.
fn mul_curvature(a: &Expr, b: &Expr) -> Curvature {
    match (a.constant_value(), b.constant_value()) {
        (Some(_), Some(_)) => Curvature::Constant,
        (Some(c), None) => const_mul_curvature(c, b.curvature()),
        (None, Some(c)) => const_mul_curvature(c, a.curvature()),
        // variable * variable is not DCP
        (None, None) => Curvature::Unknown,
    }
}

/// Combine curvatures for stacking operations.
fn combine_all_curvatures(exprs: &[Arc<Expr>]) -> Curvature {
    exprs
        .iter()
        .fold(Curvature::Constant, |acc, e| add_curvature(acc, e.curvature()))
}
