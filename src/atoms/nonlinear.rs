//! Convex atoms used by the rebalance program.
//!
//! Each one lowers to an epigraph with a nonnegative, second-order or
//! power cone.

use std::sync::Arc;

use crate::expr::Expr;

// ============================================================================
// Norms (all convex)
// ============================================================================

/// ||x||_1, used for leverage and turnover. Convex and nonnegative.
pub fn norm1(x: &Expr) -> Expr {
    Expr::Norm1(Arc::new(x.clone()))
}

/// ||x||_2. Lowered to a single second-order cone.
pub fn norm2(x: &Expr) -> Expr {
    Expr::Norm2(Arc::new(x.clone()))
}

// ============================================================================
// Element-wise atoms
// ============================================================================

/// Absolute value: |x| (element-wise).
pub fn abs(x: &Expr) -> Expr {
    Expr::Abs(Arc::new(x.clone()))
}

/// Positive part: max(x, 0) (element-wise).
///
/// Properties:
/// - Curvature: Convex
/// - Sign: Non-negative
/// - Monotonicity: Increasing
pub fn pos(x: &Expr) -> Expr {
    Expr::Pos(Arc::new(x.clone()))
}

/// Negative part: max(-x, 0) (element-wise).
pub fn neg_part(x: &Expr) -> Expr {
    Expr::Pos(Arc::new(Expr::Neg(Arc::new(x.clone()))))
}

/// Power of the magnitude: |x|^p (element-wise).
///
/// Only `p >= 1` is representable; the trading-cost model uses `p = 3/2`.
/// Other exponents yield an expression of unknown curvature, which the DCP
/// check rejects.
pub fn power(x: &Expr, p: f64) -> Expr {
    Expr::Power(Arc::new(x.clone()), p)
}
