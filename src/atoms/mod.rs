//! Atom functions for building expressions.
//!
//! - **Affine atoms**: operations that preserve linearity (add, mul, sum, stack)
//! - **Nonlinear atoms**: norms, absolute value, positive part and powers

pub mod affine;
pub mod nonlinear;

pub use affine::{dot, matmul, multiply, sum, vstack};
pub use nonlinear::{abs, neg_part, norm1, norm2, pos, power};
