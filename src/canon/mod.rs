//! Canonicalization transforms expressions into standard form.
//!
//! DCP expressions become linear expressions (LinExpr) plus cone
//! constraints (ConeConstraint) for the nonlinear atoms.

pub mod canonicalizer;
pub mod lin_expr;

pub use canonicalizer::{canonicalize, CanonResult, ConeConstraint};
pub use lin_expr::LinExpr;
