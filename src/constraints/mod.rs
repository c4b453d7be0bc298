//! User-level constraints.

pub mod constraint;

pub use constraint::{Constraint, ConstraintExt, ConstraintKind};
