//! Expression types and creation utilities.
//!
//! This module provides the core expression types for building programs:
//! - `Expr` - the expression tree
//! - `Shape` - shape information for expressions
//! - Variable creation via `variable()` and `VariableBuilder`
//! - Constant creation via `constant()` and related functions
//! - Numeric evaluation via `Expr::evaluate`

pub mod constant;
pub mod eval;
pub mod expression;
pub mod shape;
pub mod variable;

pub use constant::{constant, constant_matrix, constant_vec, ones};
pub use expression::{Array, Expr, ExprId, VariableData};
pub use shape::Shape;
pub use variable::{named_variable, variable, VariableBuilder};
