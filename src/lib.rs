//! # robust-rebalance
//!
//! Robust single-period portfolio rebalancing.
//!
//! Given current holdings and a factor model of returns and risk, the
//! rebalancer solves a convex program that maximizes worst-case return
//! net of risk, holding and trading costs, subject to budget, box,
//! leverage, turnover and risk limits. If the solver does not produce an
//! optimal allocation the previous holdings are returned unchanged.
//!
//! ## Quick Start
//!
//! ```ignore
//! use robust_rebalance::prelude::*;
//!
//! let market = MarketState {
//!     idio_mean: DVector::from_vec(vec![0.10, 0.05]),
//!     ..MarketState::new(DVector::from_vec(vec![0.5, 0.5]), 0.0, 1)
//! };
//! let result = rebalance(&market, &RebalanceParameters::new(2))?;
//! println!("{} -> {:?}", result.status, result.weights);
//! ```
//!
//! ## Modeling layer
//!
//! The program is built with a small Disciplined Convex Programming
//! layer:
//!
//! - **Expression trees** built from the `Expr` enum with `Arc` sharing
//! - **DCP verification** via curvature and sign tracking
//! - **Canonicalization** to affine expressions plus zero, nonnegative,
//!   second-order and power cone constraints
//! - **Solver injection** through the [`solver::ConicSolver`] trait, with
//!   Clarabel as the default backend
//!
//! ### Atoms
//! - Affine: `+`, `-`, `*`, `/` (by scalar), `sum`, `vstack`, `matmul`,
//!   `dot`, `multiply`
//! - Convex: `norm1`, `norm2`, `abs`, `pos`, `neg_part`, `power` (p >= 1)

pub mod atoms;
pub mod canon;
pub mod constraints;
pub mod dcp;
pub mod error;
pub mod expr;
pub mod problem;
pub mod rebalance;
pub mod settings;
pub mod solver;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use robust_rebalance::prelude::*;
/// ```
pub mod prelude {
    pub use nalgebra::{DMatrix, DVector};

    // Expression types
    pub use crate::expr::{
        constant, constant_matrix, constant_vec, named_variable, ones, variable, Array, Expr,
        ExprId, Shape, VariableBuilder,
    };

    // Atoms
    pub use crate::atoms::{
        abs, dot, matmul, multiply, neg_part, norm1, norm2, pos, power, sum, vstack,
    };

    // Constraints
    pub use crate::constraints::{Constraint, ConstraintExt};

    // DCP
    pub use crate::dcp::{Curvature, Sign};

    // Problem
    pub use crate::problem::{Objective, Problem, ProblemBuilder, Solution};

    // Solver
    pub use crate::settings::Settings;
    pub use crate::solver::{ClarabelSolver, ConicSolver, SolveStatus};

    // Rebalance
    pub use crate::rebalance::{
        rebalance, MarketState, RebalanceBreakdown, RebalanceParameters, Rebalancer, RiskModel,
        SoftTargets, SolveResult,
    };

    // Errors
    pub use crate::error::{CvxError, RebalanceError, RebalanceResult, Result};
}

// Re-export main types at crate root
pub use error::{CvxError, RebalanceError, RebalanceResult, Result};
pub use problem::{Problem, Solution};
pub use rebalance::{
    rebalance, MarketState, RebalanceParameters, Rebalancer, SoftTargets, SolveResult,
};
pub use settings::Settings;
pub use solver::SolveStatus;
