//! Solver interface.
//!
//! This module provides:
//! - Matrix stuffing to convert canonicalized problems to conic form
//! - The `ConicSolver` trait through which the numerical solve is injected
//! - The Clarabel backend

pub mod clarabel;
pub mod stuffing;

use std::fmt;

use crate::error::Result;
use crate::settings::Settings;

pub use self::clarabel::ClarabelSolver;
pub use stuffing::{stuff_problem, ConeDims, StuffedProblem, VariableMap};

/// Normalized outcome of a conic solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Solution found to reduced accuracy.
    OptimalInaccurate,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// The solver failed, hit a limit, or faulted.
    SolverError,
}

impl SolveStatus {
    /// Statuses whose primal point may be used.
    pub fn is_optimal(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }

    /// Upper-case status tag.
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::OptimalInaccurate => "OPTIMAL_INACCURATE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unbounded => "UNBOUNDED",
            SolveStatus::SolverError => "SOLVER_ERROR",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw output of a conic solver on a [`StuffedProblem`].
#[derive(Debug, Clone)]
pub struct RawSolution {
    /// Normalized status.
    pub status: SolveStatus,
    /// Stacked primal point, one entry per column of `A`.
    pub x: Vec<f64>,
    /// Solve time in seconds.
    pub solve_time: f64,
    /// Number of iterations.
    pub iterations: u32,
}

/// A numerical conic solver.
///
/// Implementations return `Err` only for faults (bad input, internal
/// failure); infeasibility and unboundedness are statuses.
pub trait ConicSolver {
    /// Solve `minimize q'x s.t. Ax + s = b, s in K`.
    fn solve(&self, problem: &StuffedProblem, settings: &Settings) -> Result<RawSolution>;
}

impl<S: ConicSolver + ?Sized> ConicSolver for &S {
    fn solve(&self, problem: &StuffedProblem, settings: &Settings) -> Result<RawSolution> {
        (**self).solve(problem, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags() {
        assert_eq!(SolveStatus::OptimalInaccurate.to_string(), "OPTIMAL_INACCURATE");
        assert_eq!(SolveStatus::SolverError.to_string(), "SOLVER_ERROR");
        assert!(SolveStatus::Optimal.is_optimal());
        assert!(SolveStatus::OptimalInaccurate.is_optimal());
        assert!(!SolveStatus::Infeasible.is_optimal());
        assert!(!SolveStatus::Unbounded.is_optimal());
    }
}
