//! Runs the injected solver and normalizes its outcome.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use nalgebra::DVector;

use super::program::RebalanceProgram;
use crate::settings::Settings;
use crate::solver::{ConicSolver, SolveStatus, StuffedProblem};

/// Normalized result of one solve attempt.
///
/// `weights`, `cash` and `objective_value` are present exactly when the
/// status is optimal-class and the point is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    pub weights: Option<DVector<f64>>,
    pub cash: Option<f64>,
    pub objective_value: Option<f64>,
}

impl SolverOutcome {
    fn failed(status: SolveStatus) -> Self {
        SolverOutcome {
            status,
            weights: None,
            cash: None,
            objective_value: None,
        }
    }
}

/// Solve `stuffed` once with `solver`.
///
/// Solver errors and panics are reported as `SolverError`; nothing is
/// propagated to the caller.
pub fn solve<S: ConicSolver>(
    program: &RebalanceProgram,
    stuffed: &StuffedProblem,
    solver: &S,
    settings: &Settings,
) -> SolverOutcome {
    let raw = match panic::catch_unwind(AssertUnwindSafe(|| solver.solve(stuffed, settings))) {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!("solver failed: {}", e);
            return SolverOutcome::failed(SolveStatus::SolverError);
        }
        Err(payload) => {
            warn!("solver panicked: {}", panic_message(payload.as_ref()));
            return SolverOutcome::failed(SolveStatus::SolverError);
        }
    };
    debug!(
        "solver returned {} after {} iterations ({:.4}s)",
        raw.status, raw.iterations, raw.solve_time
    );

    let solution = match program.problem.interpret(
        stuffed,
        raw.status,
        &raw.x,
        raw.solve_time,
        raw.iterations,
    ) {
        Ok(solution) => solution,
        Err(e) => {
            warn!("could not read solver point: {}", e);
            return SolverOutcome::failed(SolveStatus::SolverError);
        }
    };
    if !solution.status.is_optimal() {
        return SolverOutcome::failed(solution.status);
    }

    let weights = solution.get(&program.terms.w).cloned();
    let cash = solution.get(&program.terms.c).and_then(|c| c.get(0).copied());
    match (weights, cash, solution.value) {
        (Some(w), Some(c), Some(value))
            if w.iter().all(|v| v.is_finite()) && c.is_finite() && value.is_finite() =>
        {
            SolverOutcome {
                status: solution.status,
                weights: Some(w),
                cash: Some(c),
                objective_value: Some(value),
            }
        }
        _ => {
            warn!("solver reported {} with a missing or non-finite point", solution.status);
            SolverOutcome::failed(SolveStatus::SolverError)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
