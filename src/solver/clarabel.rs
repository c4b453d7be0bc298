//! Clarabel solver integration.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT,
};
use log::debug;

use super::stuffing::{ConeDims, StuffedProblem};
use super::{ConicSolver, RawSolution, SolveStatus};
use crate::error::{CvxError, Result};
use crate::settings::Settings;

impl From<SolverStatus> for SolveStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Solved => SolveStatus::Optimal,
            SolverStatus::AlmostSolved => SolveStatus::OptimalInaccurate,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                SolveStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                SolveStatus::Unbounded
            }
            _ => SolveStatus::SolverError,
        }
    }
}

/// The Clarabel interior-point solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelSolver;

impl ClarabelSolver {
    /// Create a Clarabel backend.
    pub fn new() -> Self {
        ClarabelSolver
    }
}

impl ConicSolver for ClarabelSolver {
    fn solve(&self, problem: &StuffedProblem, settings: &Settings) -> Result<RawSolution> {
        let n = problem.num_vars();
        if problem.a.ncols() != n || problem.a.nrows() != problem.b.len() {
            return Err(CvxError::InvalidProblem(format!(
                "constraint matrix is {}x{} but the problem has {} rows and {} variables",
                problem.a.nrows(),
                problem.a.ncols(),
                problem.b.len(),
                n
            )));
        }

        // Linear objective only
        let p = ClarabelCsc::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let a = to_clarabel_csc(&problem.a);
        let cones = to_clarabel_cones(&problem.cone_dims);

        let mut solver = DefaultSolver::new(
            &p,
            &problem.q,
            &a,
            &problem.b,
            &cones,
            clarabel_settings(settings)?,
        );
        solver.solve();

        let status: SolveStatus = solver.solution.status.into();
        debug!(
            "clarabel finished: status={:?}, iterations={}, time={:.4}s",
            solver.solution.status, solver.info.iterations, solver.solution.solve_time
        );

        Ok(RawSolution {
            status,
            x: solver.solution.x.clone(),
            solve_time: solver.solution.solve_time,
            iterations: solver.info.iterations,
        })
    }
}

fn clarabel_settings(settings: &Settings) -> Result<DefaultSettings<f64>> {
    DefaultSettingsBuilder::default()
        .verbose(settings.verbose)
        .max_iter(settings.max_iter)
        .time_limit(settings.time_limit.unwrap_or(f64::INFINITY))
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .tol_feas(settings.tol_feas)
        .build()
        .map_err(|e| CvxError::SolverError(format!("invalid solver settings: {}", e)))
}

/// Convert nalgebra CSC to Clarabel CSC.
fn to_clarabel_csc(m: &nalgebra_sparse::CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}

/// Convert cone dimensions to Clarabel cones, in row order.
fn to_clarabel_cones(dims: &ConeDims) -> Vec<SupportedConeT<f64>> {
    let mut cones = Vec::new();

    if dims.zero > 0 {
        cones.push(SupportedConeT::ZeroConeT(dims.zero));
    }
    if dims.nonneg > 0 {
        cones.push(SupportedConeT::NonnegativeConeT(dims.nonneg));
    }
    for &soc_dim in &dims.soc {
        cones.push(SupportedConeT::SecondOrderConeT(soc_dim));
    }
    for &alpha in &dims.power {
        cones.push(SupportedConeT::PowerConeT(alpha));
    }

    cones
}
