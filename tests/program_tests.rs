//! Program assembly, solver injection and concavity properties.

use std::cell::Cell;

use proptest::prelude::*;
use robust_rebalance::prelude::*;
use robust_rebalance::rebalance::RebalanceProgram;
use robust_rebalance::solver::{RawSolution, StuffedProblem};

fn market() -> MarketState {
    MarketState {
        idio_mean: DVector::from_vec(vec![0.02, 0.05, 0.03]),
        factor_mean: DVector::from_vec(vec![0.03]),
        risk_free: 0.01,
        factor_covariance_chol: DMatrix::from_element(1, 1, 0.2),
        idio_volas: DVector::from_vec(vec![0.1, 0.3, 0.2]),
        factor_loadings: DMatrix::from_column_slice(3, 1, &[1.0, 1.2, 0.7]),
        kappa_short: DVector::from_element(3, 0.01),
        kappa_borrow: 0.02,
        kappa_spread: DVector::from_element(3, 0.001),
        kappa_impact: DVector::from_element(3, 0.05),
        ..MarketState::new(DVector::from_vec(vec![0.3, 0.3, 0.3]), 0.1, 1)
    }
}

fn params() -> RebalanceParameters {
    RebalanceParameters {
        w_lower: DVector::from_element(3, -0.5),
        c_lower: -0.5,
        rho_mean: DVector::from_element(3, 0.005),
        rho_covariance: 0.05,
        gamma_hold: 1.0,
        gamma_trade: 1.0,
        gamma_turn: 0.5,
        gamma_leverage: 0.5,
        gamma_risk: 2.0,
        soft: SoftTargets {
            turnover: Some(0.1),
            leverage: Some(0.8),
            risk: Some(0.1),
        },
        ..RebalanceParameters::new(3)
    }
}

// ============================================================================
// Stub solvers
// ============================================================================

struct StatusSolver(SolveStatus);

impl ConicSolver for StatusSolver {
    fn solve(&self, problem: &StuffedProblem, _: &Settings) -> Result<RawSolution> {
        Ok(RawSolution {
            status: self.0,
            x: vec![0.0; problem.num_vars()],
            solve_time: 0.0,
            iterations: 1,
        })
    }
}

struct FailingSolver;

impl ConicSolver for FailingSolver {
    fn solve(&self, _: &StuffedProblem, _: &Settings) -> Result<RawSolution> {
        Err(CvxError::SolverError("numerical failure".into()))
    }
}

struct PanickingSolver;

impl ConicSolver for PanickingSolver {
    fn solve(&self, _: &StuffedProblem, _: &Settings) -> Result<RawSolution> {
        panic!("index out of bounds")
    }
}

#[derive(Default)]
struct CountingSolver {
    calls: Cell<usize>,
}

impl ConicSolver for CountingSolver {
    fn solve(&self, problem: &StuffedProblem, settings: &Settings) -> Result<RawSolution> {
        self.calls.set(self.calls.get() + 1);
        ClarabelSolver.solve(problem, settings)
    }
}

/// Returns a fixed allocation; `w` and `c` are the first columns.
struct PointSolver {
    weights: Vec<f64>,
    cash: f64,
}

impl ConicSolver for PointSolver {
    fn solve(&self, problem: &StuffedProblem, _: &Settings) -> Result<RawSolution> {
        let n = self.weights.len();
        let mut x = vec![0.0; problem.num_vars()];
        x[..n].copy_from_slice(&self.weights);
        x[n] = self.cash;
        Ok(RawSolution {
            status: SolveStatus::Optimal,
            x,
            solve_time: 0.0,
            iterations: 1,
        })
    }
}

fn assert_fallback(result: &SolveResult, status: SolveStatus) {
    let m = market();
    assert!(!result.success);
    assert_eq!(result.status, status);
    assert_eq!(result.weights, m.w_prev);
    assert_eq!(result.cash, m.c_prev);
    assert!(result.objective_value.is_none());
    assert!(result.is_unchanged());
}

#[test]
fn test_unbounded_falls_back() {
    let rebalancer = Rebalancer::with_solver(StatusSolver(SolveStatus::Unbounded));
    let result = rebalancer.rebalance(&market(), &params()).unwrap();
    assert_fallback(&result, SolveStatus::Unbounded);
}

#[test]
fn test_solver_error_status_falls_back() {
    let rebalancer = Rebalancer::with_solver(StatusSolver(SolveStatus::SolverError));
    let result = rebalancer.rebalance(&market(), &params()).unwrap();
    assert_fallback(&result, SolveStatus::SolverError);
}

#[test]
fn test_solver_fault_falls_back() {
    let result = Rebalancer::with_solver(FailingSolver)
        .rebalance(&market(), &params())
        .unwrap();
    assert_fallback(&result, SolveStatus::SolverError);
}

#[test]
fn test_solver_panic_falls_back() {
    let result = Rebalancer::with_solver(PanickingSolver)
        .rebalance(&market(), &params())
        .unwrap();
    assert_fallback(&result, SolveStatus::SolverError);
}

#[test]
fn test_one_solve_per_call() {
    let solver = CountingSolver::default();
    let rebalancer = Rebalancer::with_solver(&solver);
    let result = rebalancer.rebalance(&market(), &params()).unwrap();
    assert!(result.success, "status {}", result.status);
    assert_eq!(solver.calls.get(), 1);

    // Inverted bounds never reach the solver
    let mut bad = params();
    bad.c_lower = 1.0;
    bad.c_upper = 0.0;
    let result = rebalancer.rebalance(&market(), &bad).unwrap();
    assert_eq!(result.status, SolveStatus::Infeasible);
    assert_eq!(solver.calls.get(), 1);
}

#[test]
fn test_inverted_bounds_skip_assembly_and_solve() {
    let solver = CountingSolver::default();
    let mut bad = params();
    bad.z_lower[2] = 0.5;
    bad.z_upper[2] = -0.5;

    let result = Rebalancer::with_solver(&solver)
        .rebalance(&market(), &bad)
        .unwrap();
    assert_fallback(&result, SolveStatus::Infeasible);
    let b = result.breakdown.unwrap();
    assert_eq!(b.turnover, 0.0);
    assert!((b.leverage - 0.9).abs() < 1e-12);

    let strict = Rebalancer::with_solver(&solver).with_settings(Settings {
        strict_bounds: true,
        ..Settings::default()
    });
    match strict.rebalance(&market(), &bad) {
        Err(RebalanceError::InvalidBounds { field, index, .. }) => {
            assert_eq!(field, "trades");
            assert_eq!(index, Some(2));
        }
        other => panic!("Expected InvalidBounds, got {:?}", other),
    }
    assert_eq!(solver.calls.get(), 0);
}

#[test]
fn test_dust_cleanup_keeps_budget() {
    let n = 200;
    let market = MarketState::new(DVector::from_element(n, 0.004), 0.2, 1);
    let params = RebalanceParameters::new(n);

    // Every weight drifts by dust, cash carries the exact offset
    let solver = PointSolver {
        weights: vec![0.004 + 0.9e-6; n],
        cash: 0.2 - n as f64 * 0.9e-6,
    };
    let result = Rebalancer::with_solver(solver)
        .rebalance(&market, &params)
        .unwrap();

    assert!(result.success, "status {}", result.status);
    assert!(result.is_unchanged());
    assert_eq!(result.gross_trade(), 0.0);
    assert!((result.weights.sum() + result.cash - 1.0).abs() < 1e-9);
    assert!((result.cash - market.c_prev).abs() < 1e-9);
}

#[test]
fn test_dust_cleanup_skipped_when_cash_would_leave_box() {
    let n = 200;
    let market = MarketState::new(DVector::from_element(n, 0.004), 0.2, 1);
    let params = RebalanceParameters {
        c_upper: 0.2 - 1e-4,
        ..RebalanceParameters::new(n)
    };

    let solver = PointSolver {
        weights: vec![0.004 + 0.9e-6; n],
        cash: 0.2 - n as f64 * 0.9e-6,
    };
    let result = Rebalancer::with_solver(solver)
        .rebalance(&market, &params)
        .unwrap();

    assert!(result.success, "status {}", result.status);
    assert!(result.cash <= params.c_upper);
    assert!((result.gross_trade() - n as f64 * 0.9e-6).abs() < 1e-9);
    assert!((result.weights.sum() + result.cash - 1.0).abs() < 1e-9);
}

#[test]
fn test_accepted_allocation_matches_breakdown() {
    let result = rebalance(&market(), &params()).unwrap();
    assert!(result.success, "status {}", result.status);

    let b = result.breakdown.unwrap();
    let p = params();
    let objective = b.return_wc
        - p.gamma_risk * (b.risk_wc - p.soft_risk()).max(0.0)
        - p.gamma_hold * b.holding_cost
        - p.gamma_trade * b.trading_cost
        - p.gamma_turn * (b.turnover - p.soft_turnover()).max(0.0)
        - p.gamma_leverage * (b.leverage - p.soft_leverage()).max(0.0);
    assert!((objective - result.objective_value.unwrap()).abs() < 1e-5);
}

// ============================================================================
// Concavity
// ============================================================================

#[test]
fn test_objective_is_concave() {
    let program = RebalanceProgram::build(&market(), &params()).unwrap();
    assert!(program.problem.is_dcp());
    assert!(program.problem.objective.expr().is_concave());
    assert!(!program.problem.objective.is_minimize());
}

fn allocation() -> impl Strategy<Value = (Vec<f64>, f64)> {
    (prop::collection::vec(-1.0..1.0f64, 3), -1.0..1.0f64)
}

proptest! {
    #[test]
    fn prop_objective_midpoint_concave((wa, ca) in allocation(), (wb, cb) in allocation()) {
        let program = RebalanceProgram::build(&market(), &params()).unwrap();
        let objective = program.problem.objective.expr();
        let eval = |w: &DVector<f64>, c: f64| {
            objective
                .evaluate_scalar(&program.terms.assignment(w, c))
                .unwrap()
        };

        let (wa, wb) = (DVector::from_vec(wa), DVector::from_vec(wb));
        let mid = (&wa + &wb) * 0.5;
        let lhs = eval(&mid, 0.5 * (ca + cb));
        let rhs = 0.5 * (eval(&wa, ca) + eval(&wb, cb));
        prop_assert!(lhs >= rhs - 1e-9, "f(mid) = {} < {}", lhs, rhs);
    }

    #[test]
    fn prop_risk_is_absolutely_homogeneous(w in prop::collection::vec(-1.0..1.0f64, 3), t in -3.0..3.0f64) {
        let model = RiskModel::new(&market());
        let w = DVector::from_vec(w);
        let scaled = model.worst_case_risk(&(&w * t), 0.05);
        let expected = t.abs() * model.worst_case_risk(&w, 0.05);
        prop_assert!((scaled - expected).abs() < 1e-9);
    }
}

// ============================================================================
// Serialization
// ============================================================================

#[cfg(feature = "serde")]
#[test]
fn test_serde_round_trip() {
    let m = market();
    let json = serde_json::to_string(&m).unwrap();
    let back: MarketState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m);

    let p = params();
    let back: RebalanceParameters =
        serde_json::from_str(&serde_json::to_string(&p).unwrap()).unwrap();
    assert_eq!(back, p);

    let result = Rebalancer::with_solver(FailingSolver)
        .rebalance(&m, &p)
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "SOLVER_ERROR");
    assert_eq!(json["success"], false);

    let defaults = Settings::default();
    let back: Settings = serde_json::from_str(&serde_json::to_string(&defaults).unwrap()).unwrap();
    assert_eq!(back, defaults);

    let settings = Settings {
        time_limit: Some(10.0),
        strict_bounds: true,
        ..Settings::default()
    };
    let back: Settings = serde_json::from_str(&serde_json::to_string(&settings).unwrap()).unwrap();
    assert_eq!(back, settings);

    // Missing fields take their defaults
    let back: Settings = serde_json::from_str(r#"{"max_iter": 50}"#).unwrap();
    assert_eq!(back.max_iter, 50);
    assert_eq!(back.time_limit, None);
}
