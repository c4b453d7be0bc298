//! Robust single-period portfolio rebalance.
//!
//! A call validates the inputs and checks the bounds for inversions, then
//! assembles the concave program from the risk model, objective and
//! constraint builders. The program is solved once with the injected
//! [`ConicSolver`]; the new allocation is either accepted or replaced by
//! the previous holdings.
//!
//! ```ignore
//! use robust_rebalance::rebalance::{rebalance, MarketState, RebalanceParameters};
//!
//! let market = MarketState { idio_mean, ..MarketState::new(w_prev, c_prev, k) };
//! let result = rebalance(&market, &RebalanceParameters::new(n))?;
//! if result.success { /* trade result.trades */ }
//! ```

pub mod adapter;
pub mod constraints;
pub mod market;
pub mod objective;
pub mod params;
pub mod policy;
pub mod program;
pub mod result;
pub mod risk;
mod validate;

use log::{debug, warn};

use crate::error::RebalanceResult;
use crate::settings::Settings;
use crate::solver::{ClarabelSolver, ConicSolver, SolveStatus};

pub use adapter::SolverOutcome;
pub use constraints::ConstraintBuilder;
pub use market::MarketState;
pub use objective::{ObjectiveBuilder, RebalanceTerms};
pub use params::{RebalanceParameters, SoftTargets};
pub use policy::ResultPolicy;
pub use program::RebalanceProgram;
pub use result::{RebalanceBreakdown, SolveResult};
pub use risk::RiskModel;

/// Rebalancer with an injected solver and fixed settings.
///
/// Holds no state between calls; independent calls may run in parallel.
#[derive(Debug, Clone, Default)]
pub struct Rebalancer<S = ClarabelSolver> {
    solver: S,
    settings: Settings,
}

impl Rebalancer<ClarabelSolver> {
    /// Rebalancer backed by Clarabel with default settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: ConicSolver> Rebalancer<S> {
    /// Rebalancer backed by `solver`.
    pub fn with_solver(solver: S) -> Self {
        Rebalancer {
            solver,
            settings: Settings::default(),
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compute the new allocation.
    ///
    /// Input errors are returned as `Err`. Solver failure, infeasibility and
    /// unboundedness are not errors: they yield the previous holdings with
    /// `success == false` and the matching status.
    pub fn rebalance(
        &self,
        market: &MarketState,
        params: &RebalanceParameters,
    ) -> RebalanceResult<SolveResult> {
        self.settings.validate()?;
        market.validate()?;
        params.validate(market.n_assets())?;

        if let Err(e) = params.check_bounds() {
            if self.settings.strict_bounds {
                return Err(e);
            }
            warn!("{}; skipping solve", e);
            // Only the terms are needed to report the held allocation
            let terms = RebalanceTerms::new(market, params, &RiskModel::new(market));
            let policy = ResultPolicy::new(market, params, &terms, &self.settings);
            return Ok(policy.fallback(SolveStatus::Infeasible));
        }

        let program = RebalanceProgram::build(market, params)?;
        let policy = ResultPolicy::new(market, params, &program.terms, &self.settings);
        let stuffed = program.stuff()?;
        debug!(
            "solving rebalance: {} variables, {} rows",
            stuffed.num_vars(),
            stuffed.num_rows()
        );
        let outcome = adapter::solve(&program, &stuffed, &self.solver, &self.settings);
        Ok(policy.resolve(outcome))
    }
}

/// Rebalance with Clarabel and default settings.
pub fn rebalance(market: &MarketState, params: &RebalanceParameters) -> RebalanceResult<SolveResult> {
    Rebalancer::new().rebalance(market, params)
}
