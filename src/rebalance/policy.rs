//! Accept-or-fallback decision on a solver outcome.

use log::{debug, info, warn};
use nalgebra::DVector;

use super::adapter::SolverOutcome;
use super::market::MarketState;
use super::objective::RebalanceTerms;
use super::params::RebalanceParameters;
use super::result::{RebalanceBreakdown, SolveResult};
use crate::settings::Settings;
use crate::solver::SolveStatus;

const BUDGET_ROUNDING: f64 = 1e-12;

/// Turns a [`SolverOutcome`] into the [`SolveResult`] handed to callers.
#[derive(Debug, Clone, Copy)]
pub struct ResultPolicy<'a> {
    market: &'a MarketState,
    params: &'a RebalanceParameters,
    terms: &'a RebalanceTerms,
    settings: &'a Settings,
}

impl<'a> ResultPolicy<'a> {
    pub fn new(
        market: &'a MarketState,
        params: &'a RebalanceParameters,
        terms: &'a RebalanceTerms,
        settings: &'a Settings,
    ) -> Self {
        ResultPolicy {
            market,
            params,
            terms,
            settings,
        }
    }

    /// Accept an optimal-class outcome, otherwise keep the previous holdings.
    pub fn resolve(&self, outcome: SolverOutcome) -> SolveResult {
        match outcome {
            SolverOutcome {
                status,
                weights: Some(weights),
                cash: Some(cash),
                objective_value,
            } if status.is_optimal() => self.accept(status, weights, cash, objective_value),
            SolverOutcome { status, .. } => {
                // An optimal tag without a point is not usable
                let status = if status.is_optimal() {
                    SolveStatus::SolverError
                } else {
                    status
                };
                self.fallback(status)
            }
        }
    }

    /// Previous holdings, unchanged, tagged with `status`.
    pub fn fallback(&self, status: SolveStatus) -> SolveResult {
        warn!("rebalance rejected ({}), keeping previous holdings", status);
        let weights = self.market.w_prev.clone();
        let cash = self.market.c_prev;
        SolveResult {
            trades: DVector::zeros(weights.len()),
            breakdown: self.breakdown(&weights, cash),
            weights,
            cash,
            success: false,
            status,
            objective_value: None,
        }
    }

    fn accept(
        &self,
        status: SolveStatus,
        weights: DVector<f64>,
        cash: f64,
        objective_value: Option<f64>,
    ) -> SolveResult {
        let (weights, cash) = self.snap_dust(weights, cash);
        let trades = &weights - &self.market.w_prev;
        let breakdown = self.breakdown(&weights, cash);
        let result = SolveResult {
            weights,
            cash,
            success: true,
            status,
            objective_value,
            trades,
            breakdown,
        };
        info!(
            "rebalance accepted ({}): objective={:?}, gross trade={:.6}",
            status,
            objective_value,
            result.gross_trade()
        );
        result
    }

    /// Snap trades within `trade_tolerance` to zero and close the budget with cash.
    ///
    /// A weight is snapped only where the previous weight and a zero trade
    /// both sit inside their boxes. Cash becomes `1 - sum(w)`, or `c_prev`
    /// when the two agree up to rounding. If that cash would leave the cash
    /// box, the solver point is returned untouched.
    fn snap_dust(&self, weights: DVector<f64>, cash: f64) -> (DVector<f64>, f64) {
        let tol = self.settings.trade_tolerance;
        let p = self.params;
        let w_prev = &self.market.w_prev;

        let mut snapped = weights.clone();
        for i in 0..snapped.len() {
            let prev = w_prev[i];
            let in_box = p.w_lower[i] <= prev
                && prev <= p.w_upper[i]
                && p.z_lower[i] <= 0.0
                && 0.0 <= p.z_upper[i];
            if in_box && (snapped[i] - prev).abs() <= tol {
                snapped[i] = prev;
            }
        }

        let mut closing = 1.0 - snapped.sum();
        if (closing - self.market.c_prev).abs() <= BUDGET_ROUNDING {
            closing = self.market.c_prev;
        }
        let slack = self.settings.tol_feas;
        if closing < p.c_lower - slack || closing > p.c_upper + slack {
            debug!(
                "closing cash {} outside [{}, {}], keeping solver point",
                closing, p.c_lower, p.c_upper
            );
            return (weights, cash);
        }
        (snapped, closing)
    }

    fn breakdown(&self, weights: &DVector<f64>, cash: f64) -> Option<RebalanceBreakdown> {
        match self.terms.breakdown(weights, cash) {
            Ok(b) => Some(b),
            Err(e) => {
                warn!("could not evaluate objective terms: {}", e);
                None
            }
        }
    }
}
