//! Decision variables, derived terms, and the rebalance objective.

use std::collections::HashMap;

use nalgebra::DVector;

use super::market::MarketState;
use super::params::RebalanceParameters;
use super::result::RebalanceBreakdown;
use super::risk::RiskModel;
use crate::atoms::{abs, dot, neg_part, norm1, pos, power};
use crate::error::{CvxError, Result};
use crate::expr::{constant, constant_vec, named_variable, Expr, ExprId};

/// Exponent of the market-impact cost.
pub const IMPACT_EXPONENT: f64 = 1.5;

/// Decision variables and every derived term of one rebalance.
///
/// All terms are expressions in `w` and `c` only. Parts with all-zero
/// coefficients are left out, so the program carries no epigraph
/// variables that the objective does not price.
#[derive(Debug, Clone)]
pub struct RebalanceTerms {
    /// New asset weights (n).
    pub w: Expr,
    /// New cash weight.
    pub c: Expr,
    /// Trades `w - w_prev`.
    pub z: Expr,
    /// `½‖z‖₁`.
    pub turnover: Expr,
    /// `‖w‖₁`.
    pub leverage: Expr,
    /// Expected return less the mean-uncertainty penalty.
    pub return_wc: Expr,
    /// Volatility inflated by covariance uncertainty.
    pub risk_wc: Expr,
    /// Shorting and borrowing cost.
    pub holding_cost: Expr,
    /// Spread and market-impact cost.
    pub trading_cost: Expr,
}

impl RebalanceTerms {
    /// Create fresh variables and derive all terms.
    pub fn new(market: &MarketState, params: &RebalanceParameters, risk: &RiskModel) -> Self {
        let n = market.n_assets();
        let w = named_variable("w", n);
        let c = named_variable("c", ());
        let z = &w - constant_vec(market.w_prev.clone());

        let turnover = 0.5 * norm1(&z);
        let leverage = norm1(&w);

        let mean = &market.factor_loadings * &market.factor_mean + &market.idio_mean;
        let return_wc = dot(&constant_vec(mean), &w) + market.risk_free * &c;
        let return_wc = match weighted(&params.rho_mean, abs(&w)) {
            Some(penalty) => return_wc - penalty,
            None => return_wc,
        };

        let risk_wc = risk.worst_case_risk_expr(&w, params.rho_covariance);

        let borrow = (market.kappa_borrow != 0.0).then(|| market.kappa_borrow * neg_part(&c));
        let holding_cost = total([weighted(&market.kappa_short, neg_part(&w)), borrow]);

        let trading_cost = total([
            weighted(&market.kappa_spread, abs(&z)),
            weighted(&market.kappa_impact, power(&z, IMPACT_EXPONENT)),
        ]);

        RebalanceTerms {
            w,
            c,
            z,
            turnover,
            leverage,
            return_wc,
            risk_wc,
            holding_cost,
            trading_cost,
        }
    }

    /// Variable assignment for a concrete allocation.
    pub fn assignment(&self, weights: &DVector<f64>, cash: f64) -> HashMap<ExprId, DVector<f64>> {
        let mut values = HashMap::new();
        if let Some(id) = self.w.variable_id() {
            values.insert(id, weights.clone());
        }
        if let Some(id) = self.c.variable_id() {
            values.insert(id, DVector::from_element(1, cash));
        }
        values
    }

    /// Evaluate every term at a concrete allocation.
    pub fn breakdown(&self, weights: &DVector<f64>, cash: f64) -> Result<RebalanceBreakdown> {
        let values = self.assignment(weights, cash);
        Ok(RebalanceBreakdown {
            return_wc: self.return_wc.evaluate_scalar(&values)?,
            risk_wc: self.risk_wc.evaluate_scalar(&values)?,
            holding_cost: self.holding_cost.evaluate_scalar(&values)?,
            trading_cost: self.trading_cost.evaluate_scalar(&values)?,
            turnover: self.turnover.evaluate_scalar(&values)?,
            leverage: self.leverage.evaluate_scalar(&values)?,
        })
    }
}

/// `kᵀ term`, or `None` when every coefficient is zero.
fn weighted(k: &DVector<f64>, term: Expr) -> Option<Expr> {
    k.iter()
        .any(|v| *v != 0.0)
        .then(|| dot(&constant_vec(k.clone()), &term))
}

/// Sum of the present parts, zero if none.
fn total<const N: usize>(parts: [Option<Expr>; N]) -> Expr {
    parts
        .into_iter()
        .flatten()
        .reduce(|acc, e| acc + e)
        .unwrap_or_else(|| constant(0.0))
}

/// Assembles the concave rebalance objective.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveBuilder<'a> {
    params: &'a RebalanceParameters,
}

impl<'a> ObjectiveBuilder<'a> {
    pub fn new(params: &'a RebalanceParameters) -> Self {
        ObjectiveBuilder { params }
    }

    /// Worst-case return less the risk, cost and soft-limit penalties.
    ///
    /// Penalties with a zero weight are omitted.
    ///
    /// Fails with `NotDcp` if the result is not concave, which only happens
    /// for coefficients that skipped validation.
    pub fn build(&self, terms: &RebalanceTerms) -> Result<Expr> {
        let p = self.params;
        let penalties = [
            (p.gamma_risk, pos(&(&terms.risk_wc - constant(p.soft_risk())))),
            (p.gamma_hold, terms.holding_cost.clone()),
            (p.gamma_trade, terms.trading_cost.clone()),
            (p.gamma_turn, pos(&(&terms.turnover - constant(p.soft_turnover())))),
            (p.gamma_leverage, pos(&(&terms.leverage - constant(p.soft_leverage())))),
        ];
        let mut objective = terms.return_wc.clone();
        for (gamma, penalty) in penalties {
            if gamma != 0.0 {
                objective = objective - gamma * penalty;
            }
        }

        if !objective.is_concave() {
            return Err(CvxError::NotDcp(format!(
                "rebalance objective has curvature {:?}, expected concave",
                objective.curvature()
            )));
        }
        Ok(objective)
    }
}
