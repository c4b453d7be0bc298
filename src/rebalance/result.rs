//! Rebalance output.

use nalgebra::DVector;

use crate::solver::SolveStatus;

/// Objective terms evaluated at an allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceBreakdown {
    pub return_wc: f64,
    pub risk_wc: f64,
    pub holding_cost: f64,
    pub trading_cost: f64,
    pub turnover: f64,
    pub leverage: f64,
}

/// Outcome of one rebalance.
///
/// When `success` is false the weights and cash are the previous holdings,
/// unchanged, and `objective_value` is `None`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveResult {
    pub weights: DVector<f64>,
    pub cash: f64,
    /// Whether the solver allocation was accepted.
    pub success: bool,
    pub status: SolveStatus,
    pub objective_value: Option<f64>,
    /// `weights - w_prev`.
    pub trades: DVector<f64>,
    /// Terms at the returned allocation, when they could be evaluated.
    pub breakdown: Option<RebalanceBreakdown>,
}

impl SolveResult {
    /// Total traded weight, `Σ|trades|`.
    pub fn gross_trade(&self) -> f64 {
        self.trades.lp_norm(1)
    }

    /// Whether the portfolio is unchanged.
    pub fn is_unchanged(&self) -> bool {
        self.trades.iter().all(|t| *t == 0.0)
    }
}
