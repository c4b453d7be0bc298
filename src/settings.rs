//! Solver and rebalance settings.

use crate::error::{RebalanceError, RebalanceResult};

/// Settings for a rebalance call and the underlying conic solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// Print solver output.
    pub verbose: bool,
    /// Maximum solver iterations.
    pub max_iter: u32,
    /// Time limit in seconds; `None` for no limit.
    pub time_limit: Option<f64>,
    /// Absolute duality-gap tolerance.
    pub tol_gap_abs: f64,
    /// Relative duality-gap tolerance.
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    pub tol_feas: f64,
    /// Trades at most this large are snapped to zero in accepted solutions.
    pub trade_tolerance: f64,
    /// Raise `InvalidBounds` instead of returning the fallback allocation.
    pub strict_bounds: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            verbose: false,
            max_iter: 200,
            time_limit: None,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            trade_tolerance: 1e-6,
            strict_bounds: false,
        }
    }
}

impl Settings {
    /// Check that tolerances are positive and limits usable.
    pub fn validate(&self) -> RebalanceResult<()> {
        let positive = [
            ("tol_gap_abs", self.tol_gap_abs),
            ("tol_gap_rel", self.tol_gap_rel),
            ("tol_feas", self.tol_feas),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RebalanceError::InvalidParameter {
                    field,
                    reason: format!("must be positive and finite, got {}", value),
                });
            }
        }
        if !(self.trade_tolerance >= 0.0 && self.trade_tolerance.is_finite()) {
            return Err(RebalanceError::InvalidParameter {
                field: "trade_tolerance",
                reason: format!("must be nonnegative and finite, got {}", self.trade_tolerance),
            });
        }
        if let Some(limit) = self.time_limit {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(RebalanceError::InvalidParameter {
                    field: "time_limit",
                    reason: format!("must be positive and finite, got {}", limit),
                });
            }
        }
        if self.max_iter == 0 {
            return Err(RebalanceError::InvalidParameter {
                field: "max_iter",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
