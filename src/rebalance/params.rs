//! Limits, uncertainty and penalty weights of one rebalance.

use nalgebra::DVector;

use super::validate::{check_finite, check_finite_vec, check_len, check_nonneg, check_nonneg_vec};
use crate::error::{RebalanceError, RebalanceResult};

/// Soft targets above which the positive-part penalties start.
///
/// An unset target falls back to the matching hard limit, so the penalty
/// only becomes active once the hard constraint itself is binding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SoftTargets {
    pub turnover: Option<f64>,
    pub leverage: Option<f64>,
    pub risk: Option<f64>,
}

/// Bounds, limits and penalty weights.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceParameters {
    /// Per-asset weight bounds (n).
    pub w_lower: DVector<f64>,
    pub w_upper: DVector<f64>,
    /// Cash bounds.
    pub c_lower: f64,
    pub c_upper: f64,
    /// Per-asset trade bounds (n).
    pub z_lower: DVector<f64>,
    pub z_upper: DVector<f64>,
    /// Hard limit on half the L1 norm of trades.
    pub turnover_limit: f64,
    /// Hard limit on the L1 norm of weights.
    pub leverage_limit: f64,
    /// Hard limit on worst-case risk.
    pub risk_target: f64,
    /// Per-asset mean-return uncertainty (n).
    pub rho_mean: DVector<f64>,
    /// Covariance uncertainty scale.
    pub rho_covariance: f64,
    pub gamma_hold: f64,
    pub gamma_trade: f64,
    pub gamma_turn: f64,
    pub gamma_leverage: f64,
    pub gamma_risk: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub soft: SoftTargets,
}

impl RebalanceParameters {
    /// Long-only, fully bounded defaults for `n` assets.
    ///
    /// Weights and cash in `[0, 1]`, trades in `[-1, 1]`, unit turnover,
    /// leverage and risk limits, no uncertainty and no penalties.
    pub fn new(n: usize) -> Self {
        RebalanceParameters {
            w_lower: DVector::zeros(n),
            w_upper: DVector::from_element(n, 1.0),
            c_lower: 0.0,
            c_upper: 1.0,
            z_lower: DVector::from_element(n, -1.0),
            z_upper: DVector::from_element(n, 1.0),
            turnover_limit: 1.0,
            leverage_limit: 1.0,
            risk_target: 1.0,
            rho_mean: DVector::zeros(n),
            rho_covariance: 0.0,
            gamma_hold: 0.0,
            gamma_trade: 0.0,
            gamma_turn: 0.0,
            gamma_leverage: 0.0,
            gamma_risk: 0.0,
            soft: SoftTargets::default(),
        }
    }

    /// Soft turnover target, defaulting to the hard limit.
    pub fn soft_turnover(&self) -> f64 {
        self.soft.turnover.unwrap_or(self.turnover_limit)
    }

    /// Soft leverage target, defaulting to the hard limit.
    pub fn soft_leverage(&self) -> f64 {
        self.soft.leverage.unwrap_or(self.leverage_limit)
    }

    /// Soft risk target, defaulting to the hard limit.
    pub fn soft_risk(&self) -> f64 {
        self.soft.risk.unwrap_or(self.risk_target)
    }

    /// Check lengths against `n`, finiteness, and the signs of limits,
    /// uncertainty and penalties.
    ///
    /// Bound ordering is checked separately by [`Self::check_bounds`].
    pub fn validate(&self, n: usize) -> RebalanceResult<()> {
        check_len("w_lower", &self.w_lower, n)?;
        check_len("w_upper", &self.w_upper, n)?;
        check_len("z_lower", &self.z_lower, n)?;
        check_len("z_upper", &self.z_upper, n)?;
        check_len("rho_mean", &self.rho_mean, n)?;

        check_finite_vec("w_lower", &self.w_lower)?;
        check_finite_vec("w_upper", &self.w_upper)?;
        check_finite_vec("z_lower", &self.z_lower)?;
        check_finite_vec("z_upper", &self.z_upper)?;
        check_finite("c_lower", self.c_lower)?;
        check_finite("c_upper", self.c_upper)?;
        check_nonneg_vec("rho_mean", &self.rho_mean)?;

        let nonneg = [
            ("turnover_limit", self.turnover_limit),
            ("leverage_limit", self.leverage_limit),
            ("risk_target", self.risk_target),
            ("rho_covariance", self.rho_covariance),
            ("gamma_hold", self.gamma_hold),
            ("gamma_trade", self.gamma_trade),
            ("gamma_turn", self.gamma_turn),
            ("gamma_leverage", self.gamma_leverage),
            ("gamma_risk", self.gamma_risk),
        ];
        for (field, value) in nonneg {
            check_nonneg(field, value)?;
        }

        let soft = [
            ("soft.turnover", self.soft.turnover),
            ("soft.leverage", self.soft.leverage),
            ("soft.risk", self.soft.risk),
        ];
        for (field, value) in soft {
            if let Some(v) = value {
                check_nonneg(field, v)?;
            }
        }
        Ok(())
    }

    /// First bound pair with `lower > upper`, as an error.
    pub fn check_bounds(&self) -> RebalanceResult<()> {
        let boxes = [
            ("weights", &self.w_lower, &self.w_upper),
            ("trades", &self.z_lower, &self.z_upper),
        ];
        for (field, lower, upper) in boxes {
            if let Some(i) = (0..lower.len().min(upper.len())).find(|&i| lower[i] > upper[i]) {
                return Err(RebalanceError::InvalidBounds {
                    field,
                    index: Some(i),
                    lower: lower[i],
                    upper: upper[i],
                });
            }
        }
        if self.c_lower > self.c_upper {
            return Err(RebalanceError::InvalidBounds {
                field: "cash",
                index: None,
                lower: self.c_lower,
                upper: self.c_upper,
            });
        }
        Ok(())
    }
}
