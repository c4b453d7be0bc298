//! Holdings and statistical model snapshot.

use nalgebra::{DMatrix, DVector};

use super::validate::{check_len, check_nonneg, check_nonneg_vec, check_shape};
use crate::error::{RebalanceError, RebalanceResult};

/// Current holdings plus the return and risk model for one rebalance.
///
/// `n` assets and `k` factors; every vector field has length `n` except
/// `factor_mean` (length `k`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarketState {
    /// Previous asset weights (n).
    pub w_prev: DVector<f64>,
    /// Previous cash weight.
    pub c_prev: f64,
    /// Idiosyncratic mean returns (n).
    pub idio_mean: DVector<f64>,
    /// Factor mean returns (k).
    pub factor_mean: DVector<f64>,
    /// Risk-free rate earned on cash.
    pub risk_free: f64,
    /// Lower Cholesky factor of the factor covariance (k x k).
    pub factor_covariance_chol: DMatrix<f64>,
    /// Idiosyncratic volatilities (n).
    pub idio_volas: DVector<f64>,
    /// Factor exposures F (n x k).
    pub factor_loadings: DMatrix<f64>,
    /// Per-asset shorting cost (n).
    pub kappa_short: DVector<f64>,
    /// Cost of borrowing cash.
    pub kappa_borrow: f64,
    /// Per-asset bid-ask spread cost (n).
    pub kappa_spread: DVector<f64>,
    /// Per-asset market impact coefficient (n).
    pub kappa_impact: DVector<f64>,
}

impl MarketState {
    /// Holdings with a zero model: no returns, no risk, no costs.
    ///
    /// Fill in the statistics with struct update syntax.
    pub fn new(w_prev: DVector<f64>, c_prev: f64, n_factors: usize) -> Self {
        let n = w_prev.len();
        MarketState {
            w_prev,
            c_prev,
            idio_mean: DVector::zeros(n),
            factor_mean: DVector::zeros(n_factors),
            risk_free: 0.0,
            factor_covariance_chol: DMatrix::zeros(n_factors, n_factors),
            idio_volas: DVector::zeros(n),
            factor_loadings: DMatrix::zeros(n, n_factors),
            kappa_short: DVector::zeros(n),
            kappa_borrow: 0.0,
            kappa_spread: DVector::zeros(n),
            kappa_impact: DVector::zeros(n),
        }
    }

    /// Number of assets.
    pub fn n_assets(&self) -> usize {
        self.w_prev.len()
    }

    /// Number of factors.
    pub fn n_factors(&self) -> usize {
        self.factor_mean.len()
    }

    /// Check dimensions against (n, k), finiteness, and cost signs.
    pub fn validate(&self) -> RebalanceResult<()> {
        let n = self.n_assets();
        let k = self.n_factors();
        if n == 0 {
            return Err(RebalanceError::DimensionMismatch {
                field: "w_prev",
                expected: "at least one asset".into(),
                got: "0".into(),
            });
        }

        check_len("idio_mean", &self.idio_mean, n)?;
        check_len("idio_volas", &self.idio_volas, n)?;
        check_len("kappa_short", &self.kappa_short, n)?;
        check_len("kappa_spread", &self.kappa_spread, n)?;
        check_len("kappa_impact", &self.kappa_impact, n)?;
        check_shape("factor_loadings", &self.factor_loadings, n, k)?;
        check_shape("factor_covariance_chol", &self.factor_covariance_chol, k, k)?;

        let finite = [
            ("w_prev", self.w_prev.as_slice()),
            ("idio_mean", self.idio_mean.as_slice()),
            ("factor_mean", self.factor_mean.as_slice()),
            ("factor_loadings", self.factor_loadings.as_slice()),
            ("factor_covariance_chol", self.factor_covariance_chol.as_slice()),
            ("c_prev", std::slice::from_ref(&self.c_prev)),
            ("risk_free", std::slice::from_ref(&self.risk_free)),
        ];
        for (field, values) in finite {
            if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                return Err(RebalanceError::InvalidParameter {
                    field,
                    reason: format!("must be finite, got {}", v),
                });
            }
        }

        check_nonneg_vec("idio_volas", &self.idio_volas)?;
        check_nonneg_vec("kappa_short", &self.kappa_short)?;
        check_nonneg_vec("kappa_spread", &self.kappa_spread)?;
        check_nonneg_vec("kappa_impact", &self.kappa_impact)?;
        check_nonneg("kappa_borrow", self.kappa_borrow)?;

        let chol = &self.factor_covariance_chol;
        for j in 0..k {
            if chol[(j, j)] < 0.0 {
                return Err(RebalanceError::InvalidParameter {
                    field: "factor_covariance_chol",
                    reason: format!("diagonal entry {} is negative", j),
                });
            }
            for i in 0..j {
                if chol[(i, j)] != 0.0 {
                    return Err(RebalanceError::InvalidParameter {
                        field: "factor_covariance_chol",
                        reason: format!("not lower-triangular at ({}, {})", i, j),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> MarketState {
        MarketState::new(DVector::from_vec(vec![0.5, 0.5]), 0.0, 1)
    }

    #[test]
    fn test_zero_model_is_valid() {
        let m = market();
        assert_eq!(m.n_assets(), 2);
        assert_eq!(m.n_factors(), 1);
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_dimension_mismatch() {
        let m = MarketState {
            idio_mean: DVector::zeros(3),
            ..market()
        };
        match m.validate() {
            Err(RebalanceError::DimensionMismatch { field, .. }) => assert_eq!(field, "idio_mean"),
            other => panic!("Expected DimensionMismatch, got {:?}", other),
        }

        let m = MarketState {
            factor_loadings: DMatrix::zeros(2, 2),
            ..market()
        };
        assert!(matches!(
            m.validate(),
            Err(RebalanceError::DimensionMismatch { field: "factor_loadings", .. })
        ));
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let m = MarketState {
            kappa_borrow: -0.1,
            ..market()
        };
        assert!(matches!(
            m.validate(),
            Err(RebalanceError::InvalidParameter { field: "kappa_borrow", .. })
        ));
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let m = MarketState {
            risk_free: f64::NAN,
            ..market()
        };
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_upper_triangular_chol_is_rejected() {
        let m = MarketState {
            factor_mean: DVector::zeros(2),
            factor_loadings: DMatrix::zeros(2, 2),
            factor_covariance_chol: DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.0, 1.0]),
            ..market()
        };
        assert!(matches!(
            m.validate(),
            Err(RebalanceError::InvalidParameter { field: "factor_covariance_chol", .. })
        ));
    }

    #[test]
    fn test_empty_portfolio_is_rejected() {
        let m = MarketState::new(DVector::zeros(0), 1.0, 0);
        assert!(matches!(
            m.validate(),
            Err(RebalanceError::DimensionMismatch { field: "w_prev", .. })
        ));
    }
}
