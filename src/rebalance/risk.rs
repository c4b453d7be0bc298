//! Factor risk model.
//!
//! With factor covariance `Σ_f = L Lᵀ`, the portfolio variance splits as
//! `‖(F L)ᵀ w‖² + ‖σ ⊙ w‖²`, so the volatility is the Euclidean norm of the
//! factor and idiosyncratic parts. Each quantity is available both as a
//! symbolic expression in the weights and as a number for a concrete
//! weight vector.

use nalgebra::{DMatrix, DVector};

use super::market::MarketState;
use crate::atoms::{abs, dot, matmul, multiply, norm2, vstack};
use crate::expr::{constant, constant_matrix, constant_vec, Expr};

/// Risk model derived from a [`MarketState`].
#[derive(Debug, Clone)]
pub struct RiskModel {
    /// `F L`, the factor exposures scaled into factor-volatility units (n x k).
    loadings: DMatrix<f64>,
    idio_volas: DVector<f64>,
}

impl RiskModel {
    /// Build the model. The market must already be validated.
    pub fn new(market: &MarketState) -> Self {
        RiskModel {
            loadings: &market.factor_loadings * &market.factor_covariance_chol,
            idio_volas: market.idio_volas.clone(),
        }
    }

    /// Scaled loadings `F L` (n x k).
    pub fn loadings(&self) -> &DMatrix<f64> {
        &self.loadings
    }

    /// `‖(F L)ᵀ w‖₂`.
    pub fn factor_risk_expr(&self, w: &Expr) -> Expr {
        if self.loadings.ncols() == 0 {
            return constant(0.0);
        }
        norm2(&matmul(&constant_matrix(self.loadings.transpose()), w))
    }

    /// `‖σ ⊙ w‖₂`.
    pub fn idiosyncratic_risk_expr(&self, w: &Expr) -> Expr {
        norm2(&multiply(&constant_vec(self.idio_volas.clone()), w))
    }

    /// Portfolio volatility: the norm of the factor and idiosyncratic parts.
    pub fn risk_expr(&self, w: &Expr) -> Expr {
        norm2(&vstack(vec![
            self.factor_risk_expr(w),
            self.idiosyncratic_risk_expr(w),
        ]))
    }

    /// Volatility inflated by covariance uncertainty:
    /// `‖(risk, √ρ · volᵀ|w|)‖₂`.
    pub fn worst_case_risk_expr(&self, w: &Expr, rho_covariance: f64) -> Expr {
        if rho_covariance == 0.0 {
            return self.risk_expr(w);
        }
        let uncertainty = rho_covariance.sqrt() * dot(&constant_vec(self.asset_volatilities()), &abs(w));
        norm2(&vstack(vec![self.risk_expr(w), uncertainty]))
    }

    /// Total per-asset volatility `σ_i + ‖(F L)_i‖₂`.
    pub fn asset_volatilities(&self) -> DVector<f64> {
        DVector::from_fn(self.idio_volas.len(), |i, _| {
            self.idio_volas[i] + self.loadings.row(i).norm()
        })
    }

    /// Numeric factor risk of `w`.
    pub fn factor_risk(&self, w: &DVector<f64>) -> f64 {
        (self.loadings.transpose() * w).norm()
    }

    /// Numeric idiosyncratic risk of `w`.
    pub fn idiosyncratic_risk(&self, w: &DVector<f64>) -> f64 {
        self.idio_volas.component_mul(w).norm()
    }

    /// Numeric portfolio volatility of `w`.
    pub fn portfolio_risk(&self, w: &DVector<f64>) -> f64 {
        self.factor_risk(w).hypot(self.idiosyncratic_risk(w))
    }

    /// Numeric worst-case volatility of `w`.
    pub fn worst_case_risk(&self, w: &DVector<f64>, rho_covariance: f64) -> f64 {
        let uncertainty = rho_covariance.sqrt() * self.asset_volatilities().dot(&w.abs());
        self.portfolio_risk(w).hypot(uncertainty)
    }
}
