//! End-to-end rebalance tests with the Clarabel backend.

use robust_rebalance::prelude::*;

const TOL: f64 = 1e-4;

fn dv(values: &[f64]) -> DVector<f64> {
    DVector::from_column_slice(values)
}

/// Two assets held equally, no cash, no risk and no costs.
fn two_asset_market(mean: [f64; 2]) -> MarketState {
    MarketState {
        idio_mean: dv(&mean),
        ..MarketState::new(dv(&[0.5, 0.5]), 0.0, 1)
    }
}

/// A market with factors, costs and uncertainty in every term.
fn full_market() -> MarketState {
    MarketState {
        idio_mean: dv(&[0.01, 0.02, 0.015, 0.03]),
        factor_mean: dv(&[0.04, 0.01]),
        risk_free: 0.005,
        factor_covariance_chol: DMatrix::from_row_slice(2, 2, &[0.15, 0.0, 0.05, 0.1]),
        idio_volas: dv(&[0.1, 0.2, 0.15, 0.25]),
        factor_loadings: DMatrix::from_row_slice(
            4,
            2,
            &[1.0, 0.2, 0.8, -0.3, 1.2, 0.5, 0.6, 1.0],
        ),
        kappa_short: dv(&[0.01, 0.01, 0.02, 0.02]),
        kappa_borrow: 0.01,
        kappa_spread: dv(&[0.001, 0.002, 0.001, 0.003]),
        kappa_impact: dv(&[0.01, 0.02, 0.01, 0.02]),
        ..MarketState::new(dv(&[0.25, 0.25, 0.25, 0.15]), 0.1, 2)
    }
}

fn full_params() -> RebalanceParameters {
    RebalanceParameters {
        w_lower: DVector::from_element(4, -0.2),
        w_upper: DVector::from_element(4, 0.6),
        c_lower: -0.2,
        c_upper: 0.5,
        z_lower: DVector::from_element(4, -0.3),
        z_upper: DVector::from_element(4, 0.3),
        turnover_limit: 0.5,
        leverage_limit: 1.5,
        risk_target: 0.3,
        rho_mean: DVector::from_element(4, 0.002),
        rho_covariance: 0.02,
        gamma_hold: 1.0,
        gamma_trade: 1.0,
        gamma_turn: 0.1,
        gamma_leverage: 0.1,
        gamma_risk: 0.5,
        soft: SoftTargets {
            turnover: Some(0.2),
            leverage: Some(1.2),
            risk: Some(0.15),
        },
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_concentrates_in_higher_return_asset() {
    let market = two_asset_market([0.10, 0.05]);
    let result = rebalance(&market, &RebalanceParameters::new(2)).unwrap();

    assert!(result.success, "status {}", result.status);
    assert!((result.weights[0] - 1.0).abs() < TOL);
    assert!(result.weights[1].abs() < TOL);
    assert!(result.cash.abs() < TOL);
    assert!((result.objective_value.unwrap() - 0.10).abs() < TOL);
    assert!((result.trades[0] - 0.5).abs() < TOL);
}

#[test]
fn test_frozen_trades_keep_position() {
    let market = MarketState {
        idio_mean: dv(&[0.1]),
        ..MarketState::new(dv(&[1.0]), 0.0, 1)
    };
    let params = RebalanceParameters {
        z_lower: dv(&[0.0]),
        z_upper: dv(&[0.0]),
        ..RebalanceParameters::new(1)
    };
    let result = rebalance(&market, &params).unwrap();

    assert_eq!(result.weights[0], 1.0);
    assert_eq!(result.cash, 0.0);
    assert!(result.is_unchanged());
}

#[test]
fn test_zero_risk_target_moves_to_cash() {
    let market = MarketState {
        idio_mean: dv(&[0.10, 0.05]),
        idio_volas: dv(&[0.2, 0.3]),
        ..MarketState::new(dv(&[0.5, 0.5]), 0.0, 0)
    };
    let params = RebalanceParameters {
        risk_target: 0.0,
        ..RebalanceParameters::new(2)
    };
    let result = rebalance(&market, &params).unwrap();

    assert!(result.success, "status {}", result.status);
    assert!(result.weights.iter().all(|w| w.abs() < 1e-3));
    assert!((result.cash - 1.0).abs() < 1e-3);
}

#[test]
fn test_zero_turnover_limit_keeps_previous_weights() {
    let market = MarketState {
        idio_mean: dv(&[0.10, 0.05]),
        ..MarketState::new(dv(&[0.4, 0.4]), 0.2, 1)
    };
    let params = RebalanceParameters {
        turnover_limit: 0.0,
        ..RebalanceParameters::new(2)
    };
    let result = rebalance(&market, &params).unwrap();

    assert_eq!(result.weights, market.w_prev);
    assert_eq!(result.cash, market.c_prev);
    assert!(result.is_unchanged());
}

#[test]
fn test_boundary_concentration() {
    let market = MarketState {
        idio_mean: dv(&[0.02, 0.08, 0.05]),
        ..MarketState::new(DVector::from_element(3, 1.0 / 3.0), 0.0, 1)
    };
    let result = rebalance(&market, &RebalanceParameters::new(3)).unwrap();

    assert!(result.success);
    assert!(result.weights[0].abs() < TOL);
    assert!((result.weights[1] - 1.0).abs() < TOL);
    assert!(result.weights[2].abs() < TOL);
}

// ============================================================================
// Individual terms
// ============================================================================

#[test]
fn test_risk_target_binds() {
    // 0.2 w <= 0.1
    let market = MarketState {
        idio_mean: dv(&[0.1]),
        idio_volas: dv(&[0.2]),
        ..MarketState::new(dv(&[0.0]), 1.0, 1)
    };
    let params = RebalanceParameters {
        risk_target: 0.1,
        ..RebalanceParameters::new(1)
    };
    let result = rebalance(&market, &params).unwrap();

    assert!(result.success);
    assert!((result.weights[0] - 0.5).abs() < TOL);
    assert!((result.cash - 0.5).abs() < TOL);
    let breakdown = result.breakdown.unwrap();
    assert!((breakdown.risk_wc - 0.1).abs() < TOL);
}

#[test]
fn test_covariance_uncertainty_tightens_risk() {
    // sqrt((0.2 w)^2 + (0.5 * 0.2 w)^2) <= 0.1
    let market = MarketState {
        idio_mean: dv(&[0.1]),
        idio_volas: dv(&[0.2]),
        ..MarketState::new(dv(&[0.0]), 1.0, 1)
    };
    let params = RebalanceParameters {
        risk_target: 0.1,
        rho_covariance: 0.25,
        ..RebalanceParameters::new(1)
    };
    let result = rebalance(&market, &params).unwrap();

    let expected = 0.1 / (0.2 * 1.25_f64.sqrt());
    assert!(result.success);
    assert!((result.weights[0] - expected).abs() < TOL);
}

#[test]
fn test_mean_uncertainty_removes_edge() {
    let market = MarketState {
        idio_mean: dv(&[0.1]),
        ..MarketState::new(dv(&[0.5]), 0.5, 1)
    };
    let params = RebalanceParameters {
        rho_mean: dv(&[0.15]),
        ..RebalanceParameters::new(1)
    };
    let result = rebalance(&market, &params).unwrap();

    assert!(result.success);
    assert!(result.weights[0].abs() < TOL);
    assert!((result.cash - 1.0).abs() < TOL);
}

#[test]
fn test_soft_turnover_penalty() {
    // Gain 0.05 per unit moved, penalty 1 per unit of turnover above 0.1
    let market = two_asset_market([0.10, 0.05]);
    let params = RebalanceParameters {
        gamma_turn: 1.0,
        soft: SoftTargets {
            turnover: Some(0.1),
            ..SoftTargets::default()
        },
        ..RebalanceParameters::new(2)
    };
    let result = rebalance(&market, &params).unwrap();

    assert!(result.success);
    assert!((result.weights[0] - 0.6).abs() < TOL);
    assert!((result.weights[1] - 0.4).abs() < TOL);
    assert!((result.breakdown.unwrap().turnover - 0.1).abs() < TOL);
}

#[test]
fn test_spread_cost_prevents_trading() {
    let market = MarketState {
        kappa_spread: dv(&[1.0, 1.0]),
        ..two_asset_market([0.10, 0.05])
    };
    let params = RebalanceParameters {
        gamma_trade: 1.0,
        ..RebalanceParameters::new(2)
    };
    let result = rebalance(&market, &params).unwrap();

    assert!(result.success);
    assert!((result.weights[0] - 0.5).abs() < 1e-6);
    assert!((result.weights[1] - 0.5).abs() < 1e-6);
}

#[test]
fn test_market_impact_limits_trade_size() {
    // maximize 0.05 d - 2 * 0.1 * d^1.5, so d = (0.05 / 0.3)^2
    let market = MarketState {
        kappa_impact: dv(&[0.1, 0.1]),
        ..two_asset_market([0.10, 0.05])
    };
    let params = RebalanceParameters {
        gamma_trade: 1.0,
        ..RebalanceParameters::new(2)
    };
    let result = rebalance(&market, &params).unwrap();

    let shift = (0.05_f64 / 0.3).powi(2);
    assert!(result.success);
    assert!((result.weights[0] - (0.5 + shift)).abs() < 1e-3);
    assert!((result.weights[1] - (0.5 - shift)).abs() < 1e-3);
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_budget_and_bounds_hold() {
    let market = full_market();
    let params = full_params();
    let result = rebalance(&market, &params).unwrap();

    assert!(result.success, "status {}", result.status);
    assert!((result.weights.sum() + result.cash - 1.0).abs() < 1e-6);
    for i in 0..4 {
        assert!(result.weights[i] >= params.w_lower[i] - 1e-6);
        assert!(result.weights[i] <= params.w_upper[i] + 1e-6);
        assert!(result.trades[i] >= params.z_lower[i] - 1e-6);
        assert!(result.trades[i] <= params.z_upper[i] + 1e-6);
    }
    assert!(result.cash >= params.c_lower - 1e-6);
    assert!(result.cash <= params.c_upper + 1e-6);

    let breakdown = result.breakdown.unwrap();
    assert!(breakdown.leverage <= params.leverage_limit + 1e-6);
    assert!(breakdown.turnover <= params.turnover_limit + 1e-6);
    assert!(breakdown.risk_wc <= params.risk_target + 1e-6);

    let risk = RiskModel::new(&market).worst_case_risk(&result.weights, params.rho_covariance);
    assert!((breakdown.risk_wc - risk).abs() < 1e-9);
}

#[test]
fn test_deterministic() {
    let market = full_market();
    let params = full_params();
    let first = rebalance(&market, &params).unwrap();
    let second = rebalance(&market, &params).unwrap();

    assert_eq!(first.status, second.status);
    assert!((&first.weights - &second.weights).amax() < 1e-6);
    assert!((first.cash - second.cash).abs() < 1e-6);
}

#[test]
fn test_inputs_are_not_mutated() {
    let market = full_market();
    let params = full_params();
    let _ = rebalance(&market, &params).unwrap();
    assert_eq!(market, full_market());
    assert_eq!(params, full_params());
}

// ============================================================================
// Fallback and errors
// ============================================================================

#[test]
fn test_infeasible_program_falls_back() {
    // Weights and cash cannot reach the budget
    let market = two_asset_market([0.10, 0.05]);
    let params = RebalanceParameters {
        w_upper: DVector::from_element(2, 0.2),
        c_upper: 0.1,
        ..RebalanceParameters::new(2)
    };
    let result = rebalance(&market, &params).unwrap();

    assert!(!result.success);
    assert_eq!(result.status, SolveStatus::Infeasible);
    assert_eq!(result.weights, market.w_prev);
    assert_eq!(result.cash, market.c_prev);
    assert!(result.objective_value.is_none());
}

#[test]
fn test_inverted_bounds_fall_back_without_solving() {
    let market = two_asset_market([0.10, 0.05]);
    let mut params = RebalanceParameters::new(2);
    params.w_lower[0] = 0.8;
    params.w_upper[0] = 0.2;

    let result = rebalance(&market, &params).unwrap();
    assert!(!result.success);
    assert_eq!(result.status, SolveStatus::Infeasible);
    assert_eq!(result.weights, market.w_prev);
    assert!(result.is_unchanged());
}

#[test]
fn test_inverted_bounds_strict() {
    let market = two_asset_market([0.10, 0.05]);
    let mut params = RebalanceParameters::new(2);
    params.w_lower[1] = 0.8;
    params.w_upper[1] = 0.2;

    let rebalancer = Rebalancer::new().with_settings(Settings {
        strict_bounds: true,
        ..Settings::default()
    });
    match rebalancer.rebalance(&market, &params) {
        Err(RebalanceError::InvalidBounds { field, index, .. }) => {
            assert_eq!(field, "weights");
            assert_eq!(index, Some(1));
        }
        other => panic!("Expected InvalidBounds, got {:?}", other),
    }
}

#[test]
fn test_dimension_mismatch() {
    let market = two_asset_market([0.10, 0.05]);
    let params = RebalanceParameters::new(3);
    assert!(matches!(
        rebalance(&market, &params),
        Err(RebalanceError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_negative_penalty_is_rejected() {
    let market = two_asset_market([0.10, 0.05]);
    let params = RebalanceParameters {
        gamma_hold: -0.5,
        ..RebalanceParameters::new(2)
    };
    assert!(matches!(
        rebalance(&market, &params),
        Err(RebalanceError::InvalidParameter { field: "gamma_hold", .. })
    ));
}

#[test]
fn test_invalid_settings_are_rejected() {
    let market = two_asset_market([0.10, 0.05]);
    let rebalancer = Rebalancer::new().with_settings(Settings {
        tol_gap_rel: -1.0,
        ..Settings::default()
    });
    assert!(matches!(
        rebalancer.rebalance(&market, &RebalanceParameters::new(2)),
        Err(RebalanceError::InvalidParameter { .. })
    ));
}
