//! Robust Rebalance Example
//!
//! Four assets driven by two factors, currently held equally with some
//! cash. The rebalance trades toward the better worst-case return while
//! paying spread and market impact, and keeps worst-case risk below 20%.

use robust_rebalance::prelude::*;

fn main() {
    println!("=== Robust Rebalance ===\n");

    #[rustfmt::skip]
    let market = MarketState {
        idio_mean: DVector::from_vec(vec![0.02, 0.01, 0.03, 0.00]),
        factor_mean: DVector::from_vec(vec![0.05, 0.02]),
        risk_free: 0.01,
        factor_covariance_chol: DMatrix::from_row_slice(2, 2, &[
            0.18, 0.00,
            0.03, 0.10,
        ]),
        idio_volas: DVector::from_vec(vec![0.15, 0.10, 0.25, 0.05]),
        factor_loadings: DMatrix::from_row_slice(4, 2, &[
            1.1, 0.2,
            0.8, 0.5,
            1.4, -0.3,
            0.2, 0.9,
        ]),
        kappa_short: DVector::from_element(4, 0.005),
        kappa_borrow: 0.01,
        kappa_spread: DVector::from_vec(vec![0.001, 0.001, 0.002, 0.0005]),
        kappa_impact: DVector::from_vec(vec![0.01, 0.01, 0.03, 0.005]),
        ..MarketState::new(DVector::from_element(4, 0.225), 0.1, 2)
    };

    let params = RebalanceParameters {
        w_lower: DVector::from_element(4, -0.1),
        w_upper: DVector::from_element(4, 0.5),
        c_lower: -0.1,
        c_upper: 0.3,
        z_lower: DVector::from_element(4, -0.2),
        z_upper: DVector::from_element(4, 0.2),
        turnover_limit: 0.3,
        leverage_limit: 1.2,
        risk_target: 0.2,
        rho_mean: DVector::from_element(4, 0.002),
        rho_covariance: 0.02,
        gamma_hold: 1.0,
        gamma_trade: 1.0,
        gamma_turn: 0.5,
        gamma_leverage: 0.5,
        gamma_risk: 1.0,
        soft: SoftTargets {
            turnover: Some(0.1),
            leverage: Some(1.0),
            risk: Some(0.15),
        },
    };

    let result = match rebalance(&market, &params) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Invalid input: {}", e);
            return;
        }
    };

    println!("Status: {}", result.status);
    if !result.success {
        println!("Keeping previous holdings.");
    }

    println!("\nAllocation:");
    let assets = ["A", "B", "C", "D"];
    for (i, name) in assets.iter().enumerate() {
        println!(
            "  Asset {}: {:6.2}%  (trade {:+6.2}%)",
            name,
            result.weights[i] * 100.0,
            result.trades[i] * 100.0
        );
    }
    println!("  Cash:    {:6.2}%", result.cash * 100.0);
    println!("  Gross trade: {:.2}%", result.gross_trade() * 100.0);

    if let Some(b) = result.breakdown {
        println!("\nBreakdown:");
        println!("  Worst-case return: {:.4}", b.return_wc);
        println!("  Worst-case risk:   {:.4}", b.risk_wc);
        println!("  Holding cost:      {:.6}", b.holding_cost);
        println!("  Trading cost:      {:.6}", b.trading_cost);
        println!("  Turnover:          {:.4}", b.turnover);
        println!("  Leverage:          {:.4}", b.leverage);
    }
    if let Some(value) = result.objective_value {
        println!("\nObjective: {:.6}", value);
    }
}
