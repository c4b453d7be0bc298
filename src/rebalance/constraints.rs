//! Hard constraints of the rebalance program.

use super::objective::RebalanceTerms;
use super::params::RebalanceParameters;
use crate::atoms::sum;
use crate::constraints::{Constraint, ConstraintExt};

/// Builds the budget, box, leverage, turnover and risk constraints.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintBuilder<'a> {
    params: &'a RebalanceParameters,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(params: &'a RebalanceParameters) -> Self {
        ConstraintBuilder { params }
    }

    /// All constraints, each labeled for DCP diagnostics.
    pub fn build(&self, terms: &RebalanceTerms) -> Vec<Constraint> {
        let p = self.params;
        vec![
            (sum(&terms.w) + &terms.c).equals(1.0).labeled("budget"),
            terms.w.geq(&p.w_lower).labeled("weight_lower"),
            terms.w.leq(&p.w_upper).labeled("weight_upper"),
            terms.c.geq(p.c_lower).labeled("cash_lower"),
            terms.c.leq(p.c_upper).labeled("cash_upper"),
            terms.z.geq(&p.z_lower).labeled("trade_lower"),
            terms.z.leq(&p.z_upper).labeled("trade_upper"),
            terms.leverage.leq(p.leverage_limit).labeled("leverage"),
            terms.turnover.leq(p.turnover_limit).labeled("turnover"),
            terms.risk_wc.leq(p.risk_target).labeled("risk"),
        ]
    }
}
