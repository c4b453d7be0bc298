//! The assembled rebalance program.

use log::debug;

use super::constraints::ConstraintBuilder;
use super::market::MarketState;
use super::objective::{ObjectiveBuilder, RebalanceTerms};
use super::params::RebalanceParameters;
use super::risk::RiskModel;
use crate::error::{CvxError, Result};
use crate::problem::Problem;
use crate::solver::StuffedProblem;

/// A DCP-checked maximization problem together with its terms.
#[derive(Debug, Clone)]
pub struct RebalanceProgram {
    pub terms: RebalanceTerms,
    pub problem: Problem,
}

impl RebalanceProgram {
    /// Assemble the objective and constraints for validated inputs.
    pub fn build(market: &MarketState, params: &RebalanceParameters) -> Result<Self> {
        let risk = RiskModel::new(market);
        let terms = RebalanceTerms::new(market, params, &risk);
        let objective = ObjectiveBuilder::new(params).build(&terms)?;
        let constraints = ConstraintBuilder::new(params).build(&terms);

        let problem = Problem::maximize(objective).subject_to(constraints).build();
        if !problem.is_dcp() {
            return Err(CvxError::NotDcp(problem.dcp_violation_message()));
        }
        debug!(
            "built rebalance program: {} assets, {} factors, {} constraints",
            market.n_assets(),
            market.n_factors(),
            problem.constraints.len()
        );
        Ok(RebalanceProgram { terms, problem })
    }

    /// Compile to conic form.
    pub fn stuff(&self) -> Result<StuffedProblem> {
        self.problem.stuff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    #[test]
    fn test_build_and_stuff() {
        let market = MarketState {
            idio_volas: DVector::from_vec(vec![0.1, 0.2, 0.15]),
            kappa_impact: DVector::from_element(3, 0.01),
            ..MarketState::new(DVector::from_vec(vec![0.3, 0.3, 0.3]), 0.1, 1)
        };
        let params = RebalanceParameters {
            gamma_trade: 1.0,
            ..RebalanceParameters::new(3)
        };
        let program = RebalanceProgram::build(&market, &params).unwrap();
        assert!(program.problem.is_dcp());

        let stuffed = program.stuff().unwrap();
        // w and c come first, followed by epigraph variables
        assert!(stuffed.num_vars() > 4);
        assert_eq!(stuffed.cone_dims.zero, 1);
        // one power cone per asset for the impact cost
        assert_eq!(stuffed.cone_dims.power.len(), 3);
        assert!(stuffed.cone_dims.power.iter().all(|a| (a - 2.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_unpriced_terms_are_omitted() {
        let market = MarketState {
            kappa_impact: DVector::from_element(2, 0.01),
            ..MarketState::new(DVector::from_vec(vec![0.5, 0.5]), 0.0, 1)
        };
        let program = RebalanceProgram::build(&market, &RebalanceParameters::new(2)).unwrap();
        let stuffed = program.stuff().unwrap();
        assert!(stuffed.cone_dims.power.is_empty());
    }
}
