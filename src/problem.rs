//! Convex programs: an objective, labeled constraints, and the path to a
//! conic solver.
//!
//! A `Problem` is checked against the DCP rules before it is stuffed, so a
//! violation surfaces as `CvxError::NotDcp` naming the offending part:
//! ```ignore
//! let solution = Problem::maximize(objective)
//!     .subject_to([budget, risk_limit])
//!     .solve()?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::debug;
use nalgebra::DVector;

use crate::canon::{canonicalize, ConeConstraint};
use crate::constraints::{Constraint, ConstraintKind};
use crate::error::{CvxError, Result};
use crate::expr::{Expr, ExprId, Shape};
use crate::settings::Settings;
use crate::solver::{stuff_problem, ClarabelSolver, ConicSolver, SolveStatus, StuffedProblem};

/// Objective type for optimization problems.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(Expr),
    /// Maximize the expression (internally converted to minimization).
    Maximize(Expr),
}

impl Objective {
    /// Get the expression being optimized.
    pub fn expr(&self) -> &Expr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    /// Check if this is a minimization.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }
}

/// Solution of a [`Problem`].
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status.
    pub status: SolveStatus,
    /// Optimal value, in the sense of the original objective (if optimal).
    pub value: Option<f64>,
    /// Primal values of the user variables (empty unless optimal).
    pub primal: HashMap<ExprId, DVector<f64>>,
    /// Solve time in seconds.
    pub solve_time: f64,
    /// Number of iterations.
    pub iterations: u32,
}

impl Solution {
    /// Get the value of a variable expression.
    pub fn get(&self, var: &Expr) -> Option<&DVector<f64>> {
        var.variable_id().and_then(|id| self.primal.get(&id))
    }
}

/// An optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The objective to optimize.
    pub objective: Objective,
    /// The constraints.
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Create a minimization problem.
    pub fn minimize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Minimize(expr),
            constraints: Vec::new(),
        }
    }

    /// Create a maximization problem.
    pub fn maximize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Maximize(expr),
            constraints: Vec::new(),
        }
    }

    /// Check if this problem is DCP-compliant.
    ///
    /// A problem is DCP if:
    /// - Minimize: objective is convex
    /// - Maximize: objective is concave
    /// - All constraints are DCP
    pub fn is_dcp(&self) -> bool {
        let obj_valid = match &self.objective {
            Objective::Minimize(e) => e.is_convex(),
            Objective::Maximize(e) => e.is_concave(),
        };
        obj_valid && self.constraints.iter().all(|c| c.is_dcp())
    }

    /// All user variables with their shapes, ordered by id.
    pub fn variables(&self) -> Vec<(ExprId, Shape)> {
        let mut vars = BTreeMap::new();
        self.objective.expr().collect_variables(&mut vars);
        for c in &self.constraints {
            c.expr.collect_variables(&mut vars);
        }
        vars.into_iter().collect()
    }

    /// Check DCP compliance and compile to conic form.
    pub fn stuff(&self) -> Result<StuffedProblem> {
        if !self.is_dcp() {
            return Err(CvxError::NotDcp(self.dcp_violation_message()));
        }

        let obj_expr = match &self.objective {
            Objective::Minimize(e) => e.clone(),
            Objective::Maximize(e) => Expr::Neg(Arc::new(e.clone())),
        };
        if obj_expr.shape().size() != 1 {
            return Err(CvxError::ShapeMismatch {
                expected: "()".into(),
                got: obj_expr.shape().to_string(),
            });
        }

        let obj_canon = canonicalize(&obj_expr)?;

        let mut all_vars: Vec<(ExprId, usize)> = self
            .variables()
            .into_iter()
            .map(|(id, shape)| (id, shape.size()))
            .collect();
        all_vars.extend(obj_canon.aux_vars);
        let mut cone_constraints = obj_canon.constraints;

        for constraint in &self.constraints {
            let canon = canonicalize(&constraint.expr)?;
            cone_constraints.push(match constraint.kind {
                ConstraintKind::Zero => ConeConstraint::Zero { a: canon.expr },
                ConstraintKind::NonNeg => ConeConstraint::NonNeg { a: canon.expr },
            });
            cone_constraints.extend(canon.constraints);
            all_vars.extend(canon.aux_vars);
        }

        let stuffed = stuff_problem(&obj_canon.expr, &cone_constraints, &all_vars)?;
        debug!(
            "stuffed problem: {} variables, {} rows (zero={}, nonneg={}, soc={}, power={})",
            stuffed.num_vars(),
            stuffed.num_rows(),
            stuffed.cone_dims.zero,
            stuffed.cone_dims.nonneg,
            stuffed.cone_dims.soc.len(),
            stuffed.cone_dims.power.len()
        );
        Ok(stuffed)
    }

    /// Solve the problem with Clarabel and default settings.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(&ClarabelSolver, &Settings::default())
    }

    /// Solve the problem with the given solver and settings.
    ///
    /// Non-optimal outcomes are returned as `Ok` with their status; `Err`
    /// means the problem could not be compiled or the solver faulted.
    pub fn solve_with<S: ConicSolver>(&self, solver: &S, settings: &Settings) -> Result<Solution> {
        let stuffed = self.stuff()?;
        let raw = solver.solve(&stuffed, settings)?;
        self.interpret(&stuffed, raw.status, &raw.x, raw.solve_time, raw.iterations)
    }

    /// Map a stacked solver point back to the problem's variables.
    pub fn interpret(
        &self,
        stuffed: &StuffedProblem,
        status: SolveStatus,
        x: &[f64],
        solve_time: f64,
        iterations: u32,
    ) -> Result<Solution> {
        let mut solution = Solution {
            status,
            value: None,
            primal: HashMap::new(),
            solve_time,
            iterations,
        };
        if !status.is_optimal() {
            return Ok(solution);
        }
        if x.len() != stuffed.num_vars() {
            return Err(CvxError::SolverError(format!(
                "solver returned {} values for {} variables",
                x.len(),
                stuffed.num_vars()
            )));
        }

        for (id, _) in self.variables() {
            if let Some((start, size)) = stuffed.var_map.get(id) {
                solution
                    .primal
                    .insert(id, DVector::from_column_slice(&x[start..start + size]));
            }
        }
        let value = stuffed.objective_at(x);
        solution.value = Some(if self.objective.is_minimize() {
            value
        } else {
            -value
        });
        Ok(solution)
    }

    /// Get a message describing why the problem is not DCP.
    pub fn dcp_violation_message(&self) -> String {
        let mut violations = Vec::new();

        match &self.objective {
            Objective::Minimize(e) if !e.is_convex() => {
                violations.push(format!(
                    "objective has curvature {:?} but must be convex for minimization",
                    e.curvature()
                ));
            }
            Objective::Maximize(e) if !e.is_concave() => {
                violations.push(format!(
                    "objective has curvature {:?} but must be concave for maximization",
                    e.curvature()
                ));
            }
            _ => {}
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if !c.is_dcp() {
                match &c.label {
                    Some(label) => violations.push(format!("constraint '{}' is not DCP", label)),
                    None => violations.push(format!("constraint {} is not DCP", i)),
                }
            }
        }

        if violations.is_empty() {
            "unknown DCP violation".into()
        } else {
            violations.join("; ")
        }
    }
}

/// Builder for constructing problems.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Add constraints to the problem.
    pub fn subject_to(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Add a single constraint.
    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Build the problem.
    pub fn build(self) -> Problem {
        Problem {
            objective: self.objective,
            constraints: self.constraints,
        }
    }

    /// Build and solve the problem with default settings.
    pub fn solve(self) -> Result<Solution> {
        self.build().solve()
    }
}
