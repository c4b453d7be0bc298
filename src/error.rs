//! Error types for the modeling layer and the rebalancer.

use thiserror::Error;

/// Errors raised while building, checking or compiling a convex program.
#[derive(Debug, Error)]
pub enum CvxError {
    /// Problem is not DCP.
    #[error("Problem is not DCP: {0}")]
    NotDcp(String),

    /// The conic solver failed internally.
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Two operands have incompatible shapes.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid problem specification.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
}

/// Result type for modeling-layer operations.
pub type Result<T> = std::result::Result<T, CvxError>;

/// Caller-visible configuration errors of a rebalance call.
///
/// Solver faults, infeasibility and unboundedness are never reported here;
/// they surface through [`crate::SolveResult::status`].
#[derive(Debug, Error)]
pub enum RebalanceError {
    /// An input vector or matrix does not agree with the declared (n, k).
    #[error("dimension mismatch in {field}: expected {expected}, got {got}")]
    DimensionMismatch {
        field: &'static str,
        expected: String,
        got: String,
    },

    /// A lower bound exceeds its paired upper bound.
    #[error("invalid bounds for {field}{}: lower {lower} > upper {upper}", index_suffix(.index))]
    InvalidBounds {
        field: &'static str,
        index: Option<usize>,
        lower: f64,
        upper: f64,
    },

    /// A cost, penalty, limit or model value is negative or not finite.
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// The assembled program could not be built or compiled.
    #[error(transparent)]
    Model(#[from] CvxError),
}

fn index_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!("[{i}]")).unwrap_or_default()
}

/// Result type for rebalance operations.
pub type RebalanceResult<T> = std::result::Result<T, RebalanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bounds_display() {
        let err = RebalanceError::InvalidBounds {
            field: "weights",
            index: Some(2),
            lower: 0.5,
            upper: 0.1,
        };
        assert_eq!(
            err.to_string(),
            "invalid bounds for weights[2]: lower 0.5 > upper 0.1"
        );

        let err = RebalanceError::InvalidBounds {
            field: "cash",
            index: None,
            lower: 1.0,
            upper: 0.0,
        };
        assert_eq!(err.to_string(), "invalid bounds for cash: lower 1 > upper 0");
    }

    #[test]
    fn test_model_error_is_transparent() {
        let err: RebalanceError = CvxError::NotDcp("objective".into()).into();
        assert_eq!(err.to_string(), "Problem is not DCP: objective");
    }
}
