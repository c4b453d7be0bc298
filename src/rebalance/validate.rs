//! Shared input checks.

use nalgebra::{DMatrix, DVector};

use crate::error::{RebalanceError, RebalanceResult};

pub(crate) fn check_len(field: &'static str, v: &DVector<f64>, n: usize) -> RebalanceResult<()> {
    if v.len() == n {
        Ok(())
    } else {
        Err(RebalanceError::DimensionMismatch {
            field,
            expected: format!("({},)", n),
            got: format!("({},)", v.len()),
        })
    }
}

pub(crate) fn check_shape(
    field: &'static str,
    m: &DMatrix<f64>,
    rows: usize,
    cols: usize,
) -> RebalanceResult<()> {
    if m.nrows() == rows && m.ncols() == cols {
        Ok(())
    } else {
        Err(RebalanceError::DimensionMismatch {
            field,
            expected: format!("({}, {})", rows, cols),
            got: format!("({}, {})", m.nrows(), m.ncols()),
        })
    }
}

pub(crate) fn check_nonneg(field: &'static str, value: f64) -> RebalanceResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(RebalanceError::InvalidParameter {
            field,
            reason: format!("must be nonnegative and finite, got {}", value),
        })
    }
}

pub(crate) fn check_nonneg_vec(field: &'static str, v: &DVector<f64>) -> RebalanceResult<()> {
    match v.iter().position(|x| !(x.is_finite() && *x >= 0.0)) {
        None => Ok(()),
        Some(i) => Err(RebalanceError::InvalidParameter {
            field,
            reason: format!("entry {} must be nonnegative and finite, got {}", i, v[i]),
        }),
    }
}

pub(crate) fn check_finite_vec(field: &'static str, v: &DVector<f64>) -> RebalanceResult<()> {
    match v.iter().position(|x| !x.is_finite()) {
        None => Ok(()),
        Some(i) => Err(RebalanceError::InvalidParameter {
            field,
            reason: format!("entry {} must be finite, got {}", i, v[i]),
        }),
    }
}

pub(crate) fn check_finite(field: &'static str, value: f64) -> RebalanceResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RebalanceError::InvalidParameter {
            field,
            reason: format!("must be finite, got {}", value),
        })
    }
}
