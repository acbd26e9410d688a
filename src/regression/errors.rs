//! regression::errors — error surface for regressors.
//!
//! Purpose
//! -------
//! Give every [`Regressor`](crate::regression::traits::Regressor)
//! implementation a shared error type so the forecaster can wrap training
//! and inference failures without knowing which regressor produced them.
//!
//! Conventions
//! -----------
//! - Shape errors carry both the expected and the observed size.
//! - Optimizer failures are wrapped, never flattened into strings, so
//!   callers can still match on the underlying [`OptError`].

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::optimization::errors::OptError;

/// Result alias for regressor operations.
pub type RegressorResult<T> = Result<T, RegressorError>;

#[derive(Debug, Clone, PartialEq)]
pub enum RegressorError {
    /// `predict`/`export` called before `fit`.
    NotFitted,

    /// Training matrix has no rows or no columns.
    EmptyTrainingSet { rows: usize, cols: usize },

    /// Two arrays that must agree on a dimension do not.
    ShapeMismatch { what: &'static str, expected: usize, found: usize },

    /// A target value is outside the objective's support or not finite.
    InvalidTarget { row: usize, col: usize, value: f64, reason: &'static str },

    /// A feature value is not finite.
    InvalidFeature { row: usize, col: usize, value: f64 },

    /// Ridge penalty must be finite and non-negative.
    InvalidPenalty { value: f64 },

    /// Quantile objective level outside (0, 1).
    InvalidQuantileLevel { alpha: f64 },

    /// The likelihood optimizer failed for one output column.
    Optimization { output: usize, source: OptError },
}

impl std::error::Error for RegressorError {}

impl std::fmt::Display for RegressorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegressorError::NotFitted => write!(f, "Regressor has not been fitted"),
            RegressorError::EmptyTrainingSet { rows, cols } => {
                write!(f, "Training set is empty: {rows} rows, {cols} columns")
            }
            RegressorError::ShapeMismatch { what, expected, found } => {
                write!(f, "Shape mismatch for {what}: expected {expected}, found {found}")
            }
            RegressorError::InvalidTarget { row, col, value, reason } => {
                write!(f, "Invalid target at row {row}, column {col}: {value}: {reason}")
            }
            RegressorError::InvalidFeature { row, col, value } => {
                write!(f, "Invalid feature at row {row}, column {col}: {value}, must be finite")
            }
            RegressorError::InvalidPenalty { value } => {
                write!(f, "Invalid ridge penalty {value}: must be finite and non-negative")
            }
            RegressorError::InvalidQuantileLevel { alpha } => {
                write!(f, "Invalid quantile level {alpha}: must lie strictly inside (0, 1)")
            }
            RegressorError::Optimization { output, source } => {
                write!(f, "Optimization failed for output column {output}: {source}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<RegressorError> for PyErr {
    fn from(err: RegressorError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
