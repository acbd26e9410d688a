//! forecasting::errors — error taxonomy for series, lags, ensembles, and
//! the forecaster.
//!
//! Purpose
//! -------
//! Give the forecasting stack one error enum, [`ForecastError`], and the
//! alias [`ForecastResult<T>`]. Configuration mistakes (lags, likelihood,
//! quantiles, chunk length) are reported at construction; data-shape
//! problems (short histories, short covariates, mismatched components) are
//! reported before any partial work is committed.
//!
//! Conventions
//! -----------
//! - `series` payloads are indexes into the caller's series slice.
//! - Covariate classes are named `"target"`, `"past"`, or `"future"`.
//! - Regressor failures are wrapped unchanged in `Training`.
//! - Under `python-bindings`, every variant maps to `ValueError`.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::regression::errors::RegressorError;

/// Result alias for forecasting operations.
pub type ForecastResult<T> = Result<T, ForecastError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    // ---- Series ----
    /// A `TimeSeries` could not be constructed.
    InvalidSeries { reason: String },

    // ---- Configuration ----
    /// Lag specification violates its invariants.
    InvalidLags { class: &'static str, reason: String },

    /// Output chunk length must be at least one.
    InvalidOutputChunkLength { value: usize },

    /// Unknown likelihood tag.
    InvalidLikelihood { name: String },

    /// Quantile list malformed.
    InvalidQuantiles { reason: String },

    /// `max_samples_per_ts` must be positive when given.
    InvalidMaxSamples { value: usize },

    // ---- Data shape ----
    /// A series is too short for the configured lags/horizon.
    InsufficientHistory { series: usize, length: usize, required: usize },

    /// Covariates do not cover the required time range.
    InsufficientCovariates { series: usize, class: &'static str, required: (i64, i64), available: (i64, i64) },

    /// Lags were configured for a covariate class but no covariates given.
    MissingCovariates { class: &'static str },

    /// Covariates were given for a class that has no lags configured.
    UnexpectedCovariates { class: &'static str },

    /// Number of covariate series differs from number of target series.
    CovariateCountMismatch { class: &'static str, expected: usize, found: usize },

    /// Component count differs from the first series or from training.
    ComponentMismatch { class: &'static str, series: usize, expected: usize, found: usize },

    /// Static covariates missing on some series or of varying length.
    StaticCovariateMismatch { series: usize, expected: Option<usize>, found: Option<usize> },

    // ---- Prediction ----
    /// `predict` or `export` before a successful `fit`.
    NotFitted,

    /// Forecast horizon must be at least one.
    InvalidHorizon { n: usize },

    /// Sample count invalid for the configured likelihood.
    InvalidNumSamples { num_samples: usize, reason: &'static str },

    /// Likelihood parameters cannot be produced for this request.
    ParametersUnavailable { reason: &'static str },

    /// A regressor emitted a value the likelihood cannot use.
    InvalidParameter { name: &'static str, value: f64 },

    // ---- Ensemble ----
    /// A key that is not one of the declared quantile levels.
    UnknownQuantile { level: f64 },

    // ---- Wrapped ----
    /// The underlying regressor failed to train or predict.
    Training { source: RegressorError },

    /// Writing an exported model failed.
    Export { reason: String },
}

impl std::error::Error for ForecastError {}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Series ----
            ForecastError::InvalidSeries { reason } => write!(f, "Invalid series: {reason}"),

            // ---- Configuration ----
            ForecastError::InvalidLags { class, reason } => {
                write!(f, "Invalid {class} lags: {reason}")
            }
            ForecastError::InvalidOutputChunkLength { value } => {
                write!(f, "Invalid output chunk length {value}: must be at least 1")
            }
            ForecastError::InvalidLikelihood { name } => write!(
                f,
                "Invalid likelihood '{name}': valid options are 'quantile', 'poisson', 'gaussian'"
            ),
            ForecastError::InvalidQuantiles { reason } => {
                write!(f, "Invalid quantiles: {reason}")
            }
            ForecastError::InvalidMaxSamples { value } => {
                write!(f, "Invalid max_samples_per_ts {value}: must be positive")
            }

            // ---- Data shape ----
            ForecastError::InsufficientHistory { series, length, required } => write!(
                f,
                "Series {series} has {length} time steps, at least {required} are required"
            ),
            ForecastError::InsufficientCovariates { series, class, required, available } => {
                write!(
                    f,
                    "{class} covariates of series {series} span [{}, {}), required [{}, {})",
                    available.0, available.1, required.0, required.1
                )
            }
            ForecastError::MissingCovariates { class } => {
                write!(f, "{class} covariate lags are configured but no {class} covariates were given")
            }
            ForecastError::UnexpectedCovariates { class } => {
                write!(f, "{class} covariates were given but no {class} covariate lags are configured")
            }
            ForecastError::CovariateCountMismatch { class, expected, found } => write!(
                f,
                "Expected {expected} {class} covariate series (one per target), found {found}"
            ),
            ForecastError::ComponentMismatch { class, series, expected, found } => write!(
                f,
                "{class} series {series} has {found} components, expected {expected}"
            ),
            ForecastError::StaticCovariateMismatch { series, expected, found } => write!(
                f,
                "Static covariates of series {series} have dimension {found:?}, expected {expected:?}"
            ),

            // ---- Prediction ----
            ForecastError::NotFitted => write!(f, "Model has not been fitted"),
            ForecastError::InvalidHorizon { n } => {
                write!(f, "Invalid forecast horizon {n}: must be at least 1")
            }
            ForecastError::InvalidNumSamples { num_samples, reason } => {
                write!(f, "Invalid num_samples {num_samples}: {reason}")
            }
            ForecastError::ParametersUnavailable { reason } => {
                write!(f, "Likelihood parameters unavailable: {reason}")
            }
            ForecastError::InvalidParameter { name, value } => {
                write!(f, "Invalid likelihood parameter {name} = {value}")
            }

            // ---- Ensemble ----
            ForecastError::UnknownQuantile { level } => {
                write!(f, "Quantile {level} is not one of the declared levels")
            }

            // ---- Wrapped ----
            ForecastError::Training { source } => write!(f, "Regressor failure: {source}"),
            ForecastError::Export { reason } => write!(f, "Export failed: {reason}"),
        }
    }
}

impl From<RegressorError> for ForecastError {
    fn from(source: RegressorError) -> Self {
        match source {
            RegressorError::NotFitted => ForecastError::NotFitted,
            source => ForecastError::Training { source },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ForecastError> for PyErr {
    fn from(err: ForecastError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
