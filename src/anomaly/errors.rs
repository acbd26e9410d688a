//! anomaly::errors — error surface for window NLL scoring.
//!
//! Purpose
//! -------
//! Report shape problems between a stochastic forecast and the series it
//! is scored against, fitted parameters no distribution can take, and
//! (on request) support violations that were otherwise returned as `+∞`
//! scores.
//!
//! Conventions
//! -----------
//! - Out-of-support true values are not errors by default: they score
//!   `+∞` and are listed on `WindowScores`. `DistributionSupport` is only
//!   produced by `WindowScores::ensure_supported`.
//! - `time` payloads are absolute times of the window end.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for scoring operations.
pub type ScoreResult<T> = Result<T, ScoreError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Window length must be at least one.
    InvalidWindow { window: usize },

    /// Fewer scored time steps than the window length.
    WindowTooLong { window: usize, length: usize },

    /// Forecast and true series disagree on the number of time steps.
    LengthMismatch { forecast: usize, actual: usize },

    /// Forecast and true series disagree on the number of components.
    ComponentMismatch { forecast: usize, actual: usize },

    /// The forecast carries no samples.
    NoSamples,

    /// Forecast and true series share no time step.
    NoOverlap { forecast: (i64, i64), actual: (i64, i64) },

    /// The parameter fitted from a window is outside the family's domain.
    InvalidFittedParameter { time: i64, component: usize, value: f64 },

    /// At least one true value lies outside the fitted distribution's support.
    DistributionSupport { time: i64, component: usize, value: f64, count: usize },
}

impl std::error::Error for ScoreError {}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::InvalidWindow { window } => {
                write!(f, "Invalid window {window}: must be at least 1")
            }
            ScoreError::WindowTooLong { window, length } => {
                write!(f, "Window {window} is longer than the {length} scored time steps")
            }
            ScoreError::LengthMismatch { forecast, actual } => write!(
                f,
                "Forecast has {forecast} time steps but the true series has {actual}"
            ),
            ScoreError::ComponentMismatch { forecast, actual } => write!(
                f,
                "Forecast has {forecast} components but the true series has {actual}"
            ),
            ScoreError::NoSamples => write!(f, "Forecast has no samples"),
            ScoreError::NoOverlap { forecast, actual } => write!(
                f,
                "Forecast span [{}, {}) does not overlap true series span [{}, {})",
                forecast.0, forecast.1, actual.0, actual.1
            ),
            ScoreError::InvalidFittedParameter { time, component, value } => write!(
                f,
                "Fitted parameter {value} for window ending at {time}, component {component} is invalid"
            ),
            ScoreError::DistributionSupport { time, component, value, count } => write!(
                f,
                "{count} true value(s) outside the fitted distribution's support, first {value} at \
                 time {time}, component {component}"
            ),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<ScoreError> for PyErr {
    fn from(err: ScoreError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
