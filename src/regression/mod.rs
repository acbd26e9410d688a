//! regression — regressor capability contract and a reference implementation.
//!
//! Purpose
//! -------
//! Separate "what the forecaster needs from a learner" from any particular
//! learner. [`traits::Regressor`] is the seam; [`linear::LinearRegressor`]
//! is a maximum-likelihood linear model that satisfies it for every
//! objective (point, quantile, Poisson, Gaussian with uncertainty).
//!
//! Key behaviors
//! -------------
//! - [`traits`]: `Regressor`, `Objective`, `EvalSet`.
//! - [`objectives`]: per-column log-likelihoods wired into the optimizer.
//! - [`linear`]: feature standardization, intercept-only warm starts,
//!   L-BFGS fits, and link-aware prediction.
//! - [`errors`]: `RegressorError` / `RegressorResult`.
//!
//! Downstream usage
//! ----------------
//! - `forecasting::models::forecaster::RegressionForecaster` is generic
//!   over `Regressor`; plug in [`LinearRegressor`] or any other
//!   implementation (e.g. a wrapper around a boosting library).

pub mod errors;
pub mod linear;
pub mod objectives;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{RegressorError, RegressorResult};
pub use self::linear::{LinearRegressor, LinearRegressorOptions};
pub use self::traits::{EvalSet, Objective, Regressor};

pub mod prelude {
    pub use super::errors::{RegressorError, RegressorResult};
    pub use super::linear::{LinearRegressor, LinearRegressorOptions};
    pub use super::traits::{EvalSet, Objective, Regressor};
}
