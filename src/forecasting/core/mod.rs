//! core — series, lags, feature building, ensembles, and sampling.
//!
//! Purpose
//! -------
//! Collect the building blocks the regression forecaster composes: the
//! validated series container, lag specifications, the lag feature builder
//! that tabularizes series, the keyed model ensemble, likelihood variants
//! with their sampler, construction-time options, and forecast containers.
//!
//! Key behaviors
//! -------------
//! - [`TimeSeries`] and [`LagSpec`] validate on construction so later
//!   stages only see well-formed inputs.
//! - [`LagFeatureBuilder`] builds `(X, Y)` for training and writes single
//!   feature rows for the rollout, from the same layout.
//! - [`ModelEnsemble`] answers `predict(key, X)` whether one model or one
//!   per quantile is stored.
//! - [`sample`], [`point_values`], and [`likelihood_parameters`] interpret
//!   raw regressor output under a [`Likelihood`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Time indexes are absolute `i64`; covariates align to targets by time,
//!   not by row.
//! - Raw regressor output is `[rows, outputs, params]`, with `params`
//!   fixed by the likelihood.
//!
//! Conventions
//! -----------
//! - Feature rows are lag-major, component-minor; multi-output labels are
//!   step-major.
//! - No logging happens here except a `debug!` summary of each built
//!   training set.

pub mod ensemble;
pub mod forecasts;
pub mod lags;
pub mod likelihood;
pub mod options;
pub mod sampling;
pub mod series;
pub mod tabularize;

pub use self::ensemble::{ModelEnsemble, ModelKey};
pub use self::forecasts::{ParameterForecast, Prediction, StochasticForecast};
pub use self::lags::{FutureLags, LagSpec, Lags};
pub use self::likelihood::{DEFAULT_QUANTILES, Likelihood, QuantileLevels};
pub use self::options::ForecasterOptions;
pub use self::sampling::{likelihood_parameters, point_values, sample};
pub use self::series::TimeSeries;
pub use self::tabularize::{History, InputSignature, LagFeatureBuilder, SeriesSet, TrainingSet};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_forecasting::forecasting::core::prelude::*;
//
// to import the main forecasting core surface in a single line.

pub mod prelude {
    pub use super::ensemble::{ModelEnsemble, ModelKey};
    pub use super::forecasts::{ParameterForecast, Prediction, StochasticForecast};
    pub use super::lags::{FutureLags, LagSpec, Lags};
    pub use super::likelihood::{Likelihood, QuantileLevels};
    pub use super::options::ForecasterOptions;
    pub use super::series::TimeSeries;
    pub use super::tabularize::{LagFeatureBuilder, SeriesSet};
}
