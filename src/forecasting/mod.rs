//! forecasting — probabilistic lag-regression forecasting.
//!
//! Purpose
//! -------
//! Turn one or more time series (plus optional past/future covariates and
//! static covariates) into a supervised dataset through fixed lag windows,
//! train an ensemble of regressors on it, and roll the ensemble forward to
//! produce stochastic multi-step forecasts under a quantile, Poisson, or
//! Gaussian likelihood.
//!
//! Key behaviors
//! -------------
//! - [`core`] holds the validated inputs ([`TimeSeries`], [`LagSpec`],
//!   [`ForecasterOptions`]), the [`LagFeatureBuilder`], the
//!   [`ModelEnsemble`], and the likelihood sampler.
//! - [`models`] holds [`RegressionForecaster`], which owns the fit/predict
//!   lifecycle, the rollout loop, and the RNG.
//! - [`errors`] defines [`ForecastError`] / [`ForecastResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Configuration errors surface at construction; data-shape errors
//!   surface before any training or rollout work is done.
//! - Regressors are reached only through
//!   [`Regressor`](crate::regression::traits::Regressor), so any
//!   implementation (the bundled `LinearRegressor` or an external
//!   learner) can back the forecaster.
//!
//! Downstream usage
//! ----------------
//! - Build a [`ForecasterOptions`], construct a
//!   [`RegressionForecaster`] with a regressor template, `fit` it on a
//!   [`SeriesSet`], and `predict` stochastic forecasts that can be scored
//!   by [`crate::anomaly`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; the end-to-end pipeline is covered
//!   in `tests/forecast_pipeline.rs`.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    ForecasterOptions, FutureLags, LagFeatureBuilder, LagSpec, Lags, Likelihood, ModelEnsemble,
    ModelKey, ParameterForecast, Prediction, QuantileLevels, SeriesSet, StochasticForecast,
    TimeSeries,
};

pub use self::errors::{ForecastError, ForecastResult};

pub use self::models::{FitSummary, ForecasterState, RegressionForecaster};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_forecasting::forecasting::prelude::*;
//
// to import the main forecasting surface in a single line.

pub mod prelude {
    pub use super::{
        FitSummary, ForecastError, ForecastResult, ForecasterOptions, ForecasterState, FutureLags,
        LagSpec, Lags, Likelihood, ModelEnsemble, ModelKey, ParameterForecast, Prediction,
        QuantileLevels, RegressionForecaster, SeriesSet, StochasticForecast, TimeSeries,
    };
}
