//! Forecaster configuration fixed at construction time.
//!
//! Purpose
//! -------
//! Bundle everything that shapes the supervised problem and the forecast
//! distribution: lags, output chunk length, likelihood, the multi-model
//! switch, and whether static covariates become features.
//!
//! Key behaviors
//! -------------
//! - [`ForecasterOptions::new`] validates the chunk length and the future
//!   lag bound eagerly.
//! - [`ForecasterOptions::min_train_series_length`] is the shortest target
//!   series `fit` accepts.
//!
//! Downstream usage
//! ----------------
//! - `RegressionForecaster::new` takes a `ForecasterOptions` and derives its
//!   feature builder and empty ensemble from it.
use crate::forecasting::{
    core::{lags::LagSpec, likelihood::Likelihood, tabularize::LagFeatureBuilder},
    errors::ForecastResult,
};

/// ForecasterOptions — construction-time configuration of a regression
/// forecaster.
///
/// Fields
/// ------
/// - `lags`: [`LagSpec`]
///   Target, past-covariate, and future-covariate lag offsets.
/// - `output_chunk_length`: `usize`
///   Steps predicted per model call. At least 1.
/// - `likelihood`: [`Likelihood`]
///   How regressor output becomes a forecast distribution.
/// - `multi_models`: `bool`
///   `true` trains one output per step of the chunk from a shared anchor;
///   `false` trains a single step-ahead output on the last chunk step and
///   shifts the anchor for earlier steps.
/// - `use_static_covariates`: `bool`
///   Append each series' static covariates to its features.
///
/// Invariants
/// ----------
/// - `output_chunk_length >= 1`.
/// - Every future lag is `<= output_chunk_length - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecasterOptions {
    lags: LagSpec,
    output_chunk_length: usize,
    likelihood: Likelihood,
    multi_models: bool,
    use_static_covariates: bool,
}

impl ForecasterOptions {
    /// Construct validated options.
    ///
    /// Errors
    /// ------
    /// - `ForecastError::InvalidOutputChunkLength` when
    ///   `output_chunk_length == 0`.
    /// - `ForecastError::InvalidLags` when a future lag exceeds
    ///   `output_chunk_length - 1`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use rust_forecasting::forecasting::core::{
    /// #     lags::LagSpec, likelihood::Likelihood, options::ForecasterOptions,
    /// # };
    /// let opts = ForecasterOptions::new(
    ///     LagSpec::autoregressive(3).unwrap(),
    ///     2,
    ///     Likelihood::Poisson,
    ///     true,
    ///     false,
    /// )
    /// .unwrap();
    /// assert_eq!(opts.min_train_series_length(), 6);
    /// ```
    pub fn new(
        lags: LagSpec, output_chunk_length: usize, likelihood: Likelihood, multi_models: bool,
        use_static_covariates: bool,
    ) -> ForecastResult<Self> {
        LagFeatureBuilder::new(lags.clone(), output_chunk_length, multi_models, use_static_covariates)?;
        Ok(Self { lags, output_chunk_length, likelihood, multi_models, use_static_covariates })
    }

    pub fn lags(&self) -> &LagSpec {
        &self.lags
    }

    pub fn output_chunk_length(&self) -> usize {
        self.output_chunk_length
    }

    pub fn likelihood(&self) -> &Likelihood {
        &self.likelihood
    }

    pub fn multi_models(&self) -> bool {
        self.multi_models
    }

    pub fn use_static_covariates(&self) -> bool {
        self.use_static_covariates
    }

    /// Shortest target series `fit` accepts.
    ///
    /// `max(3, -min(target_lags) + output_chunk_length + 1)`, or
    /// `max(3, output_chunk_length)` without target lags.
    pub fn min_train_series_length(&self) -> usize {
        let ocl = self.output_chunk_length;
        match self.lags.min_target_lag() {
            Some(l) => 3.max((-l) as usize + ocl + 1),
            None => 3.max(ocl),
        }
    }

    /// Feature builder matching these options.
    pub fn feature_builder(&self) -> ForecastResult<LagFeatureBuilder> {
        LagFeatureBuilder::new(
            self.lags.clone(),
            self.output_chunk_length,
            self.multi_models,
            self.use_static_covariates,
        )
    }
}
