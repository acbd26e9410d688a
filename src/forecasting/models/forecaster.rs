//! Probabilistic regression forecaster.
//!
//! Purpose
//! -------
//! Train an ensemble of regressors on lag features and roll it forward in
//! chunks to produce stochastic (sample-path) or deterministic forecasts,
//! or the raw likelihood parameters of the next chunk.
//!
//! Key behaviors
//! -------------
//! - `fit` builds the training set (and an optional eval set), derives the
//!   objective from the likelihood, and trains either one regressor or one
//!   per quantile level, each a fresh clone of the configured template.
//!   Quantile ensembles are cleared before every fit.
//! - `predict` validates every series up front, then runs an explicit loop
//!   over chunks of `output_chunk_length` steps. Each sample path owns a
//!   column of the history buffer; generated points are written back and
//!   read by the next chunk's lag features.
//! - With `multi_models` one anchor per chunk predicts every step. Without
//!   it, step `j` of the chunk starting at `T` is predicted from anchor
//!   `T + j - (ocl - 1)` by the single last-step regressor.
//! - `num_samples == 1` yields the deterministic forecast (median quantile,
//!   `λ`, `μ`, or the raw prediction); larger counts draw one value per
//!   path and step from the instance-owned RNG.
//!
//! Invariants & assumptions
//! ------------------------
//! - States move `Unfit → Fit → Predicting`; a failed `fit` returns to
//!   `Unfit` with an empty ensemble.
//! - Prediction inputs must have the component counts and static
//!   dimension seen in training.
//!
//! Conventions
//! -----------
//! - `info!` summarises each fit and predict, `debug!` reports per-model
//!   training.
//! - One call in flight per instance is enforced by `&mut self`.
//!
//! Testing notes
//! -------------
//! - Unit tests use a deterministic mock regressor so rollout arithmetic,
//!   state transitions, and error paths can be checked exactly; the
//!   end-to-end pipeline with `LinearRegressor` lives in `tests/`.
use std::{fs::File, io::BufWriter, path::Path};

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    forecasting::{
        core::{
            ensemble::{ModelEnsemble, ModelKey},
            forecasts::{ParameterForecast, Prediction, StochasticForecast},
            likelihood::Likelihood,
            options::ForecasterOptions,
            sampling::{likelihood_parameters, point_values, sample},
            tabularize::{History, InputSignature, LagFeatureBuilder, SeriesSet},
        },
        errors::{ForecastError, ForecastResult},
    },
    regression::{
        errors::RegressorError,
        traits::{EvalSet, Objective, Regressor},
    },
};

/// Lifecycle of a forecaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForecasterState {
    Unfit,
    Fit,
    /// Fitted and has served at least one prediction.
    Predicting,
}

/// What the last successful `fit` saw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub samples_per_series: Vec<usize>,
    pub n_features: usize,
    pub n_outputs: usize,
    pub eval_samples: Option<usize>,
    pub signature: InputSignature,
}

/// Regression forecaster over a cloneable regressor template `M`.
#[derive(Debug, Clone)]
pub struct RegressionForecaster<M, R = StdRng> {
    options: ForecasterOptions,
    builder: LagFeatureBuilder,
    template: M,
    ensemble: ModelEnsemble<M>,
    summary: Option<FitSummary>,
    state: ForecasterState,
    rng: R,
}

impl<M: Regressor> RegressionForecaster<M, StdRng> {
    /// Forecaster sampling from a `StdRng` seeded with `seed`.
    pub fn with_seed(options: ForecasterOptions, template: M, seed: u64) -> ForecastResult<Self> {
        Self::new(options, template, StdRng::seed_from_u64(seed))
    }
}

impl<M: Regressor, R: Rng> RegressionForecaster<M, R> {
    /// Build an unfitted forecaster.
    ///
    /// # Errors
    /// Propagates option validation (`InvalidOutputChunkLength`,
    /// `InvalidLags`).
    pub fn new(options: ForecasterOptions, template: M, rng: R) -> ForecastResult<Self> {
        let builder = options.feature_builder()?;
        let ensemble = ModelEnsemble::for_likelihood(options.likelihood());
        Ok(Self {
            options,
            builder,
            template,
            ensemble,
            summary: None,
            state: ForecasterState::Unfit,
            rng,
        })
    }

    pub fn options(&self) -> &ForecasterOptions {
        &self.options
    }

    pub fn state(&self) -> ForecasterState {
        self.state
    }

    pub fn fit_summary(&self) -> Option<&FitSummary> {
        self.summary.as_ref()
    }

    pub fn ensemble(&self) -> &ModelEnsemble<M> {
        &self.ensemble
    }

    pub fn min_train_series_length(&self) -> usize {
        self.options.min_train_series_length()
    }

    /// Train the ensemble on `train`, monitoring on `val` when given.
    /// `max_samples_per_ts` caps the samples of both sets.
    ///
    /// Any previous fit is discarded first, so a failed call leaves the
    /// forecaster `Unfit`.
    ///
    /// # Errors
    /// - `InsufficientHistory` for a target shorter than
    ///   [`ForecasterOptions::min_train_series_length`].
    /// - Feature-building errors for `train` or `val`, and a
    ///   `ComponentMismatch`/`StaticCovariateMismatch` when `val` is shaped
    ///   differently from `train`.
    /// - `Training` when a regressor fails.
    pub fn fit(
        &mut self, train: &SeriesSet<'_>, val: Option<&SeriesSet<'_>>, max_samples_per_ts: Option<usize>,
    ) -> ForecastResult<&FitSummary> {
        self.state = ForecasterState::Unfit;
        self.summary = None;
        self.ensemble.clear();

        let required = self.options.min_train_series_length();
        for (i, series) in train.targets.iter().enumerate() {
            if series.len() < required {
                return Err(ForecastError::InsufficientHistory { series: i, length: series.len(), required });
            }
        }
        let data = self.builder.training_set(train, max_samples_per_ts)?;
        let eval = match val {
            Some(val) => {
                let eval = self.builder.training_set(val, max_samples_per_ts)?;
                check_signature(&data.signature, &eval.signature)?;
                Some(eval)
            }
            None => None,
        };
        let eval_set = eval.as_ref().map(|e| EvalSet { x: e.x.view(), y: e.y.view() });

        if let Err(err) = self.train_ensemble(data.x.view(), data.y.view(), eval_set) {
            self.ensemble.clear();
            return Err(err);
        }

        let summary = FitSummary {
            n_features: data.x.ncols(),
            n_outputs: data.y.ncols(),
            eval_samples: eval.as_ref().map(|e| e.x.nrows()),
            signature: data.signature,
            samples_per_series: data.samples_per_series,
        };
        info!(
            samples = data.x.nrows(),
            features = summary.n_features,
            models = self.ensemble.len(),
            "fitted regression forecaster"
        );
        self.state = ForecasterState::Fit;
        Ok(self.summary.insert(summary))
    }

    /// Forecast `n` steps past the end of every target in `inputs`.
    ///
    /// # Errors
    /// - `NotFitted` before a successful `fit`.
    /// - `InvalidHorizon` for `n == 0`; `InvalidNumSamples` for zero
    ///   samples or sampling a deterministic likelihood.
    /// - `ParametersUnavailable` when parameters are requested for a
    ///   deterministic likelihood, with `num_samples != 1`, or with
    ///   `n > output_chunk_length`.
    /// - Signature and coverage errors (`ComponentMismatch`,
    ///   `StaticCovariateMismatch`, `MissingCovariates`,
    ///   `InsufficientHistory`, `InsufficientCovariates`) before any
    ///   rollout work.
    /// - `InvalidParameter` when a regressor emits a non-finite parameter.
    pub fn predict(
        &mut self, n: usize, inputs: &SeriesSet<'_>, num_samples: usize, predict_likelihood_parameters: bool,
    ) -> ForecastResult<Prediction> {
        let summary = self.summary.as_ref().ok_or(ForecastError::NotFitted)?;
        let likelihood = self.options.likelihood();
        if n == 0 {
            return Err(ForecastError::InvalidHorizon { n });
        }
        if num_samples == 0 {
            return Err(ForecastError::InvalidNumSamples {
                num_samples,
                reason: "at least one sample is required",
            });
        }
        if num_samples > 1 && !likelihood.is_probabilistic() {
            return Err(ForecastError::InvalidNumSamples {
                num_samples,
                reason: "sampling requires a probabilistic likelihood",
            });
        }
        if predict_likelihood_parameters {
            if !likelihood.is_probabilistic() {
                return Err(ForecastError::ParametersUnavailable {
                    reason: "the likelihood is deterministic",
                });
            }
            if num_samples != 1 {
                return Err(ForecastError::ParametersUnavailable { reason: "num_samples must be 1" });
            }
            if n > self.options.output_chunk_length() {
                return Err(ForecastError::ParametersUnavailable {
                    reason: "n must not exceed output_chunk_length",
                });
            }
        }

        let signature = self.builder.signature(inputs)?;
        check_signature(&summary.signature, &signature)?;
        self.builder.check_prediction_inputs(inputs, n)?;

        let prediction = if predict_likelihood_parameters {
            let mut out = Vec::with_capacity(inputs.targets.len());
            for i in 0..inputs.targets.len() {
                out.push(self.parameters_for(i, inputs, n)?);
            }
            Prediction::Parameters(out)
        } else {
            let mut out = Vec::with_capacity(inputs.targets.len());
            for i in 0..inputs.targets.len() {
                out.push(self.rollout(i, inputs, n, num_samples)?);
            }
            Prediction::Samples(out)
        };
        info!(series = inputs.targets.len(), horizon = n, num_samples, "forecast complete");
        self.state = ForecasterState::Predicting;
        Ok(prediction)
    }

    fn train_ensemble(
        &mut self, x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>, eval_set: Option<EvalSet<'_>>,
    ) -> ForecastResult<()> {
        match self.options.likelihood() {
            Likelihood::Quantile(levels) => {
                for &alpha in levels.levels() {
                    let mut model = self.template.clone();
                    model.set_objective(Objective::Quantile { alpha });
                    model.fit(x, y, eval_set)?;
                    self.ensemble.set(ModelKey::Level(alpha), model)?;
                    debug!(alpha, "trained quantile regressor");
                }
            }
            likelihood => {
                let mut model = self.template.clone();
                model.set_objective(likelihood.objective());
                model.fit(x, y, eval_set)?;
                self.ensemble.set(ModelKey::Median, model)?;
                debug!(objective = ?likelihood.objective(), "trained regressor");
            }
        }
        Ok(())
    }

    /// Roll series `i` forward `n` steps with `num_samples` paths.
    fn rollout(
        &mut self, i: usize, inputs: &SeriesSet<'_>, n: usize, num_samples: usize,
    ) -> ForecastResult<StochasticForecast> {
        let target = &inputs.targets[i];
        let ocl = self.options.output_chunk_length();
        let n_chunks = n.div_ceil(ocl);
        let (len, n_comp) = (target.len(), target.n_components());

        let mut buffer = Array3::<f64>::zeros((len + n_chunks * ocl, n_comp, num_samples));
        buffer.slice_mut(s![..len, .., ..]).assign(&target.values().insert_axis(Axis(2)));

        for k in 0..n_chunks {
            let offset = len + k * ocl;
            let raw = self.chunk_output(i, inputs, buffer.view(), target.start() + offset as i64)?;
            let draws = if num_samples == 1 {
                point_values(raw.view(), self.options.likelihood())?
            } else {
                sample(raw.view(), 1, self.options.likelihood(), &mut self.rng)?.index_axis_move(Axis(2), 0)
            };
            for path in 0..num_samples {
                for h in 0..ocl {
                    buffer
                        .slice_mut(s![offset + h, .., path])
                        .assign(&draws.row(path * ocl + h));
                }
            }
        }

        let values = buffer.slice(s![len..len + n, .., ..]).to_owned();
        Ok(StochasticForecast::new(target.end(), values, target.components().to_vec()))
    }

    /// Named likelihood parameters of the first `n <= ocl` steps.
    fn parameters_for(&self, i: usize, inputs: &SeriesSet<'_>, n: usize) -> ForecastResult<ParameterForecast> {
        let target = &inputs.targets[i];
        let buffer = target.values().insert_axis(Axis(2));
        let raw = self.chunk_output(i, inputs, buffer, target.end())?;
        let params = likelihood_parameters(raw.view(), self.options.likelihood())?;

        let suffixes = self.options.likelihood().parameter_names().unwrap_or_default();
        let n_params = suffixes.len();
        let mut names = Vec::with_capacity(target.n_components() * n_params);
        for component in target.components() {
            for suffix in &suffixes {
                names.push(format!("{component}_{suffix}"));
            }
        }
        let mut values = Array2::<f64>::zeros((n, names.len()));
        for t in 0..n {
            for c in 0..target.n_components() {
                for p in 0..n_params {
                    values[[t, c * n_params + p]] = params[[t, c, p]];
                }
            }
        }
        Ok(ParameterForecast::new(target.end(), values, names))
    }

    /// Raw output for the chunk starting at `chunk_start`, laid out as
    /// `[paths * ocl, components, params]` with row `path * ocl + h`.
    ///
    /// `buffer` is `[time, component, path]` starting at the target's
    /// start and covering every time before `chunk_start`.
    fn chunk_output(
        &self, i: usize, inputs: &SeriesSet<'_>, buffer: ArrayView3<'_, f64>, chunk_start: i64,
    ) -> ForecastResult<Array3<f64>> {
        let summary = self.summary.as_ref().ok_or(ForecastError::NotFitted)?;
        let target = &inputs.targets[i];
        let ocl = self.options.output_chunk_length();
        let n_comp = target.n_components();
        let n_paths = buffer.dim().2;
        let anchors = self.builder.chunk_anchors(chunk_start);
        let per_path = anchors.clone().count();

        let past = inputs.past_covariates.map(|p| History::from(&p[i]));
        let future = inputs.future_covariates.map(|f| History::from(&f[i]));
        let mut x = Array2::<f64>::zeros((n_paths * per_path, summary.n_features));
        for path in 0..n_paths {
            let history = History::new(target.start(), buffer.index_axis(Axis(2), path));
            for (j, anchor) in anchors.clone().enumerate() {
                self.builder.write_features(
                    x.row_mut(path * per_path + j),
                    anchor,
                    history,
                    past,
                    future,
                    target.static_covariates(),
                );
            }
        }

        let likelihood = self.options.likelihood();
        let raw = match likelihood {
            Likelihood::Quantile(_) => self.ensemble.predict_quantiles(x.view())?,
            _ => self.ensemble.predict(ModelKey::Median, x.view())?,
        };
        let expected = [
            ("regressor output rows", x.nrows(), raw.dim().0),
            ("regressor output columns", summary.n_outputs, raw.dim().1),
            ("regressor output parameters", likelihood.n_raw_params(), raw.dim().2),
        ];
        if let Some((what, expected, found)) = expected.into_iter().find(|(_, e, f)| e != f) {
            return Err(RegressorError::ShapeMismatch { what, expected, found }.into());
        }

        if !self.options.multi_models() {
            return Ok(raw);
        }
        let n_params = raw.dim().2;
        let mut out = Array3::<f64>::zeros((n_paths * ocl, n_comp, n_params));
        for path in 0..n_paths {
            for h in 0..ocl {
                out.slice_mut(s![path * ocl + h, .., ..])
                    .assign(&raw.slice(s![path, h * n_comp..(h + 1) * n_comp, ..]));
            }
        }
        Ok(out)
    }
}

impl<M: Regressor + Serialize, R: Rng> RegressionForecaster<M, R> {
    /// Write the fitted ensemble and its configuration to `path` as JSON.
    ///
    /// # Errors
    /// `NotFitted` before a successful `fit`; `Export` on I/O or
    /// serialization failure.
    pub fn export<P: AsRef<Path>>(&self, path: P) -> ForecastResult<()> {
        let summary = self.summary.as_ref().ok_or(ForecastError::NotFitted)?;
        if !self.ensemble.is_complete() {
            return Err(ForecastError::NotFitted);
        }
        let exported = ExportedForecaster {
            likelihood: self.options.likelihood(),
            output_chunk_length: self.options.output_chunk_length(),
            multi_models: self.options.multi_models(),
            summary,
            ensemble: &self.ensemble,
        };
        let file = File::create(path.as_ref()).map_err(|e| ForecastError::Export { reason: e.to_string() })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &exported)
            .map_err(|e| ForecastError::Export { reason: e.to_string() })?;
        info!(path = %path.as_ref().display(), "exported forecaster");
        Ok(())
    }
}

#[derive(Serialize)]
struct ExportedForecaster<'a, M> {
    likelihood: &'a Likelihood,
    output_chunk_length: usize,
    multi_models: bool,
    summary: &'a FitSummary,
    ensemble: &'a ModelEnsemble<M>,
}

fn check_signature(expected: &InputSignature, found: &InputSignature) -> ForecastResult<()> {
    let classes = [
        ("target", Some(expected.target_components), Some(found.target_components)),
        ("past", expected.past_components, found.past_components),
        ("future", expected.future_components, found.future_components),
    ];
    for (class, e, f) in classes {
        if e != f {
            return Err(ForecastError::ComponentMismatch {
                class,
                series: 0,
                expected: e.unwrap_or(0),
                found: f.unwrap_or(0),
            });
        }
    }
    if expected.static_dim != found.static_dim {
        return Err(ForecastError::StaticCovariateMismatch {
            series: 0,
            expected: expected.static_dim,
            found: found.static_dim,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forecasting::core::{
            lags::{FutureLags, LagSpec, Lags},
            likelihood::QuantileLevels,
            series::TimeSeries,
        },
        regression::errors::RegressorResult,
    };
    use ndarray::{Array1, concatenate};
    use std::{cell::Cell, rc::Rc};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Training-length enforcement and the fit state machine.
    // - Quantile ensembles: one model per level, cleared on refit and on
    //   failure.
    // - Rollout arithmetic in both modes, chunk consistency, sampling
    //   reproducibility, parameter output, and export.
    // - Prediction-time validation (horizon, samples, signature, coverage).
    //
    // They intentionally DO NOT cover:
    // - Statistical quality of a real regressor (see tests/).
    // -------------------------------------------------------------------------

    /// Predicts `0.5 * sum(features) + 1` (+ α for quantiles) for every
    /// output; Gaussian variance is fixed at 1.
    #[derive(Debug, Clone, Serialize)]
    struct Echo {
        objective: Objective,
        n_outputs: usize,
        #[serde(skip)]
        fits: Rc<Cell<usize>>,
        #[serde(skip)]
        fail: Rc<Cell<bool>>,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                objective: Objective::default(),
                n_outputs: 0,
                fits: Rc::new(Cell::new(0)),
                fail: Rc::new(Cell::new(false)),
            }
        }
    }

    impl Regressor for Echo {
        fn objective(&self) -> Objective {
            self.objective
        }

        fn set_objective(&mut self, objective: Objective) {
            self.objective = objective;
        }

        fn fit(
            &mut self, _x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>, _eval: Option<EvalSet<'_>>,
        ) -> RegressorResult<()> {
            if self.fail.get() {
                return Err(RegressorError::EmptyTrainingSet { rows: 0, cols: 0 });
            }
            self.fits.set(self.fits.get() + 1);
            self.n_outputs = y.ncols();
            Ok(())
        }

        fn predict(&self, x: ArrayView2<'_, f64>) -> RegressorResult<Array3<f64>> {
            if self.n_outputs == 0 {
                return Err(RegressorError::NotFitted);
            }
            let shift = match self.objective {
                Objective::Quantile { alpha } => alpha,
                _ => 0.0,
            };
            let mut out = Array3::<f64>::zeros((x.nrows(), self.n_outputs, self.objective.n_params()));
            for (r, row) in x.outer_iter().enumerate() {
                let value = 0.5 * row.sum() + 1.0 + shift;
                for o in 0..self.n_outputs {
                    out[[r, o, 0]] = match self.objective {
                        Objective::Poisson => value.max(0.0),
                        _ => value,
                    };
                    if self.objective == Objective::GaussianWithUncertainty {
                        out[[r, o, 1]] = 1.0;
                    }
                }
            }
            Ok(out)
        }

        fn is_fitted(&self) -> bool {
            self.n_outputs > 0
        }
    }

    fn options(width: usize, ocl: usize, likelihood: Likelihood, multi: bool) -> ForecasterOptions {
        ForecasterOptions::new(LagSpec::autoregressive(width).expect("lags"), ocl, likelihood, multi, false)
            .expect("valid options")
    }

    fn series(values: &[f64]) -> TimeSeries {
        TimeSeries::univariate(values).expect("finite values")
    }

    fn ramp(len: usize) -> TimeSeries {
        series(&(0..len).map(|t| t as f64 * 0.1).collect::<Vec<_>>())
    }

    #[test]
    // Purpose
    // -------
    // Training rejects series shorter than the minimum training length.
    //
    // Given
    // -----
    // - Width 3, chunk 2 (minimum 6) and a series of length 5.
    //
    // Expect
    // ------
    // - `InsufficientHistory { required: 6 }` and state stays `Unfit`.
    fn fit_enforces_min_train_length() {
        let mut model =
            RegressionForecaster::with_seed(options(3, 2, Likelihood::None, true), Echo::new(), 0).expect("valid");

        let err = model.fit(&SeriesSet::new(&[ramp(5)]), None, None).expect_err("too short");

        assert_eq!(err, ForecastError::InsufficientHistory { series: 0, length: 5, required: 6 });
        assert_eq!(model.state(), ForecasterState::Unfit);
        assert_eq!(model.min_train_series_length(), 6);
    }

    #[test]
    // Purpose
    // -------
    // Quantile mode trains one model per level and refits from scratch.
    //
    // Given
    // -----
    // - Levels [0.1, 0.5, 0.9]; two fits, then a failing fit.
    //
    // Expect
    // ------
    // - Three models after each fit, six fits in total; after the failure
    //   the ensemble is empty and the state is `Unfit`.
    fn quantile_refit_clears_ensemble() {
        let levels = QuantileLevels::new(vec![0.1, 0.5, 0.9]).expect("valid levels");
        let template = Echo::new();
        let (fits, fail) = (template.fits.clone(), template.fail.clone());
        let mut model =
            RegressionForecaster::with_seed(options(2, 1, Likelihood::Quantile(levels), true), template, 0)
                .expect("valid");
        let train = [ramp(10)];

        model.fit(&SeriesSet::new(&train), None, None).expect("first fit");
        assert_eq!(model.ensemble().len(), 3);
        model.fit(&SeriesSet::new(&train), None, None).expect("second fit");
        assert_eq!(model.ensemble().len(), 3);
        assert_eq!(fits.get(), 6);

        fail.set(true);
        let err = model.fit(&SeriesSet::new(&train), None, None).expect_err("regressor fails");
        assert!(matches!(err, ForecastError::Training { .. }));
        assert!(model.ensemble().is_empty());
        assert_eq!(model.state(), ForecasterState::Unfit);
    }

    #[test]
    // Purpose
    // -------
    // Deterministic rollout follows the chunk arithmetic of each mode.
    //
    // Given
    // -----
    // - Width 1, chunk 2, series [0, 0, 0, 2] and the Echo regressor
    //   (x ↦ 0.5 x + 1).
    //
    // Expect
    // ------
    // - Multi: chunk 1 from y3 = 2 gives [2, 2]; chunk 2 from 2 gives [2].
    // - Single-model: step 0 reads y2 = 0 → 1, step 1 reads y3 = 2 → 2;
    //   next chunk reads 1 → 1.5 and 2 → 2.
    fn rollout_follows_mode() {
        let train = [series(&[0.0, 0.0, 0.0, 2.0])];
        let set = SeriesSet::new(&train);

        let mut multi =
            RegressionForecaster::with_seed(options(1, 2, Likelihood::None, true), Echo::new(), 0).expect("valid");
        multi.fit(&set, None, None).expect("fit");
        let out = multi.predict(3, &set, 1, false).expect("predict").into_samples().expect("samples");
        assert_eq!(out[0].values().iter().copied().collect::<Vec<_>>(), vec![2.0, 2.0, 2.0]);
        assert_eq!(out[0].start(), 4);

        let mut single =
            RegressionForecaster::with_seed(options(1, 2, Likelihood::None, false), Echo::new(), 0).expect("valid");
        single.fit(&set, None, None).expect("fit");
        let out = single.predict(4, &set, 1, false).expect("predict").into_samples().expect("samples");
        assert_eq!(out[0].values().iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, 1.5, 2.0]);
        assert_eq!(single.state(), ForecasterState::Predicting);
    }

    #[test]
    // Purpose
    // -------
    // Forecasting 2k steps equals forecasting k, appending, and
    // forecasting k again.
    //
    // Given
    // -----
    // - Width 3, chunk 2, both modes, k = 4.
    //
    // Expect
    // ------
    // - Identical deterministic paths.
    fn rollout_is_chunk_consistent() {
        for multi in [true, false] {
            let train = [ramp(12)];
            let mut model = RegressionForecaster::with_seed(options(3, 2, Likelihood::None, multi), Echo::new(), 0)
                .expect("valid");
            model.fit(&SeriesSet::new(&train), None, None).expect("fit");

            let full = model.predict(8, &SeriesSet::new(&train), 1, false).expect("predict");
            let full = full.into_samples().expect("samples")[0].values().index_axis(Axis(2), 0).to_owned();

            let head = model.predict(4, &SeriesSet::new(&train), 1, false).expect("predict");
            let head = head.into_samples().expect("samples")[0].values().index_axis(Axis(2), 0).to_owned();
            let extended = TimeSeries::new(0, concatenate(Axis(0), &[train[0].values(), head.view()]).expect("stack"))
                .expect("finite");
            let tail = model.predict(4, &SeriesSet::new(&[extended]), 1, false).expect("predict");
            let tail = tail.into_samples().expect("samples")[0].values().index_axis(Axis(2), 0).to_owned();

            let joined = concatenate(Axis(0), &[head.view(), tail.view()]).expect("stack");
            assert_eq!(full, joined, "multi_models = {multi}");
        }
    }

    #[test]
    // Purpose
    // -------
    // The same seed reproduces the same stochastic forecast.
    //
    // Given
    // -----
    // - Two Gaussian forecasters seeded 7, one seeded 8; 64 samples.
    //
    // Expect
    // ------
    // - Seed 7 twice gives identical values; seed 8 differs.
    fn sampling_is_reproducible_under_seed() {
        let train = [ramp(10)];
        let run = |seed: u64| {
            let mut model =
                RegressionForecaster::with_seed(options(2, 2, Likelihood::Gaussian, true), Echo::new(), seed)
                    .expect("valid");
            model.fit(&SeriesSet::new(&train), None, None).expect("fit");
            let out = model.predict(3, &SeriesSet::new(&train), 64, false).expect("predict");
            out.into_samples().expect("samples").remove(0)
        };

        let (a, b, c) = (run(7), run(7), run(8));

        assert_eq!(a.n_samples(), 64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    // Purpose
    // -------
    // Likelihood parameters are named per component and limited to one
    // chunk.
    //
    // Given
    // -----
    // - Gaussian, chunk 2, component "y"; n = 2 and n = 3.
    //
    // Expect
    // ------
    // - Columns ["y_mu", "y_sigma"] with σ = 1; n = 3 is
    //   `ParametersUnavailable`.
    fn likelihood_parameters_are_named() {
        let train = [ramp(10).with_components(["y"]).expect("one name")];
        let set = SeriesSet::new(&train);
        let mut model =
            RegressionForecaster::with_seed(options(2, 2, Likelihood::Gaussian, true), Echo::new(), 0).expect("valid");
        model.fit(&set, None, None).expect("fit");

        let params = model.predict(2, &set, 1, true).expect("parameters").into_parameters().expect("params");
        assert_eq!(params[0].names(), &["y_mu".to_string(), "y_sigma".to_string()]);
        assert_eq!(params[0].column("y_sigma").map(|c| c.to_vec()), Some(vec![1.0, 1.0]));

        assert!(matches!(model.predict(3, &set, 1, true), Err(ForecastError::ParametersUnavailable { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Prediction-time validation happens before any rollout.
    //
    // Given
    // -----
    // - An unfitted model; then a fitted point model asked for n = 0,
    //   2 samples, and a bivariate input.
    //
    // Expect
    // ------
    // - `NotFitted`, `InvalidHorizon`, `InvalidNumSamples`,
    //   `ComponentMismatch`.
    fn prediction_inputs_are_validated() {
        let train = [ramp(10)];
        let set = SeriesSet::new(&train);
        let mut model =
            RegressionForecaster::with_seed(options(2, 1, Likelihood::None, true), Echo::new(), 0).expect("valid");
        assert_eq!(model.predict(1, &set, 1, false), Err(ForecastError::NotFitted));

        model.fit(&set, None, None).expect("fit");
        assert_eq!(model.predict(0, &set, 1, false), Err(ForecastError::InvalidHorizon { n: 0 }));
        assert!(matches!(
            model.predict(1, &set, 2, false),
            Err(ForecastError::InvalidNumSamples { num_samples: 2, .. })
        ));

        let wide = [TimeSeries::new(0, Array2::zeros((10, 2))).expect("finite")];
        assert!(matches!(
            model.predict(1, &SeriesSet::new(&wide), 1, false),
            Err(ForecastError::ComponentMismatch { class: "target", expected: 1, found: 2, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Covariates must be present and long enough at prediction time.
    //
    // Given
    // -----
    // - Future lags [0] with chunk 1, trained with a future covariate of
    //   length 14 on a target of length 10.
    //
    // Expect
    // ------
    // - Omitting covariates is `MissingCovariates`; n = 4 works; n = 5 is
    //   `InsufficientCovariates`.
    fn prediction_checks_covariates() {
        let lags = LagSpec::new(Some(Lags::Width(2)), None, Some(FutureLags::Explicit(vec![0]))).expect("lags");
        let opts = ForecasterOptions::new(lags, 1, Likelihood::None, true, false).expect("valid");
        let train = [ramp(10)];
        let future = [series(&Array1::linspace(0.0, 1.0, 14).to_vec())];
        let set = SeriesSet::new(&train).with_future_covariates(&future);
        let mut model = RegressionForecaster::with_seed(opts, Echo::new(), 0).expect("valid");
        model.fit(&set, None, None).expect("fit");

        assert_eq!(
            model.predict(1, &SeriesSet::new(&train), 1, false),
            Err(ForecastError::MissingCovariates { class: "future" })
        );
        assert!(model.predict(4, &set, 1, false).is_ok());
        assert!(matches!(
            model.predict(5, &set, 1, false),
            Err(ForecastError::InsufficientCovariates { class: "future", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Export requires a fit and then writes valid JSON.
    //
    // Given
    // -----
    // - A Poisson forecaster exported before and after fitting.
    //
    // Expect
    // ------
    // - `NotFitted` first; afterwards the file parses and names the
    //   likelihood.
    fn export_requires_fit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("model.json");
        let mut model =
            RegressionForecaster::with_seed(options(2, 1, Likelihood::Poisson, true), Echo::new(), 0).expect("valid");

        assert_eq!(model.export(&path), Err(ForecastError::NotFitted));

        model.fit(&SeriesSet::new(&[ramp(10)]), None, None).expect("fit");
        model.export(&path).expect("export");
        let text = std::fs::read_to_string(&path).expect("readable");
        let json: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
        assert_eq!(json["likelihood"], "Poisson");
        assert_eq!(json["summary"]["samples_per_series"][0], 8);
    }

    #[test]
    // Purpose
    // -------
    // A multi-series fit is all-or-nothing: one short series discards the
    // previous fit and leaves nothing behind.
    //
    // Given
    // -----
    // - Quantile levels [0.25, 0.75], width 2, chunk 1 (minimum 4).
    // - A successful fit, then a fit on [len 10, len 3].
    //
    // Expect
    // ------
    // - `InsufficientHistory { series: 1, length: 3, required: 4 }`,
    //   state `Unfit`, an empty ensemble, and no fit summary.
    fn failed_multi_series_fit_leaves_model_unfit() {
        let levels = QuantileLevels::new(vec![0.25, 0.75]).expect("valid levels");
        let mut model =
            RegressionForecaster::with_seed(options(2, 1, Likelihood::Quantile(levels), true), Echo::new(), 0)
                .expect("valid");
        model.fit(&SeriesSet::new(&[ramp(10)]), None, None).expect("first fit");
        assert_eq!(model.ensemble().len(), 2);

        let err = model.fit(&SeriesSet::new(&[ramp(10), ramp(3)]), None, None).expect_err("series 1 too short");

        assert_eq!(err, ForecastError::InsufficientHistory { series: 1, length: 3, required: 4 });
        assert_eq!(model.state(), ForecasterState::Unfit);
        assert!(model.ensemble().is_empty());
        assert!(model.fit_summary().is_none());
    }

    #[test]
    // Purpose
    // -------
    // A refit on different data replaces the recorded sample counts.
    //
    // Given
    // -----
    // - Width 2, chunk 1; fit on [len 10], then on [len 6, len 12].
    //
    // Expect
    // ------
    // - Counts [8], then [3, 9].
    fn refit_replaces_sample_counts() {
        let mut model =
            RegressionForecaster::with_seed(options(2, 1, Likelihood::None, true), Echo::new(), 0).expect("valid");

        let first = model.fit(&SeriesSet::new(&[ramp(10)]), None, None).expect("first fit");
        assert_eq!(first.samples_per_series, vec![8]);

        let second = model.fit(&SeriesSet::new(&[ramp(6), ramp(12)]), None, None).expect("second fit");
        assert_eq!(second.samples_per_series, vec![3, 9]);
    }

    #[test]
    // Purpose
    // -------
    // The per-series sample cap applies to the validation set as well.
    //
    // Given
    // -----
    // - Width 2, chunk 1; train len 10, validation len 12, cap 2.
    //
    // Expect
    // ------
    // - Two training and two validation samples.
    fn sample_cap_applies_to_validation_set() {
        let mut model =
            RegressionForecaster::with_seed(options(2, 1, Likelihood::None, true), Echo::new(), 0).expect("valid");
        let (train, val) = ([ramp(10)], [ramp(12)]);

        let summary =
            model.fit(&SeriesSet::new(&train), Some(&SeriesSet::new(&val)), Some(2)).expect("fit");

        assert_eq!(summary.samples_per_series, vec![2]);
        assert_eq!(summary.eval_samples, Some(2));
    }

    #[test]
    // Purpose
    // -------
    // Prediction needs enough target history for the first chunk's
    // anchors, which reach further back in single-model mode.
    //
    // Given
    // -----
    // - Width 3, chunk 2, single-model (history of 4 required); fitted on
    //   len 10, asked to predict from a series of len 3.
    //
    // Expect
    // ------
    // - `InsufficientHistory { series: 0, length: 3, required: 4 }`.
    fn prediction_requires_target_history() {
        let mut model =
            RegressionForecaster::with_seed(options(3, 2, Likelihood::None, false), Echo::new(), 0).expect("valid");
        model.fit(&SeriesSet::new(&[ramp(10)]), None, None).expect("fit");

        let err = model.predict(2, &SeriesSet::new(&[ramp(3)]), 1, false).expect_err("too short");

        assert_eq!(err, ForecastError::InsufficientHistory { series: 0, length: 3, required: 4 });
    }

    #[test]
    // Purpose
    // -------
    // Past covariates must reach every later chunk's lags once the
    // horizon spans several chunks.
    //
    // Given
    // -----
    // - Target and past widths 2, chunk 2, multi; target and past
    //   covariate both cover [0, 20).
    //
    // Expect
    // ------
    // - n = 2 succeeds; n = 3 reaches a second chunk anchored at 22 and is
    //   `InsufficientCovariates` requiring [18, 22).
    fn prediction_checks_past_covariates_across_chunks() {
        let lags = LagSpec::new(Some(Lags::Width(2)), Some(Lags::Width(2)), None).expect("lags");
        let opts = ForecasterOptions::new(lags, 2, Likelihood::None, true, false).expect("valid");
        let (train, past) = ([ramp(20)], [ramp(20)]);
        let set = SeriesSet::new(&train).with_past_covariates(&past);
        let mut model = RegressionForecaster::with_seed(opts, Echo::new(), 0).expect("valid");
        model.fit(&set, None, None).expect("fit");

        assert!(model.predict(2, &set, 1, false).is_ok());
        assert_eq!(
            model.predict(3, &set, 1, false),
            Err(ForecastError::InsufficientCovariates {
                series: 0,
                class: "past",
                required: (18, 22),
                available: (0, 20),
            })
        );
    }
}
