//! Lag feature builder — tabularize series into a supervised dataset.
//!
//! Purpose
//! -------
//! Turn target series plus optional past/future covariates into a design
//! matrix `X` and label matrix `Y` using fixed lag windows, and write the
//! same feature layout for a single anchor during the forecast rollout.
//!
//! Key behaviors
//! -------------
//! - One sample per anchor `τ` (the first step a sample predicts) for
//!   which every lag `τ + l` lies inside its source series and the label
//!   steps exist. Anchors are intersected across the target and every
//!   configured covariate class.
//! - Feature order: target lags, past-covariate lags, future-covariate
//!   lags, then static covariates. Inside each class the layout is
//!   lag-major, component-minor.
//! - Labels: with `multi_models` the whole chunk `y[τ .. τ + ocl)` flattened
//!   step-major (`col = h * C + c`); otherwise only the last step
//!   `y[τ + ocl - 1]`.
//! - `max_samples_per_ts` keeps the most recent anchors of each series.
//! - Series are stacked row-wise in input order; no sample mixes series.
//!
//! Invariants & assumptions
//! ------------------------
//! - For a target-only width `w` and chunk length `h`, a series of length
//!   `L` yields `L - w - h + 1` samples.
//! - [`LagFeatureBuilder::write_features`] assumes the caller has already
//!   checked coverage (via [`LagFeatureBuilder::check_prediction_inputs`]
//!   or the training anchor ranges); reading outside a history is a logic
//!   error and panics on indexing.
//!
//! Conventions
//! -----------
//! - Times are absolute (`TimeSeries::start` based), never row offsets.
//! - Covariate lists, when given, hold one series per target, in order.
use std::ops::RangeInclusive;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};
use serde::Serialize;
use tracing::debug;

use crate::forecasting::{
    core::{lags::LagSpec, series::TimeSeries},
    errors::{ForecastError, ForecastResult},
};

/// Target series with optional per-target covariates.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSet<'a> {
    pub targets: &'a [TimeSeries],
    pub past_covariates: Option<&'a [TimeSeries]>,
    pub future_covariates: Option<&'a [TimeSeries]>,
}

impl<'a> SeriesSet<'a> {
    pub fn new(targets: &'a [TimeSeries]) -> Self {
        Self { targets, past_covariates: None, future_covariates: None }
    }

    pub fn with_past_covariates(mut self, past: &'a [TimeSeries]) -> Self {
        self.past_covariates = Some(past);
        self
    }

    pub fn with_future_covariates(mut self, future: &'a [TimeSeries]) -> Self {
        self.future_covariates = Some(future);
        self
    }

    fn past(&self, i: usize) -> Option<&'a TimeSeries> {
        self.past_covariates.map(|p| &p[i])
    }

    fn future(&self, i: usize) -> Option<&'a TimeSeries> {
        self.future_covariates.map(|f| &f[i])
    }
}

/// Shape of the inputs a model was trained on.
///
/// Prediction inputs must reproduce it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputSignature {
    pub target_components: usize,
    pub past_components: Option<usize>,
    pub future_components: Option<usize>,
    pub static_dim: Option<usize>,
}

/// Stacked supervised dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    /// `[samples, features]`.
    pub x: Array2<f64>,
    /// `[samples, outputs]`.
    pub y: Array2<f64>,
    /// Samples contributed by each target series, in input order.
    pub samples_per_series: Vec<usize>,
    pub signature: InputSignature,
}

/// Target values on the absolute time axis, borrowed from a series or
/// from one sample path of a rollout buffer.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    start: i64,
    values: ArrayView2<'a, f64>,
}

impl<'a> History<'a> {
    pub fn new(start: i64, values: ArrayView2<'a, f64>) -> Self {
        Self { start, values }
    }

    fn at(&self, time: i64) -> ArrayView1<'a, f64> {
        self.values.index_axis_move(Axis(0), (time - self.start) as usize)
    }
}

impl<'a> From<&'a TimeSeries> for History<'a> {
    fn from(series: &'a TimeSeries) -> Self {
        Self::new(series.start(), series.values())
    }
}

/// Builds lag features for training and rollout.
#[derive(Debug, Clone, PartialEq)]
pub struct LagFeatureBuilder {
    lags: LagSpec,
    output_chunk_length: usize,
    multi_models: bool,
    use_static_covariates: bool,
}

impl LagFeatureBuilder {
    /// # Errors
    /// `InvalidOutputChunkLength` for a zero chunk, `InvalidLags` when a
    /// future lag reaches past the chunk.
    pub fn new(
        lags: LagSpec, output_chunk_length: usize, multi_models: bool, use_static_covariates: bool,
    ) -> ForecastResult<Self> {
        if output_chunk_length == 0 {
            return Err(ForecastError::InvalidOutputChunkLength { value: output_chunk_length });
        }
        lags.validate_against_chunk(output_chunk_length)?;
        Ok(Self { lags, output_chunk_length, multi_models, use_static_covariates })
    }

    pub fn lags(&self) -> &LagSpec {
        &self.lags
    }

    pub fn output_chunk_length(&self) -> usize {
        self.output_chunk_length
    }

    pub fn multi_models(&self) -> bool {
        self.multi_models
    }

    /// Target steps before the forecast start that the rollout reads.
    pub fn required_history(&self) -> usize {
        match self.lags.min_target_lag() {
            None => 0,
            Some(l) if self.multi_models => (-l) as usize,
            Some(l) => (-l) as usize + self.output_chunk_length - 1,
        }
    }

    /// Feature count for inputs of the given shape.
    pub fn n_features(&self, signature: &InputSignature) -> usize {
        let width = |lags: Option<&[i64]>, comps: Option<usize>| {
            lags.map_or(0, |l| l.len()) * comps.unwrap_or(0)
        };
        width(self.lags.target(), Some(signature.target_components))
            + width(self.lags.past(), signature.past_components)
            + width(self.lags.future(), signature.future_components)
            + signature.static_dim.unwrap_or(0)
    }

    /// Label columns: `ocl × C` with `multi_models`, else `C`.
    pub fn n_outputs(&self, target_components: usize) -> usize {
        if self.multi_models { self.output_chunk_length * target_components } else { target_components }
    }

    /// Check covariate presence, counts, component counts, and statics.
    ///
    /// # Errors
    /// `InvalidSeries` for an empty target list, `MissingCovariates`,
    /// `UnexpectedCovariates`, `CovariateCountMismatch`,
    /// `ComponentMismatch`, `StaticCovariateMismatch`.
    pub fn signature(&self, set: &SeriesSet<'_>) -> ForecastResult<InputSignature> {
        let first = set.targets.first().ok_or_else(|| ForecastError::InvalidSeries {
            reason: "at least one target series is required".to_string(),
        })?;
        let target_components = consistent_components("target", set.targets)?;

        let past_components =
            covariate_components("past", self.lags.past(), set.past_covariates, set.targets.len())?;
        let future_components =
            covariate_components("future", self.lags.future(), set.future_covariates, set.targets.len())?;

        let static_dim = if self.use_static_covariates {
            let expected = first.static_covariates().map(|s| s.len());
            for (i, series) in set.targets.iter().enumerate() {
                let found = series.static_covariates().map(|s| s.len());
                if found != expected {
                    return Err(ForecastError::StaticCovariateMismatch { series: i, expected, found });
                }
            }
            expected
        } else {
            None
        };

        Ok(InputSignature { target_components, past_components, future_components, static_dim })
    }

    /// Build the stacked training set.
    ///
    /// # Errors
    /// - `InvalidMaxSamples` for `Some(0)`.
    /// - Everything [`LagFeatureBuilder::signature`] reports.
    /// - `InsufficientHistory` when a target is too short for its lags and
    ///   chunk, `InsufficientCovariates` when covariate overlap leaves no
    ///   anchor.
    pub fn training_set(
        &self, set: &SeriesSet<'_>, max_samples_per_ts: Option<usize>,
    ) -> ForecastResult<TrainingSet> {
        if max_samples_per_ts == Some(0) {
            return Err(ForecastError::InvalidMaxSamples { value: 0 });
        }
        let signature = self.signature(set)?;
        let n_features = self.n_features(&signature);
        let n_comp = signature.target_components;
        let n_outputs = self.n_outputs(n_comp);

        let mut ranges = Vec::with_capacity(set.targets.len());
        for i in 0..set.targets.len() {
            let (mut lo, hi) = self.training_anchors(i, set)?;
            if let Some(cap) = max_samples_per_ts {
                lo = lo.max(hi - cap as i64 + 1);
            }
            ranges.push(lo..=hi);
        }
        let samples_per_series: Vec<usize> =
            ranges.iter().map(|r| (r.end() - r.start() + 1) as usize).collect();
        let n_rows = samples_per_series.iter().sum();

        let mut x = Array2::<f64>::zeros((n_rows, n_features));
        let mut y = Array2::<f64>::zeros((n_rows, n_outputs));
        let mut row = 0;
        for (i, anchors) in ranges.into_iter().enumerate() {
            let target = &set.targets[i];
            let history = History::from(target);
            for anchor in anchors {
                self.write_features(
                    x.row_mut(row),
                    anchor,
                    history,
                    set.past(i).map(History::from),
                    set.future(i).map(History::from),
                    target.static_covariates(),
                );
                let mut labels = y.row_mut(row);
                if self.multi_models {
                    for h in 0..self.output_chunk_length {
                        let step = history.at(anchor + h as i64);
                        for c in 0..n_comp {
                            labels[h * n_comp + c] = step[c];
                        }
                    }
                } else {
                    labels.assign(&history.at(anchor + self.output_chunk_length as i64 - 1));
                }
                row += 1;
            }
        }
        debug!(
            rows = n_rows,
            features = n_features,
            outputs = n_outputs,
            series = set.targets.len(),
            "built lag training set"
        );
        Ok(TrainingSet { x, y, samples_per_series, signature })
    }

    /// Write the feature vector of `anchor` into `out`.
    ///
    /// `out.len()` must equal [`LagFeatureBuilder::n_features`] for the
    /// inputs' signature.
    pub fn write_features<'h>(
        &self, mut out: ArrayViewMut1<'_, f64>, anchor: i64, target: History<'h>,
        past: Option<History<'h>>, future: Option<History<'h>>, statics: Option<ArrayView1<'_, f64>>,
    ) {
        let mut k = 0;
        for (lags, source) in
            [(self.lags.target(), Some(target)), (self.lags.past(), past), (self.lags.future(), future)]
        {
            if let (Some(lags), Some(source)) = (lags, source) {
                for &l in lags {
                    for &v in source.at(anchor + l).iter() {
                        out[k] = v;
                        k += 1;
                    }
                }
            }
        }
        if self.use_static_covariates {
            if let Some(statics) = statics {
                for &v in statics.iter() {
                    out[k] = v;
                    k += 1;
                }
            }
        }
        debug_assert_eq!(k, out.len());
    }

    /// Anchors whose rows predict the chunk starting at `chunk_start`.
    ///
    /// One anchor with `multi_models`; otherwise one per step, step `j`
    /// reading from `chunk_start + j - (ocl - 1)`.
    pub fn chunk_anchors(&self, chunk_start: i64) -> RangeInclusive<i64> {
        if self.multi_models {
            chunk_start..=chunk_start
        } else {
            chunk_start - self.output_chunk_length as i64 + 1..=chunk_start
        }
    }

    /// First and last anchor a rollout of `n` steps past `end` visits.
    pub fn prediction_anchors(&self, end: i64, n: usize) -> (i64, i64) {
        let ocl = self.output_chunk_length;
        let last_chunk = end + ((n.max(1).div_ceil(ocl) - 1) * ocl) as i64;
        (*self.chunk_anchors(end).start(), *self.chunk_anchors(last_chunk).end())
    }

    /// Check every series can be rolled forward `n` steps.
    ///
    /// # Errors
    /// `InsufficientHistory` for a target shorter than
    /// [`LagFeatureBuilder::required_history`], `InsufficientCovariates`
    /// when a covariate does not span every anchor's lags.
    pub fn check_prediction_inputs(&self, set: &SeriesSet<'_>, n: usize) -> ForecastResult<()> {
        for (i, target) in set.targets.iter().enumerate() {
            let required = self.required_history();
            if target.len() < required {
                return Err(ForecastError::InsufficientHistory {
                    series: i,
                    length: target.len(),
                    required,
                });
            }
            let (first, last) = self.prediction_anchors(target.end(), n);
            for (class, lags, cov) in
                [("past", self.lags.past(), set.past(i)), ("future", self.lags.future(), set.future(i))]
            {
                if let (Some(lags), Some(cov)) = (lags, cov) {
                    let (lo, hi) = (first + lags[0], last + lags[lags.len() - 1] + 1);
                    if !cov.covers(lo, hi) {
                        return Err(ForecastError::InsufficientCovariates {
                            series: i,
                            class,
                            required: (lo, hi),
                            available: (cov.start(), cov.end()),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Inclusive anchor range of series `i` before any sample cap.
    fn training_anchors(&self, i: usize, set: &SeriesSet<'_>) -> ForecastResult<(i64, i64)> {
        let target = &set.targets[i];
        let ocl = self.output_chunk_length as i64;
        let reach = -self.lags.min_target_lag().unwrap_or(0);
        let mut lo = target.start() + reach;
        let mut hi = target.end() - ocl;
        if hi < lo {
            return Err(ForecastError::InsufficientHistory {
                series: i,
                length: target.len(),
                required: (reach + ocl) as usize,
            });
        }
        for (class, lags, cov) in
            [("past", self.lags.past(), set.past(i)), ("future", self.lags.future(), set.future(i))]
        {
            if let (Some(lags), Some(cov)) = (lags, cov) {
                let (l_min, l_max) = (lags[0], lags[lags.len() - 1]);
                let cov_lo = lo.max(cov.start() - l_min);
                let cov_hi = hi.min(cov.end() - 1 - l_max);
                if cov_hi < cov_lo {
                    return Err(ForecastError::InsufficientCovariates {
                        series: i,
                        class,
                        required: (lo + l_min, hi + l_max + 1),
                        available: (cov.start(), cov.end()),
                    });
                }
                lo = cov_lo;
                hi = cov_hi;
            }
        }
        Ok((lo, hi))
    }
}

fn consistent_components(class: &'static str, series: &[TimeSeries]) -> ForecastResult<usize> {
    let expected = series.first().map_or(0, TimeSeries::n_components);
    for (i, s) in series.iter().enumerate() {
        if s.n_components() != expected {
            return Err(ForecastError::ComponentMismatch {
                class,
                series: i,
                expected,
                found: s.n_components(),
            });
        }
    }
    Ok(expected)
}

fn covariate_components(
    class: &'static str, lags: Option<&[i64]>, covariates: Option<&[TimeSeries]>, n_targets: usize,
) -> ForecastResult<Option<usize>> {
    match (lags, covariates) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ForecastError::MissingCovariates { class }),
        (None, Some(_)) => Err(ForecastError::UnexpectedCovariates { class }),
        (Some(_), Some(cov)) => {
            if cov.len() != n_targets {
                return Err(ForecastError::CovariateCountMismatch {
                    class,
                    expected: n_targets,
                    found: cov.len(),
                });
            }
            consistent_components(class, cov).map(Some)
        }
    }
}
