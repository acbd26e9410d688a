//! Window negative-log-likelihood scorers.
//!
//! Purpose
//! -------
//! Score how improbable the true series is under distributions fitted to
//! a stochastic forecast, one window at a time.
//!
//! Key behaviors
//! -------------
//! - For each window of `W` steps and each component, every sample of
//!   every in-window step is pooled; the distribution is fitted to the
//!   pool (Poisson: rate = mean; Gaussian: mean and population standard
//!   deviation) and the NLL of the window's **last** true value is
//!   reported. `W = 1` scores each step on its own samples.
//! - A series of `L` steps yields `L - W + 1` scores per component.
//! - Values the fitted distribution cannot produce score `+∞` and are
//!   recorded as [`SupportViolation`]s rather than clipped.
//!
//! Invariants & assumptions
//! ------------------------
//! - Poisson: rate 0 with true 0 scores 0; negative, non-integer, or
//!   non-finite true values, and positive true values under rate 0, are
//!   violations. A negative or non-finite fitted rate is an
//!   `InvalidFittedParameter` error.
//! - Gaussian: a pool with (numerically) zero spread is a point mass:
//!   0 when the true value equals the mean, `+∞` otherwise.
//!
//! Conventions
//! -----------
//! - Array entry points take `forecast[time, component, sample]` and
//!   `actual[time, component]` of equal length, with window ends reported
//!   relative to row 0.
//! - The series entry point aligns a [`StochasticForecast`] and a
//!   [`TimeSeries`] on their overlapping absolute times.
use ndarray::{Array2, ArrayView2, ArrayView3, s};
use statrs::distribution::{Continuous, Discrete, Normal, Poisson};
use tracing::{debug, warn};

use crate::{
    anomaly::{
        errors::{ScoreError, ScoreResult},
        windows::{SupportViolation, WindowScores},
    },
    forecasting::core::{forecasts::StochasticForecast, series::TimeSeries},
};

/// Distance under which a true value counts as an integer count.
const INTEGER_TOL: f64 = 1e-9;

/// Relative spread under which a Gaussian pool is a point mass.
const POINT_MASS_TOL: f64 = 1e-12;

/// A distribution family scored by negative log-likelihood.
pub trait NllScorer {
    /// Family name used in logs.
    fn distribution(&self) -> &'static str;

    /// NLL of `actual` under the distribution fitted to `samples`.
    ///
    /// `samples` is the pooled window `[step, sample]` of one component.
    /// Out-of-support values return `Ok(f64::INFINITY)`.
    ///
    /// # Errors
    /// `InvalidFittedParameter` (with zero position fields; callers fill
    /// them in) when the fitted parameter is outside the family's domain.
    fn nll(&self, samples: ArrayView2<'_, f64>, actual: f64) -> ScoreResult<f64>;

    /// Score aligned arrays.
    ///
    /// # Errors
    /// `InvalidWindow`, `LengthMismatch`, `ComponentMismatch`,
    /// `NoSamples`, `WindowTooLong`, `InvalidFittedParameter`.
    fn score(
        &self, forecast: ArrayView3<'_, f64>, actual: ArrayView2<'_, f64>, window: usize,
    ) -> ScoreResult<WindowScores> {
        score_windows(self, forecast, actual, window, 0)
    }

    /// Score a forecast against a series over their common time span.
    ///
    /// # Errors
    /// `NoOverlap` when the spans are disjoint, plus everything
    /// [`NllScorer::score`] reports.
    fn score_series(
        &self, forecast: &StochasticForecast, actual: &TimeSeries, window: usize,
    ) -> ScoreResult<WindowScores> {
        if forecast.components().len() != actual.n_components() {
            return Err(ScoreError::ComponentMismatch {
                forecast: forecast.components().len(),
                actual: actual.n_components(),
            });
        }
        let from = forecast.start().max(actual.start());
        let to = forecast.end().min(actual.end());
        if to <= from {
            return Err(ScoreError::NoOverlap {
                forecast: (forecast.start(), forecast.end()),
                actual: (actual.start(), actual.end()),
            });
        }
        let f = (from - forecast.start()) as usize..(to - forecast.start()) as usize;
        let a = (from - actual.start()) as usize..(to - actual.start()) as usize;
        score_windows(
            self,
            forecast.values().slice(s![f, .., ..]),
            actual.values().slice(s![a, ..]),
            window,
            from,
        )
    }
}

/// Poisson NLL with the rate fitted as the pooled sample mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoissonNllScorer;

impl NllScorer for PoissonNllScorer {
    fn distribution(&self) -> &'static str {
        "poisson"
    }

    fn nll(&self, samples: ArrayView2<'_, f64>, actual: f64) -> ScoreResult<f64> {
        let rate = pooled_mean(samples);
        if !rate.is_finite() || rate < 0.0 {
            return Err(ScoreError::InvalidFittedParameter { time: 0, component: 0, value: rate });
        }
        if !actual.is_finite() || actual < 0.0 || (actual - actual.round()).abs() > INTEGER_TOL {
            return Ok(f64::INFINITY);
        }
        let k = actual.round() as u64;
        if rate == 0.0 {
            return Ok(if k == 0 { 0.0 } else { f64::INFINITY });
        }
        let dist = Poisson::new(rate)
            .map_err(|_| ScoreError::InvalidFittedParameter { time: 0, component: 0, value: rate })?;
        Ok(-dist.ln_pmf(k))
    }
}

/// Gaussian NLL with mean and population standard deviation of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GaussianNllScorer;

impl NllScorer for GaussianNllScorer {
    fn distribution(&self) -> &'static str {
        "gaussian"
    }

    fn nll(&self, samples: ArrayView2<'_, f64>, actual: f64) -> ScoreResult<f64> {
        let mu = pooled_mean(samples);
        let sd = samples.std(0.0);
        if !mu.is_finite() || !sd.is_finite() {
            let value = if mu.is_finite() { sd } else { mu };
            return Err(ScoreError::InvalidFittedParameter { time: 0, component: 0, value });
        }
        if !actual.is_finite() {
            return Ok(f64::INFINITY);
        }
        let scale = mu.abs().max(1.0);
        if sd <= POINT_MASS_TOL * scale {
            return Ok(if (actual - mu).abs() <= INTEGER_TOL * scale { 0.0 } else { f64::INFINITY });
        }
        let dist = Normal::new(mu, sd)
            .map_err(|_| ScoreError::InvalidFittedParameter { time: 0, component: 0, value: sd })?;
        Ok(-dist.ln_pdf(actual))
    }
}

fn pooled_mean(samples: ArrayView2<'_, f64>) -> f64 {
    samples.mean().unwrap_or(f64::NAN)
}

/// Slide the window over both inputs; `origin` is the absolute time of
/// row 0.
fn score_windows<S: NllScorer + ?Sized>(
    scorer: &S, forecast: ArrayView3<'_, f64>, actual: ArrayView2<'_, f64>, window: usize, origin: i64,
) -> ScoreResult<WindowScores> {
    if window == 0 {
        return Err(ScoreError::InvalidWindow { window });
    }
    let (n_time, n_comp, n_samples) = forecast.dim();
    if n_time != actual.nrows() {
        return Err(ScoreError::LengthMismatch { forecast: n_time, actual: actual.nrows() });
    }
    if n_comp != actual.ncols() {
        return Err(ScoreError::ComponentMismatch { forecast: n_comp, actual: actual.ncols() });
    }
    if n_samples == 0 {
        return Err(ScoreError::NoSamples);
    }
    if n_time < window {
        return Err(ScoreError::WindowTooLong { window, length: n_time });
    }

    let n_windows = n_time - window + 1;
    let mut scores = Array2::<f64>::zeros((n_windows, n_comp));
    let mut violations = Vec::new();
    for j in 0..n_windows {
        let end = j + window - 1;
        let time = origin + end as i64;
        for c in 0..n_comp {
            let pool = forecast.slice(s![j..=end, c, ..]);
            let value = actual[[end, c]];
            let score = scorer.nll(pool, value).map_err(|err| match err {
                ScoreError::InvalidFittedParameter { value, .. } => {
                    ScoreError::InvalidFittedParameter { time, component: c, value }
                }
                other => other,
            })?;
            if score == f64::INFINITY {
                violations.push(SupportViolation { time, component: c, value });
            }
            scores[[j, c]] = score;
        }
    }
    if !violations.is_empty() {
        warn!(
            distribution = scorer.distribution(),
            count = violations.len(),
            "true values outside the fitted support scored +inf"
        );
    }
    debug!(distribution = scorer.distribution(), windows = n_windows, window, "scored windows");
    Ok(WindowScores::new(origin + window as i64 - 1, window, scores, violations))
}
