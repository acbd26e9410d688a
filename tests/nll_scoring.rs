//! Integration tests for window NLL scoring of sampled forecasts.
//!
//! Purpose
//! -------
//! - Validate forecast-then-score: a Poisson forecaster produces samples,
//!   and the window scorers turn them plus the realized series into
//!   anomaly scores aligned on absolute time.
//!
//! Coverage
//! --------
//! - `anomaly::scorers`: `score_series` against real forecaster output,
//!   the pooled-rate reference formula, anomaly ranking, and Gaussian
//!   scoring of the same samples.
//! - `anomaly::windows`: point-wise aggregation over real scores.
//!
//! Exclusions
//! ----------
//! - Degenerate distributions and error paths: covered by unit tests.
use approx::assert_relative_eq;
use ndarray::{Array2, s};
use rust_forecasting::{
    anomaly::{
        scorers::{GaussianNllScorer, NllScorer, PoissonNllScorer},
        windows::WindowAgg,
    },
    forecasting::{
        core::{
            forecasts::StochasticForecast, lags::LagSpec, likelihood::Likelihood,
            options::ForecasterOptions, series::TimeSeries, tabularize::SeriesSet,
        },
        models::forecaster::RegressionForecaster,
    },
    regression::linear::LinearRegressor,
};
use statrs::distribution::{Discrete, Poisson};

const HISTORY: usize = 50;
const HORIZON: usize = 10;

/// Purpose
/// -------
/// Counts cycling through 2..=6 over `n` steps from time 0.
fn counts(n: usize) -> Vec<f64> {
    (0..n).map(|t| (t % 5) as f64 + 2.0).collect()
}

/// Purpose
/// -------
/// Fit a Poisson forecaster on the first `HISTORY` counts and draw
/// `HORIZON` steps of 200 samples past them.
fn poisson_forecast() -> StochasticForecast {
    let history = [TimeSeries::univariate(&counts(HISTORY)).expect("finite counts")];
    let set = SeriesSet::new(&history);
    let options = ForecasterOptions::new(
        LagSpec::autoregressive(5).expect("valid lags"),
        1,
        Likelihood::Poisson,
        true,
        false,
    )
    .expect("valid options");
    let mut model =
        RegressionForecaster::with_seed(options, LinearRegressor::default(), 11).expect("valid forecaster");
    model.fit(&set, None, None).expect("fit should succeed");
    model
        .predict(HORIZON, &set, 200, false)
        .expect("predict should succeed")
        .into_samples()
        .expect("samples mode")
        .remove(0)
}

/// Purpose
/// -------
/// The realized series over the forecast horizon, optionally with a spike.
fn realized(spike: Option<(usize, f64)>) -> TimeSeries {
    let mut values = counts(HISTORY + HORIZON)[HISTORY..].to_vec();
    if let Some((at, value)) = spike {
        values[at] = value;
    }
    let column = Array2::from_shape_vec((HORIZON, 1), values).expect("column shape");
    TimeSeries::new(HISTORY as i64, column).expect("finite truth")
}

#[test]
// Purpose
// -------
// Scores against real forecaster output follow the pooled-rate formula.
//
// Given
// -----
// - A 10-step Poisson forecast with 200 samples and the matching truth;
//   window 3.
//
// Expect
// ------
// - 8 window ends starting at time 52, all finite, each equal to
//   −ln P(y_e; mean of the 3 × 200 pooled samples).
fn poisson_scores_follow_pooled_rate() {
    let forecast = poisson_forecast();
    let truth = realized(None);

    let scores = PoissonNllScorer.score_series(&forecast, &truth, 3).expect("scoring should succeed");

    assert_eq!(scores.len(), HORIZON - 2);
    assert_eq!(scores.start(), HISTORY as i64 + 2);
    assert!(scores.is_supported());
    for j in 0..scores.len() {
        let end = j + 2;
        let rate = forecast.values().slice(s![j..=end, 0, ..]).mean().expect("non-empty pool");
        let k = truth.values()[[end, 0]] as u64;
        let expected = -Poisson::new(rate).expect("positive rate").ln_pmf(k);
        assert_relative_eq!(scores.scores()[[j, 0]], expected, epsilon = 1e-9);
    }
}

#[test]
// Purpose
// -------
// A spike in the realized counts produces the largest window score.
//
// Given
// -----
// - The same forecast; truth with a 40 at horizon step 6; window 1.
//
// Expect
// ------
// - The maximum score sits at time 56 and exceeds every other score.
fn spike_gets_the_highest_score() {
    let forecast = poisson_forecast();
    let truth = realized(Some((6, 40.0)));

    let scores = PoissonNllScorer.score_series(&forecast, &truth, 1).expect("scoring should succeed");

    let column = scores.scores().column(0).to_vec();
    let (argmax, max) = column
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| if *v > best.1 { (i, *v) } else { best });
    assert_eq!(scores.start() + argmax as i64, HISTORY as i64 + 6);
    assert!(column.iter().enumerate().all(|(i, v)| i == argmax || *v < max));
}

#[test]
// Purpose
// -------
// Gaussian scoring of the same samples and point-wise aggregation both
// cover the expected time span.
//
// Given
// -----
// - The same forecast and truth; Gaussian scorer with window 4.
//
// Expect
// ------
// - 7 finite window scores; the point-wise view has 10 rows starting at
//   the first forecast time.
fn gaussian_scores_map_back_to_every_step() {
    let forecast = poisson_forecast();
    let truth = realized(None);

    let scores = GaussianNllScorer.score_series(&forecast, &truth, 4).expect("scoring should succeed");
    let points = scores.to_pointwise(WindowAgg::Max);

    assert_eq!(scores.len(), HORIZON - 3);
    assert!(scores.scores().iter().all(|v| v.is_finite()));
    assert_eq!(scores.pointwise_start(), HISTORY as i64);
    assert_eq!(points.nrows(), HORIZON);
}
