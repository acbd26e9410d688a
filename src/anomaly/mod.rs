//! anomaly — window negative-log-likelihood scoring of stochastic forecasts.
//!
//! Purpose
//! -------
//! Turn a sampled forecast and the realized series into anomaly scores:
//! for every window of `W` steps, fit a distribution to the pooled
//! forecast samples and report the NLL of the window's last true value.
//!
//! Key behaviors
//! -------------
//! - [`PoissonNllScorer`] fits a rate (for counts); [`GaussianNllScorer`]
//!   fits a mean and population standard deviation.
//! - [`WindowScores`] carries per-window-end scores, any support
//!   violations, and a point-wise view via [`WindowScores::to_pointwise`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Scoring is pure: no state is kept between calls.
//! - Out-of-support values score `+∞` and are logged with `warn!`; they
//!   become an error only through [`WindowScores::ensure_supported`].
//!
//! Downstream usage
//! ----------------
//! - Feed `RegressionForecaster::predict` output (samples mode) into
//!   [`NllScorer::score_series`] together with the true series.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/nll_scoring.rs` runs a
//!   forecast-then-score pipeline end to end.

pub mod errors;
pub mod scorers;
pub mod windows;

pub use self::errors::{ScoreError, ScoreResult};
pub use self::scorers::{GaussianNllScorer, NllScorer, PoissonNllScorer};
pub use self::windows::{SupportViolation, WindowAgg, WindowScores};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_forecasting::anomaly::prelude::*;
//
// to import the main scoring surface in a single line.

pub mod prelude {
    pub use super::errors::{ScoreError, ScoreResult};
    pub use super::scorers::{GaussianNllScorer, NllScorer, PoissonNllScorer};
    pub use super::windows::{WindowAgg, WindowScores};
}
