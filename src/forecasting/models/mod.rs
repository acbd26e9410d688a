//! models — forecasters assembled from the core building blocks.
//!
//! - [`forecaster`]: [`RegressionForecaster`], a lag-regression forecaster
//!   generic over the regressor and the RNG, with its [`FitSummary`] and
//!   [`ForecasterState`].

pub mod forecaster;

pub use self::forecaster::{FitSummary, ForecasterState, RegressionForecaster};
