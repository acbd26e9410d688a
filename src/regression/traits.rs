//! regression::traits — the capability contract the forecaster trains.
//!
//! Purpose
//! -------
//! Describe the only things the forecaster needs from a regressor: a way
//! to overwrite its training objective, `fit(X, Y, eval_set)`, and
//! `predict(X)`. Everything else about the regressor (hyperparameters,
//! seeds, solver settings) is its own configuration and is left untouched.
//!
//! Conventions
//! -----------
//! - `X` is `[rows, features]`, `Y` is `[rows, outputs]`; one model per
//!   output column is the regressor's business, not the caller's.
//! - `predict` returns `[rows, outputs, params]` where `params` is
//!   [`Objective::n_params`]: one value for point, quantile, and Poisson
//!   objectives (`λ` for Poisson), two for the Gaussian objective
//!   (`μ`, `σ²`).
use ndarray::{Array3, ArrayView2};
use serde::Serialize;

use crate::regression::errors::RegressorResult;

/// Training objective a regressor is configured with.
///
/// The forecaster derives this from its likelihood: `SquaredError` for
/// point forecasts, one `Quantile` per declared level, `Poisson` for count
/// data, and `GaussianWithUncertainty` for mean/variance regression.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum Objective {
    #[default]
    SquaredError,
    Quantile {
        alpha: f64,
    },
    Poisson,
    GaussianWithUncertainty,
}

impl Objective {
    /// Number of values `predict` emits per output column.
    pub fn n_params(&self) -> usize {
        match self {
            Objective::GaussianWithUncertainty => 2,
            _ => 1,
        }
    }

    /// Loss name in the `loss_function` vocabulary of boosting libraries,
    /// useful when forwarding the objective to an external regressor.
    pub fn loss_name(&self) -> String {
        match self {
            Objective::SquaredError => "RMSE".to_string(),
            Objective::Quantile { alpha } => format!("Quantile:alpha={alpha}"),
            Objective::Poisson => "Poisson".to_string(),
            Objective::GaussianWithUncertainty => "RMSEWithUncertainty".to_string(),
        }
    }
}

/// Held-out data forwarded to `fit` for monitoring.
#[derive(Debug, Clone, Copy)]
pub struct EvalSet<'a> {
    pub x: ArrayView2<'a, f64>,
    pub y: ArrayView2<'a, f64>,
}

/// Regressor capability used by the forecaster.
///
/// `Clone` lets the forecaster stamp out one independently trained copy per
/// quantile level from a single configured template.
pub trait Regressor: Clone {
    /// Objective the next `fit` will train against.
    fn objective(&self) -> Objective;

    /// Overwrite the training objective; all other settings are kept.
    fn set_objective(&mut self, objective: Objective);

    /// Train on `x` `[rows, features]` against `y` `[rows, outputs]`.
    ///
    /// Refitting discards any previous fit.
    fn fit(
        &mut self, x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>, eval_set: Option<EvalSet<'_>>,
    ) -> RegressorResult<()>;

    /// Predict `[rows, outputs, objective.n_params()]`.
    ///
    /// # Errors
    /// `RegressorError::NotFitted` before a successful `fit`, and
    /// `RegressorError::ShapeMismatch` when the feature count differs
    /// from training.
    fn predict(&self, x: ArrayView2<'_, f64>) -> RegressorResult<Array3<f64>>;

    fn is_fitted(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Parameter counts and loss names follow the objective.
    //
    // Given
    // -----
    // - Each objective variant.
    //
    // Expect
    // ------
    // - Only the Gaussian objective emits two parameters; names match the
    //   boosting vocabulary.
    fn objective_parameter_counts_and_names() {
        assert_eq!(Objective::SquaredError.n_params(), 1);
        assert_eq!(Objective::Quantile { alpha: 0.5 }.n_params(), 1);
        assert_eq!(Objective::Poisson.n_params(), 1);
        assert_eq!(Objective::GaussianWithUncertainty.n_params(), 2);

        assert_eq!(Objective::Quantile { alpha: 0.25 }.loss_name(), "Quantile:alpha=0.25");
        assert_eq!(Objective::GaussianWithUncertainty.loss_name(), "RMSEWithUncertainty");
        assert_eq!(Objective::default(), Objective::SquaredError);
    }
}
