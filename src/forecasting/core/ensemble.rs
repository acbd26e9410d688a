//! Model ensemble container — one regressor, or one per quantile level.
//!
//! Purpose
//! -------
//! Hide the difference between single-model likelihoods and quantile
//! regression behind a keyed `predict(key, X)` capability, so the
//! forecaster's rollout never branches on how many models exist.
//!
//! Key behaviors
//! -------------
//! - [`ModelKey::Median`] resolves to the level closest to 0.5 in quantile
//!   mode and to the only model in single mode.
//! - In single mode every key maps to the one model.
//! - [`ModelEnsemble::clear`] empties every slot; lookups on an empty slot
//!   fail with `NotFitted`.
//! - [`ModelEnsemble::predict_quantiles`] stacks the first output parameter
//!   of every level into `[rows, outputs, levels]`.
//!
//! Conventions
//! -----------
//! - Slots are ordered like the declared levels (ascending).
use ndarray::{Array3, ArrayView2, Axis};
use serde::Serialize;

use crate::{
    forecasting::{
        core::likelihood::{Likelihood, QuantileLevels},
        errors::{ForecastError, ForecastResult},
    },
    regression::{errors::RegressorError, traits::Regressor},
};

/// Key addressing a model in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelKey {
    /// The median quantile, or the single model.
    Median,
    /// A declared quantile level.
    Level(f64),
}

/// Trained regressors keyed by quantile level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ModelEnsemble<M> {
    Single { model: Option<M> },
    Quantile { levels: QuantileLevels, models: Vec<Option<M>> },
}

impl<M> ModelEnsemble<M> {
    /// Empty ensemble laid out for `likelihood`.
    pub fn for_likelihood(likelihood: &Likelihood) -> Self {
        match likelihood {
            Likelihood::Quantile(levels) => ModelEnsemble::Quantile {
                levels: levels.clone(),
                models: (0..levels.len()).map(|_| None).collect(),
            },
            _ => ModelEnsemble::Single { model: None },
        }
    }

    /// Drop every trained model.
    pub fn clear(&mut self) {
        match self {
            ModelEnsemble::Single { model } => *model = None,
            ModelEnsemble::Quantile { models, .. } => models.iter_mut().for_each(|m| *m = None),
        }
    }

    /// Store `model` under `key`, replacing any previous one.
    ///
    /// # Errors
    /// `UnknownQuantile` if `key` is a level that was not declared.
    pub fn set(&mut self, key: ModelKey, model: M) -> ForecastResult<()> {
        match self {
            ModelEnsemble::Single { model: slot } => *slot = Some(model),
            ModelEnsemble::Quantile { levels, models } => {
                let idx = slot_index(levels, key)?;
                models[idx] = Some(model);
            }
        }
        Ok(())
    }

    /// Model stored under `key`.
    ///
    /// # Errors
    /// `UnknownQuantile` for an undeclared level, `NotFitted` for an empty
    /// slot.
    pub fn get(&self, key: ModelKey) -> ForecastResult<&M> {
        let slot = match self {
            ModelEnsemble::Single { model } => model.as_ref(),
            ModelEnsemble::Quantile { levels, models } => models[slot_index(levels, key)?].as_ref(),
        };
        slot.ok_or(ForecastError::NotFitted)
    }

    /// Number of trained models.
    pub fn len(&self) -> usize {
        match self {
            ModelEnsemble::Single { model } => usize::from(model.is_some()),
            ModelEnsemble::Quantile { models, .. } => models.iter().filter(|m| m.is_some()).count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every slot holds a trained model.
    pub fn is_complete(&self) -> bool {
        match self {
            ModelEnsemble::Single { model } => model.is_some(),
            ModelEnsemble::Quantile { models, .. } => models.iter().all(Option::is_some),
        }
    }

    /// Declared quantile levels, `None` in single mode.
    pub fn levels(&self) -> Option<&QuantileLevels> {
        match self {
            ModelEnsemble::Single { .. } => None,
            ModelEnsemble::Quantile { levels, .. } => Some(levels),
        }
    }
}

impl<M: Regressor> ModelEnsemble<M> {
    /// Raw output `[rows, outputs, params]` of the model under `key`.
    pub fn predict(&self, key: ModelKey, x: ArrayView2<'_, f64>) -> ForecastResult<Array3<f64>> {
        Ok(self.get(key)?.predict(x)?)
    }

    /// Quantile curves `[rows, outputs, levels]`.
    ///
    /// In single mode this is the single model's output unchanged.
    pub fn predict_quantiles(&self, x: ArrayView2<'_, f64>) -> ForecastResult<Array3<f64>> {
        match self {
            ModelEnsemble::Single { .. } => self.predict(ModelKey::Median, x),
            ModelEnsemble::Quantile { models, .. } => {
                let mut out: Option<Array3<f64>> = None;
                for (k, model) in models.iter().enumerate() {
                    let model = model.as_ref().ok_or(ForecastError::NotFitted)?;
                    let raw = model.predict(x)?;
                    let curves = out.get_or_insert_with(|| {
                        Array3::zeros((raw.dim().0, raw.dim().1, models.len()))
                    });
                    if raw.dim().1 != curves.dim().1 {
                        return Err(RegressorError::ShapeMismatch {
                            what: "quantile model outputs",
                            expected: curves.dim().1,
                            found: raw.dim().1,
                        }
                        .into());
                    }
                    curves.index_axis_mut(Axis(2), k).assign(&raw.index_axis(Axis(2), 0));
                }
                out.ok_or(ForecastError::NotFitted)
            }
        }
    }
}

fn slot_index(levels: &QuantileLevels, key: ModelKey) -> ForecastResult<usize> {
    match key {
        ModelKey::Median => Ok(levels.median_idx()),
        ModelKey::Level(level) => levels.position(level).ok_or(ForecastError::UnknownQuantile { level }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::{
        errors::RegressorResult,
        traits::{EvalSet, Objective},
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Key resolution (median, declared/undeclared levels, single mode).
    // - `clear`, completeness, and stacked quantile prediction.
    // -------------------------------------------------------------------------

    /// Returns its tag for every row so tests can see which model answered.
    #[derive(Debug, Clone, PartialEq)]
    struct Tagged(f64);

    impl Regressor for Tagged {
        fn objective(&self) -> Objective {
            Objective::SquaredError
        }
        fn set_objective(&mut self, _objective: Objective) {}
        fn fit(
            &mut self, _x: ArrayView2<'_, f64>, _y: ArrayView2<'_, f64>, _eval: Option<EvalSet<'_>>,
        ) -> RegressorResult<()> {
            Ok(())
        }
        fn predict(&self, x: ArrayView2<'_, f64>) -> RegressorResult<Array3<f64>> {
            Ok(Array3::from_elem((x.nrows(), 1, 1), self.0))
        }
        fn is_fitted(&self) -> bool {
            true
        }
    }

    fn quantile_ensemble() -> ModelEnsemble<Tagged> {
        let levels = QuantileLevels::new(vec![0.1, 0.5, 0.9]).expect("valid levels");
        let mut ensemble = ModelEnsemble::for_likelihood(&Likelihood::Quantile(levels));
        for q in [0.1, 0.5, 0.9] {
            ensemble.set(ModelKey::Level(q), Tagged(q)).expect("declared level");
        }
        ensemble
    }

    #[test]
    // Purpose
    // -------
    // Quantile mode holds one model per level and the median key resolves
    // to the 0.5 model.
    //
    // Given
    // -----
    // - Levels [0.1, 0.5, 0.9], each slot tagged with its level.
    //
    // Expect
    // ------
    // - len 3, complete; `Median` and `Level(0.5)` both answer 0.5.
    fn quantile_mode_has_one_model_per_level() {
        let ensemble = quantile_ensemble();
        let x = array![[0.0], [1.0]];

        assert_eq!(ensemble.len(), 3);
        assert!(ensemble.is_complete());
        assert_eq!(ensemble.get(ModelKey::Median).expect("median"), &Tagged(0.5));
        assert_eq!(ensemble.predict(ModelKey::Level(0.9), x.view()).expect("fitted")[[1, 0, 0]], 0.9);
    }

    #[test]
    // Purpose
    // -------
    // Undeclared levels are rejected on both set and get.
    //
    // Given
    // -----
    // - The [0.1, 0.5, 0.9] ensemble and level 0.3.
    //
    // Expect
    // ------
    // - `UnknownQuantile { level: 0.3 }`.
    fn undeclared_level_is_rejected() {
        let mut ensemble = quantile_ensemble();

        assert_eq!(
            ensemble.set(ModelKey::Level(0.3), Tagged(0.3)),
            Err(ForecastError::UnknownQuantile { level: 0.3 })
        );
        assert!(matches!(
            ensemble.get(ModelKey::Level(0.3)),
            Err(ForecastError::UnknownQuantile { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // `clear` empties every slot and lookups then report `NotFitted`.
    //
    // Given
    // -----
    // - A complete quantile ensemble.
    //
    // Expect
    // ------
    // - len 0 after clear; `get(Median)` is `NotFitted`.
    fn clear_drops_all_models() {
        let mut ensemble = quantile_ensemble();

        ensemble.clear();

        assert!(ensemble.is_empty());
        assert!(!ensemble.is_complete());
        assert_eq!(ensemble.get(ModelKey::Median), Err(ForecastError::NotFitted));
    }

    #[test]
    // Purpose
    // -------
    // Single mode answers every key with the one model.
    //
    // Given
    // -----
    // - A Poisson ensemble with one model tagged 7.
    //
    // Expect
    // ------
    // - `Median` and `Level(0.9)` both return it; no levels are reported.
    fn single_mode_ignores_key() {
        let mut ensemble = ModelEnsemble::for_likelihood(&Likelihood::Poisson);
        ensemble.set(ModelKey::Median, Tagged(7.0)).expect("single slot");

        assert_eq!(ensemble.get(ModelKey::Level(0.9)).expect("single"), &Tagged(7.0));
        assert_eq!(ensemble.get(ModelKey::Median).expect("single"), &Tagged(7.0));
        assert!(ensemble.levels().is_none());
    }

    #[test]
    // Purpose
    // -------
    // Quantile prediction stacks levels along the last axis.
    //
    // Given
    // -----
    // - The [0.1, 0.5, 0.9] ensemble and 2 input rows.
    //
    // Expect
    // ------
    // - Shape [2, 1, 3] holding [0.1, 0.5, 0.9] per row.
    fn predict_quantiles_stacks_levels() {
        let ensemble = quantile_ensemble();

        let curves = ensemble.predict_quantiles(array![[0.0], [1.0]].view()).expect("complete");

        assert_eq!(curves.dim(), (2, 1, 3));
        assert_eq!(curves.slice(ndarray::s![1, 0, ..]).to_vec(), vec![0.1, 0.5, 0.9]);
    }
}
