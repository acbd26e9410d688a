//! regression::linear — maximum-likelihood linear regressor.
//!
//! Purpose
//! -------
//! Provide a concrete [`Regressor`] that supports every objective the
//! forecaster can request, so the full fit/predict/sample pipeline runs
//! without an external learner. Each output column gets its own
//! coefficient vector fitted by L-BFGS through [`maximize`].
//!
//! Key behaviors
//! -------------
//! - Standardizes features on the training set (zero mean, unit scale;
//!   constant columns keep scale 1) and prepends an intercept.
//! - Starts each column at a closed-form intercept-only solution (mean,
//!   empirical quantile, log-mean, mean + log-variance) and skips the
//!   optimizer when that start is already stationary.
//! - Predicts `[rows, outputs, params]`: the linear predictor for point and
//!   quantile objectives, `exp(η)` for Poisson, and `(μ, exp(η_σ²))` for the
//!   Gaussian objective.
//! - Records per-column optimizer diagnostics and, when an eval set is
//!   supplied, the mean negative log-likelihood on it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Training features and targets are finite; Poisson targets are
//!   non-negative.
//! - A fitted model never changes objective silently: `set_objective`
//!   discards the current fit.
//!
//! Conventions
//! -----------
//! - Fitted state serializes with `serde` so a forecaster can export it.
//!
//! Testing notes
//! -------------
//! - Unit tests check recovery of known relations for each objective and
//!   the error paths (unfitted predict, shape mismatch, bad targets).
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis, s};
use serde::Serialize;
use tracing::debug;

use crate::{
    optimization::{
        loglik_optimizer::{LogLikelihood, MLEOptions, Theta, maximize},
        numerical_stability::{VARIANCE_FLOOR, safe_exp},
    },
    regression::{
        errors::{RegressorError, RegressorResult},
        objectives::{ColumnObjective, DesignData},
        traits::{EvalSet, Objective, Regressor},
    },
};

/// Pinball smoothing width relative to the target's standard deviation.
const QUANTILE_SMOOTHING: f64 = 1e-2;

/// Gradient norm under which the intercept-only start is accepted as is.
const STATIONARY_TOL: f64 = 1e-10;

/// Configuration for [`LinearRegressor`].
///
/// - `l2`: ridge penalty on non-intercept coefficients (standardized
///   scale). Must be finite and `>= 0`.
/// - `mle`: optimizer tolerances, line search, and L-BFGS memory.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressorOptions {
    pub l2: f64,
    pub mle: MLEOptions,
}

impl LinearRegressorOptions {
    pub fn new(l2: f64, mle: MLEOptions) -> RegressorResult<Self> {
        if !l2.is_finite() || l2 < 0.0 {
            return Err(RegressorError::InvalidPenalty { value: l2 });
        }
        Ok(Self { l2, mle })
    }
}

impl Default for LinearRegressorOptions {
    fn default() -> Self {
        Self { l2: 1e-6, mle: MLEOptions::default() }
    }
}

/// Optimizer summary for one output column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDiagnostics {
    pub loglik: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Fitted coefficients and the feature scaling they were fitted on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearFit {
    pub n_features: usize,
    pub feature_means: Array1<f64>,
    pub feature_scales: Array1<f64>,
    /// `[outputs, params, 1 + n_features]`, intercept first.
    pub coefficients: Array3<f64>,
    pub diagnostics: Vec<ColumnDiagnostics>,
    pub eval_loss: Option<f64>,
}

/// Linear model with likelihood-specific links, one per output column.
#[derive(Debug, Clone, Serialize)]
pub struct LinearRegressor {
    #[serde(skip)]
    options: LinearRegressorOptions,
    objective: Objective,
    fit: Option<LinearFit>,
}

impl LinearRegressor {
    pub fn new(options: LinearRegressorOptions) -> Self {
        Self { options, objective: Objective::default(), fit: None }
    }

    pub fn options(&self) -> &LinearRegressorOptions {
        &self.options
    }

    /// Fitted state, if any.
    pub fn fitted(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }

    /// Mean negative log-likelihood on the eval set of the last fit.
    pub fn eval_loss(&self) -> Option<f64> {
        self.fit.as_ref().and_then(|f| f.eval_loss)
    }

    fn design(&self, x: ArrayView2<'_, f64>, means: &Array1<f64>, scales: &Array1<f64>) -> Array2<f64> {
        let mut z = Array2::<f64>::ones((x.nrows(), x.ncols() + 1));
        let mut body = z.slice_mut(s![.., 1..]);
        body.assign(&x);
        body -= means;
        body /= scales;
        z
    }

    fn objective_for(&self, column: usize, y: ArrayView1<'_, f64>) -> ColumnObjective {
        let spread = population_std(y);
        let smoothing = QUANTILE_SMOOTHING * if spread > 0.0 { spread } else { 1.0 };
        ColumnObjective::new(self.objective, column, self.options.l2, smoothing)
    }

    fn initial_theta(&self, d: usize, y: ArrayView1<'_, f64>) -> Theta {
        let mut theta = Theta::zeros(self.objective.n_params() * d);
        let mean = y.mean().unwrap_or(0.0);
        match self.objective {
            Objective::SquaredError => theta[0] = mean,
            Objective::Quantile { alpha } => theta[0] = empirical_quantile(y, alpha),
            Objective::Poisson => theta[0] = mean.max(1e-8).ln(),
            Objective::GaussianWithUncertainty => {
                theta[0] = mean;
                theta[d] = population_std(y).powi(2).max(VARIANCE_FLOOR).ln();
            }
        }
        theta
    }

    fn validate_training(
        &self, x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>,
    ) -> RegressorResult<()> {
        if x.nrows() == 0 || y.ncols() == 0 {
            return Err(RegressorError::EmptyTrainingSet { rows: x.nrows(), cols: y.ncols() });
        }
        if x.nrows() != y.nrows() {
            return Err(RegressorError::ShapeMismatch {
                what: "target rows",
                expected: x.nrows(),
                found: y.nrows(),
            });
        }
        if let Objective::Quantile { alpha } = self.objective {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(RegressorError::InvalidQuantileLevel { alpha });
            }
        }
        for ((row, col), &value) in x.indexed_iter() {
            if !value.is_finite() {
                return Err(RegressorError::InvalidFeature { row, col, value });
            }
        }
        for ((row, col), &value) in y.indexed_iter() {
            if !value.is_finite() {
                return Err(RegressorError::InvalidTarget {
                    row,
                    col,
                    value,
                    reason: "targets must be finite",
                });
            }
            if self.objective == Objective::Poisson && value < 0.0 {
                return Err(RegressorError::InvalidTarget {
                    row,
                    col,
                    value,
                    reason: "Poisson targets must be non-negative",
                });
            }
        }
        Ok(())
    }

    fn eval_loss_on(&self, eval: EvalSet<'_>, fit: &LinearFit) -> RegressorResult<f64> {
        if eval.x.ncols() != fit.n_features {
            return Err(RegressorError::ShapeMismatch {
                what: "eval features",
                expected: fit.n_features,
                found: eval.x.ncols(),
            });
        }
        if eval.y.ncols() != fit.coefficients.len_of(Axis(0)) || eval.x.nrows() != eval.y.nrows() {
            return Err(RegressorError::ShapeMismatch {
                what: "eval targets",
                expected: fit.coefficients.len_of(Axis(0)),
                found: eval.y.ncols(),
            });
        }
        let data = DesignData {
            x: self.design(eval.x, &fit.feature_means, &fit.feature_scales),
            y: eval.y.to_owned(),
        };
        let mut total = 0.0;
        for (col, coef) in fit.coefficients.outer_iter().enumerate() {
            let theta: Theta = coef.iter().copied().collect();
            let mut obj = self.objective_for(col, data.y.column(col));
            obj.l2 = 0.0;
            total -= obj
                .value(&theta, &data)
                .map_err(|source| RegressorError::Optimization { output: col, source })?;
        }
        Ok(total / fit.coefficients.len_of(Axis(0)) as f64)
    }
}

impl Default for LinearRegressor {
    fn default() -> Self {
        Self::new(LinearRegressorOptions::default())
    }
}

impl Regressor for LinearRegressor {
    fn objective(&self) -> Objective {
        self.objective
    }

    fn set_objective(&mut self, objective: Objective) {
        if objective != self.objective {
            self.fit = None;
        }
        self.objective = objective;
    }

    fn fit(
        &mut self, x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>, eval_set: Option<EvalSet<'_>>,
    ) -> RegressorResult<()> {
        self.fit = None;
        self.validate_training(x, y)?;

        let n_features = x.ncols();
        let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n_features));
        let scales: Array1<f64> = x
            .axis_iter(Axis(1))
            .map(|col| {
                let sd = population_std(col);
                if sd > 1e-12 { sd } else { 1.0 }
            })
            .collect();
        let data = DesignData { x: self.design(x, &means, &scales), y: y.to_owned() };
        let d = n_features + 1;
        let n_params = self.objective.n_params();

        let mut coefficients = Array3::<f64>::zeros((y.ncols(), n_params, d));
        let mut diagnostics = Vec::with_capacity(y.ncols());
        for col in 0..y.ncols() {
            let target = data.y.column(col);
            let obj = self.objective_for(col, target);
            let theta0 = self.initial_theta(d, target);
            let to_err = |source| RegressorError::Optimization { output: col, source };

            let start_grad = obj.grad(&theta0, &data).map_err(to_err)?;
            let stationary = start_grad.iter().all(|g| g.abs() < STATIONARY_TOL)
                || (self.objective == Objective::GaussianWithUncertainty
                    && population_std(target) == 0.0);

            let (theta_hat, diag) = if stationary {
                let loglik = obj.value(&theta0, &data).map_err(to_err)?;
                (theta0, ColumnDiagnostics { loglik, iterations: 0, converged: true })
            } else {
                let out = maximize(&obj, theta0, &data, &self.options.mle).map_err(to_err)?;
                let diag = ColumnDiagnostics {
                    loglik: out.value,
                    iterations: out.iterations,
                    converged: out.converged,
                };
                (out.theta_hat, diag)
            };
            debug!(
                column = col,
                objective = %self.objective.loss_name(),
                iterations = diag.iterations,
                loglik = diag.loglik,
                "linear regressor column fitted"
            );
            for p in 0..n_params {
                coefficients
                    .slice_mut(s![col, p, ..])
                    .assign(&theta_hat.slice(s![p * d..(p + 1) * d]));
            }
            diagnostics.push(diag);
        }

        let mut fit = LinearFit {
            n_features,
            feature_means: means,
            feature_scales: scales,
            coefficients,
            diagnostics,
            eval_loss: None,
        };
        if let Some(eval) = eval_set {
            let loss = self.eval_loss_on(eval, &fit)?;
            debug!(eval_loss = loss, "linear regressor eval set scored");
            fit.eval_loss = Some(loss);
        }
        self.fit = Some(fit);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> RegressorResult<Array3<f64>> {
        let fit = self.fit.as_ref().ok_or(RegressorError::NotFitted)?;
        if x.ncols() != fit.n_features {
            return Err(RegressorError::ShapeMismatch {
                what: "features",
                expected: fit.n_features,
                found: x.ncols(),
            });
        }
        let z = self.design(x, &fit.feature_means, &fit.feature_scales);
        let n_outputs = fit.coefficients.len_of(Axis(0));
        let n_params = self.objective.n_params();

        let mut out = Array3::<f64>::zeros((x.nrows(), n_outputs, n_params));
        for col in 0..n_outputs {
            for p in 0..n_params {
                let eta = z.dot(&fit.coefficients.slice(s![col, p, ..]));
                let values = match (self.objective, p) {
                    (Objective::Poisson, _) | (Objective::GaussianWithUncertainty, 1) => {
                        eta.mapv(safe_exp)
                    }
                    _ => eta,
                };
                out.slice_mut(s![.., col, p]).assign(&values);
            }
        }
        Ok(out)
    }

    fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }
}

fn population_std(values: ArrayView1<'_, f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.std(0.0)
}

/// Linear-interpolated empirical quantile (numpy's default rule).
fn empirical_quantile(values: ArrayView1<'_, f64>, alpha: f64) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = alpha * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::Tolerances;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of known relations under each objective.
    // - Eval-set loss recording.
    // - Error paths: unfitted predict, feature-count mismatch, negative
    //   Poisson targets.
    //
    // They intentionally DO NOT cover:
    // - Optimizer internals (see `optimization::loglik_optimizer`).
    // -------------------------------------------------------------------------

    fn tight_regressor(objective: Objective) -> LinearRegressor {
        let tols = Tolerances::new(Some(1e-9), None, Some(500)).expect("valid tolerances");
        let mle = MLEOptions { tols, ..MLEOptions::default() };
        let mut model = LinearRegressor::new(
            LinearRegressorOptions::new(0.0, mle).expect("valid options"),
        );
        model.set_objective(objective);
        model
    }

    fn grid(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 1), |(i, _)| i as f64 / 10.0)
    }

    #[test]
    // Purpose
    // -------
    // Squared error recovers an exact linear relation.
    //
    // Given
    // -----
    // - y = 2 + 3x on 30 grid points.
    //
    // Expect
    // ------
    // - Predictions within 1e-4 of the truth at x = 0.55.
    fn squared_error_recovers_linear_relation() {
        let x = grid(30);
        let y = x.mapv(|v| 2.0 + 3.0 * v);
        let mut model = tight_regressor(Objective::SquaredError);

        model.fit(x.view(), y.view(), None).expect("fit should succeed");
        let pred = model.predict(array![[0.55]].view()).expect("predict");

        assert_eq!(pred.dim(), (1, 1, 1));
        assert_abs_diff_eq!(pred[[0, 0, 0]], 2.0 + 3.0 * 0.55, epsilon = 1e-4);
    }

    #[test]
    // Purpose
    // -------
    // The Poisson objective fits a log-linear rate.
    //
    // Given
    // -----
    // - y = exp(0.5 + 0.3x), the rate itself as target.
    //
    // Expect
    // ------
    // - λ̂(x) ≈ exp(0.5 + 0.3x) and strictly positive.
    fn poisson_recovers_log_linear_rate() {
        let x = grid(40);
        let y = x.mapv(|v| (0.5 + 0.3 * v).exp());
        let mut model = tight_regressor(Objective::Poisson);

        model.fit(x.view(), y.view(), None).expect("fit should succeed");
        let pred = model.predict(array![[2.0]].view()).expect("predict");

        assert!(pred[[0, 0, 0]] > 0.0);
        assert_abs_diff_eq!(pred[[0, 0, 0]], (0.5_f64 + 0.6).exp(), epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // The Gaussian objective returns a mean and a positive variance that
    // tracks the residual spread.
    //
    // Given
    // -----
    // - y = 1 + x ± 0.5, alternating sign.
    //
    // Expect
    // ------
    // - Two parameters per output; μ̂(1) ≈ 2, σ̂² in (0.15, 0.35).
    fn gaussian_reports_mean_and_variance() {
        let x = grid(40);
        let y = Array2::from_shape_fn((40, 1), |(i, _)| {
            1.0 + i as f64 / 10.0 + if i % 2 == 0 { 0.5 } else { -0.5 }
        });
        let mut model = tight_regressor(Objective::GaussianWithUncertainty);

        model.fit(x.view(), y.view(), None).expect("fit should succeed");
        let pred = model.predict(array![[1.0]].view()).expect("predict");

        assert_eq!(pred.dim(), (1, 1, 2));
        assert_abs_diff_eq!(pred[[0, 0, 0]], 2.0, epsilon = 0.1);
        assert!(pred[[0, 0, 1]] > 0.15 && pred[[0, 0, 1]] < 0.35, "var = {}", pred[[0, 0, 1]]);
    }

    #[test]
    // Purpose
    // -------
    // Quantile objectives order themselves: the 0.9 fit lies above the
    // 0.1 fit.
    //
    // Given
    // -----
    // - y = x + e with e cycling over {-1, -0.5, 0, 0.5, 1}.
    //
    // Expect
    // ------
    // - q̂_0.9(1.0) > q̂_0.1(1.0).
    fn quantile_levels_are_ordered() {
        let x = grid(50);
        let noise = [-1.0, -0.5, 0.0, 0.5, 1.0];
        let y = Array2::from_shape_fn((50, 1), |(i, _)| i as f64 / 10.0 + noise[i % 5]);

        let mut lo = tight_regressor(Objective::Quantile { alpha: 0.1 });
        let mut hi = tight_regressor(Objective::Quantile { alpha: 0.9 });
        lo.fit(x.view(), y.view(), None).expect("fit lo");
        hi.fit(x.view(), y.view(), None).expect("fit hi");

        let at = array![[1.0]];
        let q_lo = lo.predict(at.view()).expect("predict lo")[[0, 0, 0]];
        let q_hi = hi.predict(at.view()).expect("predict hi")[[0, 0, 0]];
        assert!(q_hi > q_lo + 0.5, "q_hi = {q_hi}, q_lo = {q_lo}");
    }

    #[test]
    // Purpose
    // -------
    // Supplying an eval set records a finite monitoring loss.
    //
    // Given
    // -----
    // - A linear training set and a shifted eval set.
    //
    // Expect
    // ------
    // - `eval_loss()` is `Some` and finite; without an eval set it is `None`.
    fn eval_set_loss_is_recorded() {
        let x = grid(20);
        let y = x.mapv(|v| 1.0 - v);
        let x_val = array![[0.3], [0.7]];
        let y_val = array![[0.8], [0.2]];
        let mut model = tight_regressor(Objective::SquaredError);

        model
            .fit(x.view(), y.view(), Some(EvalSet { x: x_val.view(), y: y_val.view() }))
            .expect("fit with eval");
        let loss = model.eval_loss().expect("eval loss recorded");
        assert!(loss.is_finite() && loss >= 0.0);

        model.fit(x.view(), y.view(), None).expect("refit");
        assert_eq!(model.eval_loss(), None);
    }

    #[test]
    // Purpose
    // -------
    // Error paths surface as typed errors.
    //
    // Given
    // -----
    // - An unfitted model, a fitted one queried with two features, and a
    //   Poisson fit on a negative target.
    //
    // Expect
    // ------
    // - `NotFitted`, `ShapeMismatch`, `InvalidTarget` respectively.
    fn error_paths_are_typed() {
        let x = grid(10);
        let y = x.clone();
        let mut model = tight_regressor(Objective::SquaredError);
        assert_eq!(
            model.predict(x.view()).expect_err("unfitted"),
            RegressorError::NotFitted
        );

        model.fit(x.view(), y.view(), None).expect("fit");
        let wide = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            model.predict(wide.view()),
            Err(RegressorError::ShapeMismatch { expected: 1, found: 2, .. })
        ));

        let mut poisson = tight_regressor(Objective::Poisson);
        let negative = x.mapv(|v| v - 0.5);
        assert!(matches!(
            poisson.fit(x.view(), negative.view(), None),
            Err(RegressorError::InvalidTarget { .. })
        ));
    }
}
