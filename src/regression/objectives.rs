//! regression::objectives — per-column log-likelihoods for linear models.
//!
//! Purpose
//! -------
//! Express every regression [`Objective`] as a [`LogLikelihood`] over a
//! standardized design matrix so the crate's L-BFGS optimizer can fit it.
//! One [`ColumnObjective`] fits one output column of `Y`.
//!
//! Key behaviors
//! -------------
//! - `SquaredError`: Gaussian log-likelihood with unit variance,
//!   `ℓ = -½·mean((y - η)²)`.
//! - `Quantile { alpha }`: negative smoothed pinball loss
//!   `ρ_s(u) = α·u + s·softplus(-u/s)` with `u = y - η`; as `s → 0` this is
//!   the usual check function.
//! - `Poisson`: log-link, `ℓ = mean(y·η - exp(η))` (constant `ln y!`
//!   dropped).
//! - `GaussianWithUncertainty`: mean and log-variance links,
//!   `ℓ = -½·mean(log σ² + (y - μ)² / σ²)`.
//! - An optional ridge penalty `½·λ·‖w‖²` excludes intercepts.
//!
//! Invariants & assumptions
//! ------------------------
//! - Column 0 of the design matrix is the intercept (all ones); the
//!   remaining columns are already standardized.
//! - θ layout is one block of `d = x.ncols()` coefficients per
//!   parameter: `[w]`, or `[w_μ, w_logσ²]` for the Gaussian objective.
//! - Log-links are clamped to `±MAX_LOG_LINK` before exponentiation.
//!
//! Testing notes
//! -------------
//! - Analytic gradients are compared with central finite differences for
//!   every objective.
use ndarray::{Array1, Array2, ArrayView1, s};

use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, Grad, LogLikelihood, Theta},
        numerical_stability::{MAX_LOG_LINK, safe_exp, safe_logistic, safe_softplus},
    },
    regression::traits::Objective,
};

/// Design matrix (intercept + standardized features) and target matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignData {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

/// Log-likelihood of one output column under one objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnObjective {
    pub objective: Objective,
    pub column: usize,
    pub l2: f64,
    /// Pinball smoothing width `s`; ignored by other objectives.
    pub smoothing: f64,
}

impl ColumnObjective {
    pub fn new(objective: Objective, column: usize, l2: f64, smoothing: f64) -> Self {
        Self { objective, column, l2, smoothing }
    }

    /// Total θ length for a design with `d` columns.
    pub fn theta_len(&self, d: usize) -> usize {
        self.objective.n_params() * d
    }

    fn ridge(&self, theta: &Theta, d: usize) -> f64 {
        if self.l2 == 0.0 {
            return 0.0;
        }
        let mut acc = 0.0;
        for (i, &w) in theta.iter().enumerate() {
            if i % d != 0 {
                acc += w * w;
            }
        }
        0.5 * self.l2 * acc
    }

    fn ridge_grad(&self, theta: &Theta, d: usize, grad: &mut Grad) {
        if self.l2 == 0.0 {
            return;
        }
        for (i, (&w, g)) in theta.iter().zip(grad.iter_mut()).enumerate() {
            if i % d != 0 {
                *g -= self.l2 * w;
            }
        }
    }

    fn target<'a>(&self, data: &'a DesignData) -> ArrayView1<'a, f64> {
        data.y.column(self.column)
    }
}

impl LogLikelihood for ColumnObjective {
    type Data = DesignData;

    fn value(&self, theta: &Theta, data: &DesignData) -> OptResult<Cost> {
        let d = data.x.ncols();
        let n = data.x.nrows() as f64;
        let y = self.target(data);
        let eta = data.x.dot(&theta.slice(s![..d]));

        let total = match self.objective {
            Objective::SquaredError => {
                y.iter().zip(eta.iter()).map(|(&yi, &ei)| -0.5 * (yi - ei).powi(2)).sum::<f64>()
            }
            Objective::Quantile { alpha } => {
                let s = self.smoothing;
                y.iter()
                    .zip(eta.iter())
                    .map(|(&yi, &ei)| {
                        let u = yi - ei;
                        -(alpha * u + s * safe_softplus(-u / s))
                    })
                    .sum::<f64>()
            }
            Objective::Poisson => y
                .iter()
                .zip(eta.iter())
                .map(|(&yi, &ei)| {
                    let ei = ei.clamp(-MAX_LOG_LINK, MAX_LOG_LINK);
                    yi * ei - ei.exp()
                })
                .sum::<f64>(),
            Objective::GaussianWithUncertainty => {
                let log_var = data.x.dot(&theta.slice(s![d..]));
                y.iter()
                    .zip(eta.iter())
                    .zip(log_var.iter())
                    .map(|((&yi, &mu), &lv)| {
                        let lv = lv.clamp(-MAX_LOG_LINK, MAX_LOG_LINK);
                        -0.5 * (lv + (yi - mu).powi(2) * (-lv).exp())
                    })
                    .sum::<f64>()
            }
        };
        Ok(total / n - self.ridge(theta, d))
    }

    fn check(&self, theta: &Theta, data: &DesignData) -> OptResult<()> {
        let d = data.x.ncols();
        if theta.len() != self.theta_len(d) {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.theta_len(d),
                actual: theta.len(),
            });
        }
        if data.x.nrows() != data.y.nrows() || self.column >= data.y.ncols() {
            return Err(OptError::DataShapeMismatch { rows: data.x.nrows(), targets: data.y.nrows() });
        }
        if data.x.nrows() == 0 {
            return Err(OptError::DataShapeMismatch { rows: 0, targets: 0 });
        }
        for &value in self.target(data).iter() {
            if !value.is_finite() || (self.objective == Objective::Poisson && value < 0.0) {
                return Err(OptError::InvalidLogLikInput { value });
            }
        }
        Ok(())
    }

    fn grad(&self, theta: &Theta, data: &DesignData) -> OptResult<Grad> {
        let d = data.x.ncols();
        let n = data.x.nrows() as f64;
        let y = self.target(data);
        let eta = data.x.dot(&theta.slice(s![..d]));

        let mut grad = Array1::<f64>::zeros(theta.len());
        match self.objective {
            Objective::SquaredError => {
                let resid = &y - &eta;
                grad.slice_mut(s![..d]).assign(&(data.x.t().dot(&resid) / n));
            }
            Objective::Quantile { alpha } => {
                let s = self.smoothing;
                let w: Array1<f64> = y
                    .iter()
                    .zip(eta.iter())
                    .map(|(&yi, &ei)| alpha - safe_logistic(-(yi - ei) / s))
                    .collect();
                grad.slice_mut(s![..d]).assign(&(data.x.t().dot(&w) / n));
            }
            Objective::Poisson => {
                let w: Array1<f64> =
                    y.iter().zip(eta.iter()).map(|(&yi, &ei)| yi - safe_exp(ei)).collect();
                grad.slice_mut(s![..d]).assign(&(data.x.t().dot(&w) / n));
            }
            Objective::GaussianWithUncertainty => {
                let log_var = data.x.dot(&theta.slice(s![d..]));
                let mut w_mu = Array1::<f64>::zeros(y.len());
                let mut w_lv = Array1::<f64>::zeros(y.len());
                for (i, ((&yi, &mu), &lv)) in
                    y.iter().zip(eta.iter()).zip(log_var.iter()).enumerate()
                {
                    let inv_var = (-lv.clamp(-MAX_LOG_LINK, MAX_LOG_LINK)).exp();
                    let r = yi - mu;
                    w_mu[i] = r * inv_var;
                    w_lv[i] = 0.5 * (r * r * inv_var - 1.0);
                }
                grad.slice_mut(s![..d]).assign(&(data.x.t().dot(&w_mu) / n));
                grad.slice_mut(s![d..]).assign(&(data.x.t().dot(&w_lv) / n));
            }
        }
        self.ridge_grad(theta, d, &mut grad);
        Ok(grad)
    }
}
