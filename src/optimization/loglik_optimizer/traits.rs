//! Contract and configuration for maximum-likelihood fits.
//!
//! An objective implements [`LogLikelihood`] (the value `ℓ(θ)`, an input
//! check, and optionally `∇ℓ(θ)`); [`MLEOptions`] picks the stopping rules,
//! line search, and L-BFGS history; [`OptimOutcome`] is what comes back.
//! The solver minimizes `-ℓ`, but everything here speaks in terms of `ℓ`.
use std::{collections::HashMap, str::FromStr};

use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use ndarray::Array1;

use crate::optimization::errors::{OptError, OptResult};

/// Unconstrained parameter vector.
pub type Theta = Array1<f64>;

/// Gradient of `ℓ` (or of the internal cost) with respect to [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Argmin's function-evaluation counters, keyed by counter name.
pub type FnEvalMap = HashMap<String, u64>;

/// L-BFGS history used when [`MLEOptions::lbfgs_mem`] is `None`.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// A log-likelihood to maximize over [`Theta`].
///
/// `check` runs once on the starting point before any solver work and
/// should reject shape or domain problems in `data`. `grad`, when
/// implemented, returns `∇ℓ(θ)`; the default reports
/// [`OptError::GradientNotImplemented`] and the driver differentiates `ℓ`
/// numerically instead.
pub trait LogLikelihood {
    type Data: 'static;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;

    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Line search inside L-BFGS. Parsed case-insensitively from
/// `"MoreThuente"` / `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch { name: s.to_string() }),
        }
    }
}

/// Stopping rules. At least one must be set; set tolerances are finite
/// and positive, and `max_iter` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Stop once the gradient norm falls below this.
    pub tol_grad: Option<f64>,
    /// Stop once the change in cost falls below this.
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// `NoTolerancesProvided`, `InvalidTolerance`, or `InvalidMaxIter`.
    pub fn new(tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        positive_tolerance("gradient", tol_grad)?;
        positive_tolerance("cost change", tol_cost)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter { max_iter: 0 });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

fn positive_tolerance(name: &'static str, tol: Option<f64>) -> OptResult<()> {
    match tol {
        Some(value) if !(value.is_finite() && value > 0.0) => {
            Err(OptError::InvalidTolerance { name, value })
        }
        _ => Ok(()),
    }
}

/// Optimizer configuration.
///
/// Defaults: `tol_grad = 1e-6`, `max_iter = 300`, More–Thuente line
/// search, L-BFGS history [`DEFAULT_LBFGS_MEM`], not verbose. `verbose`
/// attaches a terminal observer when the `obs_slog` feature is on.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// # Errors
    /// `InvalidLBFGSMem` for a history of zero.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidLBFGSMem { mem: 0 });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Result of [`maximize`](crate::optimization::loglik_optimizer::maximize).
///
/// `value` is the best log-likelihood `ℓ(θ̂)`, not the internal cost.
/// `converged` is `true` for any argmin termination other than
/// "not terminated", including hitting `max_iter`; `status` keeps the
/// argmin reason.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Assemble an outcome from final solver state.
    ///
    /// # Errors
    /// `MissingThetaHat`, `InvalidThetaHat`, or `NonFiniteCost` when the
    /// solver's best point is absent or not finite.
    pub fn new(
        theta_hat: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = theta_hat.ok_or(OptError::MissingThetaHat)?;
        if let Some((index, &value)) = theta_hat.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaHat { index, value });
        }
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => (true, format!("{reason:?}")),
        };
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}
