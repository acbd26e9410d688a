//! loglik_optimizer — maximum-likelihood fitting on top of argmin's L-BFGS.
//!
//! Purpose
//! -------
//! Let an objective describe itself only as a log-likelihood `ℓ(θ)` and get
//! back the maximizer, leaving solver construction, sign conventions, and
//! gradient fallbacks to this module.
//!
//! Key behaviors
//! -------------
//! - [`traits`]: the [`LogLikelihood`] contract, [`Tolerances`] and
//!   [`MLEOptions`] (validated on construction), and [`OptimOutcome`].
//! - [`problem`]: [`problem::NegLogLik`], the argmin cost `-ℓ(θ)` with its
//!   gradient, including the central/forward finite-difference fallback for
//!   objectives without `grad`.
//! - [`solve`]: [`maximize`], which checks the start point, builds L-BFGS
//!   with More–Thuente or Hager–Zhang line search, and runs it.
//!
//! Conventions
//! -----------
//! - Objectives implement `ℓ` and `∇ℓ`, never the cost; values reported in
//!   [`OptimOutcome`] are log-likelihoods.
//! - An `OptError` raised by an objective mid-run reaches the caller as the
//!   same variant.
//!
//! Testing notes
//! -------------
//! - `problem`: sign flips, numerical gradients, gradient rejection.
//! - `solve`: a concave quadratic solved with both line searches.
//! - The linear regressor's tests run [`maximize`] on every regression
//!   objective.

pub mod problem;
pub mod solve;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::solve::maximize;
pub use self::traits::{
    Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta,
    Tolerances,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_forecasting::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::solve::maximize;
    pub use super::traits::{Cost, Grad, LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta, Tolerances};
}
