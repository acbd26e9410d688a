//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used to fit regressors by maximum
//! likelihood: an Argmin-backed log-likelihood optimizer, numerically
//! stable scalar transforms, and a single error/result surface. Callers
//! implement a log-likelihood, choose tolerances, and obtain fitted
//! parameters and diagnostics without touching backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing log-likelihoods** `ℓ(θ)`
//!   (`loglik_optimizer`), including configuration of solvers and stopping
//!   criteria.
//! - Supply shared numerical primitives (`numerical_stability`) for link
//!   functions and smoothed losses (softplus, logistic, clamped exponent).
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate in an unconstrained parameter space `θ` and assume
//!   that inputs are finite once validation has passed; invalid states are
//!   reported as `OptError`, not panics.
//! - Objective implementations treat malformed inputs (shape mismatches,
//!   negative Poisson counts) as recoverable errors surfaced through the
//!   optimization layer.
//!
//! Conventions
//! -----------
//! - All solvers conceptually maximize a log-likelihood `ℓ(θ)` by minimizing
//!   an internal cost `c(θ) = -ℓ(θ)`; user-facing APIs and outcomes are
//!   expressed in terms of `ℓ`.
//! - Parameters and gradients are represented using `ndarray`-based aliases
//!   (`Theta`, `Grad`); mapping between θ and regression coefficients is
//!   the objective's job.
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw Argmin errors.
//! - This module avoids I/O and logging apart from the optional
//!   `obs_slog` observer; higher layers report progress via `tracing`.
//!
//! Downstream usage
//! ----------------
//! - `regression::objectives` implements `LogLikelihood` for each
//!   regression objective and `regression::linear` calls `maximize` once
//!   per output column.
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - `loglik_optimizer`: solver wiring, tolerance handling, and MLE on a
//!   toy concave objective.
//! - `numerical_stability`: agreement with naïve formulas on safe grids and
//!   well-behaved tails.
//! - `errors`: conversions from backend errors into `OptError`.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_forecasting::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
