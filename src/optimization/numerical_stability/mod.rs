//! numerical_stability — guarded scalar transforms shared by objectives.
//!
//! Purpose
//! -------
//! Collect numerically stable scalar transforms and small tolerances used
//! by the regression objectives and the likelihood sampler, so the rest of
//! the crate can assume well-conditioned `f64` arithmetic.
//!
//! Key behaviors
//! -------------
//! - Provide stable transforms (`safe_softplus`, `safe_logistic`) for
//!   the smoothed pinball loss and its derivative.
//! - Provide `safe_exp` for log-links (Poisson rate, Gaussian variance)
//!   with the exponent clamped to `±MAX_LOG_LINK`.
//! - Centralize `VARIANCE_FLOOR`, the clamp applied to every predicted
//!   Gaussian variance before sampling, parameter reporting, or scoring.
//!
//! Invariants & assumptions
//! ------------------------
//! - All transforms assume finite inputs; shape and domain validation
//!   happen in the calling layer.
//!
//! Conventions
//! -----------
//! - Pure functions, no logging, no I/O, no panics.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] compare against naïve formulas on a
//!   safe grid and check the tails for overflow.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    MAX_LOG_LINK, VARIANCE_FLOOR, safe_exp, safe_logistic, safe_softplus,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_forecasting::optimization::numerical_stability::prelude::*;
//
// to import the main numerical-stability surface in a single line.

pub mod prelude {
    pub use super::transformations::{
        MAX_LOG_LINK, VARIANCE_FLOOR, safe_exp, safe_logistic, safe_softplus,
    };
}
