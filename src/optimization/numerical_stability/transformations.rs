//! Guarded link functions for the regression objectives.
//!
//! The pinball loss is smoothed with softplus, whose derivative is the
//! logistic function; both switch formulas by sign (or past `x = 20`) so
//! neither tail overflows. Log-links go through [`safe_exp`], and every
//! Gaussian variance is floored at [`VARIANCE_FLOOR`].

/// Smallest variance used when a Gaussian scale is required.
///
/// Regressors predicting a variance can underflow to zero or go slightly
/// negative; every consumer clamps to this floor instead of letting
/// `sqrt` produce `NaN`.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// Bound on log-link values before exponentiation.
///
/// `exp(30) ≈ 1e13`, far beyond any realistic count rate or variance,
/// while keeping gradients finite.
pub const MAX_LOG_LINK: f64 = 30.0;

/// `ln(1 + exp(x))`; returns `x` itself once `exp(-x)` is below `f64`
/// resolution.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Evaluates `exp` only on non-positive arguments so neither tail
/// overflows. This is the derivative of [`safe_softplus`].
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `exp(x)` with `x` clamped to `[-MAX_LOG_LINK, MAX_LOG_LINK]`.
pub fn safe_exp(x: f64) -> f64 {
    x.clamp(-MAX_LOG_LINK, MAX_LOG_LINK).exp()
}
