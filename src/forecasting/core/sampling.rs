//! Likelihood sampler — turn raw regressor output into sample paths.
//!
//! Purpose
//! -------
//! Convert the raw per-step output of the ensemble, shaped
//! `[time, component, params]`, into draws `[time, component, samples]`
//! under the configured [`Likelihood`], and into the deterministic point
//! values and named parameters the forecaster reports.
//!
//! Key behaviors
//! -------------
//! - Quantile: inverse-CDF sampling on uniform draws, interpolating the
//!   predicted quantile curve piecewise-linearly between declared levels
//!   and holding it flat outside `[q_min, q_max]`. Crossed predictions are
//!   sorted first, so the curve is monotone.
//! - Poisson: `λ <= 0` yields exact zeros; otherwise draws come from
//!   `statrs::distribution::Poisson`.
//! - Gaussian: the variance is floored at [`VARIANCE_FLOOR`] (NaN included)
//!   and draws come from `statrs::distribution::Normal`.
//! - None: only `num_samples == 1` is valid; the raw value is returned.
//!
//! Invariants & assumptions
//! ------------------------
//! - `raw.dim().2 == likelihood.n_raw_params()`; the forecaster checks the
//!   regressor output shape before calling in here.
//! - All randomness comes from the caller's RNG, so a seeded RNG makes the
//!   output reproducible.
//!
//! Conventions
//! -----------
//! - Gaussian parameters are reported as `(μ, σ)` with `σ = sqrt(σ²)` after
//!   flooring; raw output carries `σ²`.
use ndarray::{Array2, Array3, ArrayView1, ArrayView3, Axis, s};
use rand::Rng;
use statrs::distribution::{Normal, Poisson};

use crate::{
    forecasting::{
        core::likelihood::{Likelihood, QuantileLevels},
        errors::{ForecastError, ForecastResult},
    },
    optimization::numerical_stability::VARIANCE_FLOOR,
};

/// Draw `num_samples` values per `(time, component)` from raw output.
///
/// # Errors
/// - `InvalidNumSamples` when `num_samples == 0`, or when it exceeds one
///   for [`Likelihood::None`].
/// - `InvalidParameter` for a non-finite Poisson rate, Gaussian mean, or
///   quantile prediction.
pub fn sample<R: Rng + ?Sized>(
    raw: ArrayView3<'_, f64>, num_samples: usize, likelihood: &Likelihood, rng: &mut R,
) -> ForecastResult<Array3<f64>> {
    if num_samples == 0 {
        return Err(ForecastError::InvalidNumSamples {
            num_samples,
            reason: "at least one sample is required",
        });
    }
    debug_assert_eq!(raw.dim().2, likelihood.n_raw_params());
    let (n_time, n_comp, _) = raw.dim();
    let mut out = Array3::<f64>::zeros((n_time, n_comp, num_samples));

    match likelihood {
        Likelihood::None => {
            if num_samples > 1 {
                return Err(ForecastError::InvalidNumSamples {
                    num_samples,
                    reason: "sampling requires a probabilistic likelihood",
                });
            }
            out.index_axis_mut(Axis(2), 0).assign(&raw.index_axis(Axis(2), 0));
        }
        Likelihood::Quantile(levels) => {
            for t in 0..n_time {
                for c in 0..n_comp {
                    let curve = sorted_curve(raw.slice(s![t, c, ..]))?;
                    for s in 0..num_samples {
                        let u: f64 = rng.gen();
                        out[[t, c, s]] = interpolate_quantile(levels, &curve, u);
                    }
                }
            }
        }
        Likelihood::Poisson => {
            for t in 0..n_time {
                for c in 0..n_comp {
                    let lambda = checked("lambda", raw[[t, c, 0]])?;
                    if lambda <= 0.0 {
                        continue;
                    }
                    let dist = Poisson::new(lambda)
                        .map_err(|_| ForecastError::InvalidParameter { name: "lambda", value: lambda })?;
                    for s in 0..num_samples {
                        out[[t, c, s]] =
                            <Poisson as rand::distributions::Distribution<f64>>::sample(&dist, rng);
                    }
                }
            }
        }
        Likelihood::Gaussian => {
            for t in 0..n_time {
                for c in 0..n_comp {
                    let mu = checked("mu", raw[[t, c, 0]])?;
                    let sigma = gaussian_sigma(raw[[t, c, 1]])?;
                    let dist = Normal::new(mu, sigma)
                        .map_err(|_| ForecastError::InvalidParameter { name: "sigma", value: sigma })?;
                    for s in 0..num_samples {
                        out[[t, c, s]] =
                            <Normal as rand::distributions::Distribution<f64>>::sample(&dist, rng);
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Deterministic value per `(time, component)`: the median quantile, `λ`
/// (floored at zero), `μ`, or the raw prediction.
///
/// # Errors
/// `InvalidParameter` if the selected value is not finite.
pub fn point_values(raw: ArrayView3<'_, f64>, likelihood: &Likelihood) -> ForecastResult<Array2<f64>> {
    let (n_time, n_comp, _) = raw.dim();
    let mut out = Array2::<f64>::zeros((n_time, n_comp));
    for t in 0..n_time {
        for c in 0..n_comp {
            out[[t, c]] = match likelihood {
                Likelihood::None => checked("prediction", raw[[t, c, 0]])?,
                Likelihood::Quantile(levels) => {
                    sorted_curve(raw.slice(s![t, c, ..]))?[levels.median_idx()]
                }
                Likelihood::Poisson => checked("lambda", raw[[t, c, 0]])?.max(0.0),
                Likelihood::Gaussian => checked("mu", raw[[t, c, 0]])?,
            };
        }
    }
    Ok(out)
}

/// Named distribution parameters per `(time, component)`, in the order
/// of [`Likelihood::parameter_names`].
///
/// # Errors
/// - `ParametersUnavailable` for [`Likelihood::None`].
/// - `InvalidParameter` for non-finite predictions.
pub fn likelihood_parameters(
    raw: ArrayView3<'_, f64>, likelihood: &Likelihood,
) -> ForecastResult<Array3<f64>> {
    if !likelihood.is_probabilistic() {
        return Err(ForecastError::ParametersUnavailable {
            reason: "a deterministic model has no likelihood parameters",
        });
    }
    let (n_time, n_comp, _) = raw.dim();
    let mut out = Array3::<f64>::zeros((n_time, n_comp, likelihood.n_raw_params()));
    for t in 0..n_time {
        for c in 0..n_comp {
            match likelihood {
                Likelihood::None => {}
                Likelihood::Quantile(_) => {
                    let curve = sorted_curve(raw.slice(s![t, c, ..]))?;
                    for (k, v) in curve.into_iter().enumerate() {
                        out[[t, c, k]] = v;
                    }
                }
                Likelihood::Poisson => {
                    out[[t, c, 0]] = checked("lambda", raw[[t, c, 0]])?.max(0.0);
                }
                Likelihood::Gaussian => {
                    out[[t, c, 0]] = checked("mu", raw[[t, c, 0]])?;
                    out[[t, c, 1]] = gaussian_sigma(raw[[t, c, 1]])?;
                }
            }
        }
    }
    Ok(out)
}

fn checked(name: &'static str, value: f64) -> ForecastResult<f64> {
    if value.is_finite() { Ok(value) } else { Err(ForecastError::InvalidParameter { name, value }) }
}

/// `sqrt(σ²)` with `σ²` floored at `VARIANCE_FLOOR`; NaN takes the floor.
fn gaussian_sigma(var: f64) -> ForecastResult<f64> {
    if var == f64::INFINITY {
        return Err(ForecastError::InvalidParameter { name: "sigma", value: var });
    }
    Ok(if var > VARIANCE_FLOOR { var.sqrt() } else { VARIANCE_FLOOR.sqrt() })
}

fn sorted_curve(curve: ArrayView1<'_, f64>) -> ForecastResult<Vec<f64>> {
    let mut values = Vec::with_capacity(curve.len());
    for &v in curve.iter() {
        values.push(checked("quantile", v)?);
    }
    values.sort_by(f64::total_cmp);
    Ok(values)
}

/// Inverse CDF at `u` from a monotone quantile curve.
fn interpolate_quantile(levels: &QuantileLevels, curve: &[f64], u: f64) -> f64 {
    let qs = levels.levels();
    let last = qs.len() - 1;
    if u <= qs[0] {
        return curve[0];
    }
    if u >= qs[last] {
        return curve[last];
    }
    let upper = qs.partition_point(|&q| q < u);
    let lower = upper - 1;
    let w = (u - qs[lower]) / (qs[upper] - qs[lower]);
    curve[lower] + w * (curve[upper] - curve[lower])
}
