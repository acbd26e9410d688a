//! utils — Python argument conversion for the PyO3 layer.
//!
//! Every helper here turns loosely typed Python input (numpy arrays,
//! pandas objects, plain sequences, option strings) into the validated Rust
//! types the core modules expect, mapping failures to `PyErr`.
use ndarray::{Array2, Array3, ShapeError};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    forecasting::core::{
        lags::{FutureLags, LagSpec, Lags},
        likelihood::Likelihood,
        options::ForecasterOptions,
    },
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
    regression::linear::LinearRegressorOptions,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
    PyReadonlyArray3,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Read a `[time, component]` matrix; 1-D input becomes one component.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(py: Python<'py>, raw_data: &Bound<'py, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        let view = arr_ro.as_array();
        return matrix_from_row_major(view.dim(), view.iter().copied()).map_err(shape_error);
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(frame_ro) = obj.extract::<PyReadonlyArray2<f64>>() {
            let view = frame_ro.as_array();
            return matrix_from_row_major(view.dim(), view.iter().copied()).map_err(shape_error);
        }
    }
    let column = extract_f64_array(py, raw_data)?;
    let view = column.as_array();
    matrix_from_row_major((view.len(), 1), view.iter().copied()).map_err(shape_error)
}

/// Read a `[time, component, sample]` forecast array.
#[cfg(feature = "python-bindings")]
pub fn extract_samples<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Array3<f64>> {
    let arr_ro = raw_data.extract::<PyReadonlyArray3<f64>>().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 3-D float64 numpy.ndarray shaped [time, component, sample]",
        )
    })?;
    let view = arr_ro.as_array();
    cube_from_row_major(view.dim(), view.iter().copied()).map_err(shape_error)
}

#[cfg(feature = "python-bindings")]
fn shape_error(err: ShapeError) -> PyErr {
    PyValueError::new_err(format!("could not copy array input: {err}"))
}

/// Owned matrix from values in logical (row-major) order.
///
/// numpy hands out views typed against its own ndarray release; copying
/// element-wise keeps the crate independent of that version.
pub fn matrix_from_row_major(
    dim: (usize, usize), values: impl Iterator<Item = f64>,
) -> Result<Array2<f64>, ShapeError> {
    Array2::from_shape_vec(dim, values.collect())
}

/// Owned `[time, component, sample]` cube from values in logical order.
pub fn cube_from_row_major(
    dim: (usize, usize, usize), values: impl Iterator<Item = f64>,
) -> Result<Array3<f64>, ShapeError> {
    Array3::from_shape_vec(dim, values.collect())
}

/// Build forecaster options from Python arguments.
///
/// `lags` and `lags_past_covariates` are each a positive width or a list
/// of negative offsets; `lags_future_covariates` is a `(past, future)`
/// window tuple or a list of offsets.
#[cfg(feature = "python-bindings")]
#[allow(clippy::too_many_arguments)]
pub fn build_forecaster_options<'py>(
    lags: Option<&Bound<'py, PyAny>>, lags_past_covariates: Option<&Bound<'py, PyAny>>,
    lags_future_covariates: Option<&Bound<'py, PyAny>>, output_chunk_length: usize,
    likelihood: Option<&str>, quantiles: Option<Vec<f64>>, multi_models: bool, use_static_covariates: bool,
) -> PyResult<ForecasterOptions> {
    let target = lags.map(|raw| extract_lags("lags", raw)).transpose()?;
    let past = lags_past_covariates.map(|raw| extract_lags("lags_past_covariates", raw)).transpose()?;
    let future = lags_future_covariates.map(extract_future_lags).transpose()?;
    let spec = LagSpec::new(target, past, future)?;
    let likelihood = match likelihood {
        Some(tag) => Likelihood::parse(tag, quantiles)?,
        None if quantiles.is_some() => {
            return Err(PyValueError::new_err("quantiles require likelihood='quantile'"));
        }
        None => Likelihood::None,
    };
    Ok(ForecasterOptions::new(spec, output_chunk_length, likelihood, multi_models, use_static_covariates)?)
}

#[cfg(feature = "python-bindings")]
fn extract_lags(name: &str, raw: &Bound<'_, PyAny>) -> PyResult<Lags> {
    if let Ok(width) = raw.extract::<usize>() {
        return Ok(Lags::Width(width));
    }
    let explicit: Vec<i64> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(format!(
            "{name} must be an int or a sequence of negative ints"
        ))
    })?;
    Ok(Lags::Explicit(explicit))
}

#[cfg(feature = "python-bindings")]
fn extract_future_lags(raw: &Bound<'_, PyAny>) -> PyResult<FutureLags> {
    if let Ok((past, future)) = raw.extract::<(usize, usize)>() {
        return Ok(FutureLags::Window { past, future });
    }
    let explicit: Vec<i64> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "lags_future_covariates must be a (past, future) tuple or a sequence of ints",
        )
    })?;
    Ok(FutureLags::Explicit(explicit))
}

/// Build linear regressor options (ridge penalty and optimizer settings).
#[cfg(feature = "python-bindings")]
pub fn build_regressor_options(
    l2: Option<f64>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<LinearRegressorOptions> {
    let mle = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
    Ok(LinearRegressorOptions::new(l2.unwrap_or(1e-6), mle)?)
}

#[cfg(feature = "python-bindings")]
fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        let defaults = MLEOptions::default();
        let ls = match line_searcher {
            Some(name) => LineSearcher::from_str(name)?,
            None => defaults.line_searcher,
        };
        return Ok(MLEOptions::new(defaults.tols, ls, false, lbfgs_mem)?);
    }

    let tols = Tolerances::new(tol_grad, tol_cost, max_iter)?;
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => LineSearcher::MoreThuente,
    };
    Ok(MLEOptions::new(tols, ls, false, lbfgs_mem)?)
}
