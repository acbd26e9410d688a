//! rust_forecasting — probabilistic lag-regression forecasting and
//! likelihood-based anomaly scoring, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the forecaster and the NLL scorers to Python via the
//! `_rust_forecasting` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules: `forecasting` (lag features,
//!   ensembles, sampling, the regression forecaster), `regression` (the
//!   regressor contract and a linear implementation), `anomaly` (window
//!   NLL scorers), and `optimization` (the L-BFGS driver the linear
//!   regressor fits with).
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_forecasting` extension, with `anomaly` and `forecasting`
//!   submodules importable by dotted path.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; this file performs
//!   only FFI glue, input conversion, and error mapping.
//! - Python-visible classes mirror the validation of their Rust
//!   counterparts; nothing is re-validated differently here.
//!
//! Conventions
//! -----------
//! - Python forecasts are nested lists shaped `[time][component][sample]`;
//!   Python series are 1-D (one component) or 2-D `[time, component]`
//!   arrays indexed from time 0.
//! - Errors from core Rust code convert to `ValueError` at the boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on the inner modules and can ignore
//!   everything guarded by the `python-bindings` feature.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by
//!   the integration tests under `tests/`.

pub mod anomaly;
pub mod forecasting;
pub mod optimization;
pub mod regression;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2, Array3};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    anomaly::{
        scorers::{GaussianNllScorer, NllScorer, PoissonNllScorer},
        windows::{WindowAgg, WindowScores},
    },
    forecasting::{
        core::{series::TimeSeries, tabularize::SeriesSet},
        models::forecaster::RegressionForecaster,
    },
    regression::linear::LinearRegressor,
    utils::{
        build_forecaster_options, build_regressor_options, extract_f64_matrix, extract_samples,
    },
};

#[cfg(feature = "python-bindings")]
fn nested_rows(values: &Array2<f64>) -> Vec<Vec<f64>> {
    values.outer_iter().map(|row| row.to_vec()).collect()
}

#[cfg(feature = "python-bindings")]
fn nested_cube(values: &Array3<f64>) -> Vec<Vec<Vec<f64>>> {
    values.outer_iter().map(|step| step.outer_iter().map(|c| c.to_vec()).collect()).collect()
}

#[cfg(feature = "python-bindings")]
fn parse_agg(agg: Option<&str>) -> PyResult<WindowAgg> {
    match agg.unwrap_or("mean").to_lowercase().as_str() {
        "mean" => Ok(WindowAgg::Mean),
        "max" => Ok(WindowAgg::Max),
        other => Err(PyValueError::new_err(format!(
            "invalid aggregation {:?} (expected 'mean' or 'max')",
            other
        ))),
    }
}

#[cfg(feature = "python-bindings")]
fn score_with<'py, S: NllScorer>(
    scorer: &S, py: Python<'py>, forecast: &Bound<'py, PyAny>, actual: &Bound<'py, PyAny>,
    window: usize, start: i64, strict: bool,
) -> PyResult<NLLWindowScores> {
    let samples = extract_samples(forecast)?;
    let truth = extract_f64_matrix(py, actual)?;
    let mut scores = scorer.score(samples.view(), truth.view(), window)?.shifted(start);
    if strict {
        scores = scores.ensure_supported()?;
    }
    Ok(NLLWindowScores { inner: scores })
}

/// NLLWindowScores — window-end NLL scores returned to Python.
///
/// Purpose
/// -------
/// Carry a [`WindowScores`] result across the FFI boundary with copy-on-access
/// getters.
///
/// Notes
/// -----
/// - Constructed only by the scorer classes; Rust callers use
///   [`WindowScores`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_forecasting.anomaly")]
pub struct NLLWindowScores {
    inner: WindowScores,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl NLLWindowScores {
    /// Time of the first window end.
    #[getter]
    pub fn start(&self) -> i64 {
        self.inner.start()
    }

    #[getter]
    pub fn window(&self) -> usize {
        self.inner.window()
    }

    /// Scores as `[window end][component]`; `inf` marks support violations.
    #[getter]
    pub fn scores(&self) -> Vec<Vec<f64>> {
        nested_rows(&self.inner.scores().to_owned())
    }

    /// `(time, component, value)` for each true value outside the support.
    #[getter]
    pub fn violations(&self) -> Vec<(i64, usize, f64)> {
        self.inner.violations().iter().map(|v| (v.time, v.component, v.value)).collect()
    }

    /// Point-wise scores starting at `start - window + 1`.
    #[pyo3(signature = (agg = None), text_signature = "(self, /, agg='mean')")]
    pub fn pointwise(&self, agg: Option<&str>) -> PyResult<Vec<Vec<f64>>> {
        Ok(nested_rows(&self.inner.to_pointwise(parse_agg(agg)?)))
    }
}

/// PoissonNLLScorer — Python-facing Poisson window NLL scorer.
///
/// Purpose
/// -------
/// Score count series against sampled forecasts, forwarding to
/// [`PoissonNllScorer`].
///
/// Parameters
/// ----------
/// Constructed from Python via `PoissonNLLScorer(window=1)`:
/// - `window`: `usize`
///   Number of forecast steps pooled per fitted rate; at least 1.
///
/// Invariants
/// ----------
/// - `window >= 1` at construction time.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_forecasting.anomaly")]
pub struct PoissonNLLScorer {
    window: usize,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PoissonNLLScorer {
    #[new]
    #[pyo3(signature = (window = 1), text_signature = "(window=1)")]
    pub fn new(window: usize) -> PyResult<Self> {
        if window == 0 {
            return Err(PyValueError::new_err("window must be at least 1"));
        }
        Ok(PoissonNLLScorer { window })
    }

    #[getter]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Score `forecast[time, component, sample]` against `actual`.
    ///
    /// With `strict=True`, any support violation raises instead of
    /// scoring `inf`.
    #[pyo3(
        signature = (forecast, actual, start = 0, strict = false),
        text_signature = "(self, forecast, actual, /, start=0, strict=False)"
    )]
    pub fn score<'py>(
        &self, py: Python<'py>, forecast: &Bound<'py, PyAny>, actual: &Bound<'py, PyAny>, start: i64,
        strict: bool,
    ) -> PyResult<NLLWindowScores> {
        score_with(&PoissonNllScorer, py, forecast, actual, self.window, start, strict)
    }
}

/// GaussianNLLScorer — Python-facing Gaussian window NLL scorer.
///
/// Same contract as [`PoissonNLLScorer`], with mean and population
/// standard deviation fitted per window.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_forecasting.anomaly")]
pub struct GaussianNLLScorer {
    window: usize,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl GaussianNLLScorer {
    #[new]
    #[pyo3(signature = (window = 1), text_signature = "(window=1)")]
    pub fn new(window: usize) -> PyResult<Self> {
        if window == 0 {
            return Err(PyValueError::new_err("window must be at least 1"));
        }
        Ok(GaussianNLLScorer { window })
    }

    #[getter]
    pub fn window(&self) -> usize {
        self.window
    }

    #[pyo3(
        signature = (forecast, actual, start = 0, strict = false),
        text_signature = "(self, forecast, actual, /, start=0, strict=False)"
    )]
    pub fn score<'py>(
        &self, py: Python<'py>, forecast: &Bound<'py, PyAny>, actual: &Bound<'py, PyAny>, start: i64,
        strict: bool,
    ) -> PyResult<NLLWindowScores> {
        score_with(&GaussianNllScorer, py, forecast, actual, self.window, start, strict)
    }
}

/// LinearForecaster — Python-facing lag-regression forecaster.
///
/// Purpose
/// -------
/// Expose [`RegressionForecaster`] over a [`LinearRegressor`] for one
/// target series at a time, with optional past, future, and static
/// covariates.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `LinearForecaster(lags=None, output_chunk_length=1, likelihood=None, ...)`:
/// - `lags`, `lags_past_covariates`: `int | list[int] | None`
///   A positive width or explicit negative lag offsets.
/// - `lags_future_covariates`: `tuple[int, int] | list[int] | None`
///   A `(past, future)` window or explicit offsets.
/// - `likelihood`: `Option<&str>`
///   `'quantile'`, `'poisson'`, `'gaussian'`, `'none'`, or `None`
///   (deterministic).
/// - `quantiles`: `Option<Vec<f64>>`
///   Levels for `'quantile'`; defaults to the standard grid.
/// - `use_static_covariates`: `bool`
///   Append the target's static covariates to every feature row.
/// - `l2`, `tol_grad`, `tol_cost`, `max_iter`, `line_searcher`, `lbfgs_mem`
///   Ridge penalty and optimizer settings for each linear fit.
/// - `seed`: `u64`
///   Seeds the sampling generator.
///
/// Notes
/// -----
/// - Every array passed in starts at time 0, so covariates are aligned
///   with the target row by row.
/// - Rust callers with several series per call should use
///   [`RegressionForecaster`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_forecasting.forecasting")]
pub struct LinearForecaster {
    inner: RegressionForecaster<LinearRegressor>,
}

/// One target series with its covariates, owned so a [`SeriesSet`] can
/// borrow them.
#[cfg(feature = "python-bindings")]
struct PyInputs {
    target: [TimeSeries; 1],
    past: Option<[TimeSeries; 1]>,
    future: Option<[TimeSeries; 1]>,
}

#[cfg(feature = "python-bindings")]
impl PyInputs {
    fn extract<'py>(
        py: Python<'py>, series: &Bound<'py, PyAny>, past: Option<&Bound<'py, PyAny>>,
        future: Option<&Bound<'py, PyAny>>, statics: Option<Vec<f64>>,
    ) -> PyResult<Self> {
        let read = |raw: &Bound<'py, PyAny>| -> PyResult<TimeSeries> {
            Ok(TimeSeries::new(0, extract_f64_matrix(py, raw)?)?)
        };
        let mut target = read(series)?;
        if let Some(statics) = statics {
            target = target.with_static_covariates(Array1::from(statics))?;
        }
        Ok(PyInputs {
            target: [target],
            past: past.map(|raw| read(raw).map(|s| [s])).transpose()?,
            future: future.map(|raw| read(raw).map(|s| [s])).transpose()?,
        })
    }

    fn set(&self) -> SeriesSet<'_> {
        let mut set = SeriesSet::new(&self.target);
        if let Some(past) = &self.past {
            set = set.with_past_covariates(past);
        }
        if let Some(future) = &self.future {
            set = set.with_future_covariates(future);
        }
        set
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl LinearForecaster {
    #[new]
    #[pyo3(
        signature = (
            lags = None,
            output_chunk_length = 1,
            likelihood = None,
            quantiles = None,
            multi_models = true,
            l2 = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            seed = 0,
            lags_past_covariates = None,
            lags_future_covariates = None,
            use_static_covariates = false,
        ),
        text_signature = "(lags=None, output_chunk_length=1, likelihood=None, quantiles=None, \
                          multi_models=True, l2=None, tol_grad=None, tol_cost=None, \
                          max_iter=None, line_searcher=None, lbfgs_mem=None, seed=0, \
                          lags_past_covariates=None, lags_future_covariates=None, \
                          use_static_covariates=False)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn new<'py>(
        lags: Option<&Bound<'py, PyAny>>, output_chunk_length: usize, likelihood: Option<&str>,
        quantiles: Option<Vec<f64>>, multi_models: bool, l2: Option<f64>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
        lbfgs_mem: Option<usize>, seed: u64, lags_past_covariates: Option<&Bound<'py, PyAny>>,
        lags_future_covariates: Option<&Bound<'py, PyAny>>, use_static_covariates: bool,
    ) -> PyResult<Self> {
        let options = build_forecaster_options(
            lags,
            lags_past_covariates,
            lags_future_covariates,
            output_chunk_length,
            likelihood,
            quantiles,
            multi_models,
            use_static_covariates,
        )?;
        let regressor = LinearRegressor::new(build_regressor_options(
            l2,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
        )?);
        let inner = RegressionForecaster::with_seed(options, regressor, seed)?;
        Ok(LinearForecaster { inner })
    }

    /// Minimum target length `fit` accepts.
    #[getter]
    pub fn min_train_series_length(&self) -> usize {
        self.inner.min_train_series_length()
    }

    #[getter]
    pub fn is_fitted(&self) -> bool {
        self.inner.fit_summary().is_some()
    }

    #[pyo3(
        signature = (
            series,
            val_series = None,
            max_samples_per_ts = None,
            past_covariates = None,
            future_covariates = None,
            static_covariates = None,
            val_past_covariates = None,
            val_future_covariates = None,
        ),
        text_signature = "(self, series, /, val_series=None, max_samples_per_ts=None, \
                          past_covariates=None, future_covariates=None, static_covariates=None, \
                          val_past_covariates=None, val_future_covariates=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, series: &Bound<'py, PyAny>, val_series: Option<&Bound<'py, PyAny>>,
        max_samples_per_ts: Option<usize>, past_covariates: Option<&Bound<'py, PyAny>>,
        future_covariates: Option<&Bound<'py, PyAny>>, static_covariates: Option<Vec<f64>>,
        val_past_covariates: Option<&Bound<'py, PyAny>>, val_future_covariates: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<()> {
        let train = PyInputs::extract(py, series, past_covariates, future_covariates, static_covariates.clone())?;
        let val = match val_series {
            Some(raw) => {
                Some(PyInputs::extract(py, raw, val_past_covariates, val_future_covariates, static_covariates)?)
            }
            None => None,
        };
        let val_set = val.as_ref().map(PyInputs::set);
        self.inner.fit(&train.set(), val_set.as_ref(), max_samples_per_ts)?;
        Ok(())
    }

    /// Forecast `n` steps past the end of `series`.
    ///
    /// Returns `[time][component][sample]`.
    #[pyo3(
        signature = (
            n,
            series,
            num_samples = 1,
            past_covariates = None,
            future_covariates = None,
            static_covariates = None,
        ),
        text_signature = "(self, n, series, /, num_samples=1, past_covariates=None, \
                          future_covariates=None, static_covariates=None)"
    )]
    #[allow(clippy::too_many_arguments)]
    pub fn predict<'py>(
        &mut self, py: Python<'py>, n: usize, series: &Bound<'py, PyAny>, num_samples: usize,
        past_covariates: Option<&Bound<'py, PyAny>>, future_covariates: Option<&Bound<'py, PyAny>>,
        static_covariates: Option<Vec<f64>>,
    ) -> PyResult<Vec<Vec<Vec<f64>>>> {
        let inputs = PyInputs::extract(py, series, past_covariates, future_covariates, static_covariates)?;
        let forecasts = self
            .inner
            .predict(n, &inputs.set(), num_samples, false)?
            .into_samples()
            .ok_or_else(|| PyValueError::new_err("forecaster returned parameters instead of samples"))?;
        let first = forecasts
            .into_iter()
            .next()
            .ok_or_else(|| PyValueError::new_err("forecaster returned no series"))?;
        Ok(nested_cube(&first.into_values()))
    }

    /// Likelihood parameters for the next `n <= output_chunk_length` steps.
    ///
    /// Returns `(names, values[time][parameter])`.
    #[pyo3(
        signature = (n, series, past_covariates = None, future_covariates = None, static_covariates = None),
        text_signature = "(self, n, series, /, past_covariates=None, future_covariates=None, \
                          static_covariates=None)"
    )]
    pub fn predict_likelihood_parameters<'py>(
        &mut self, py: Python<'py>, n: usize, series: &Bound<'py, PyAny>,
        past_covariates: Option<&Bound<'py, PyAny>>, future_covariates: Option<&Bound<'py, PyAny>>,
        static_covariates: Option<Vec<f64>>,
    ) -> PyResult<(Vec<String>, Vec<Vec<f64>>)> {
        let inputs = PyInputs::extract(py, series, past_covariates, future_covariates, static_covariates)?;
        let params = self
            .inner
            .predict(n, &inputs.set(), 1, true)?
            .into_parameters()
            .ok_or_else(|| PyValueError::new_err("forecaster returned samples instead of parameters"))?;
        let first = params
            .into_iter()
            .next()
            .ok_or_else(|| PyValueError::new_err("forecaster returned no series"))?;
        Ok((first.names().to_vec(), nested_rows(first.values())))
    }

    /// Write the fitted ensemble to `path` as JSON.
    #[pyo3(signature = (path), text_signature = "(self, path, /)")]
    pub fn export(&self, path: &str) -> PyResult<()> {
        self.inner.export(path)?;
        Ok(())
    }
}

/// _rust_forecasting — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_rust_forecasting` Python module and register its
/// `anomaly` and `forecasting` submodules.
///
/// Key behaviors
/// -------------
/// - Attach both submodules to the parent module.
/// - Register them in `sys.modules` so dotted imports work.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating submodules or manipulating `sys.modules` fails.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_forecasting<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let anomaly_mod = PyModule::new(_py, "anomaly")?;
    let forecasting_mod = PyModule::new(_py, "forecasting")?;
    anomaly(_py, m, &anomaly_mod)?;
    forecasting(_py, m, &forecasting_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("rust_forecasting.anomaly", anomaly_mod)?;

    _py.import("sys")?
        .getattr("modules")?
        .set_item("rust_forecasting.forecasting", forecasting_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn anomaly<'py>(
    _py: Python, rust_forecasting: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<PoissonNLLScorer>()?;
    m.add_class::<GaussianNLLScorer>()?;
    m.add_class::<NLLWindowScores>()?;
    rust_forecasting.add_submodule(m)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn forecasting<'py>(
    _py: Python, rust_forecasting: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<LinearForecaster>()?;
    rust_forecasting.add_submodule(m)?;
    Ok(())
}
