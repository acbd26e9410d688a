//! Forecast containers returned by `RegressionForecaster::predict`.
//!
//! - [`StochasticForecast`]: sample paths `[time, component, sample]`; a
//!   deterministic forecast is the one-sample case.
//! - [`ParameterForecast`]: named likelihood parameters `[time, column]`
//!   with columns `{component}_{parameter}`.
//! - [`Prediction`]: one of the two, per input series.
use ndarray::{Array2, Array3, ArrayView3, Axis};
use serde::Serialize;

/// Sample paths on the absolute time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StochasticForecast {
    start: i64,
    values: Array3<f64>,
    components: Vec<String>,
}

impl StochasticForecast {
    pub(crate) fn new(start: i64, values: Array3<f64>, components: Vec<String>) -> Self {
        debug_assert_eq!(values.dim().1, components.len());
        Self { start, values, components }
    }

    /// Time of the first forecast step.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Time one past the last forecast step.
    pub fn end(&self) -> i64 {
        self.start + self.len() as i64
    }

    pub fn len(&self) -> usize {
        self.values.dim().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_samples(&self) -> usize {
        self.values.dim().2
    }

    pub fn is_deterministic(&self) -> bool {
        self.n_samples() == 1
    }

    /// `[time, component, sample]`.
    pub fn values(&self) -> ArrayView3<'_, f64> {
        self.values.view()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Sample mean per `(time, component)`.
    pub fn mean(&self) -> Array2<f64> {
        self.values.mean_axis(Axis(2)).unwrap_or_else(|| Array2::zeros((self.len(), self.components.len())))
    }

    /// Empirical `q`-quantile per `(time, component)`, interpolating
    /// linearly between order statistics. `q` is clamped to `[0, 1]`.
    pub fn quantile(&self, q: f64) -> Array2<f64> {
        let q = q.clamp(0.0, 1.0);
        let (n_time, n_comp, n_samples) = self.values.dim();
        let mut out = Array2::<f64>::zeros((n_time, n_comp));
        let mut buf = Vec::with_capacity(n_samples);
        for ((t, c), v) in out.indexed_iter_mut() {
            buf.clear();
            buf.extend(self.values.slice(ndarray::s![t, c, ..]).iter().copied());
            buf.sort_by(f64::total_cmp);
            let pos = q * (n_samples.saturating_sub(1)) as f64;
            let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
            *v = buf[lo] + (pos - lo as f64) * (buf[hi] - buf[lo]);
        }
        out
    }

    pub fn into_values(self) -> Array3<f64> {
        self.values
    }
}

/// Likelihood parameters on the absolute time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterForecast {
    start: i64,
    values: Array2<f64>,
    names: Vec<String>,
}

impl ParameterForecast {
    pub(crate) fn new(start: i64, values: Array2<f64>, names: Vec<String>) -> Self {
        debug_assert_eq!(values.ncols(), names.len());
        Self { start, values, names }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `[time, column]`.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Column names `{component}_{parameter}`, component-major.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column for `name`, if present.
    pub fn column(&self, name: &str) -> Option<ndarray::ArrayView1<'_, f64>> {
        self.names.iter().position(|n| n == name).map(|i| self.values.column(i))
    }
}

/// Output of one `predict` call, one entry per input series.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Samples(Vec<StochasticForecast>),
    Parameters(Vec<ParameterForecast>),
}

impl Prediction {
    pub fn into_samples(self) -> Option<Vec<StochasticForecast>> {
        match self {
            Prediction::Samples(s) => Some(s),
            Prediction::Parameters(_) => None,
        }
    }

    pub fn into_parameters(self) -> Option<Vec<ParameterForecast>> {
        match self {
            Prediction::Parameters(p) => Some(p),
            Prediction::Samples(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Prediction::Samples(s) => s.len(),
            Prediction::Parameters(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array3, array};

    #[test]
    // Purpose
    // -------
    // Summary statistics reduce over the sample axis.
    //
    // Given
    // -----
    // - One step, one component, samples [4, 1, 3, 2].
    //
    // Expect
    // ------
    // - Mean 2.5, median 2.5, quantile(0) 1, quantile(1) 4.
    fn mean_and_quantiles_reduce_samples() {
        let values = Array3::from_shape_vec((1, 1, 4), vec![4.0, 1.0, 3.0, 2.0]).expect("shape");
        let forecast = StochasticForecast::new(5, values, vec!["y".to_string()]);

        assert_eq!(forecast.end(), 6);
        assert_relative_eq!(forecast.mean()[[0, 0]], 2.5);
        assert_relative_eq!(forecast.quantile(0.5)[[0, 0]], 2.5);
        assert_relative_eq!(forecast.quantile(0.0)[[0, 0]], 1.0);
        assert_relative_eq!(forecast.quantile(1.0)[[0, 0]], 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Parameter columns are addressable by name.
    //
    // Given
    // -----
    // - Columns ["y_mu", "y_sigma"].
    //
    // Expect
    // ------
    // - `column("y_sigma")` returns the second column; unknown names `None`.
    fn parameter_columns_by_name() {
        let forecast = ParameterForecast::new(
            0,
            array![[1.0, 0.5], [2.0, 0.6]],
            vec!["y_mu".to_string(), "y_sigma".to_string()],
        );

        assert_eq!(forecast.column("y_sigma").map(|c| c.to_vec()), Some(vec![0.5, 0.6]));
        assert!(forecast.column("y_lambda").is_none());
    }
}
