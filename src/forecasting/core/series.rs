//! Validated multivariate series on an integer time index.
//!
//! A [`TimeSeries`] is the only input container the forecaster reads:
//! `values[[t, c]]` is component `c` at absolute time `start + t`. Targets
//! and covariates are aligned purely through these absolute indexes, so a
//! covariate series may start earlier or end later than its target.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::forecasting::errors::{ForecastError, ForecastResult};

/// Immutable `[time, component]` values plus optional static covariates.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    start: i64,
    values: Array2<f64>,
    components: Vec<String>,
    static_covariates: Option<Array1<f64>>,
}

impl TimeSeries {
    /// Build a series starting at absolute time `start`.
    ///
    /// Components are named `"0"`, `"1"`, ... until renamed with
    /// [`TimeSeries::with_components`].
    ///
    /// # Errors
    /// `InvalidSeries` if `values` has no rows, no columns, or a
    /// non-finite entry.
    pub fn new(start: i64, values: Array2<f64>) -> ForecastResult<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(ForecastError::InvalidSeries {
                reason: format!("values must be non-empty, got shape {:?}", values.dim()),
            });
        }
        if let Some(((t, c), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ForecastError::InvalidSeries {
                reason: format!("value {v} at time index {t}, component {c} is not finite"),
            });
        }
        let components = (0..values.ncols()).map(|c| c.to_string()).collect();
        Ok(Self { start, values, components, static_covariates: None })
    }

    /// Univariate convenience constructor starting at time 0.
    pub fn univariate(values: &[f64]) -> ForecastResult<Self> {
        Self::new(0, Array1::from(values.to_vec()).insert_axis(ndarray::Axis(1)))
    }

    /// Rename components.
    ///
    /// # Errors
    /// `InvalidSeries` if the number of names differs from the column count.
    pub fn with_components<S: Into<String>>(
        mut self, names: impl IntoIterator<Item = S>,
    ) -> ForecastResult<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.values.ncols() {
            return Err(ForecastError::InvalidSeries {
                reason: format!(
                    "{} component names given for {} columns",
                    names.len(),
                    self.values.ncols()
                ),
            });
        }
        self.components = names;
        Ok(self)
    }

    /// Attach a fixed-length static covariate vector.
    ///
    /// # Errors
    /// `InvalidSeries` if the vector is empty or has a non-finite entry.
    pub fn with_static_covariates(mut self, statics: Array1<f64>) -> ForecastResult<Self> {
        if statics.is_empty() || statics.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidSeries {
                reason: "static covariates must be non-empty and finite".to_string(),
            });
        }
        self.static_covariates = Some(statics);
        Ok(self)
    }

    /// Absolute time of the first row.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Absolute time one past the last row.
    pub fn end(&self) -> i64 {
        self.start + self.values.nrows() as i64
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn n_components(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn static_covariates(&self) -> Option<ArrayView1<'_, f64>> {
        self.static_covariates.as_ref().map(|s| s.view())
    }

    /// Row at absolute time `time`, if covered.
    pub fn at(&self, time: i64) -> Option<ArrayView1<'_, f64>> {
        if time < self.start || time >= self.end() {
            return None;
        }
        Some(self.values.row((time - self.start) as usize))
    }

    /// Whether every time in `[from, to)` is covered.
    pub fn covers(&self, from: i64, to: i64) -> bool {
        from >= self.start && to <= self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction validation (empty, non-finite, name count).
    // - Absolute-time lookup and coverage checks.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Non-finite values and empty arrays are rejected up front.
    //
    // Given
    // -----
    // - A 0×1 array and a 2×1 array containing NaN.
    //
    // Expect
    // ------
    // - Both constructions fail with `InvalidSeries`.
    fn new_rejects_empty_and_non_finite_values() {
        assert!(matches!(
            TimeSeries::new(0, Array2::zeros((0, 1))),
            Err(ForecastError::InvalidSeries { .. })
        ));
        assert!(matches!(
            TimeSeries::new(0, array![[1.0], [f64::NAN]]),
            Err(ForecastError::InvalidSeries { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Lookups use absolute time, honoring a non-zero start.
    //
    // Given
    // -----
    // - A series starting at 10 with values [1, 2, 3].
    //
    // Expect
    // ------
    // - `at(11)` is 2; `at(9)` and `at(13)` are `None`; `end()` is 13.
    fn at_uses_absolute_time() {
        let series = TimeSeries::new(10, array![[1.0], [2.0], [3.0]]).expect("valid series");

        assert_eq!(series.at(11).map(|r| r[0]), Some(2.0));
        assert!(series.at(9).is_none());
        assert!(series.at(13).is_none());
        assert_eq!(series.end(), 13);
        assert!(series.covers(10, 13));
        assert!(!series.covers(9, 12));
    }

    #[test]
    // Purpose
    // -------
    // Component names must match the column count.
    //
    // Given
    // -----
    // - A 2-component series renamed with one name, then with two.
    //
    // Expect
    // ------
    // - First rename fails, second succeeds.
    fn with_components_checks_name_count() {
        let series = TimeSeries::new(0, array![[1.0, 2.0]]).expect("valid series");

        assert!(series.clone().with_components(["a"]).is_err());
        let renamed = series.with_components(["a", "b"]).expect("two names");
        assert_eq!(renamed.components(), &["a".to_string(), "b".to_string()]);
    }
}
