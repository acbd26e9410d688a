//! Window-end anomaly scores and their point-wise aggregation.
//!
//! A [`WindowScores`] row `j` belongs to the window ending at
//! `start + j`; it covers the `window` time steps up to and including that
//! end. Entries equal to `+∞` mark true values outside the fitted
//! distribution's support and are listed in [`WindowScores::violations`].
use ndarray::{Array2, ArrayView2};
use serde::Serialize;

use crate::anomaly::errors::{ScoreError, ScoreResult};

/// A true value the fitted distribution cannot produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupportViolation {
    /// Absolute time of the window end.
    pub time: i64,
    pub component: usize,
    /// The offending true value.
    pub value: f64,
}

/// How overlapping window scores combine at a single time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowAgg {
    #[default]
    Mean,
    Max,
}

/// Scores per window end and component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowScores {
    start: i64,
    window: usize,
    scores: Array2<f64>,
    violations: Vec<SupportViolation>,
}

impl WindowScores {
    pub(crate) fn new(
        start: i64, window: usize, scores: Array2<f64>, violations: Vec<SupportViolation>,
    ) -> Self {
        Self { start, window, scores, violations }
    }

    /// Move every reported time by `offset` steps.
    pub fn shifted(mut self, offset: i64) -> Self {
        self.start += offset;
        for v in &mut self.violations {
            v.time += offset;
        }
        self
    }

    /// Time of the first window end.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// One past the time of the last window end.
    pub fn end(&self) -> i64 {
        self.start + self.len() as i64
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of window ends.
    pub fn len(&self) -> usize {
        self.scores.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `[window end, component]`.
    pub fn scores(&self) -> ArrayView2<'_, f64> {
        self.scores.view()
    }

    pub fn violations(&self) -> &[SupportViolation] {
        &self.violations
    }

    pub fn is_supported(&self) -> bool {
        self.violations.is_empty()
    }

    /// Fail if any true value was outside the fitted support.
    ///
    /// # Errors
    /// `DistributionSupport` naming the first violation and the count.
    pub fn ensure_supported(self) -> ScoreResult<Self> {
        match self.violations.first() {
            None => Ok(self),
            Some(first) => Err(ScoreError::DistributionSupport {
                time: first.time,
                component: first.component,
                value: first.value,
                count: self.violations.len(),
            }),
        }
    }

    /// Time of the first step covered by any window.
    pub fn pointwise_start(&self) -> i64 {
        self.start - (self.window as i64 - 1)
    }

    /// Map window-end scores onto every covered time step.
    ///
    /// Step `p` (relative to [`WindowScores::pointwise_start`]) combines
    /// the scores of every window containing it. The result has
    /// `len + window - 1` rows.
    pub fn to_pointwise(&self, agg: WindowAgg) -> Array2<f64> {
        let (n_windows, n_comp) = self.scores.dim();
        if n_windows == 0 {
            return Array2::zeros((0, n_comp));
        }
        let w = self.window;
        let n_points = n_windows + w - 1;
        let mut out = Array2::<f64>::zeros((n_points, n_comp));
        for p in 0..n_points {
            // Windows j cover points j..j + w.
            let first = p.saturating_sub(w - 1);
            let last = p.min(n_windows - 1);
            for c in 0..n_comp {
                let covering = (first..=last).map(|j| self.scores[[j, c]]);
                out[[p, c]] = match agg {
                    WindowAgg::Mean => covering.sum::<f64>() / (last - first + 1) as f64,
                    WindowAgg::Max => covering.fold(f64::NEG_INFINITY, f64::max),
                };
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Point-wise aggregation over covering windows.
    // - Converting recorded violations into an error on request.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Each point combines exactly the windows that contain it.
    //
    // Given
    // -----
    // - Window 2, window-end scores [1, 3, 5] starting at time 11.
    //
    // Expect
    // ------
    // - 4 points starting at 10; mean [1, 2, 4, 5]; max [1, 3, 5, 5].
    fn pointwise_combines_covering_windows() {
        let scores = WindowScores::new(11, 2, array![[1.0], [3.0], [5.0]], Vec::new());

        let mean = scores.to_pointwise(WindowAgg::Mean);
        let max = scores.to_pointwise(WindowAgg::Max);

        assert_eq!(scores.pointwise_start(), 10);
        assert_eq!(mean.column(0).to_vec(), vec![1.0, 2.0, 4.0, 5.0]);
        assert_eq!(max.column(0).to_vec(), vec![1.0, 3.0, 5.0, 5.0]);
    }

    #[test]
    // Purpose
    // -------
    // With window 1 the point-wise view equals the window scores.
    //
    // Given
    // -----
    // - Window 1, scores [0.5, 2.5].
    //
    // Expect
    // ------
    // - Identical point-wise output.
    fn unit_window_is_identity() {
        let scores = WindowScores::new(0, 1, array![[0.5], [2.5]], Vec::new());

        let points = scores.to_pointwise(WindowAgg::Mean);

        assert_relative_eq!(points[[0, 0]], 0.5);
        assert_relative_eq!(points[[1, 0]], 2.5);
    }

    #[test]
    // Purpose
    // -------
    // Violations are kept as data until the caller asks for an error.
    //
    // Given
    // -----
    // - Two violations, the first at time 4.
    //
    // Expect
    // ------
    // - `is_supported` false; `ensure_supported` reports time 4, count 2.
    fn ensure_supported_reports_first_violation() {
        let violations = vec![
            SupportViolation { time: 4, component: 0, value: -1.0 },
            SupportViolation { time: 6, component: 0, value: 2.5 },
        ];
        let scores = WindowScores::new(4, 1, array![[f64::INFINITY], [1.0], [f64::INFINITY]], violations);

        assert!(!scores.is_supported());
        assert_eq!(
            scores.ensure_supported(),
            Err(ScoreError::DistributionSupport { time: 4, component: 0, value: -1.0, count: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Shifting moves the window ends and violation times together.
    //
    // Given
    // -----
    // - Scores starting at 0 with a violation at 1; shift by 50.
    //
    // Expect
    // ------
    // - Start 50, violation at 51, scores unchanged.
    fn shifted_moves_all_times() {
        let violations = vec![SupportViolation { time: 1, component: 0, value: -2.0 }];
        let scores = WindowScores::new(0, 1, array![[0.1], [f64::INFINITY]], violations);

        let moved = scores.shifted(50);

        assert_eq!(moved.start(), 50);
        assert_eq!(moved.violations()[0].time, 51);
        assert_relative_eq!(moved.scores()[[0, 0]], 0.1);
    }
}
