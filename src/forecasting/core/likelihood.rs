//! Likelihood variants and quantile levels.
//!
//! Purpose
//! -------
//! Fix, at construction time, how raw regressor output is interpreted:
//! as a point value ([`Likelihood::None`]), as a quantile curve
//! ([`Likelihood::Quantile`]), or as distribution parameters
//! ([`Likelihood::Poisson`] rate, [`Likelihood::Gaussian`] mean and
//! variance). Every downstream component (sampler, parameter naming,
//! ensemble layout, regressor objective) matches on this enum.
//!
//! Key behaviors
//! -------------
//! - [`Likelihood::parse`] maps the tags `"none"`, `"quantile"`, `"poisson"`,
//!   `"gaussian"` (alias `"RMSEWithUncertainty"`) case-insensitively.
//! - [`QuantileLevels`] validates levels and locates the median index.
//! - [`Likelihood::parameter_names`] gives the suffixes used to name
//!   parameter-forecast columns.
use serde::Serialize;

use crate::{
    forecasting::errors::{ForecastError, ForecastResult},
    regression::traits::Objective,
};

/// Quantile levels used when none are supplied.
pub const DEFAULT_QUANTILES: [f64; 9] = [0.01, 0.05, 0.1, 0.25, 0.5, 0.75, 0.9, 0.95, 0.99];

/// Strictly increasing quantile levels in `(0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantileLevels {
    levels: Vec<f64>,
    median_idx: usize,
}

impl QuantileLevels {
    /// Validate `levels`.
    ///
    /// The median index points at the level closest to 0.5 (the lower one
    /// on a tie).
    ///
    /// # Errors
    /// `InvalidQuantiles` if the list is empty, not strictly increasing,
    /// or has a level outside `(0, 1)`.
    pub fn new(levels: Vec<f64>) -> ForecastResult<Self> {
        if levels.is_empty() {
            return Err(ForecastError::InvalidQuantiles {
                reason: "at least one quantile is required".to_string(),
            });
        }
        if let Some(q) = levels.iter().find(|q| !(**q > 0.0 && **q < 1.0)) {
            return Err(ForecastError::InvalidQuantiles {
                reason: format!("level {q} is outside (0, 1)"),
            });
        }
        if let Some(w) = levels.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ForecastError::InvalidQuantiles {
                reason: format!("levels must be strictly increasing, found {} before {}", w[0], w[1]),
            });
        }
        let mut median_idx = 0;
        for (i, q) in levels.iter().enumerate() {
            if (q - 0.5).abs() < (levels[median_idx] - 0.5).abs() {
                median_idx = i;
            }
        }
        Ok(Self { levels, median_idx })
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn median_idx(&self) -> usize {
        self.median_idx
    }

    pub fn median(&self) -> f64 {
        self.levels[self.median_idx]
    }

    /// Index of `level`, compared with a 1e-12 tolerance.
    pub fn position(&self, level: f64) -> Option<usize> {
        self.levels.iter().position(|q| (q - level).abs() < 1e-12)
    }
}

impl Default for QuantileLevels {
    fn default() -> Self {
        Self { levels: DEFAULT_QUANTILES.to_vec(), median_idx: 4 }
    }
}

/// How regressor output becomes a forecast distribution.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Likelihood {
    /// Deterministic point forecast.
    #[default]
    None,
    /// One regressor per level; output is a quantile curve.
    Quantile(QuantileLevels),
    /// Output is a non-negative rate `λ`.
    Poisson,
    /// Output is `(μ, σ²)`.
    Gaussian,
}

impl Likelihood {
    /// Parse a likelihood tag.
    ///
    /// `quantiles` is only consulted for `"quantile"`; when `None` the
    /// [`DEFAULT_QUANTILES`] are used.
    ///
    /// # Errors
    /// `InvalidLikelihood` for unknown tags, `InvalidQuantiles` for
    /// malformed levels.
    pub fn parse(tag: &str, quantiles: Option<Vec<f64>>) -> ForecastResult<Self> {
        match tag.to_lowercase().as_str() {
            "none" => Ok(Likelihood::None),
            "quantile" => Ok(Likelihood::Quantile(match quantiles {
                Some(levels) => QuantileLevels::new(levels)?,
                None => QuantileLevels::default(),
            })),
            "poisson" => Ok(Likelihood::Poisson),
            "gaussian" | "rmsewithuncertainty" => Ok(Likelihood::Gaussian),
            _ => Err(ForecastError::InvalidLikelihood { name: tag.to_string() }),
        }
    }

    pub fn is_probabilistic(&self) -> bool {
        !matches!(self, Likelihood::None)
    }

    /// Objective for the single regressor of non-quantile likelihoods.
    ///
    /// Quantile mode trains one regressor per level with
    /// `Objective::Quantile { alpha }` instead.
    pub fn objective(&self) -> Objective {
        match self {
            Likelihood::None | Likelihood::Quantile(_) => Objective::SquaredError,
            Likelihood::Poisson => Objective::Poisson,
            Likelihood::Gaussian => Objective::GaussianWithUncertainty,
        }
    }

    /// Values per `(time, component)` in raw output used for sampling.
    pub fn n_raw_params(&self) -> usize {
        match self {
            Likelihood::Quantile(levels) => levels.len(),
            Likelihood::Gaussian => 2,
            Likelihood::None | Likelihood::Poisson => 1,
        }
    }

    /// Suffixes for parameter-forecast columns, `None` for point mode.
    pub fn parameter_names(&self) -> Option<Vec<String>> {
        match self {
            Likelihood::None => None,
            Likelihood::Quantile(levels) => {
                Some(levels.levels().iter().map(|q| format!("q{q:.2}")).collect())
            }
            Likelihood::Poisson => Some(vec!["lambda".to_string()]),
            Likelihood::Gaussian => Some(vec!["mu".to_string(), "sigma".to_string()]),
        }
    }
}
