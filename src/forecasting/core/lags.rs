//! Lag specifications for target, past-covariate, and future-covariate inputs.
//!
//! Purpose
//! -------
//! Hold the validated, sorted lag offsets used to build feature vectors.
//! A lag `l` relative to an anchor time `τ` reads the value at `τ + l`,
//! where `τ` is the first time step the model predicts.
//!
//! Invariants & assumptions
//! ------------------------
//! - Target and past-covariate lags are strictly negative.
//! - Future-covariate lags are `<= output_chunk_length - 1`; this bound is
//!   checked by [`LagSpec::validate_against_chunk`] because the chunk
//!   length belongs to the forecaster options.
//! - Stored lags are unique and sorted ascending; at least one class is
//!   configured.
use crate::forecasting::errors::{ForecastError, ForecastResult};

/// Lags for the target or past covariates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lags {
    /// `w` means lags `-w..=-1`.
    Width(usize),
    /// Explicit strictly negative offsets.
    Explicit(Vec<i64>),
}

/// Lags for future covariates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FutureLags {
    /// `(past, future)` means lags `-past..future`.
    Window { past: usize, future: usize },
    /// Explicit offsets, may be non-negative.
    Explicit(Vec<i64>),
}

/// Validated lag offsets per covariate class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagSpec {
    target: Option<Vec<i64>>,
    past: Option<Vec<i64>>,
    future: Option<Vec<i64>>,
}

impl LagSpec {
    /// Build a lag specification.
    ///
    /// # Errors
    /// `InvalidLags` when every class is `None`, a width is zero, an
    /// explicit list is empty or has duplicates, or a target/past lag is
    /// not strictly negative.
    pub fn new(
        target: Option<Lags>, past: Option<Lags>, future: Option<FutureLags>,
    ) -> ForecastResult<Self> {
        if target.is_none() && past.is_none() && future.is_none() {
            return Err(ForecastError::InvalidLags {
                class: "target",
                reason: "at least one of target, past, or future lags must be given".to_string(),
            });
        }
        let target = target.map(|l| negative_lags("target", l)).transpose()?;
        let past = past.map(|l| negative_lags("past", l)).transpose()?;
        let future = future.map(future_lags).transpose()?;
        Ok(Self { target, past, future })
    }

    /// Target lags only, as a width: the common autoregressive case.
    pub fn autoregressive(width: usize) -> ForecastResult<Self> {
        Self::new(Some(Lags::Width(width)), None, None)
    }

    /// Check future lags against the forecaster's chunk length.
    pub fn validate_against_chunk(&self, output_chunk_length: usize) -> ForecastResult<()> {
        if let Some(max) = self.future.as_ref().and_then(|l| l.last()) {
            if *max > output_chunk_length as i64 - 1 {
                return Err(ForecastError::InvalidLags {
                    class: "future",
                    reason: format!(
                        "lag {max} exceeds output_chunk_length - 1 = {}",
                        output_chunk_length as i64 - 1
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn target(&self) -> Option<&[i64]> {
        self.target.as_deref()
    }

    pub fn past(&self) -> Option<&[i64]> {
        self.past.as_deref()
    }

    pub fn future(&self) -> Option<&[i64]> {
        self.future.as_deref()
    }

    /// Most negative target lag.
    pub fn min_target_lag(&self) -> Option<i64> {
        self.target.as_ref().and_then(|l| l.first().copied())
    }
}

fn negative_lags(class: &'static str, lags: Lags) -> ForecastResult<Vec<i64>> {
    let lags = match lags {
        Lags::Width(0) => {
            return Err(ForecastError::InvalidLags {
                class,
                reason: "width must be positive".to_string(),
            });
        }
        Lags::Width(w) => (-(w as i64)..=-1).collect(),
        Lags::Explicit(list) => sorted_unique(class, list)?,
    };
    if let Some(bad) = lags.iter().find(|&&l| l >= 0) {
        return Err(ForecastError::InvalidLags {
            class,
            reason: format!("lag {bad} must be strictly negative"),
        });
    }
    Ok(lags)
}

fn future_lags(lags: FutureLags) -> ForecastResult<Vec<i64>> {
    match lags {
        FutureLags::Window { past: 0, future: 0 } => Err(ForecastError::InvalidLags {
            class: "future",
            reason: "window must cover at least one lag".to_string(),
        }),
        FutureLags::Window { past, future } => Ok((-(past as i64)..future as i64).collect()),
        FutureLags::Explicit(list) => sorted_unique("future", list),
    }
}

fn sorted_unique(class: &'static str, mut list: Vec<i64>) -> ForecastResult<Vec<i64>> {
    if list.is_empty() {
        return Err(ForecastError::InvalidLags { class, reason: "lag list is empty".to_string() });
    }
    list.sort_unstable();
    if let Some(pair) = list.windows(2).find(|w| w[0] == w[1]) {
        return Err(ForecastError::InvalidLags {
            class,
            reason: format!("lag {} is repeated", pair[0]),
        });
    }
    Ok(list)
}
