//! optimization::errors — failures of the maximum-likelihood fit driver.
//!
//! Configuration mistakes (tolerances, memory, line-search name), bad
//! objective inputs, numerical breakdowns during a run, and errors raised
//! inside argmin all surface as one [`OptError`]. Argmin's boxed error is
//! unwrapped at the boundary (`From<argmin::core::Error>`): an `OptError`
//! raised by an objective comes back unchanged, anything else becomes
//! [`OptError::Backend`].
use argmin::core::{ArgminError, Error};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    /// The objective has no analytic gradient; finite differences are used.
    GradientNotImplemented,

    /// Gradient length differs from the parameter length.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient entry is NaN or infinite.
    InvalidGradient { index: usize, value: f64 },

    /// A stopping tolerance is non-finite or not positive.
    InvalidTolerance { name: &'static str, value: f64 },

    /// `max_iter` of zero.
    InvalidMaxIter { max_iter: usize },

    /// Every stopping rule was left unset.
    NoTolerancesProvided,

    /// Unknown line-search name.
    InvalidLineSearch { name: String },

    /// L-BFGS history of zero.
    InvalidLBFGSMem { mem: usize },

    /// The objective evaluated to NaN or infinity.
    NonFiniteCost { value: f64 },

    /// The solver finished without a best parameter vector.
    MissingThetaHat,

    /// The solver's best parameter vector has a non-finite entry.
    InvalidThetaHat { index: usize, value: f64 },

    /// A design-matrix entry or target handed to an objective is unusable.
    InvalidLogLikInput { value: f64 },

    /// Parameter vector length does not match the objective's layout.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Design matrix and target column disagree on the number of rows, or
    /// the requested target column does not exist.
    DataShapeMismatch { rows: usize, targets: usize },

    /// Error raised by argmin itself; `kind` names the argmin category.
    Backend { kind: &'static str, text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::GradientNotImplemented => write!(f, "Analytic gradient not implemented"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient has length {found}, expected {expected}")
            }
            OptError::InvalidGradient { index, value } => {
                write!(f, "Gradient entry {index} is not finite: {value}")
            }
            OptError::InvalidTolerance { name, value } => {
                write!(f, "Invalid {name} tolerance {value}: must be finite and positive")
            }
            OptError::InvalidMaxIter { max_iter } => {
                write!(f, "Invalid maximum iterations {max_iter}: must be at least 1")
            }
            OptError::NoTolerancesProvided => {
                write!(f, "At least one of tol_grad, tol_cost, or max_iter must be set")
            }
            OptError::InvalidLineSearch { name } => write!(
                f,
                "Invalid line searcher '{name}': expected 'MoreThuente' or 'HagerZhang' (any case)"
            ),
            OptError::InvalidLBFGSMem { mem } => {
                write!(f, "Invalid L-BFGS memory {mem}: must be at least 1")
            }
            OptError::NonFiniteCost { value } => write!(f, "Objective is not finite: {value}"),
            OptError::MissingThetaHat => write!(f, "Solver returned no parameter estimate"),
            OptError::InvalidThetaHat { index, value } => {
                write!(f, "Estimated parameter {index} is not finite: {value}")
            }
            OptError::InvalidLogLikInput { value } => {
                write!(f, "Invalid input to log-likelihood function: {value}")
            }
            OptError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            OptError::DataShapeMismatch { rows, targets } => write!(
                f,
                "Objective data shape mismatch: design matrix has {rows} rows, target has {targets}"
            ),
            OptError::Backend { kind, text } => write!(f, "Optimizer backend error ({kind}): {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(opt) => return opt,
            Err(err) => err,
        };
        match err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                let (kind, text) = match argmin_err {
                    ArgminError::InvalidParameter { text } => ("invalid parameter", text),
                    ArgminError::NotImplemented { text } => ("not implemented", text),
                    ArgminError::NotInitialized { text } => ("not initialized", text),
                    ArgminError::ConditionViolated { text } => ("condition violated", text),
                    ArgminError::CheckpointNotFound { text } => ("checkpoint not found", text),
                    ArgminError::PotentialBug { text } => ("potential bug", text),
                    ArgminError::ImpossibleError { text } => ("impossible error", text),
                    other => ("unknown", other.to_string()),
                };
                OptError::Backend { kind, text }
            }
            Err(other) => OptError::Backend { kind: "other", text: other.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
