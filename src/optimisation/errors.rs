use argmin::core::{ArgminError, Error};

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::{data::errors::DataError, optimisation::capabilities::Capability};

/// Crate-wide result alias for operators, functions, and solvers.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Geometry ----
    /// Operands, or an operand and a declared domain/range, are incompatible.
    GeometryMismatch {
        expected: String,
        found: String,
    },

    /// Any other container-level failure.
    Data(DataError),

    // ---- Capabilities ----
    /// An operator or function was asked for an operation it does not offer.
    UnsupportedOperation {
        target: String,
        operation: Capability,
    },

    /// A sum with more than one non-constant term cannot offer a proximal map.
    NonSeparableProximal {
        non_constant_terms: usize,
    },

    /// A step-size rule needs a Lipschitz constant the function cannot give.
    MissingLipschitz {
        target: String,
    },

    /// A sum, block, or composition was built without members.
    EmptyComposition {
        what: &'static str,
    },

    // ---- Configuration ----
    /// Tolerance needs to be finite and non-negative.
    InvalidTolerance {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// Step size needs to be finite and positive.
    InvalidStepSize {
        value: f64,
        reason: &'static str,
    },
    /// Generic scalar parameter check.
    InvalidScalar {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// Block operator grid does not hold `rows × cols` operators.
    InvalidBlockShape {
        rows: usize,
        cols: usize,
        found: usize,
    },
    /// Objective recording interval needs to be positive.
    InvalidObjectiveInterval {
        value: usize,
    },
    /// Primal-dual step sizes violate `σ τ ‖K‖² ≤ 1`.
    UnstableStepSizes {
        sigma: f64,
        tau: f64,
        norm: f64,
    },
    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },
    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Runtime ----
    /// An objective evaluation produced NaN.
    NonFiniteObjective {
        value: f64,
    },
    /// A gradient entry is NaN or infinite.
    NonFiniteGradient {
        index: usize,
        value: f64,
    },
    /// A solver hit its iteration cap without meeting its tolerance.
    NonConvergence {
        solver: String,
        iterations: usize,
        tolerance: f64,
    },
    /// An algorithm moved to `Failed` after an inner evaluation error.
    AlgorithmFailure {
        algorithm: String,
        iteration: usize,
        source: Box<OptError>,
    },

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// Error for a capability `target` does not implement.
    pub fn unsupported(target: &str, operation: Capability) -> Self {
        OptError::UnsupportedOperation { target: target.to_string(), operation }
    }
}

impl std::error::Error for OptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OptError::Data(err) => Some(err),
            OptError::AlgorithmFailure { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Geometry ----
            OptError::GeometryMismatch { expected, found } => {
                write!(f, "Geometry mismatch: expected {expected}, found {found}")
            }
            OptError::Data(err) => write!(f, "{err}"),

            // ---- Capabilities ----
            OptError::UnsupportedOperation { target, operation } => {
                write!(f, "{target} does not support {operation}")
            }
            OptError::NonSeparableProximal { non_constant_terms } => {
                write!(
                    f,
                    "Proximal map of a sum with {non_constant_terms} non-constant terms is not \
                     available: the terms are not separable"
                )
            }
            OptError::MissingLipschitz { target } => {
                write!(f, "{target} has no Lipschitz constant for its gradient")
            }
            OptError::EmptyComposition { what } => {
                write!(f, "{what} needs at least one member")
            }

            // ---- Configuration ----
            OptError::InvalidTolerance { tol, reason } => {
                write!(f, "Invalid tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::InvalidStepSize { value, reason } => {
                write!(f, "Invalid step size {value}: {reason}")
            }
            OptError::InvalidScalar { name, value, reason } => {
                write!(f, "Invalid {name} {value}: {reason}")
            }
            OptError::InvalidBlockShape { rows, cols, found } => {
                let needed = rows * cols;
                write!(f, "Block operator of shape {rows}x{cols} needs {needed} operators, found {found}")
            }
            OptError::InvalidObjectiveInterval { value } => {
                write!(f, "Invalid objective update interval {value}: must be >= 1")
            }
            OptError::UnstableStepSizes { sigma, tau, norm } => {
                write!(
                    f,
                    "Unstable primal-dual step sizes: sigma={sigma}, tau={tau}, ||K||={norm}; \
                     need sigma*tau*||K||^2 <= 1"
                )
            }
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Runtime ----
            OptError::NonFiniteObjective { value } => {
                write!(f, "Non-finite objective value: {value}")
            }
            OptError::NonFiniteGradient { index, value } => {
                write!(f, "Non-finite gradient entry {value} at index {index}")
            }
            OptError::NonConvergence { solver, iterations, tolerance } => {
                write!(
                    f,
                    "{solver} did not reach tolerance {tolerance} within {iterations} iterations"
                )
            }
            OptError::AlgorithmFailure { algorithm, iteration, source } => {
                write!(f, "{algorithm} failed at iteration {iteration}: {source}")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<DataError> for OptError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::GeometryMismatch { expected, found } => {
                OptError::GeometryMismatch { expected, found }
            }
            other => OptError::Data(other),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Errors raised inside cost/gradient callbacks come back as OptError.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Mapping of `DataError` into `OptError`.
    // - Round-tripping `OptError` through argmin's error type.
    // - The `source` chain of `AlgorithmFailure`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that container geometry mismatches surface as the top-level
    // `GeometryMismatch` variant and other data errors pass through.
    //
    // Given
    // -----
    // - A `DataError::GeometryMismatch` and a `DataError::EmptyBlock`.
    //
    // Expect
    // ------
    // - `OptError::GeometryMismatch` and `OptError::Data(EmptyBlock)`.
    fn data_errors_convert_into_opt_errors() {
        // Arrange
        let mismatch =
            DataError::GeometryMismatch { expected: "[x=3]".to_string(), found: "[x=4]".to_string() };

        // Act
        let a: OptError = mismatch.into();
        let b: OptError = DataError::EmptyBlock.into();

        // Assert
        assert_eq!(
            a,
            OptError::GeometryMismatch { expected: "[x=3]".to_string(), found: "[x=4]".to_string() }
        );
        assert_eq!(b, OptError::Data(DataError::EmptyBlock));
    }

    #[test]
    // Purpose
    // -------
    // Verify that an `OptError` raised inside an argmin callback is
    // recovered unchanged.
    //
    // Given
    // -----
    // - `NonFiniteObjective` wrapped into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - The conversion returns the original variant.
    fn opt_error_round_trips_through_argmin() {
        // Arrange
        let wrapped: Error = OptError::NonFiniteObjective { value: f64::INFINITY }.into();

        // Act
        let back: OptError = wrapped.into();

        // Assert
        assert_eq!(back, OptError::NonFiniteObjective { value: f64::INFINITY });
    }

    #[test]
    // Purpose
    // -------
    // Verify that argmin's own error kinds map to their wrappers.
    //
    // Given
    // -----
    // - `ArgminError::InvalidParameter`.
    //
    // Expect
    // ------
    // - `OptError::InvalidParameter` with the same text.
    fn argmin_errors_map_to_wrappers() {
        // Arrange
        let wrapped: Error = ArgminError::InvalidParameter { text: "m".to_string() }.into();

        // Act
        let back: OptError = wrapped.into();

        // Assert
        assert_eq!(back, OptError::InvalidParameter { text: "m".to_string() });
    }

    #[test]
    // Purpose
    // -------
    // Verify that `AlgorithmFailure` exposes its cause via `source`.
    //
    // Given
    // -----
    // - A failure wrapping `UnsupportedOperation`.
    //
    // Expect
    // ------
    // - `source()` renders the inner error; `Display` names the iteration.
    fn algorithm_failure_exposes_source() {
        // Arrange
        let inner = OptError::UnsupportedOperation {
            target: "L1Norm".to_string(),
            operation: Capability::Gradient,
        };
        let err = OptError::AlgorithmFailure {
            algorithm: "GD".to_string(),
            iteration: 3,
            source: Box::new(inner.clone()),
        };

        // Act
        let msg = err.to_string();
        let source = err.source().map(|s| s.to_string());

        // Assert
        assert!(msg.contains("iteration 3"), "got: {msg}");
        assert_eq!(source, Some(inner.to_string()));
    }
}
