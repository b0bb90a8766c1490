//! Validation helpers for solver configuration and runtime values.
//!
//! This module centralizes common consistency checks used across the
//! operator, function, and algorithm layers:
//!
//! - **Tolerance checks**: [`verify_tolerance`] ensures stopping tolerances
//!   are finite and non-negative.
//! - **Iteration caps**: [`verify_max_iter`] rejects a zero cap.
//! - **Step sizes and scalars**: [`verify_step_size`] and
//!   [`verify_positive_scalar`] require finite, strictly positive values.
//! - **Objective values**: [`validate_objective`] rejects NaN objectives
//!   while letting `+∞` through, since indicator terms legitimately take it.
//!
//! Every helper returns a specific [`OptError`] variant so configuration
//! mistakes are reported the same way everywhere.
use crate::optimisation::errors::{OptError, OptResult};

/// Validate a stopping tolerance.
///
/// Zero is accepted and means "never stop on tolerance".
///
/// # Errors
/// Returns [`OptError::InvalidTolerance`] if the value is non-finite or < 0.
pub fn verify_tolerance(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolerance { tol, reason: "Tolerance must be finite." });
    }
    if tol < 0.0 {
        return Err(OptError::InvalidTolerance { tol, reason: "Tolerance must be non-negative." });
    }
    Ok(())
}

/// Validate an iteration cap.
///
/// # Errors
/// Returns [`OptError::InvalidMaxIter`] if `max_iter == 0`.
pub fn verify_max_iter(max_iter: usize) -> OptResult<()> {
    if max_iter == 0 {
        return Err(OptError::InvalidMaxIter {
            max_iter,
            reason: "Maximum iterations must be positive.",
        });
    }
    Ok(())
}

/// Validate a step size.
///
/// # Errors
/// Returns [`OptError::InvalidStepSize`] if the value is non-finite or ≤ 0.
pub fn verify_step_size(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidStepSize { value, reason: "Step size must be finite." });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidStepSize { value, reason: "Step size must be positive." });
    }
    Ok(())
}

/// Validate a named scalar parameter that must be finite and `> 0`.
///
/// # Errors
/// Returns [`OptError::InvalidScalar`] carrying `name`.
pub fn verify_positive_scalar(name: &'static str, value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidScalar { name, value, reason: "Value must be finite." });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidScalar { name, value, reason: "Value must be positive." });
    }
    Ok(())
}

/// Validate a named scalar that only needs to be finite.
///
/// # Errors
/// Returns [`OptError::InvalidScalar`] carrying `name`.
pub fn verify_finite_scalar(name: &'static str, value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidScalar { name, value, reason: "Value must be finite." });
    }
    Ok(())
}

/// Validate an objective value.
///
/// # Errors
/// Returns [`OptError::NonFiniteObjective`] if the value is NaN or `-∞`.
pub fn validate_objective(value: f64) -> OptResult<f64> {
    if value.is_nan() || value == f64::NEG_INFINITY {
        return Err(OptError::NonFiniteObjective { value });
    }
    Ok(value)
}
