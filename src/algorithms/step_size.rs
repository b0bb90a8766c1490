//! algorithms::step_size — step-size rules for gradient methods.
//!
//! - `Fixed(α)`: the same step every iteration.
//! - `Lipschitz`: `α = 1/L` from the objective's Lipschitz constant.
//! - `Armijo`: backtracking from `initial`, multiplying by `shrink` until
//!   `f(x − α g) ≤ f(x) − ½ α ‖g‖²`.
use crate::{
    data::container::Container,
    functions::traits::Function,
    optimisation::{
        errors::{OptError, OptResult},
        validation::{verify_max_iter, verify_step_size},
    },
};

/// Default first trial step of Armijo backtracking.
pub const DEFAULT_ARMIJO_INITIAL: f64 = 1.0;
/// Default shrink factor of Armijo backtracking.
pub const DEFAULT_ARMIJO_SHRINK: f64 = 0.5;
/// Default cap on Armijo backtracking steps.
pub const DEFAULT_ARMIJO_MAX_BACKTRACKS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepSize {
    Fixed(f64),
    Lipschitz,
    Armijo { initial: f64, shrink: f64, max_backtracks: usize },
}

impl Default for StepSize {
    fn default() -> Self {
        StepSize::Armijo {
            initial: DEFAULT_ARMIJO_INITIAL,
            shrink: DEFAULT_ARMIJO_SHRINK,
            max_backtracks: DEFAULT_ARMIJO_MAX_BACKTRACKS,
        }
    }
}

impl StepSize {
    /// Check the rule's parameters.
    ///
    /// # Errors
    /// - `InvalidStepSize` for a non-positive fixed or initial step.
    /// - `InvalidScalar` for a shrink factor outside `(0, 1)`.
    /// - `InvalidMaxIter` for zero backtracks.
    pub fn validate(&self) -> OptResult<()> {
        match *self {
            StepSize::Fixed(alpha) => verify_step_size(alpha),
            StepSize::Lipschitz => Ok(()),
            StepSize::Armijo { initial, shrink, max_backtracks } => {
                verify_step_size(initial)?;
                if !(shrink > 0.0 && shrink < 1.0) {
                    return Err(OptError::InvalidScalar {
                        name: "shrink",
                        value: shrink,
                        reason: "Armijo shrink factor must lie in (0, 1).",
                    });
                }
                verify_max_iter(max_backtracks)
            }
        }
    }
}

/// `1/L` from `f.lipschitz()`.
///
/// # Errors
/// - `MissingLipschitz` if `f` reports no constant or a non-positive one.
pub fn inverse_lipschitz<F: Function + ?Sized>(f: &F) -> OptResult<f64> {
    match f.lipschitz() {
        Some(l) if l > 0.0 && l.is_finite() => Ok(1.0 / l),
        _ => Err(OptError::MissingLipschitz { target: f.name().to_string() }),
    }
}

/// Backtrack from `initial` until the sufficient-decrease condition holds.
///
/// Returns the accepted step and the trial point `x − α g`.
///
/// # Errors
/// - `InvalidStepSize` if `max_backtracks` trials all fail.
/// - Errors from evaluating `f`.
pub(crate) fn armijo<F: Function + ?Sized>(
    f: &F, x: &Container, fx: f64, g: &Container, initial: f64, shrink: f64,
    max_backtracks: usize,
) -> OptResult<(f64, Container)> {
    let g_sq = g.squared_norm();
    let mut alpha = initial;
    for _ in 0..max_backtracks {
        let trial = x.axpby(1.0, -alpha, g)?;
        let f_trial = f.value(&trial)?;
        if f_trial <= fx - 0.5 * alpha * g_sq {
            return Ok((alpha, trial));
        }
        alpha *= shrink;
    }
    Err(OptError::InvalidStepSize {
        value: alpha,
        reason: "Armijo backtracking found no step with sufficient decrease.",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::geometry::{Geometry, Space},
        functions::{composition::ScaledFunction, norms::L2NormSquared},
    };
    use std::sync::Arc;

    #[test]
    // Purpose
    // -------
    // Verify rule validation and the `1/L` rule.
    //
    // Given
    // -----
    // - A shrink factor of `1.0`, a negative fixed step, and `5‖x‖²`.
    //
    // Expect
    // ------
    // - Both rules are rejected; `1/L = 0.1`.
    fn validation_and_inverse_lipschitz() {
        // Arrange
        let bad_shrink = StepSize::Armijo { initial: 1.0, shrink: 1.0, max_backtracks: 5 };
        let f = ScaledFunction::new(5.0, Arc::new(L2NormSquared::new())).unwrap();

        // Act + Assert
        assert!(bad_shrink.validate().is_err());
        assert!(StepSize::Fixed(-1.0).validate().is_err());
        assert!(StepSize::default().validate().is_ok());
        assert!((inverse_lipschitz(&f).unwrap() - 0.1).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Verify that backtracking on `‖x‖²` accepts `α = 0.5` from `α₀ = 1`.
    //
    // Given
    // -----
    // - `x = [1, 1]`, `g = 2x`, `f(x) = 2`.
    //
    // Expect
    // ------
    // - `α = 1` gives `f = 2 > 2 − 4`; `α = 0.5` gives `0 ≤ 2 − 2`.
    fn armijo_backtracks_once() {
        // Arrange
        let f = L2NormSquared::new();
        let x = Space::dense(Geometry::new(&[2]).unwrap()).allocate(1.0);
        let g = f.gradient(&x).unwrap();

        // Act
        let (alpha, trial) = armijo(&f, &x, 2.0, &g, 1.0, 0.5, 10).unwrap();

        // Assert
        assert_eq!(alpha, 0.5);
        assert_eq!(trial.max_abs(), 0.0);
    }
}
