//! algorithms::config — run configuration shared by every solver.
//!
//! [`AlgorithmConfig`] follows the validated-options pattern used across
//! the crate: `new` checks every field and `Default` gives a usable
//! baseline. Nothing here reads the environment; all tolerances and caps are
//! passed explicitly.
use crate::optimisation::{
    errors::{OptError, OptResult},
    validation::{verify_max_iter, verify_tolerance},
};

/// Default iteration cap.
pub const DEFAULT_MAX_ITER: usize = 100;
/// Default tolerance for the stopping criterion.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// StoppingCriterion — convergence test evaluated after every update.
///
/// Variants
/// --------
/// - `RelativeObjectiveChange`: `|fₖ − fⱼ| ≤ tol · max(|fⱼ|, ε)` where `fⱼ`
///   is the previously recorded objective. Evaluated only at iterations
///   where the objective is recorded.
/// - `RelativeIterateChange`: the solver's `last_change() ≤ tol`.
/// - `None`: run until the iteration cap or an observer stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoppingCriterion {
    RelativeObjectiveChange,
    RelativeIterateChange,
    None,
}

/// AlgorithmConfig — controls for `Algorithm`.
///
/// Fields
/// ------
/// - `max_iter`: iteration cap (`>= 1`).
/// - `tolerance`: threshold of the stopping criterion (finite, `>= 0`).
/// - `criterion`: which convergence test to apply.
/// - `update_objective_interval`: record the objective every this many
///   iterations (`>= 1`). The final iteration is always recorded.
/// - `verbose`: attach a terminal logger (feature `obs_slog`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmConfig {
    pub max_iter: usize,
    pub tolerance: f64,
    pub criterion: StoppingCriterion,
    pub update_objective_interval: usize,
    pub verbose: bool,
}

impl AlgorithmConfig {
    /// # Errors
    /// - `InvalidMaxIter` if `max_iter == 0`.
    /// - `InvalidTolerance` if `tolerance` is negative or non-finite.
    /// - `InvalidObjectiveInterval` if `update_objective_interval == 0`.
    pub fn new(
        max_iter: usize, tolerance: f64, criterion: StoppingCriterion,
        update_objective_interval: usize,
    ) -> OptResult<Self> {
        verify_max_iter(max_iter)?;
        verify_tolerance(tolerance)?;
        if update_objective_interval == 0 {
            return Err(OptError::InvalidObjectiveInterval { value: update_objective_interval });
        }
        Ok(Self { max_iter, tolerance, criterion, update_objective_interval, verbose: false })
    }

    /// Same settings, but log progress.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            tolerance: DEFAULT_TOLERANCE,
            criterion: StoppingCriterion::RelativeObjectiveChange,
            update_objective_interval: 1,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Verify that each invalid field is rejected with its own error.
    //
    // Given
    // -----
    // - Zero iterations, a negative tolerance, and a zero interval.
    //
    // Expect
    // ------
    // - `InvalidMaxIter`, `InvalidTolerance`, `InvalidObjectiveInterval`.
    fn rejects_invalid_fields() {
        let crit = StoppingCriterion::None;
        assert!(matches!(
            AlgorithmConfig::new(0, 1e-6, crit, 1),
            Err(OptError::InvalidMaxIter { .. })
        ));
        assert!(matches!(
            AlgorithmConfig::new(10, -1.0, crit, 1),
            Err(OptError::InvalidTolerance { .. })
        ));
        assert!(matches!(
            AlgorithmConfig::new(10, 1e-6, crit, 0),
            Err(OptError::InvalidObjectiveInterval { value: 0 })
        ));
        let ok = AlgorithmConfig::new(10, 0.0, crit, 3).unwrap().verbose(true);
        assert!(ok.verbose);
        assert_eq!(ok.update_objective_interval, 3);
    }
}
