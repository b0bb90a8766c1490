//! operators::power_method — norm estimation and adjoint checks.
//!
//! Purpose
//! -------
//! Estimate the largest singular value `‖A‖` of a linear operator by power
//! iteration on `AᵗA`, and measure how well an adjoint matches its forward
//! map. Step-size rules in the solvers (`1/L`, `σ τ ‖K‖² ≤ 1`) are built on
//! these estimates.
//!
//! Key behaviors
//! -------------
//! - Power iteration starts from a seeded `U[0, 1)` container, so the same
//!   options always give the same estimate.
//! - The iteration never fails for a linear operator: when the cap is hit
//!   the best estimate seen is returned with `converged = false`.
//! - An operator that annihilates the start vector reports `0` as a
//!   converged estimate.
//!
//! Invariants & assumptions
//! ------------------------
//! - The operator's adjoint is correct; a wrong adjoint gives a meaningless
//!   estimate. [`dot_test`] is the check for that.
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    operators::traits::{NormEstimate, Operator},
    optimisation::{
        capabilities::Capability,
        errors::{OptError, OptResult},
        validation::{verify_max_iter, verify_tolerance},
    },
};

/// Default iteration cap of the power method.
pub const DEFAULT_POWER_MAX_ITER: usize = 100;
/// Default relative tolerance between successive estimates.
pub const DEFAULT_POWER_TOL: f64 = 1e-6;
/// Default RNG seed for the start vector.
pub const DEFAULT_POWER_SEED: u64 = 5;

/// PowerMethodOptions — controls for [`power_method`].
///
/// Fields
/// ------
/// - `max_iter`: iteration cap (`>= 1`).
/// - `tolerance`: stop when `|σₖ − σₖ₋₁| ≤ tolerance · σₖ`.
/// - `seed`: seed of the random start vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerMethodOptions {
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl PowerMethodOptions {
    /// # Errors
    /// - `InvalidMaxIter` if `max_iter == 0`.
    /// - `InvalidTolerance` if `tolerance` is negative or non-finite.
    pub fn new(max_iter: usize, tolerance: f64, seed: u64) -> OptResult<Self> {
        verify_max_iter(max_iter)?;
        verify_tolerance(tolerance)?;
        Ok(Self { max_iter, tolerance, seed })
    }
}

impl Default for PowerMethodOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_POWER_MAX_ITER,
            tolerance: DEFAULT_POWER_TOL,
            seed: DEFAULT_POWER_SEED,
        }
    }
}

/// Estimate `‖A‖` by power iteration on `AᵗA`.
///
/// Parameters
/// ----------
/// - `op`: a linear operator.
/// - `opts`: iteration cap, tolerance, and seed.
///
/// Returns
/// -------
/// - `NormEstimate` with the largest estimate seen.
///
/// Errors
/// ------
/// - `UnsupportedOperation` if `op` is not linear.
/// - Any error raised by `direct` / `adjoint`.
pub fn power_method<O: Operator + ?Sized>(
    op: &O, opts: &PowerMethodOptions,
) -> OptResult<NormEstimate> {
    if !op.is_linear() {
        return Err(OptError::unsupported(op.name(), Capability::Adjoint));
    }
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut x = op.domain().random(&mut rng);
    let start_norm = x.norm();
    if start_norm == 0.0 {
        return Ok(NormEstimate::exact(0.0));
    }
    x.scale_assign(1.0 / start_norm);

    let mut best = 0.0_f64;
    let mut previous = 0.0_f64;
    for iteration in 1..=opts.max_iter {
        let z = op.adjoint(&op.direct(&x)?)?;
        let z_norm = z.norm();
        if z_norm == 0.0 {
            return Ok(NormEstimate { value: 0.0, iterations: iteration, converged: true });
        }
        // ‖x‖ = 1, so ‖AᵗA x‖ approaches σ_max².
        let estimate = z_norm.sqrt();
        best = best.max(estimate);
        if iteration > 1 && (estimate - previous).abs() <= opts.tolerance * estimate {
            return Ok(NormEstimate { value: best, iterations: iteration, converged: true });
        }
        previous = estimate;
        x = z.scaled(1.0 / z_norm);
    }
    Ok(NormEstimate { value: best, iterations: opts.max_iter, converged: false })
}

/// Relative adjoint mismatch `|⟨Ax, y⟩ − ⟨x, Aᵗy⟩| / max(|⟨Ax, y⟩|, |⟨x, Aᵗy⟩|)`
/// for random `x`, `y`.
///
/// # Errors
/// - `UnsupportedOperation` if `op` has no adjoint.
pub fn dot_test<O: Operator + ?Sized, R: Rng + ?Sized>(op: &O, rng: &mut R) -> OptResult<f64> {
    if !op.is_linear() {
        return Err(OptError::unsupported(op.name(), Capability::Adjoint));
    }
    let x = op.domain().random(rng);
    let y = op.range().random(rng);
    let lhs = op.direct(&x)?.dot(&y)?;
    let rhs = x.dot(&op.adjoint(&y)?)?;
    let scale = lhs.abs().max(rhs.abs()).max(f64::MIN_POSITIVE);
    Ok((lhs - rhs).abs() / scale)
}
