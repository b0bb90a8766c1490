//! functions::total_variation — total-variation regulariser.
//!
//! Purpose
//! -------
//! Provide `TV(x) = α·‖∇x‖₂,₁` (isotropic) or `α·‖∇x‖₁` (anisotropic), the
//! edge-preserving regulariser of tomographic reconstruction, together with
//! its proximal map.
//!
//! Key behaviors
//! -------------
//! - The proximal map has no closed form. It is the denoising problem
//!   `argmin_z ½‖z − x‖² + τα·TV(z) + ι_{[l, u]}(z)`, solved by a pluggable
//!   [`TvProximalSolver`]. The default is the fast gradient projection on
//!   the dual, run through the crate's `Algorithm` state machine.
//! - [`TotalVariation::proximal_with_status`] reports the inner iteration
//!   count and whether the inner tolerance was met. `proximal` returns the
//!   best available approximation either way.
//! - `τα = 0` reduces the proximal map to the box projection.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs must live in the domain the regulariser was built for.
//! - Inner solvers are stateless (`Sync`): every proximal call starts from a
//!   zero dual variable, so repeated calls with the same input give the same
//!   output.
//!
//! Conventions
//! -----------
//! - The value excludes the box indicator; bounds only constrain the
//!   proximal map.
use std::{fmt::Debug, sync::Arc};

use crate::{
    algorithms::fgp::FgpSolver,
    data::{container::Container, geometry::Space},
    functions::traits::Function,
    operators::{
        finite_difference::{Boundary, GradientOperator},
        traits::{Operator, check_domain},
    },
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
        validation::{verify_max_iter, verify_step_size, verify_tolerance},
    },
};

/// Default inner iteration cap.
pub const DEFAULT_TV_MAX_ITER: usize = 100;
/// Default inner tolerance on the relative iterate change.
pub const DEFAULT_TV_TOL: f64 = 1e-6;

/// TvOptions — inner-solver controls for the TV proximal map.
///
/// Fields
/// ------
/// - `max_iter`: inner iteration cap (`>= 1`).
/// - `tolerance`: stop when `‖zₖ − zₖ₋₁‖ ≤ tolerance · ‖zₖ‖`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TvOptions {
    pub max_iter: usize,
    pub tolerance: f64,
}

impl TvOptions {
    /// # Errors
    /// - `InvalidMaxIter` if `max_iter == 0`.
    /// - `InvalidTolerance` if `tolerance` is negative or non-finite.
    pub fn new(max_iter: usize, tolerance: f64) -> OptResult<Self> {
        verify_max_iter(max_iter)?;
        verify_tolerance(tolerance)?;
        Ok(Self { max_iter, tolerance })
    }
}

impl Default for TvOptions {
    fn default() -> Self {
        Self { max_iter: DEFAULT_TV_MAX_ITER, tolerance: DEFAULT_TV_TOL }
    }
}

/// TvProblem — one instance of the TV denoising problem
/// `argmin_z ½‖z − data‖² + lambda·TV(z) + ι_{[lower, upper]}(z)`.
#[derive(Debug, Clone, Copy)]
pub struct TvProblem<'a> {
    pub data: &'a Container,
    pub lambda: f64,
    pub gradient: &'a Arc<GradientOperator>,
    pub isotropic: bool,
    pub lower: f64,
    pub upper: f64,
    pub options: &'a TvOptions,
}

/// InnerSolution — result of an inner solve.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerSolution {
    pub solution: Container,
    pub iterations: usize,
    pub converged: bool,
}

/// Solver of [`TvProblem`]s. Implementations must not keep state between
/// calls.
pub trait TvProximalSolver: Send + Sync + Debug {
    fn solve(&self, problem: &TvProblem<'_>) -> OptResult<InnerSolution>;
}

/// TotalVariation — `α·TV(x)` with an optional box constraint in the
/// proximal map.
#[derive(Debug, Clone)]
pub struct TotalVariation {
    alpha: f64,
    isotropic: bool,
    lower: f64,
    upper: f64,
    options: TvOptions,
    gradient: Arc<GradientOperator>,
    solver: Arc<dyn TvProximalSolver>,
}

impl TotalVariation {
    /// Isotropic TV on `domain` with Neumann boundaries, no bounds, default
    /// inner options and the FGP inner solver.
    ///
    /// # Errors
    /// - `InvalidScalar` if `alpha` is negative or non-finite.
    /// - `Data(NotDense)` if `domain` is a block space.
    pub fn new(domain: Space, alpha: f64) -> OptResult<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(OptError::InvalidScalar {
                name: "alpha",
                value: alpha,
                reason: "Regularisation weight must be finite and non-negative.",
            });
        }
        let gradient = Arc::new(GradientOperator::new(domain, Boundary::Neumann)?);
        Ok(Self {
            alpha,
            isotropic: true,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            options: TvOptions::default(),
            gradient,
            solver: Arc::new(FgpSolver),
        })
    }

    /// Switch to `α·‖∇x‖₁`.
    pub fn anisotropic(mut self) -> Self {
        self.isotropic = false;
        self
    }

    /// Constrain the proximal map to `[lower, upper]`.
    ///
    /// # Errors
    /// - `InvalidScalar` if a bound is NaN or `lower > upper`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> OptResult<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(OptError::InvalidScalar {
                name: "lower",
                value: lower,
                reason: "Bounds must be ordered and not NaN.",
            });
        }
        self.lower = lower;
        self.upper = upper;
        Ok(self)
    }

    pub fn with_options(mut self, options: TvOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_solver(mut self, solver: Arc<dyn TvProximalSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// # Errors
    /// - Propagates `GradientOperator::new` errors.
    pub fn with_boundary(mut self, boundary: Boundary) -> OptResult<Self> {
        self.gradient = Arc::new(GradientOperator::new(self.domain().clone(), boundary)?);
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_isotropic(&self) -> bool {
        self.isotropic
    }

    pub fn domain(&self) -> &Space {
        self.gradient.domain()
    }

    pub fn gradient_operator(&self) -> &Arc<GradientOperator> {
        &self.gradient
    }

    pub fn options(&self) -> &TvOptions {
        &self.options
    }

    /// Unweighted `TV(x)`.
    pub fn total_variation(&self, x: &Container) -> OptResult<f64> {
        check_domain(self.gradient.as_ref(), x)?;
        let grad = self.gradient.direct(x)?;
        if self.isotropic {
            Ok(grad.as_block()?.pointwise_norm()?.sum())
        } else {
            Ok(grad.abs().sum())
        }
    }

    /// Proximal map with the inner solver's status.
    ///
    /// # Errors
    /// - `InvalidStepSize` if `tau` is not finite and positive.
    /// - `GeometryMismatch` if `x` is outside the domain.
    /// - Whatever the inner solver reports.
    pub fn proximal_with_status(&self, x: &Container, tau: f64) -> OptResult<InnerSolution> {
        verify_step_size(tau)?;
        check_domain(self.gradient.as_ref(), x)?;
        let lambda = tau * self.alpha;
        if lambda == 0.0 {
            return Ok(InnerSolution {
                solution: x.clip(self.lower, self.upper),
                iterations: 0,
                converged: true,
            });
        }
        let problem = TvProblem {
            data: x,
            lambda,
            gradient: &self.gradient,
            isotropic: self.isotropic,
            lower: self.lower,
            upper: self.upper,
            options: &self.options,
        };
        self.solver.solve(&problem)
    }
}

impl Function for TotalVariation {
    fn name(&self) -> &str {
        "TotalVariation"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[Capability::Value, Capability::Proximal, Capability::ProximalConjugate])
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(self.alpha * self.total_variation(x)?)
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        Ok(self.proximal_with_status(x, tau)?.solution)
    }
}
