//! functions::total_generalised_variation — second-order TGV regulariser.
//!
//! Purpose
//! -------
//! Provide `TGV_{α,β}(u) = min_w α‖∇u − w‖₂,₁ + β‖Ew‖₂,₁`, with `E` the
//! symmetrised gradient. Unlike TV it does not penalise smooth ramps, so
//! piecewise-affine images are recovered without staircasing.
//!
//! Key behaviors
//! -------------
//! - Both the value and the proximal map need an inner solve, delegated to a
//!   pluggable [`TgvProximalSolver`]. The default runs PDHG through the
//!   crate's `Algorithm` state machine.
//! - Proximal map: `argmin_{u,w} ‖u − x‖²/(2τ) + α‖∇u − w‖₂,₁ + β‖Ew‖₂,₁`,
//!   returning `u`.
//! - Value: the minimum over `w` at fixed `u`, never above `α·TV(u)` (the
//!   value at `w = 0`).
//! - [`TotalGeneralisedVariation::proximal_with_status`] and
//!   [`TotalGeneralisedVariation::value_with_status`] expose the inner
//!   iteration counts and convergence flags.
//!
//! Invariants & assumptions
//! ------------------------
//! - `α, β > 0` and finite.
//! - Inner solvers are stateless: every call starts from `w = 0`.
//! - The inner controls are shared with TV ([`TvOptions`]).
use std::{fmt::Debug, sync::Arc};

use crate::{
    algorithms::tgv::PdhgTgvSolver,
    data::{container::Container, geometry::Space},
    functions::{
        total_variation::{InnerSolution, TvOptions},
        traits::Function,
    },
    operators::{
        finite_difference::{Boundary, GradientOperator, SymmetrisedGradientOperator},
        traits::{Operator, check_domain},
    },
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::OptResult,
        validation::{verify_positive_scalar, verify_step_size},
    },
};

/// TgvOperators — the two derivatives a TGV problem is built from.
#[derive(Debug, Clone)]
pub struct TgvOperators {
    pub gradient: Arc<GradientOperator>,
    pub symmetrised: Arc<SymmetrisedGradientOperator>,
}

/// TgvProblem — `argmin_{u,w} ‖u − data‖²/(2τ) + α‖∇u − w‖₂,₁ + β‖Ew‖₂,₁`.
#[derive(Debug, Clone, Copy)]
pub struct TgvProblem<'a> {
    pub data: &'a Container,
    pub tau: f64,
    pub alpha: f64,
    pub beta: f64,
    pub operators: &'a TgvOperators,
    pub options: &'a TvOptions,
}

/// TgvValueProblem — `min_w α‖∇image − w‖₂,₁ + β‖Ew‖₂,₁`.
#[derive(Debug, Clone, Copy)]
pub struct TgvValueProblem<'a> {
    pub image: &'a Container,
    pub alpha: f64,
    pub beta: f64,
    pub operators: &'a TgvOperators,
    pub options: &'a TvOptions,
}

/// InnerValue — result of an inner minimisation that only reports a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnerValue {
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Solver of the two TGV subproblems. Implementations must not keep state
/// between calls.
pub trait TgvProximalSolver: Send + Sync + Debug {
    fn solve(&self, problem: &TgvProblem<'_>) -> OptResult<InnerSolution>;

    fn evaluate(&self, problem: &TgvValueProblem<'_>) -> OptResult<InnerValue>;
}

/// TotalGeneralisedVariation — `TGV_{α,β}` on a dense domain.
#[derive(Debug, Clone)]
pub struct TotalGeneralisedVariation {
    alpha: f64,
    beta: f64,
    options: TvOptions,
    operators: TgvOperators,
    solver: Arc<dyn TgvProximalSolver>,
}

impl TotalGeneralisedVariation {
    /// TGV on `domain` with Neumann boundaries, default inner options and the
    /// PDHG inner solver.
    ///
    /// # Errors
    /// - `InvalidScalar` if `alpha` or `beta` is not finite and positive.
    /// - `Data(NotDense)` if `domain` is a block space.
    pub fn new(domain: Space, alpha: f64, beta: f64) -> OptResult<Self> {
        verify_positive_scalar("alpha", alpha)?;
        verify_positive_scalar("beta", beta)?;
        Ok(Self {
            alpha,
            beta,
            options: TvOptions::default(),
            operators: build_operators(domain, Boundary::Neumann)?,
            solver: Arc::new(PdhgTgvSolver),
        })
    }

    pub fn with_options(mut self, options: TvOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_solver(mut self, solver: Arc<dyn TgvProximalSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// # Errors
    /// - Propagates the operator constructors' errors.
    pub fn with_boundary(mut self, boundary: Boundary) -> OptResult<Self> {
        self.operators = build_operators(self.domain().clone(), boundary)?;
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn domain(&self) -> &Space {
        self.operators.gradient.domain()
    }

    pub fn operators(&self) -> &TgvOperators {
        &self.operators
    }

    pub fn options(&self) -> &TvOptions {
        &self.options
    }

    /// Value with the inner solver's status.
    ///
    /// # Errors
    /// - `GeometryMismatch` if `x` is outside the domain.
    /// - Whatever the inner solver reports.
    pub fn value_with_status(&self, x: &Container) -> OptResult<InnerValue> {
        check_domain(self.operators.gradient.as_ref(), x)?;
        self.solver.evaluate(&TgvValueProblem {
            image: x,
            alpha: self.alpha,
            beta: self.beta,
            operators: &self.operators,
            options: &self.options,
        })
    }

    /// Proximal map with the inner solver's status.
    ///
    /// # Errors
    /// - `InvalidStepSize` if `tau` is not finite and positive.
    /// - `GeometryMismatch` if `x` is outside the domain.
    /// - Whatever the inner solver reports.
    pub fn proximal_with_status(&self, x: &Container, tau: f64) -> OptResult<InnerSolution> {
        verify_step_size(tau)?;
        check_domain(self.operators.gradient.as_ref(), x)?;
        self.solver.solve(&TgvProblem {
            data: x,
            tau,
            alpha: self.alpha,
            beta: self.beta,
            operators: &self.operators,
            options: &self.options,
        })
    }
}

fn build_operators(domain: Space, boundary: Boundary) -> OptResult<TgvOperators> {
    let gradient = GradientOperator::new(domain, boundary)?;
    let symmetrised = SymmetrisedGradientOperator::new(gradient.range().clone(), boundary)?;
    Ok(TgvOperators { gradient: Arc::new(gradient), symmetrised: Arc::new(symmetrised) })
}

impl Function for TotalGeneralisedVariation {
    fn name(&self) -> &str {
        "TotalGeneralisedVariation"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[Capability::Value, Capability::Proximal, Capability::ProximalConjugate])
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(self.value_with_status(x)?.value)
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        Ok(self.proximal_with_status(x, tau)?.solution)
    }
}
