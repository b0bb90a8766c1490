//! algorithms::pdhg — primal-dual hybrid gradient for `min f(Kx) + g(x)`.
//!
//! Purpose
//! -------
//! Solve saddle-point problems where `f` is only accessible through its
//! convex conjugate and `K` is a linear operator:
//!
//! ```text
//! yₖ₊₁ = prox_{σ f*}(yₖ + σ K x̄ₖ)
//! xₖ₊₁ = prox_{τ g}(xₖ − τ Kᵀ yₖ₊₁)
//! x̄ₖ₊₁ = xₖ₊₁ + θ (xₖ₊₁ − xₖ)
//! ```
//!
//! Key behaviors
//! -------------
//! - Defaults: `σ = 1/‖K‖` and `τ = 1/(σ‖K‖²)`. When only one step is
//!   given the other is derived from it the same way.
//! - Over-relaxation `θ = 1`. With [`Pdhg::with_strong_convexity`] the
//!   steps are accelerated every iteration: `θ = 1/√(1 + 2γτ)`,
//!   `τ ← θτ`, `σ ← σ/θ`.
//! - The objective is the primal value `f(Kx) + g(x)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `σ τ ‖K‖² ≤ 1` for explicitly supplied steps (small slack for the
//!   power-method estimate); violations fail with `UnstableStepSizes`.
//! - `x0` lives in `K.domain()`; the dual iterate starts at zero in
//!   `K.range()`.
use std::sync::Arc;

use crate::{
    algorithms::traits::{Solver, relative_change},
    data::container::Container,
    functions::traits::{Function, require},
    operators::{
        power_method::PowerMethodOptions,
        traits::{Operator, check_domain},
    },
    optimisation::{
        capabilities::Capability,
        errors::{OptError, OptResult},
        validation::{verify_positive_scalar, verify_step_size},
    },
};

/// Slack allowed on `σ τ ‖K‖² ≤ 1` to absorb norm-estimate error.
const STEP_PRODUCT_SLACK: f64 = 1e-6;

/// Pdhg — Chambolle–Pock primal-dual solver.
#[derive(Debug, Clone)]
pub struct Pdhg {
    f: Arc<dyn Function>,
    g: Arc<dyn Function>,
    operator: Arc<dyn Operator>,
    x: Container,
    x_bar: Container,
    y: Container,
    sigma: f64,
    tau: f64,
    theta: f64,
    gamma_g: Option<f64>,
    operator_norm: f64,
    last_change: Option<f64>,
}

impl Pdhg {
    /// Build a PDHG solver, estimating `‖K‖` with the power method.
    ///
    /// # Errors
    /// - `UnsupportedOperation` if `f` lacks `ProximalConjugate`, `g` lacks
    ///   `Proximal`, or `K` is not linear.
    /// - `GeometryMismatch` if `x0` is not in `K.domain()`.
    /// - `InvalidScalar` if `‖K‖ = 0`.
    /// - `InvalidStepSize` / `UnstableStepSizes` for bad explicit steps.
    pub fn new(
        f: Arc<dyn Function>, g: Arc<dyn Function>, operator: Arc<dyn Operator>, x0: Container,
        sigma: Option<f64>, tau: Option<f64>,
    ) -> OptResult<Self> {
        require(&f, Capability::Value)?;
        require(&f, Capability::ProximalConjugate)?;
        require(&g, Capability::Value)?;
        require(&g, Capability::Proximal)?;
        if !operator.is_linear() {
            return Err(OptError::unsupported(operator.name(), Capability::Adjoint));
        }
        check_domain(operator.as_ref(), &x0)?;

        let norm = operator.norm(&PowerMethodOptions::default())?.value;
        if !(norm > 0.0 && norm.is_finite()) {
            return Err(OptError::InvalidScalar {
                name: "operator_norm",
                value: norm,
                reason: "PDHG needs an operator with a positive finite norm.",
            });
        }
        let (sigma, tau) = resolve_steps(sigma, tau, norm)?;

        let y = operator.range().allocate(0.0);
        Ok(Self {
            f,
            g,
            operator,
            x_bar: x0.clone(),
            x: x0,
            y,
            sigma,
            tau,
            theta: 1.0,
            gamma_g: None,
            operator_norm: norm,
            last_change: None,
        })
    }

    /// Accelerate with the strong-convexity modulus `γ` of `g`.
    ///
    /// # Errors
    /// - `InvalidScalar` if `gamma` is not finite and positive.
    pub fn with_strong_convexity(mut self, gamma: f64) -> OptResult<Self> {
        verify_positive_scalar("gamma", gamma)?;
        self.gamma_g = Some(gamma);
        Ok(self)
    }

    /// Current dual iterate.
    pub fn dual(&self) -> &Container {
        &self.y
    }

    /// Current `(σ, τ)`.
    pub fn step_sizes(&self) -> (f64, f64) {
        (self.sigma, self.tau)
    }

    /// Operator norm estimate the steps were derived from.
    pub fn operator_norm(&self) -> f64 {
        self.operator_norm
    }
}

fn resolve_steps(sigma: Option<f64>, tau: Option<f64>, norm: f64) -> OptResult<(f64, f64)> {
    let norm_sq = norm * norm;
    match (sigma, tau) {
        (None, None) => {
            let sigma = 1.0 / norm;
            Ok((sigma, 1.0 / (sigma * norm_sq)))
        }
        (Some(sigma), None) => {
            verify_step_size(sigma)?;
            Ok((sigma, 1.0 / (sigma * norm_sq)))
        }
        (None, Some(tau)) => {
            verify_step_size(tau)?;
            Ok((1.0 / (tau * norm_sq), tau))
        }
        (Some(sigma), Some(tau)) => {
            verify_step_size(sigma)?;
            verify_step_size(tau)?;
            if sigma * tau * norm_sq > 1.0 + STEP_PRODUCT_SLACK {
                return Err(OptError::UnstableStepSizes { sigma, tau, norm });
            }
            Ok((sigma, tau))
        }
    }
}

impl Solver for Pdhg {
    fn name(&self) -> &str {
        "PDHG"
    }

    fn solution(&self) -> &Container {
        &self.x
    }

    fn update(&mut self) -> OptResult<()> {
        let k_bar = self.operator.direct(&self.x_bar)?;
        let dual_arg = self.y.axpby(1.0, self.sigma, &k_bar)?;
        let y_new = self.f.proximal_conjugate(&dual_arg, self.sigma)?;

        let kt_y = self.operator.adjoint(&y_new)?;
        let primal_arg = self.x.axpby(1.0, -self.tau, &kt_y)?;
        let x_new = self.g.proximal(&primal_arg, self.tau)?;

        if let Some(gamma) = self.gamma_g {
            self.theta = 1.0 / (1.0 + 2.0 * gamma * self.tau).sqrt();
            self.tau *= self.theta;
            self.sigma /= self.theta;
        }
        let x_bar = x_new.axpby(1.0 + self.theta, -self.theta, &self.x)?;

        let change = relative_change(&x_new, &self.x)?;
        self.x = x_new;
        self.x_bar = x_bar;
        self.y = y_new;
        self.last_change = Some(change);
        Ok(())
    }

    fn objective(&self) -> OptResult<f64> {
        let kx = self.operator.direct(&self.x)?;
        Ok(self.f.value(&kx)? + self.g.value(&self.x)?)
    }

    fn restore(&mut self, iterate: Container) {
        self.x = iterate;
    }

    fn last_change(&self) -> Option<f64> {
        self.last_change
    }
}
