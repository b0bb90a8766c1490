//! algorithms::proximal_gradient — ISTA and FISTA for `min f(x) + g(x)`.
//!
//! Purpose
//! -------
//! Minimise the sum of a smooth term `f` (gradient required) and a
//! proximable term `g` (proximal map required).
//!
//! Key behaviors
//! -------------
//! - [`Ista`]: `x ← prox_{αg}(x − α∇f(x))`.
//! - [`Fista`]: the same step taken from an extrapolated point `y`, with
//!   momentum `tₖ₊₁ = (1 + √(1 + 4tₖ²)) / 2`.
//! - The step `α` defaults to `1/L` with `L = f.lipschitz()`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Capabilities are checked at construction: `f` needs `Gradient`, `g`
//!   needs `Proximal`, and both need `Value` for the objective.
use std::sync::Arc;

use crate::{
    algorithms::{
        step_size::inverse_lipschitz,
        traits::{Solver, relative_change},
    },
    data::container::Container,
    functions::traits::{Function, require},
    optimisation::{
        capabilities::Capability,
        errors::OptResult,
        validation::verify_step_size,
    },
};

fn resolve_step(f: &Arc<dyn Function>, g: &Arc<dyn Function>, step: Option<f64>) -> OptResult<f64> {
    require(f, Capability::Value)?;
    require(f, Capability::Gradient)?;
    require(g, Capability::Value)?;
    require(g, Capability::Proximal)?;
    match step {
        Some(alpha) => {
            verify_step_size(alpha)?;
            Ok(alpha)
        }
        None => inverse_lipschitz(f),
    }
}

/// Ista — proximal gradient descent.
#[derive(Debug, Clone)]
pub struct Ista {
    f: Arc<dyn Function>,
    g: Arc<dyn Function>,
    x: Container,
    alpha: f64,
    last_change: Option<f64>,
}

impl Ista {
    /// # Errors
    /// - `UnsupportedOperation` for missing capabilities.
    /// - `MissingLipschitz` when `step` is `None` and `f` has no constant.
    /// - `InvalidStepSize` for a non-positive explicit step.
    pub fn new(
        f: Arc<dyn Function>, g: Arc<dyn Function>, x0: Container, step: Option<f64>,
    ) -> OptResult<Self> {
        let alpha = resolve_step(&f, &g, step)?;
        Ok(Self { f, g, x: x0, alpha, last_change: None })
    }

    pub fn step_size(&self) -> f64 {
        self.alpha
    }
}

impl Solver for Ista {
    fn name(&self) -> &str {
        "ISTA"
    }

    fn solution(&self) -> &Container {
        &self.x
    }

    fn update(&mut self) -> OptResult<()> {
        let grad = self.f.gradient(&self.x)?;
        let forward = self.x.axpby(1.0, -self.alpha, &grad)?;
        let x_new = self.g.proximal(&forward, self.alpha)?;
        let change = relative_change(&x_new, &self.x)?;
        self.x = x_new;
        self.last_change = Some(change);
        Ok(())
    }

    fn objective(&self) -> OptResult<f64> {
        Ok(self.f.value(&self.x)? + self.g.value(&self.x)?)
    }

    fn restore(&mut self, iterate: Container) {
        self.x = iterate;
    }

    fn last_change(&self) -> Option<f64> {
        self.last_change
    }
}

/// Fista — accelerated proximal gradient.
#[derive(Debug, Clone)]
pub struct Fista {
    f: Arc<dyn Function>,
    g: Arc<dyn Function>,
    x: Container,
    y: Container,
    t: f64,
    alpha: f64,
    last_change: Option<f64>,
}

impl Fista {
    /// # Errors
    /// Same as [`Ista::new`].
    pub fn new(
        f: Arc<dyn Function>, g: Arc<dyn Function>, x0: Container, step: Option<f64>,
    ) -> OptResult<Self> {
        let alpha = resolve_step(&f, &g, step)?;
        Ok(Self { f, g, y: x0.clone(), x: x0, t: 1.0, alpha, last_change: None })
    }

    pub fn step_size(&self) -> f64 {
        self.alpha
    }
}

impl Solver for Fista {
    fn name(&self) -> &str {
        "FISTA"
    }

    fn solution(&self) -> &Container {
        &self.x
    }

    fn update(&mut self) -> OptResult<()> {
        let grad = self.f.gradient(&self.y)?;
        let forward = self.y.axpby(1.0, -self.alpha, &grad)?;
        let x_new = self.g.proximal(&forward, self.alpha)?;
        let t_new = 0.5 * (1.0 + (1.0 + 4.0 * self.t * self.t).sqrt());
        let momentum = (self.t - 1.0) / t_new;
        let y_new = x_new.axpby(1.0 + momentum, -momentum, &self.x)?;
        let change = relative_change(&x_new, &self.x)?;
        self.x = x_new;
        self.y = y_new;
        self.t = t_new;
        self.last_change = Some(change);
        Ok(())
    }

    fn objective(&self) -> OptResult<f64> {
        Ok(self.f.value(&self.x)? + self.g.value(&self.x)?)
    }

    fn restore(&mut self, iterate: Container) {
        self.x = iterate;
    }

    fn last_change(&self) -> Option<f64> {
        self.last_change
    }
}
