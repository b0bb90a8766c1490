//! algorithms::gradient_descent — `x ← x − α ∇f(x)`.
//!
//! The step follows a [`StepSize`] rule: fixed, `1/L`, or Armijo
//! backtracking (the default). With `α ≤ 1/L` on an `L`-smooth convex `f`
//! the objective decreases monotonically.
use std::sync::Arc;

use crate::{
    algorithms::{
        step_size::{StepSize, armijo, inverse_lipschitz},
        traits::{Solver, relative_change},
    },
    data::container::Container,
    functions::traits::{Function, require},
    optimisation::{capabilities::Capability, errors::OptResult},
};

/// GradientDescent — steepest descent on a differentiable objective.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    f: Arc<dyn Function>,
    x: Container,
    step: StepSize,
    alpha: f64,
    last_change: Option<f64>,
}

impl GradientDescent {
    /// # Errors
    /// - `UnsupportedOperation` if `f` lacks a value or gradient.
    /// - `MissingLipschitz` for `StepSize::Lipschitz` without a known `L`.
    /// - Step-rule validation errors.
    pub fn new(f: Arc<dyn Function>, x0: Container, step: StepSize) -> OptResult<Self> {
        require(&f, Capability::Value)?;
        require(&f, Capability::Gradient)?;
        step.validate()?;
        let alpha = match step {
            StepSize::Fixed(alpha) => alpha,
            StepSize::Lipschitz => inverse_lipschitz(&f)?,
            StepSize::Armijo { initial, .. } => initial,
        };
        Ok(Self { f, x: x0, step, alpha, last_change: None })
    }

    /// Step used by the last update (the fixed step before any update).
    pub fn step_size(&self) -> f64 {
        self.alpha
    }
}

impl Solver for GradientDescent {
    fn name(&self) -> &str {
        "GradientDescent"
    }

    fn solution(&self) -> &Container {
        &self.x
    }

    fn update(&mut self) -> OptResult<()> {
        let g = self.f.gradient(&self.x)?;
        let (alpha, x_new) = match self.step {
            StepSize::Armijo { initial, shrink, max_backtracks } => {
                let fx = self.f.value(&self.x)?;
                armijo(&self.f, &self.x, fx, &g, initial, shrink, max_backtracks)?
            }
            _ => (self.alpha, self.x.axpby(1.0, -self.alpha, &g)?),
        };
        let change = relative_change(&x_new, &self.x)?;
        self.alpha = alpha;
        self.x = x_new;
        self.last_change = Some(change);
        Ok(())
    }

    fn objective(&self) -> OptResult<f64> {
        self.f.value(&self.x)
    }

    fn restore(&mut self, iterate: Container) {
        self.x = iterate;
    }

    fn last_change(&self) -> Option<f64> {
        self.last_change
    }
}
