//! algorithms::lbfgs::adapter — exposes a `Function` as an argmin problem.
//!
//! Parameters arrive flat; the adapter unflattens them into the space of
//! the starting point, evaluates the function, and flattens gradients back.
//! Functions without the `Gradient` capability are differentiated
//! numerically with `finitediff`: central differences first, forward
//! differences when a central evaluation failed or produced a non-finite
//! entry.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

use crate::{
    algorithms::lbfgs::types::{Cost, Grad, Theta},
    data::{container::Container, geometry::Space},
    functions::traits::Function,
    optimisation::{
        capabilities::Capability,
        errors::{OptError, OptResult},
    },
};

/// FunctionAdapter — `CostFunction` + `Gradient` over a flattened space.
#[derive(Debug, Clone)]
pub struct FunctionAdapter<'a, F: Function + ?Sized> {
    f: &'a F,
    space: Space,
}

impl<'a, F: Function + ?Sized> FunctionAdapter<'a, F> {
    pub fn new(f: &'a F, space: Space) -> Self {
        Self { f, space }
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    fn container(&self, theta: &Theta) -> OptResult<Container> {
        Ok(self.space.unflatten(theta)?)
    }
}

impl<F: Function + ?Sized> CostFunction for FunctionAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// `f(x)`; non-finite values fail with `NonFiniteObjective`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(&self.container(theta)?)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteObjective { value }.into());
        }
        Ok(value)
    }
}

impl<F: Function + ?Sized> Gradient for FunctionAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        if self.f.capabilities().contains(Capability::Gradient) {
            let x = self.container(theta)?;
            let g = self.f.gradient(&x)?;
            g.check_space(&self.space).map_err(OptError::from)?;
            let flat = g.to_flat();
            validate_grad(&flat)?;
            return Ok(flat);
        }

        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.cost(theta) {
                Ok(value) => value,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let central = theta.central_diff(&cost_func);
        if closure_err.borrow().is_none() && validate_grad(&central).is_ok() {
            return Ok(central);
        }
        forward_fd(theta, &cost_func, &closure_err)
    }
}

/// Forward-difference retry with error capture.
fn forward_fd<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&grad)?;
    Ok(grad)
}

fn validate_grad(grad: &Grad) -> OptResult<()> {
    match grad.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(OptError::NonFiniteGradient { index, value: grad[index] }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::geometry::Geometry,
        functions::{indicator::IndicatorBox, norms::L2NormSquared},
        optimisation::capabilities::Capabilities,
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Analytic gradients passed through in flat form.
    // - The finite-difference fallback for a value-only function.
    // - Non-finite costs surfacing as `NonFiniteObjective`.
    // -------------------------------------------------------------------------

    #[derive(Debug)]
    struct Quartic;

    impl Function for Quartic {
        fn name(&self) -> &str {
            "Quartic"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::of(&[Capability::Value])
        }

        fn value(&self, x: &Container) -> OptResult<f64> {
            Ok(x.map(|v| v.powi(4)).sum())
        }
    }

    fn space() -> Space {
        Space::dense(Geometry::new(&[2]).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // Verify analytic and numeric gradients.
    //
    // Given
    // -----
    // - `‖x‖²` (analytic) and `Σ x⁴` (value only) at `x = [1, -2]`.
    //
    // Expect
    // ------
    // - `[2, -4]` exactly and `[4, -32]` to `1e-5`.
    fn analytic_and_numeric_gradients() {
        // Arrange
        let theta = array![1.0, -2.0];
        let quadratic = L2NormSquared::new();
        let analytic = FunctionAdapter::new(&quadratic, space());
        let numeric = FunctionAdapter::new(&Quartic, space());

        // Act
        let g1 = analytic.gradient(&theta).unwrap();
        let g2 = numeric.gradient(&theta).unwrap();

        // Assert
        assert_eq!(g1, array![2.0, -4.0]);
        assert_relative_eq!(g2[0], 4.0, epsilon = 1e-5);
        assert_relative_eq!(g2[1], -32.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Verify that infinite costs are rejected.
    //
    // Given
    // -----
    // - The non-negativity indicator at `[-1, 1]`.
    //
    // Expect
    // ------
    // - `NonFiniteObjective { value: ∞ }` after converting back.
    fn infinite_cost_is_rejected() {
        let boxed = IndicatorBox::non_negative();
        let adapter = FunctionAdapter::new(&boxed, space());
        let err: OptError = adapter.cost(&array![-1.0, 1.0]).unwrap_err().into();
        assert_eq!(err, OptError::NonFiniteObjective { value: f64::INFINITY });
    }
}
