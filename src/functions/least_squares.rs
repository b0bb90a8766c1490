//! functions::least_squares — data fidelities built on an operator.
//!
//! - [`LeastSquares`]: `c·½‖A x − b‖²`, the standard reconstruction
//!   fidelity. Its Lipschitz constant `c‖A‖²` is estimated once at
//!   construction.
//! - [`OperatorCompositionFunction`]: `F(A x)` for any smooth `F`.
use std::sync::Arc;

use crate::{
    data::container::Container,
    functions::traits::Function,
    operators::{
        power_method::PowerMethodOptions,
        traits::{Operator, check_range},
    },
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::OptResult,
        validation::verify_finite_scalar,
    },
};

/// LeastSquares — `F(x) = c·½‖A x − b‖²`.
///
/// Fields
/// ------
/// - `operator`: forward model `A`. Gradient and Lipschitz constant need it
///   to be linear.
/// - `data`: measured `b`, in `A.range()`.
/// - `scale`: `c`.
/// - `lipschitz`: `|c|·‖A‖²`, `None` for non-linear `A`.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    operator: Arc<dyn Operator>,
    data: Container,
    scale: f64,
    lipschitz: Option<f64>,
}

impl LeastSquares {
    /// `½‖A x − b‖²` with default power-method options.
    ///
    /// # Errors
    /// - `GeometryMismatch` if `data` is not in `operator.range()`.
    pub fn new(operator: Arc<dyn Operator>, data: Container) -> OptResult<Self> {
        Self::with_options(operator, data, 1.0, &PowerMethodOptions::default())
    }

    /// `c·½‖A x − b‖²`, estimating `‖A‖` with `opts`.
    ///
    /// # Errors
    /// - `GeometryMismatch` if `data` is not in `operator.range()`.
    /// - `InvalidScalar` if `scale` is not finite.
    pub fn with_options(
        operator: Arc<dyn Operator>, data: Container, scale: f64, opts: &PowerMethodOptions,
    ) -> OptResult<Self> {
        verify_finite_scalar("scale", scale)?;
        check_range(&operator, &data)?;
        let lipschitz = if operator.is_linear() {
            let norm = operator.norm(opts)?.value;
            Some(scale.abs() * norm * norm)
        } else {
            None
        };
        Ok(Self { operator, data, scale, lipschitz })
    }

    pub fn operator(&self) -> &Arc<dyn Operator> {
        &self.operator
    }

    pub fn data(&self) -> &Container {
        &self.data
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// `A x − b`.
    pub fn residual(&self, x: &Container) -> OptResult<Container> {
        let mut r = self.operator.direct(x)?;
        r.subtract_assign(&self.data)?;
        Ok(r)
    }
}

impl Function for LeastSquares {
    fn name(&self) -> &str {
        "LeastSquares"
    }

    fn capabilities(&self) -> Capabilities {
        if self.operator.is_linear() {
            Capabilities::of(&[Capability::Value, Capability::Gradient])
        } else {
            Capabilities::of(&[Capability::Value])
        }
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(0.5 * self.scale * self.residual(x)?.squared_norm())
    }

    /// `c·Aᵗ(A x − b)`.
    fn gradient(&self, x: &Container) -> OptResult<Container> {
        let mut g = self.operator.adjoint(&self.residual(x)?)?;
        g.scale_assign(self.scale);
        Ok(g)
    }

    fn lipschitz(&self) -> Option<f64> {
        self.lipschitz
    }
}

/// OperatorCompositionFunction — `G(x) = F(A x)`.
#[derive(Debug, Clone)]
pub struct OperatorCompositionFunction {
    function: Arc<dyn Function>,
    operator: Arc<dyn Operator>,
    lipschitz: Option<f64>,
}

impl OperatorCompositionFunction {
    /// Compose with default power-method options.
    pub fn new(function: Arc<dyn Function>, operator: Arc<dyn Operator>) -> OptResult<Self> {
        Self::with_options(function, operator, &PowerMethodOptions::default())
    }

    /// Compose, estimating `‖A‖` with `opts` when `F` has a known Lipschitz
    /// constant and `A` is linear.
    pub fn with_options(
        function: Arc<dyn Function>, operator: Arc<dyn Operator>, opts: &PowerMethodOptions,
    ) -> OptResult<Self> {
        let lipschitz = match function.lipschitz() {
            Some(l) if operator.is_linear() => {
                let norm = operator.norm(opts)?.value;
                Some(l * norm * norm)
            }
            _ => None,
        };
        Ok(Self { function, operator, lipschitz })
    }
}

impl Function for OperatorCompositionFunction {
    fn name(&self) -> &str {
        "OperatorCompositionFunction"
    }

    fn capabilities(&self) -> Capabilities {
        let caps = Capabilities::of(&[Capability::Value]);
        if self.operator.is_linear() && self.function.capabilities().contains(Capability::Gradient)
        {
            caps.with(Capability::Gradient)
        } else {
            caps
        }
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        self.function.value(&self.operator.direct(x)?)
    }

    /// `Aᵗ ∇F(A x)`.
    fn gradient(&self, x: &Container) -> OptResult<Container> {
        let inner = self.function.gradient(&self.operator.direct(x)?)?;
        self.operator.adjoint(&inner)
    }

    fn lipschitz(&self) -> Option<f64> {
        self.lipschitz
    }
}
