//! operators::basic — elementary linear operators.
//!
//! - [`IdentityOperator`]: `x ↦ x`, norm exactly 1.
//! - [`ZeroOperator`]: `x ↦ 0` between any two spaces, norm exactly 0.
//! - [`DiagonalOperator`]: pointwise multiplication by fixed weights;
//!   self-adjoint with norm `max |w|`.
//! - [`MatrixOperator`]: dense matrix acting on 1-D geometries; adjoint is
//!   the transpose.
use std::sync::Arc;

use ndarray::{Array2, Ix1};

use crate::{
    data::{
        container::{Container, DataContainer},
        geometry::{Geometry, Space},
    },
    operators::{
        power_method::PowerMethodOptions,
        traits::{NormEstimate, Operator, check_domain, check_range},
    },
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::OptResult,
    },
};

const LINEAR: Capabilities = Capabilities::of(&[Capability::Direct, Capability::Adjoint]);

/// IdentityOperator — `I x = x` on a fixed space.
#[derive(Debug, Clone)]
pub struct IdentityOperator {
    space: Space,
}

impl IdentityOperator {
    pub fn new(space: Space) -> Self {
        Self { space }
    }
}

impl Operator for IdentityOperator {
    fn name(&self) -> &str {
        "IdentityOperator"
    }

    fn domain(&self) -> &Space {
        &self.space
    }

    fn range(&self) -> &Space {
        &self.space
    }

    fn capabilities(&self) -> Capabilities {
        LINEAR
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        check_domain(self, x)?;
        Ok(x.clone())
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        check_range(self, y)?;
        Ok(y.clone())
    }

    fn norm(&self, _opts: &PowerMethodOptions) -> OptResult<NormEstimate> {
        Ok(NormEstimate::exact(1.0))
    }
}

/// ZeroOperator — maps every input to zeros of the range.
#[derive(Debug, Clone)]
pub struct ZeroOperator {
    domain: Space,
    range: Space,
}

impl ZeroOperator {
    pub fn new(domain: Space, range: Space) -> Self {
        Self { domain, range }
    }
}

impl Operator for ZeroOperator {
    fn name(&self) -> &str {
        "ZeroOperator"
    }

    fn domain(&self) -> &Space {
        &self.domain
    }

    fn range(&self) -> &Space {
        &self.range
    }

    fn capabilities(&self) -> Capabilities {
        LINEAR
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        check_domain(self, x)?;
        Ok(self.range.allocate(0.0))
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        check_range(self, y)?;
        Ok(self.domain.allocate(0.0))
    }

    fn norm(&self, _opts: &PowerMethodOptions) -> OptResult<NormEstimate> {
        Ok(NormEstimate::exact(0.0))
    }
}

/// DiagonalOperator — `D x = w ⊙ x`.
#[derive(Debug, Clone)]
pub struct DiagonalOperator {
    weights: Container,
    space: Space,
}

impl DiagonalOperator {
    /// The domain and range are the space of `weights`.
    pub fn new(weights: Container) -> Self {
        let space = weights.space();
        Self { weights, space }
    }

    pub fn weights(&self) -> &Container {
        &self.weights
    }
}

impl Operator for DiagonalOperator {
    fn name(&self) -> &str {
        "DiagonalOperator"
    }

    fn domain(&self) -> &Space {
        &self.space
    }

    fn range(&self) -> &Space {
        &self.space
    }

    fn capabilities(&self) -> Capabilities {
        LINEAR
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        Ok(x.multiply(&self.weights)?)
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        Ok(y.multiply(&self.weights)?)
    }

    fn norm(&self, _opts: &PowerMethodOptions) -> OptResult<NormEstimate> {
        Ok(NormEstimate::exact(self.weights.max_abs()))
    }
}

/// MatrixOperator — dense `m × n` matrix from `[x=n]` to `[x=m]`.
#[derive(Debug, Clone)]
pub struct MatrixOperator {
    matrix: Array2<f64>,
    domain: Space,
    range: Space,
}

impl MatrixOperator {
    /// Wrap `matrix`; domain and range are 1-D geometries of matching size.
    ///
    /// # Errors
    /// - `Data(InvalidGeometry)` if the matrix has a zero dimension.
    pub fn new(matrix: Array2<f64>) -> OptResult<Self> {
        let (m, n) = matrix.dim();
        let domain = Space::Dense(Arc::new(Geometry::new(&[n])?));
        let range = Space::Dense(Arc::new(Geometry::new(&[m])?));
        Ok(Self { matrix, domain, range })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    fn apply(&self, x: &Container, transpose: bool, out_space: &Space) -> OptResult<Container> {
        let v = x.as_dense()?.array().view().into_dimensionality::<Ix1>().map_err(|_| {
            crate::data::errors::DataError::NotDense { found: x.space().to_string() }
        })?;
        let y = if transpose { self.matrix.t().dot(&v) } else { self.matrix.dot(&v) };
        let geometry = out_space.as_dense()?.clone();
        Ok(Container::Dense(DataContainer::new(y.into_dyn(), geometry)?))
    }
}

impl Operator for MatrixOperator {
    fn name(&self) -> &str {
        "MatrixOperator"
    }

    fn domain(&self) -> &Space {
        &self.domain
    }

    fn range(&self) -> &Space {
        &self.range
    }

    fn capabilities(&self) -> Capabilities {
        LINEAR
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        check_domain(self, x)?;
        self.apply(x, false, &self.range)
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        check_range(self, y)?;
        self.apply(y, true, &self.domain)
    }
}
