//! operators::combinators — scaled, summed, and composed operators.
//!
//! Composites own their constituents through `Arc<dyn Operator>`, so one
//! operator can appear in several composites (e.g. `A` inside both a
//! least-squares term and a block system) without copying it.
//!
//! Geometry is checked once at construction: a sum needs equal domains and
//! equal ranges, and a composition `B ∘ A` needs `A.range` to match
//! `B.domain`. A composite is linear when all of its parts are.
use std::sync::Arc;

use crate::{
    data::{container::Container, geometry::Space},
    operators::{
        power_method::PowerMethodOptions,
        traits::{NormEstimate, Operator},
    },
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
    },
};

/// ScaledOperator — `(c A) x = c · A x`.
#[derive(Debug, Clone)]
pub struct ScaledOperator {
    scalar: f64,
    operator: Arc<dyn Operator>,
}

impl ScaledOperator {
    /// # Errors
    /// - `InvalidScalar` if `scalar` is not finite.
    pub fn new(scalar: f64, operator: Arc<dyn Operator>) -> OptResult<Self> {
        if !scalar.is_finite() {
            return Err(OptError::InvalidScalar {
                name: "scalar",
                value: scalar,
                reason: "Operator scale must be finite.",
            });
        }
        Ok(Self { scalar, operator })
    }

    pub fn scalar(&self) -> f64 {
        self.scalar
    }
}

impl Operator for ScaledOperator {
    fn name(&self) -> &str {
        "ScaledOperator"
    }

    fn domain(&self) -> &Space {
        self.operator.domain()
    }

    fn range(&self) -> &Space {
        self.operator.range()
    }

    fn capabilities(&self) -> Capabilities {
        self.operator.capabilities()
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        let mut y = self.operator.direct(x)?;
        y.scale_assign(self.scalar);
        Ok(y)
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        let mut x = self.operator.adjoint(y)?;
        x.scale_assign(self.scalar);
        Ok(x)
    }

    fn norm(&self, opts: &PowerMethodOptions) -> OptResult<NormEstimate> {
        let inner = self.operator.norm(opts)?;
        Ok(NormEstimate { value: self.scalar.abs() * inner.value, ..inner })
    }
}

/// SumOperator — `(A + B) x = A x + B x`.
#[derive(Debug, Clone)]
pub struct SumOperator {
    first: Arc<dyn Operator>,
    second: Arc<dyn Operator>,
}

impl SumOperator {
    /// # Errors
    /// - `GeometryMismatch` if the domains or the ranges differ.
    pub fn new(first: Arc<dyn Operator>, second: Arc<dyn Operator>) -> OptResult<Self> {
        first.domain().check_matches(second.domain())?;
        first.range().check_matches(second.range())?;
        Ok(Self { first, second })
    }
}

impl Operator for SumOperator {
    fn name(&self) -> &str {
        "SumOperator"
    }

    fn domain(&self) -> &Space {
        self.first.domain()
    }

    fn range(&self) -> &Space {
        self.first.range()
    }

    fn capabilities(&self) -> Capabilities {
        self.first.capabilities().intersection(self.second.capabilities())
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        let mut y = self.first.direct(x)?;
        y.add_assign(&self.second.direct(x)?)?;
        Ok(y)
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        if !self.is_linear() {
            return Err(OptError::unsupported(self.name(), Capability::Adjoint));
        }
        let mut x = self.first.adjoint(y)?;
        x.add_assign(&self.second.adjoint(y)?)?;
        Ok(x)
    }
}

/// CompositionOperator — `(B ∘ A) x = B(A x)`.
#[derive(Debug, Clone)]
pub struct CompositionOperator {
    outer: Arc<dyn Operator>,
    inner: Arc<dyn Operator>,
}

impl CompositionOperator {
    /// Build `outer ∘ inner`.
    ///
    /// # Errors
    /// - `GeometryMismatch` if `inner.range()` does not match
    ///   `outer.domain()`.
    pub fn new(outer: Arc<dyn Operator>, inner: Arc<dyn Operator>) -> OptResult<Self> {
        outer.domain().check_matches(inner.range())?;
        Ok(Self { outer, inner })
    }

    /// Compose a chain applied right to left: `ops[0] ∘ ops[1] ∘ … ∘ ops[n-1]`.
    ///
    /// # Errors
    /// - `EmptyComposition` if `ops` is empty.
    /// - `GeometryMismatch` on the first incompatible link.
    pub fn chain(ops: Vec<Arc<dyn Operator>>) -> OptResult<Arc<dyn Operator>> {
        let mut iter = ops.into_iter().rev();
        let mut acc = iter.next().ok_or(OptError::EmptyComposition { what: "Composition" })?;
        for outer in iter {
            acc = Arc::new(CompositionOperator::new(outer, acc)?);
        }
        Ok(acc)
    }
}

impl Operator for CompositionOperator {
    fn name(&self) -> &str {
        "CompositionOperator"
    }

    fn domain(&self) -> &Space {
        self.inner.domain()
    }

    fn range(&self) -> &Space {
        self.outer.range()
    }

    fn capabilities(&self) -> Capabilities {
        self.outer.capabilities().intersection(self.inner.capabilities())
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        self.outer.direct(&self.inner.direct(x)?)
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        if !self.is_linear() {
            return Err(OptError::unsupported(self.name(), Capability::Adjoint));
        }
        self.inner.adjoint(&self.outer.adjoint(y)?)
    }
}
