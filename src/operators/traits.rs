//! operators::traits — the `Operator` interface.
//!
//! - [`Operator`]: forward map between two [`Space`]s with an optional
//!   adjoint and a norm estimate.
//! - [`NormEstimate`]: result of a norm computation with its convergence
//!   status.
//! - [`check_domain`] / [`check_range`]: input validation every
//!   implementation runs before computing.
use std::{fmt::Debug, sync::Arc};

use crate::{
    data::{container::Container, geometry::Space},
    operators::power_method::{PowerMethodOptions, power_method},
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
    },
};

/// Operator — map between containers with declared domain and range.
///
/// Implementations are stateless with respect to application, so one
/// instance can be applied from several threads to distinct containers.
///
/// Required methods
/// ----------------
/// - `name`: short identifier used in error messages and logs.
/// - `domain` / `range`: declared input and output spaces.
/// - `capabilities`: which of `Direct` / `Adjoint` are implemented.
/// - `direct`: forward map. Fails with `GeometryMismatch` when the input is
///   not in `domain`.
///
/// Provided methods
/// ----------------
/// - `is_linear`: `true` when an adjoint is offered.
/// - `adjoint`: fails with `UnsupportedOperation` unless overridden. When
///   implemented it must satisfy `⟨A x, y⟩ = ⟨x, Aᵗ y⟩` up to rounding.
/// - `norm`: largest singular value, by default from [`power_method`].
pub trait Operator: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn domain(&self) -> &Space;

    fn range(&self) -> &Space;

    fn capabilities(&self) -> Capabilities;

    fn direct(&self, x: &Container) -> OptResult<Container>;

    fn is_linear(&self) -> bool {
        self.capabilities().contains(Capability::Adjoint)
    }

    fn adjoint(&self, _y: &Container) -> OptResult<Container> {
        Err(OptError::unsupported(self.name(), Capability::Adjoint))
    }

    fn norm(&self, opts: &PowerMethodOptions) -> OptResult<NormEstimate> {
        power_method(self, opts)
    }
}

impl<T: Operator + ?Sized> Operator for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn domain(&self) -> &Space {
        (**self).domain()
    }

    fn range(&self) -> &Space {
        (**self).range()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        (**self).direct(x)
    }

    fn is_linear(&self) -> bool {
        (**self).is_linear()
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        (**self).adjoint(y)
    }

    fn norm(&self, opts: &PowerMethodOptions) -> OptResult<NormEstimate> {
        (**self).norm(opts)
    }
}

/// NormEstimate — operator norm with its convergence status.
///
/// Fields
/// ------
/// - `value`: best estimate of the largest singular value.
/// - `iterations`: power iterations used (`0` for closed forms).
/// - `converged`: whether the relative change dropped below tolerance
///   before the cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormEstimate {
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl NormEstimate {
    /// Closed-form norm.
    pub fn exact(value: f64) -> Self {
        Self { value, iterations: 0, converged: true }
    }
}

/// Fail with `GeometryMismatch` unless `x` lives in `op.domain()`.
pub fn check_domain<O: Operator + ?Sized>(op: &O, x: &Container) -> OptResult<()> {
    x.check_space(op.domain())?;
    Ok(())
}

/// Fail with `GeometryMismatch` unless `y` lives in `op.range()`.
pub fn check_range<O: Operator + ?Sized>(op: &O, y: &Container) -> OptResult<()> {
    y.check_space(op.range())?;
    Ok(())
}
