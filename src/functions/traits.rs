//! functions::traits — the `Function` interface and capability checks.
//!
//! - [`Function`]: scalar objective term with optional gradient, proximal
//!   map, convex conjugate, and conjugate proximal map.
//! - [`require`]: capability check algorithms run at construction.
//! - [`moreau_proximal_conjugate`]: the Moreau-decomposition fallback used by
//!   the default `proximal_conjugate`.
use std::{fmt::Debug, sync::Arc};

use crate::{
    data::container::Container,
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
        validation::verify_step_size,
    },
};

/// Function — scalar-valued objective term.
///
/// Required methods
/// ----------------
/// - `name`: short identifier used in error messages and logs.
/// - `capabilities`: which operations are implemented. Algorithms check
///   this before the first iteration through [`require`].
/// - `value`: `F(x)`. May be `+∞` (indicators outside their set).
///
/// Provided methods
/// ----------------
/// - `gradient`, `proximal`, `convex_conjugate`: fail with
///   `UnsupportedOperation` unless overridden.
/// - `proximal_conjugate(x, τ)`: `prox_{τF*}(x)`, by default through the
///   Moreau decomposition `x − τ·prox_{F/τ}(x/τ)`. Closed forms override it.
/// - `lipschitz`: Lipschitz constant of the gradient, when known.
/// - `is_constant`: `true` for terms that do not depend on `x`; sums use it
///   to decide whether a proximal map is available.
///
/// Conventions
/// -----------
/// - `proximal(x, τ) = argmin_z F(z) + ‖z − x‖² / (2τ)`, with `τ > 0`.
pub trait Function: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn value(&self, x: &Container) -> OptResult<f64>;

    fn gradient(&self, _x: &Container) -> OptResult<Container> {
        Err(OptError::unsupported(self.name(), Capability::Gradient))
    }

    fn proximal(&self, _x: &Container, _tau: f64) -> OptResult<Container> {
        Err(OptError::unsupported(self.name(), Capability::Proximal))
    }

    fn convex_conjugate(&self, _x: &Container) -> OptResult<f64> {
        Err(OptError::unsupported(self.name(), Capability::ConvexConjugate))
    }

    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        moreau_proximal_conjugate(self, x, tau)
    }

    fn lipschitz(&self) -> Option<f64> {
        None
    }

    fn is_constant(&self) -> bool {
        false
    }
}

impl<T: Function + ?Sized> Function for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        (**self).value(x)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        (**self).gradient(x)
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        (**self).proximal(x, tau)
    }

    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        (**self).convex_conjugate(x)
    }

    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        (**self).proximal_conjugate(x, tau)
    }

    fn lipschitz(&self) -> Option<f64> {
        (**self).lipschitz()
    }

    fn is_constant(&self) -> bool {
        (**self).is_constant()
    }
}

/// Fail with `UnsupportedOperation` unless `f` offers `capability`.
pub fn require<F: Function + ?Sized>(f: &F, capability: Capability) -> OptResult<()> {
    if f.capabilities().contains(capability) {
        Ok(())
    } else {
        Err(OptError::unsupported(f.name(), capability))
    }
}

/// `prox_{τF*}(x) = x − τ·prox_{F/τ}(x/τ)`.
///
/// # Errors
/// - `InvalidStepSize` if `tau` is not finite and positive.
/// - `UnsupportedOperation(ProximalConjugate)` if `f` has no proximal map.
pub fn moreau_proximal_conjugate<F: Function + ?Sized>(
    f: &F, x: &Container, tau: f64,
) -> OptResult<Container> {
    verify_step_size(tau)?;
    if !f.capabilities().contains(Capability::Proximal) {
        return Err(OptError::unsupported(f.name(), Capability::ProximalConjugate));
    }
    let inner = f.proximal(&x.scaled(1.0 / tau), 1.0 / tau)?;
    Ok(x.axpby(1.0, -tau, &inner)?)
}

/// Capabilities of a term that has a proximal map: conjugate prox comes for
/// free through Moreau.
pub(crate) const fn with_moreau(caps: Capabilities) -> Capabilities {
    if caps.contains(Capability::Proximal) { caps.with(Capability::ProximalConjugate) } else { caps }
}
