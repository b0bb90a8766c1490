//! functions::composition — constants and function combinators.
//!
//! Purpose
//! -------
//! Build objective terms from other terms without re-deriving their maps:
//! scaling, translation, sums, and block-separable sums. Constants are
//! included here because sums treat them specially.
//!
//! Key behaviors
//! -------------
//! - [`ConstantFunction`] / [`ZeroFunction`]: value `c`, gradient zero,
//!   proximal map the identity, conjugate `−c` at zero and `+∞` elsewhere.
//! - [`ScaledFunction`]: `c·F`, with the proximal map `prox_{cτF}` for
//!   `c > 0`.
//! - [`TranslateFunction`]: `F(x − center)`.
//! - [`SumFunction`]: `Σ Fᵢ`. The proximal map is only offered when at most
//!   one term depends on `x`.
//! - [`BlockFunction`]: `Σ Fᵢ(xᵢ)` over the parts of a block container.
//!
//! Invariants & assumptions
//! ------------------------
//! - Capabilities of a combinator are derived from its terms at call time;
//!   nothing is cached, so a combinator never claims more than its terms
//!   provide.
//! - `SumFunction` and `BlockFunction` reject empty term lists.
//!
//! Conventions
//! -----------
//! - For `ScaledFunction` with `c ≤ 0` the proximal and conjugate maps are
//!   withdrawn from the capabilities.
use std::sync::Arc;

use crate::{
    data::{block::BlockContainer, container::Container, errors::DataError},
    functions::traits::{Function, require},
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
        validation::{verify_finite_scalar, verify_step_size},
    },
};

const CONSTANT_CAPS: Capabilities = Capabilities::of(&[
    Capability::Value,
    Capability::Gradient,
    Capability::Proximal,
    Capability::ConvexConjugate,
    Capability::ProximalConjugate,
]);

/// ConstantFunction — `F(x) = c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantFunction {
    constant: f64,
}

impl ConstantFunction {
    /// # Errors
    /// - `InvalidScalar` if `constant` is not finite.
    pub fn new(constant: f64) -> OptResult<Self> {
        verify_finite_scalar("constant", constant)?;
        Ok(Self { constant })
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }
}

impl Function for ConstantFunction {
    fn name(&self) -> &str {
        "ConstantFunction"
    }

    fn capabilities(&self) -> Capabilities {
        CONSTANT_CAPS
    }

    fn value(&self, _x: &Container) -> OptResult<f64> {
        Ok(self.constant)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        Ok(x.zeros_like())
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        Ok(x.clone())
    }

    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        if x.max_abs() == 0.0 { Ok(-self.constant) } else { Ok(f64::INFINITY) }
    }

    /// Projection onto `{0}`.
    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        Ok(x.zeros_like())
    }

    fn lipschitz(&self) -> Option<f64> {
        Some(0.0)
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// ZeroFunction — `F(x) = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZeroFunction;

impl Function for ZeroFunction {
    fn name(&self) -> &str {
        "ZeroFunction"
    }

    fn capabilities(&self) -> Capabilities {
        CONSTANT_CAPS
    }

    fn value(&self, _x: &Container) -> OptResult<f64> {
        Ok(0.0)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        Ok(x.zeros_like())
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        Ok(x.clone())
    }

    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        if x.max_abs() == 0.0 { Ok(0.0) } else { Ok(f64::INFINITY) }
    }

    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        Ok(x.zeros_like())
    }

    fn lipschitz(&self) -> Option<f64> {
        Some(0.0)
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// ScaledFunction — `(c·F)(x) = c·F(x)`.
#[derive(Debug, Clone)]
pub struct ScaledFunction {
    scalar: f64,
    function: Arc<dyn Function>,
}

impl ScaledFunction {
    /// # Errors
    /// - `InvalidScalar` if `scalar` is not finite.
    pub fn new(scalar: f64, function: Arc<dyn Function>) -> OptResult<Self> {
        verify_finite_scalar("scalar", scalar)?;
        Ok(Self { scalar, function })
    }

    pub fn scalar(&self) -> f64 {
        self.scalar
    }

    fn check_positive(&self, operation: Capability) -> OptResult<()> {
        if self.scalar > 0.0 { Ok(()) } else { Err(OptError::unsupported(self.name(), operation)) }
    }
}

impl Function for ScaledFunction {
    fn name(&self) -> &str {
        "ScaledFunction"
    }

    fn capabilities(&self) -> Capabilities {
        let inner = self.function.capabilities();
        if self.scalar > 0.0 {
            inner
        } else {
            inner
                .without(Capability::Proximal)
                .without(Capability::ConvexConjugate)
                .without(Capability::ProximalConjugate)
        }
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(self.scalar * self.function.value(x)?)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        let mut g = self.function.gradient(x)?;
        g.scale_assign(self.scalar);
        Ok(g)
    }

    /// `prox_{τ(cF)}(x) = prox_{(cτ)F}(x)`.
    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        self.check_positive(Capability::Proximal)?;
        verify_step_size(tau)?;
        self.function.proximal(x, tau * self.scalar)
    }

    /// `(cF)*(x) = c·F*(x/c)`.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        self.check_positive(Capability::ConvexConjugate)?;
        Ok(self.scalar * self.function.convex_conjugate(&x.scaled(1.0 / self.scalar))?)
    }

    /// `prox_{τ(cF)*}(x) = c·prox_{(τ/c)F*}(x/c)`.
    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        self.check_positive(Capability::ProximalConjugate)?;
        verify_step_size(tau)?;
        let c = self.scalar;
        let mut z = self.function.proximal_conjugate(&x.scaled(1.0 / c), tau / c)?;
        z.scale_assign(c);
        Ok(z)
    }

    fn lipschitz(&self) -> Option<f64> {
        self.function.lipschitz().map(|l| self.scalar.abs() * l)
    }

    fn is_constant(&self) -> bool {
        self.scalar == 0.0 || self.function.is_constant()
    }
}

/// TranslateFunction — `G(x) = F(x − center)`.
#[derive(Debug, Clone)]
pub struct TranslateFunction {
    function: Arc<dyn Function>,
    center: Container,
}

impl TranslateFunction {
    pub fn new(function: Arc<dyn Function>, center: Container) -> Self {
        Self { function, center }
    }

    pub fn center(&self) -> &Container {
        &self.center
    }
}

impl Function for TranslateFunction {
    fn name(&self) -> &str {
        "TranslateFunction"
    }

    fn capabilities(&self) -> Capabilities {
        self.function.capabilities()
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        self.function.value(&x.subtract(&self.center)?)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        self.function.gradient(&x.subtract(&self.center)?)
    }

    /// `prox_{τG}(x) = prox_{τF}(x − center) + center`.
    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        let mut z = self.function.proximal(&x.subtract(&self.center)?, tau)?;
        z.add_assign(&self.center)?;
        Ok(z)
    }

    /// `G*(x) = F*(x) + ⟨center, x⟩`.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        let shift = x.dot(&self.center)?;
        Ok(self.function.convex_conjugate(x)? + shift)
    }

    /// `prox_{τG*}(x) = prox_{τF*}(x − τ·center)`.
    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        self.function.proximal_conjugate(&x.axpby(1.0, -tau, &self.center)?, tau)
    }

    fn lipschitz(&self) -> Option<f64> {
        self.function.lipschitz()
    }

    fn is_constant(&self) -> bool {
        self.function.is_constant()
    }
}

/// SumFunction — `F(x) = Σᵢ Fᵢ(x)`.
///
/// Capabilities
/// ------------
/// - `Value`: always.
/// - `Gradient`: when every term has one; `lipschitz` is then the sum of
///   the terms' constants (or `None` if any is unknown).
/// - `Proximal` / `ProximalConjugate` / `ConvexConjugate`: only when at most
///   one term is non-constant. The map is that term's, since the constants
///   shift the value only. A sum of several non-constant terms has no
///   proximal map here; [`SumFunction::with_proximal`] turns that into a
///   construction-time error.
#[derive(Debug, Clone)]
pub struct SumFunction {
    terms: Vec<Arc<dyn Function>>,
}

impl SumFunction {
    /// # Errors
    /// - `EmptyComposition` if `terms` is empty.
    pub fn new(terms: Vec<Arc<dyn Function>>) -> OptResult<Self> {
        if terms.is_empty() {
            return Err(OptError::EmptyComposition { what: "SumFunction" });
        }
        Ok(Self { terms })
    }

    /// Like [`SumFunction::new`], but require a proximal map.
    ///
    /// # Errors
    /// - `EmptyComposition` if `terms` is empty.
    /// - `NonSeparableProximal` if more than one term is non-constant.
    /// - `UnsupportedOperation(Proximal)` if the single non-constant term has
    ///   no proximal map.
    pub fn with_proximal(terms: Vec<Arc<dyn Function>>) -> OptResult<Self> {
        let sum = Self::new(terms)?;
        let non_constant = sum.non_constant_terms();
        if non_constant.len() > 1 {
            return Err(OptError::NonSeparableProximal { non_constant_terms: non_constant.len() });
        }
        if let Some(term) = non_constant.first() {
            require(*term, Capability::Proximal)?;
        }
        Ok(sum)
    }

    pub fn terms(&self) -> &[Arc<dyn Function>] {
        &self.terms
    }

    fn non_constant_terms(&self) -> Vec<&Arc<dyn Function>> {
        self.terms.iter().filter(|t| !t.is_constant()).collect()
    }

    /// The term carrying the proximal map, or `None` when every term is
    /// constant.
    fn proximal_term(&self) -> OptResult<Option<&Arc<dyn Function>>> {
        let non_constant = self.non_constant_terms();
        match non_constant.len() {
            0 => Ok(None),
            1 => Ok(Some(non_constant[0])),
            n => Err(OptError::NonSeparableProximal { non_constant_terms: n }),
        }
    }

    fn constant_offset(&self, x: &Container) -> OptResult<f64> {
        let mut offset = 0.0;
        for term in self.terms.iter().filter(|t| t.is_constant()) {
            offset += term.value(x)?;
        }
        Ok(offset)
    }
}

impl Function for SumFunction {
    fn name(&self) -> &str {
        "SumFunction"
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::of(&[Capability::Value]);
        if self.terms.iter().all(|t| t.capabilities().contains(Capability::Gradient)) {
            caps = caps.with(Capability::Gradient);
        }
        let non_constant = self.non_constant_terms();
        match non_constant.len() {
            0 => {
                caps = caps
                    .with(Capability::Proximal)
                    .with(Capability::ConvexConjugate)
                    .with(Capability::ProximalConjugate);
            }
            1 => {
                let inner = non_constant[0].capabilities();
                for cap in [
                    Capability::Proximal,
                    Capability::ConvexConjugate,
                    Capability::ProximalConjugate,
                ] {
                    if inner.contains(cap) {
                        caps = caps.with(cap);
                    }
                }
            }
            _ => {}
        }
        caps
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        let mut total = 0.0;
        for term in &self.terms {
            total += term.value(x)?;
        }
        Ok(total)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        let mut iter = self.terms.iter();
        let mut acc = match iter.next() {
            Some(first) => first.gradient(x)?,
            None => return Err(OptError::EmptyComposition { what: "SumFunction" }),
        };
        for term in iter {
            acc.add_assign(&term.gradient(x)?)?;
        }
        Ok(acc)
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        match self.proximal_term()? {
            Some(term) => term.proximal(x, tau),
            None => Ok(x.clone()),
        }
    }

    /// `(F + c)*(x) = F*(x) − c`.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        let offset = self.constant_offset(x)?;
        match self.proximal_term()? {
            Some(term) => Ok(term.convex_conjugate(x)? - offset),
            None if x.max_abs() == 0.0 => Ok(-offset),
            None => Ok(f64::INFINITY),
        }
    }

    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        match self.proximal_term()? {
            Some(term) => term.proximal_conjugate(x, tau),
            None => Ok(x.zeros_like()),
        }
    }

    fn lipschitz(&self) -> Option<f64> {
        self.terms.iter().map(|t| t.lipschitz()).sum()
    }

    fn is_constant(&self) -> bool {
        self.terms.iter().all(|t| t.is_constant())
    }
}

/// BlockFunction — `F(x) = Σᵢ Fᵢ(xᵢ)` over a block container.
#[derive(Debug, Clone)]
pub struct BlockFunction {
    terms: Vec<Arc<dyn Function>>,
}

impl BlockFunction {
    /// # Errors
    /// - `EmptyComposition` if `terms` is empty.
    pub fn new(terms: Vec<Arc<dyn Function>>) -> OptResult<Self> {
        if terms.is_empty() {
            return Err(OptError::EmptyComposition { what: "BlockFunction" });
        }
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[Arc<dyn Function>] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn split<'a>(&self, x: &'a Container) -> OptResult<&'a [Container]> {
        let block = x.as_block()?;
        if block.len() != self.terms.len() {
            return Err(OptError::from(DataError::GeometryMismatch {
                expected: format!("Block of {} parts", self.terms.len()),
                found: x.space().to_string(),
            }));
        }
        Ok(block.parts())
    }

    fn map_parts<F>(&self, x: &Container, f: F) -> OptResult<Container>
    where
        F: Fn(&Arc<dyn Function>, &Container) -> OptResult<Container>,
    {
        let parts = self.split(x)?;
        let mapped = self
            .terms
            .iter()
            .zip(parts)
            .map(|(term, part)| f(term, part))
            .collect::<OptResult<Vec<_>>>()?;
        Ok(BlockContainer::new(mapped)?.into())
    }
}

impl Function for BlockFunction {
    fn name(&self) -> &str {
        "BlockFunction"
    }

    fn capabilities(&self) -> Capabilities {
        self.terms
            .iter()
            .fold(Capabilities::of(&Capability::ALL), |acc, t| acc.intersection(t.capabilities()))
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        let parts = self.split(x)?;
        let mut total = 0.0;
        for (term, part) in self.terms.iter().zip(parts) {
            total += term.value(part)?;
        }
        Ok(total)
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        self.map_parts(x, |term, part| term.gradient(part))
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        self.map_parts(x, |term, part| term.proximal(part, tau))
    }

    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        let parts = self.split(x)?;
        let mut total = 0.0;
        for (term, part) in self.terms.iter().zip(parts) {
            total += term.convex_conjugate(part)?;
        }
        Ok(total)
    }

    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        self.map_parts(x, |term, part| term.proximal_conjugate(part, tau))
    }

    fn lipschitz(&self) -> Option<f64> {
        self.terms.iter().map(|t| t.lipschitz()).try_fold(0.0_f64, |acc, l| l.map(|l| acc.max(l)))
    }

    fn is_constant(&self) -> bool {
        self.terms.iter().all(|t| t.is_constant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::geometry::{Geometry, Space},
        functions::{
            indicator::IndicatorBox,
            norms::{L1Norm, L2NormSquared},
        },
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Constant conjugates and proximal maps.
    // - Scaling and translation identities against direct computation.
    // - The proximal rule for sums and its construction-time check.
    // - Part-wise evaluation of block functions and their geometry checks.
    // -------------------------------------------------------------------------

    fn line(values: ndarray::Array1<f64>) -> Container {
        Space::dense(Geometry::new(&[values.len()]).unwrap()).unflatten(&values).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify the constant function's maps.
    //
    // Given
    // -----
    // - `F = 3` and `x = [1, -2]`.
    //
    // Expect
    // ------
    // - Value `3`, zero gradient, identity proximal map, conjugate `−3` at
    //   zero and `+∞` at `x`.
    fn constant_function_maps() {
        // Arrange
        let f = ConstantFunction::new(3.0).unwrap();
        let x = line(array![1.0, -2.0]);

        // Act + Assert
        assert_eq!(f.value(&x).unwrap(), 3.0);
        assert_eq!(f.gradient(&x).unwrap().max_abs(), 0.0);
        assert_eq!(f.proximal(&x, 0.5).unwrap(), x);
        assert_eq!(f.convex_conjugate(&x.zeros_like()).unwrap(), -3.0);
        assert_eq!(f.convex_conjugate(&x).unwrap(), f64::INFINITY);
        assert!(ConstantFunction::new(f64::NAN).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Verify that scaling by `c` matches the closed forms of `c‖x‖²`.
    //
    // Given
    // -----
    // - `G = 3‖x‖²`, `x = [1, -2]`, `τ = 0.25`.
    //
    // Expect
    // ------
    // - `prox_{τG}(x) = x / (1 + 6τ)`; `G*(x) = ‖x‖²/12`; Lipschitz `6`;
    //   negative scaling withdraws the proximal map.
    fn scaled_function_matches_closed_form() {
        // Arrange
        let g = ScaledFunction::new(3.0, Arc::new(L2NormSquared::new())).unwrap();
        let neg = ScaledFunction::new(-1.0, Arc::new(L2NormSquared::new())).unwrap();
        let x = line(array![1.0, -2.0]);
        let tau = 0.25;

        // Act
        let p = g.proximal(&x, tau).unwrap();

        // Assert
        assert!(p.subtract(&x.scaled(1.0 / 2.5)).unwrap().max_abs() < 1e-14);
        assert_relative_eq!(g.convex_conjugate(&x).unwrap(), 5.0 / 12.0, epsilon = 1e-14);
        assert_eq!(g.lipschitz(), Some(6.0));
        assert!(!neg.capabilities().contains(Capability::Proximal));
        assert!(matches!(neg.proximal(&x, tau), Err(OptError::UnsupportedOperation { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify that the scaled conjugate proximal map agrees with Moreau.
    //
    // Given
    // -----
    // - `G = 2‖x‖₁`, `x = [3, -0.5, 1]`, `τ = 0.8`.
    //
    // Expect
    // ------
    // - The override and the Moreau fallback agree to `1e-12`.
    fn scaled_conjugate_prox_matches_moreau() {
        // Arrange
        let g = ScaledFunction::new(2.0, Arc::new(L1Norm::new())).unwrap();
        let x = line(array![3.0, -0.5, 1.0]);

        // Act
        let direct = g.proximal_conjugate(&x, 0.8).unwrap();
        let moreau = crate::functions::traits::moreau_proximal_conjugate(&g, &x, 0.8).unwrap();

        // Assert
        assert!(direct.subtract(&moreau).unwrap().max_abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify translation against the centred L2 norm.
    //
    // Given
    // -----
    // - `G(x) = ‖x − c‖²` via `TranslateFunction` and via
    //   `L2NormSquared::centered_at(c)`.
    //
    // Expect
    // ------
    // - Values, proximal maps, conjugates, and conjugate proximal maps agree.
    fn translate_matches_centered_norm() {
        // Arrange
        let c = line(array![0.5, 1.0, -1.0]);
        let shifted = TranslateFunction::new(Arc::new(L2NormSquared::new()), c.clone());
        let centered = L2NormSquared::centered_at(c);
        let x = line(array![2.0, -1.0, 0.25]);

        // Act + Assert
        assert_relative_eq!(shifted.value(&x).unwrap(), centered.value(&x).unwrap());
        let (p1, p2) = (shifted.proximal(&x, 0.3).unwrap(), centered.proximal(&x, 0.3).unwrap());
        assert!(p1.subtract(&p2).unwrap().max_abs() < 1e-14);
        assert_relative_eq!(
            shifted.convex_conjugate(&x).unwrap(),
            centered.convex_conjugate(&x).unwrap(),
            epsilon = 1e-14
        );
        let q1 = shifted.proximal_conjugate(&x, 0.3).unwrap();
        let q2 = centered.proximal_conjugate(&x, 0.3).unwrap();
        assert!(q1.subtract(&q2).unwrap().max_abs() < 1e-14);
    }

    #[test]
    // Purpose
    // -------
    // Verify the proximal rule for sums.
    //
    // Given
    // -----
    // - `‖x‖₁ + 4` (one non-constant term) and `‖x‖₁ + ι_{x ≥ 0}`.
    //
    // Expect
    // ------
    // - The first sum proxes like `‖x‖₁` and has conjugate shifted by `−4`.
    // - The second offers no proximal map and `with_proximal` rejects it with
    //   `NonSeparableProximal { non_constant_terms: 2 }`.
    fn sum_proximal_requires_single_non_constant_term() {
        // Arrange
        let l1: Arc<dyn Function> = Arc::new(L1Norm::new());
        let four: Arc<dyn Function> = Arc::new(ConstantFunction::new(4.0).unwrap());
        let boxed: Arc<dyn Function> = Arc::new(IndicatorBox::non_negative());
        let ok = SumFunction::with_proximal(vec![l1.clone(), four]).unwrap();
        let bad = SumFunction::new(vec![l1.clone(), boxed.clone()]).unwrap();
        let x = line(array![0.5, -2.0]);
        let small = line(array![0.5, -0.25]);

        // Act
        let p = ok.proximal(&x, 1.0).unwrap();

        // Assert
        assert_eq!(p, l1.proximal(&x, 1.0).unwrap());
        assert_relative_eq!(ok.value(&x).unwrap(), 6.5);
        assert_relative_eq!(ok.convex_conjugate(&small).unwrap(), -4.0);
        assert!(!bad.capabilities().contains(Capability::Proximal));
        assert!(matches!(
            SumFunction::with_proximal(vec![l1, boxed]),
            Err(OptError::NonSeparableProximal { non_constant_terms: 2 })
        ));
        assert!(matches!(SumFunction::new(vec![]), Err(OptError::EmptyComposition { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify gradient and Lipschitz aggregation for sums.
    //
    // Given
    // -----
    // - `‖x‖² + ‖x − b‖²` at `x = [1, 2]`, `b = [1, 0]`.
    //
    // Expect
    // ------
    // - Gradient `2x + 2(x − b) = [2, 8]`; Lipschitz `4`.
    fn sum_gradient_and_lipschitz() {
        // Arrange
        let b = line(array![1.0, 0.0]);
        let terms: Vec<Arc<dyn Function>> =
            vec![Arc::new(L2NormSquared::new()), Arc::new(L2NormSquared::centered_at(b))];
        let f = SumFunction::new(terms).unwrap();
        let x = line(array![1.0, 2.0]);

        // Act
        let g = f.gradient(&x).unwrap();

        // Assert
        assert_eq!(g.to_flat().to_vec(), vec![2.0, 8.0]);
        assert_eq!(f.lipschitz(), Some(4.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify part-wise evaluation of block functions.
    //
    // Given
    // -----
    // - `‖x₀‖² + ‖x₁‖₁` on a two-part block.
    //
    // Expect
    // ------
    // - Value and proximal map decompose part by part; a dense input or a
    //   block of the wrong length fails with `GeometryMismatch`.
    fn block_function_is_separable() {
        // Arrange
        let terms: Vec<Arc<dyn Function>> =
            vec![Arc::new(L2NormSquared::new()), Arc::new(L1Norm::new())];
        let f = BlockFunction::new(terms).unwrap();
        let x0 = line(array![1.0, 2.0]);
        let x1 = line(array![-3.0, 0.5]);
        let x: Container = BlockContainer::new(vec![x0.clone(), x1.clone()]).unwrap().into();

        // Act
        let p = f.proximal(&x, 0.5).unwrap();

        // Assert
        assert_relative_eq!(f.value(&x).unwrap(), 5.0 + 3.5);
        let parts = p.as_block().unwrap().parts();
        assert_eq!(parts[0], L2NormSquared::new().proximal(&x0, 0.5).unwrap());
        assert_eq!(parts[1], L1Norm::new().proximal(&x1, 0.5).unwrap());
        assert!(f.value(&x0).is_err());
        let short: Container = BlockContainer::new(vec![x0]).unwrap().into();
        assert!(matches!(f.value(&short), Err(OptError::GeometryMismatch { .. })));
    }
}
