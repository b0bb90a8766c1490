//! functions::norms — squared L2, L1, and mixed L2,1 norms.
//!
//! Purpose
//! -------
//! Provide the norm-type objective terms used as data fidelities and
//! regularisers, each with closed-form proximal and conjugate-proximal
//! maps.
//!
//! Key behaviors
//! -------------
//! - [`L2NormSquared`]: `‖x − b‖²`, smooth with Lipschitz constant 2.
//! - [`L1Norm`]: `‖x − b‖₁`, proximal map is soft thresholding around `b`.
//! - [`MixedL21Norm`]: `Σ √(Σᵢ xᵢ²)` over the parts of a block container,
//!   the isotropic total-variation norm when applied to a gradient.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optional offset `b` must be compatible with every input; the
//!   container arithmetic reports `GeometryMismatch` otherwise.
//! - Conjugates of the non-smooth norms are indicators; their value is `0`
//!   or `+∞`.
//!
//! Conventions
//! -----------
//! - `proximal_conjugate(x, τ) = prox_{τF*}(x)`, overridden here with the
//!   exact projections rather than the Moreau fallback.
//!
//! Testing notes
//! -------------
//! - Unit tests check values, closed forms against hand computations, and
//!   the Moreau identity `prox_{τF}(x) + τ·prox_{F*/τ}(x/τ) = x`.
use crate::{
    data::container::Container,
    functions::traits::Function,
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::OptResult,
        validation::verify_step_size,
    },
};

fn centered(x: &Container, b: Option<&Container>) -> OptResult<Container> {
    match b {
        Some(b) => Ok(x.subtract(b)?),
        None => Ok(x.clone()),
    }
}

fn offset_dot(x: &Container, b: Option<&Container>) -> OptResult<f64> {
    match b {
        Some(b) => Ok(x.dot(b)?),
        None => Ok(0.0),
    }
}

/// L2NormSquared — `F(x) = ‖x − b‖²`.
#[derive(Debug, Clone, Default)]
pub struct L2NormSquared {
    b: Option<Container>,
}

impl L2NormSquared {
    pub fn new() -> Self {
        Self { b: None }
    }

    pub fn centered_at(b: Container) -> Self {
        Self { b: Some(b) }
    }
}

impl Function for L2NormSquared {
    fn name(&self) -> &str {
        "L2NormSquared"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[
            Capability::Value,
            Capability::Gradient,
            Capability::Proximal,
            Capability::ConvexConjugate,
            Capability::ProximalConjugate,
        ])
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(centered(x, self.b.as_ref())?.squared_norm())
    }

    fn gradient(&self, x: &Container) -> OptResult<Container> {
        Ok(centered(x, self.b.as_ref())?.scaled(2.0))
    }

    /// `(x + 2τ b) / (1 + 2τ)`.
    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        let denom = 1.0 + 2.0 * tau;
        match &self.b {
            Some(b) => Ok(x.axpby(1.0 / denom, 2.0 * tau / denom, b)?),
            None => Ok(x.scaled(1.0 / denom)),
        }
    }

    /// `¼‖x‖² + ⟨x, b⟩`.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        Ok(0.25 * x.squared_norm() + offset_dot(x, self.b.as_ref())?)
    }

    /// `(x − τ b) / (1 + τ/2)`.
    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        let denom = 1.0 + 0.5 * tau;
        match &self.b {
            Some(b) => Ok(x.axpby(1.0 / denom, -tau / denom, b)?),
            None => Ok(x.scaled(1.0 / denom)),
        }
    }

    fn lipschitz(&self) -> Option<f64> {
        Some(2.0)
    }
}

/// L1Norm — `F(x) = ‖x − b‖₁`.
#[derive(Debug, Clone, Default)]
pub struct L1Norm {
    b: Option<Container>,
}

impl L1Norm {
    pub fn new() -> Self {
        Self { b: None }
    }

    pub fn centered_at(b: Container) -> Self {
        Self { b: Some(b) }
    }
}

impl Function for L1Norm {
    fn name(&self) -> &str {
        "L1Norm"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[
            Capability::Value,
            Capability::Proximal,
            Capability::ConvexConjugate,
            Capability::ProximalConjugate,
        ])
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(centered(x, self.b.as_ref())?.abs().sum())
    }

    /// `b + sign(x − b) · max(|x − b| − τ, 0)`.
    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        let shrunk =
            centered(x, self.b.as_ref())?.map(move |v| v.signum() * (v.abs() - tau).max(0.0));
        match &self.b {
            Some(b) => Ok(shrunk.add(b)?),
            None => Ok(shrunk),
        }
    }

    /// `⟨x, b⟩` when `‖x‖∞ ≤ 1`, `+∞` otherwise.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        if x.max_abs() > 1.0 {
            return Ok(f64::INFINITY);
        }
        offset_dot(x, self.b.as_ref())
    }

    /// `clip(x − τ b, −1, 1)`.
    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        let shifted = match &self.b {
            Some(b) => x.axpby(1.0, -tau, b)?,
            None => x.clone(),
        };
        Ok(shifted.clip(-1.0, 1.0))
    }
}

/// MixedL21Norm — `F(x) = Σ √(Σᵢ xᵢ²)` over the parts of a block container.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedL21Norm;

impl MixedL21Norm {
    pub fn new() -> Self {
        Self
    }
}

impl Function for MixedL21Norm {
    fn name(&self) -> &str {
        "MixedL21Norm"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[
            Capability::Value,
            Capability::Proximal,
            Capability::ConvexConjugate,
            Capability::ProximalConjugate,
        ])
    }

    fn value(&self, x: &Container) -> OptResult<f64> {
        Ok(x.as_block()?.pointwise_norm()?.sum())
    }

    /// Group shrinkage `x · max(|x| − τ, 0) / |x|`, zero where `|x| = 0`.
    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        let block = x.as_block()?;
        let factor = block
            .pointwise_norm()?
            .map(move |n| if n > 0.0 { (n - tau).max(0.0) / n } else { 0.0 });
        Ok(Container::Block(block.pointwise_scale(&factor)?))
    }

    /// `0` inside the pointwise unit ball, `+∞` outside.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        let norms = x.as_block()?.pointwise_norm()?;
        Ok(if norms.max_abs() > 1.0 { f64::INFINITY } else { 0.0 })
    }

    /// Projection onto the pointwise unit ball: `x / max(1, |x|)`.
    fn proximal_conjugate(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        let block = x.as_block()?;
        let factor = block.pointwise_norm()?.map(|n| 1.0 / n.max(1.0));
        Ok(Container::Block(block.pointwise_scale(&factor)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{
            block::BlockContainer,
            geometry::{Geometry, Space},
        },
        functions::traits::moreau_proximal_conjugate,
        optimisation::errors::OptError,
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Values and proximal maps against hand computations.
    // - Agreement of closed-form conjugate proximal maps with the Moreau
    //   fallback.
    // - Block-input requirements of the mixed norm.
    // -------------------------------------------------------------------------

    fn line(values: ndarray::Array1<f64>) -> Container {
        Space::dense(Geometry::new(&[values.len()]).unwrap()).unflatten(&values).unwrap()
    }

    fn assert_close(a: &Container, b: &Container, tol: f64) {
        let diff = a.subtract(b).unwrap().max_abs();
        assert!(diff <= tol, "max abs diff {diff}");
    }

    #[test]
    // Purpose
    // -------
    // Verify the squared L2 norm's value, gradient, and proximal map.
    //
    // Given
    // -----
    // - `b = [1, 1]`, `x = [3, -1]`, `τ = 0.5`.
    //
    // Expect
    // ------
    // - `F(x) = 8`, `∇F(x) = [4, -4]`, `prox = (x + b)/2 = [2, 0]`.
    fn l2_squared_value_gradient_and_prox() {
        // Arrange
        let f = L2NormSquared::centered_at(line(array![1.0, 1.0]));
        let x = line(array![3.0, -1.0]);

        // Act + Assert
        assert_relative_eq!(f.value(&x).unwrap(), 8.0);
        assert_eq!(f.gradient(&x).unwrap().to_flat().to_vec(), vec![4.0, -4.0]);
        assert_eq!(f.proximal(&x, 0.5).unwrap().to_flat().to_vec(), vec![2.0, 0.0]);
        assert_eq!(f.lipschitz(), Some(2.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that the closed-form conjugate proximal maps agree with the
    // Moreau fallback for all three norms.
    //
    // Given
    // -----
    // - Offsets `b`, a test point `x`, and `τ ∈ {0.3, 2}`.
    //
    // Expect
    // ------
    // - Agreement to `1e-12`.
    fn closed_form_conjugate_prox_matches_moreau() {
        // Arrange
        let b = line(array![0.5, -1.0, 2.0]);
        let x = line(array![1.5, 0.2, -3.0]);
        let l2 = L2NormSquared::centered_at(b.clone());
        let l1 = L1Norm::centered_at(b);
        let block = Container::Block(
            BlockContainer::new(vec![x.clone(), line(array![-0.4, 2.0, 0.0])]).unwrap(),
        );

        for tau in [0.3, 2.0] {
            // Act + Assert
            assert_close(
                &l2.proximal_conjugate(&x, tau).unwrap(),
                &moreau_proximal_conjugate(&l2, &x, tau).unwrap(),
                1e-12,
            );
            assert_close(
                &l1.proximal_conjugate(&x, tau).unwrap(),
                &moreau_proximal_conjugate(&l1, &x, tau).unwrap(),
                1e-12,
            );
            assert_close(
                &MixedL21Norm.proximal_conjugate(&block, tau).unwrap(),
                &moreau_proximal_conjugate(&MixedL21Norm, &block, tau).unwrap(),
                1e-12,
            );
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify L1 soft thresholding and its conjugate indicator.
    //
    // Given
    // -----
    // - `x = [3, -0.5, -2]`, `τ = 1`, no offset.
    //
    // Expect
    // ------
    // - `prox = [2, 0, -1]`; `F*` is `+∞` at `x` and `0` at `x/3`.
    fn l1_soft_threshold_and_conjugate() {
        // Arrange
        let f = L1Norm::new();
        let x = line(array![3.0, -0.5, -2.0]);

        // Act
        let p = f.proximal(&x, 1.0).unwrap();

        // Assert
        assert_eq!(p.to_flat().to_vec(), vec![2.0, 0.0, -1.0]);
        assert_eq!(f.convex_conjugate(&x).unwrap(), f64::INFINITY);
        assert_eq!(f.convex_conjugate(&x.scaled(1.0 / 3.0)).unwrap(), 0.0);
        assert!(matches!(f.gradient(&x), Err(OptError::UnsupportedOperation { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify the mixed norm's value, group shrinkage, and block requirement.
    //
    // Given
    // -----
    // - Components `[3, 0]` and `[4, 0]` (pointwise norms `[5, 0]`), `τ = 1`.
    //
    // Expect
    // ------
    // - `F = 5`; prox scales the first column by `4/5` and keeps zeros;
    //   a dense input fails with `NotBlock`.
    fn mixed_l21_value_and_shrinkage() {
        // Arrange
        let x = Container::Block(
            BlockContainer::new(vec![line(array![3.0, 0.0]), line(array![4.0, 0.0])]).unwrap(),
        );

        // Act
        let p = MixedL21Norm.proximal(&x, 1.0).unwrap();

        // Assert
        assert_relative_eq!(MixedL21Norm.value(&x).unwrap(), 5.0);
        let flat = p.to_flat();
        assert_relative_eq!(flat[0], 2.4, epsilon = 1e-12);
        assert_relative_eq!(flat[2], 3.2, epsilon = 1e-12);
        assert_eq!(flat[1], 0.0);
        assert!(matches!(MixedL21Norm.value(&line(array![1.0])), Err(OptError::Data(_))));
    }
}
