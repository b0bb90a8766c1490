//! algorithms::cgls — conjugate gradient least squares for `min ‖Ax − b‖²`.
//!
//! CG applied to the normal equations `AᵀA x = Aᵀb` without forming `AᵀA`.
//! Each update costs one forward and one adjoint application. The
//! normalised residual `‖Aᵀr‖ / ‖Aᵀr₀‖` is tracked; once it drops below the
//! optional residual tolerance the solver reports a zero iterate change, so
//! the `RelativeIterateChange` criterion ends the run as converged.
use std::sync::Arc;

use crate::{
    algorithms::traits::{Solver, relative_change},
    data::container::Container,
    operators::traits::{Operator, check_domain, check_range},
    optimisation::{
        capabilities::Capability,
        errors::{OptError, OptResult},
        validation::verify_tolerance,
    },
};

/// Cgls — Krylov solver for linear least squares.
#[derive(Debug, Clone)]
pub struct Cgls {
    operator: Arc<dyn Operator>,
    x: Container,
    r: Container,
    p: Container,
    gamma: f64,
    s0_norm: f64,
    residual_tol: Option<f64>,
    last_change: Option<f64>,
}

impl Cgls {
    /// # Errors
    /// - `UnsupportedOperation` if `A` is not linear.
    /// - `GeometryMismatch` if `x0 ∉ A.domain()` or `b ∉ A.range()`.
    pub fn new(operator: Arc<dyn Operator>, data: &Container, x0: Container) -> OptResult<Self> {
        if !operator.is_linear() {
            return Err(OptError::unsupported(operator.name(), Capability::Adjoint));
        }
        check_domain(operator.as_ref(), &x0)?;
        check_range(operator.as_ref(), data)?;

        let r = data.subtract(&operator.direct(&x0)?)?;
        let s = operator.adjoint(&r)?;
        let gamma = s.squared_norm();
        Ok(Self {
            operator,
            x: x0,
            r,
            p: s,
            s0_norm: gamma.sqrt(),
            gamma,
            residual_tol: None,
            last_change: None,
        })
    }

    /// Stop once `‖Aᵀr‖ / ‖Aᵀr₀‖ ≤ tol`.
    ///
    /// # Errors
    /// - `InvalidTolerance` if `tol` is negative or non-finite.
    pub fn with_residual_tolerance(mut self, tol: f64) -> OptResult<Self> {
        verify_tolerance(tol)?;
        self.residual_tol = Some(tol);
        Ok(self)
    }

    /// `‖Aᵀr‖ / ‖Aᵀr₀‖` (`0` when the start already solves the normal
    /// equations).
    pub fn normalised_residual(&self) -> f64 {
        if self.s0_norm == 0.0 { 0.0 } else { self.gamma.sqrt() / self.s0_norm }
    }

    /// Current residual `b − Ax`.
    pub fn residual(&self) -> &Container {
        &self.r
    }

    fn residual_reached(&self) -> bool {
        match self.residual_tol {
            Some(tol) => self.normalised_residual() <= tol,
            None => self.gamma == 0.0,
        }
    }
}

impl Solver for Cgls {
    fn name(&self) -> &str {
        "CGLS"
    }

    fn solution(&self) -> &Container {
        &self.x
    }

    fn update(&mut self) -> OptResult<()> {
        if self.residual_reached() {
            self.last_change = Some(0.0);
            return Ok(());
        }
        let q = self.operator.direct(&self.p)?;
        let q_sq = q.squared_norm();
        if q_sq == 0.0 {
            self.last_change = Some(0.0);
            return Ok(());
        }
        let alpha = self.gamma / q_sq;
        let x_new = self.x.axpby(1.0, alpha, &self.p)?;
        let r_new = self.r.axpby(1.0, -alpha, &q)?;
        let s_new = self.operator.adjoint(&r_new)?;
        let gamma_new = s_new.squared_norm();
        let p_new = s_new.axpby(1.0, gamma_new / self.gamma, &self.p)?;
        let change = relative_change(&x_new, &self.x)?;

        self.x = x_new;
        self.r = r_new;
        self.p = p_new;
        self.gamma = gamma_new;
        self.last_change = if self.residual_reached() { Some(0.0) } else { Some(change) };
        Ok(())
    }

    fn objective(&self) -> OptResult<f64> {
        Ok(self.r.squared_norm())
    }

    fn restore(&mut self, iterate: Container) {
        self.x = iterate;
    }

    fn last_change(&self) -> Option<f64> {
        self.last_change
    }
}
