//! functions::indicator — indicator of a box constraint.
//!
//! `IndicatorBox(l, u)` is `0` when every entry lies in `[l, u]` and `+∞`
//! otherwise. Its proximal map is the projection `clip(x, l, u)` for every
//! step size, which makes it idempotent. Bounds may be infinite, so
//! `IndicatorBox::non_negative()` is the usual positivity constraint.
use crate::{
    data::container::Container,
    functions::traits::Function,
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
        validation::verify_step_size,
    },
};

/// IndicatorBox — `ι_{[l, u]}` applied entrywise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorBox {
    lower: f64,
    upper: f64,
}

impl IndicatorBox {
    /// # Errors
    /// - `InvalidScalar` if a bound is NaN or `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> OptResult<Self> {
        if lower.is_nan() || upper.is_nan() {
            return Err(OptError::InvalidScalar {
                name: "bound",
                value: f64::NAN,
                reason: "Box bounds must not be NaN.",
            });
        }
        if lower > upper {
            return Err(OptError::InvalidScalar {
                name: "lower",
                value: lower,
                reason: "Lower bound must not exceed the upper bound.",
            });
        }
        Ok(Self { lower, upper })
    }

    /// `ι_{x ≥ 0}`.
    pub fn non_negative() -> Self {
        Self { lower: 0.0, upper: f64::INFINITY }
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Projection onto the box.
    pub fn project(&self, x: &Container) -> Container {
        x.clip(self.lower, self.upper)
    }
}

impl Function for IndicatorBox {
    fn name(&self) -> &str {
        "IndicatorBox"
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
        let (lower, upper) = (self.lower, self.upper);
        // NaN fails both comparisons.
        let outside = x
            .map(move |v| if !(v >= lower && v <= upper) { 1.0 } else { 0.0 })
            .max_abs();
        Ok(if outside > 0.0 { f64::INFINITY } else { 0.0 })
    }

    fn proximal(&self, x: &Container, tau: f64) -> OptResult<Container> {
        verify_step_size(tau)?;
        Ok(self.project(x))
    }

    /// Support function `Σ max(l·xᵢ, u·xᵢ)`; `+∞` where an infinite bound
    /// is hit from the matching side.
    fn convex_conjugate(&self, x: &Container) -> OptResult<f64> {
        let (lower, upper) = (self.lower, self.upper);
        let terms = x.map(move |v| {
            if v > 0.0 {
                upper * v
            } else if v < 0.0 {
                lower * v
            } else {
                0.0
            }
        });
        if terms.to_flat().iter().any(|&t| t == f64::INFINITY) {
            return Ok(f64::INFINITY);
        }
        Ok(terms.sum())
    }
}
