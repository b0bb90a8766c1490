//! operators — linear and nonlinear maps between container spaces.
//!
//! Purpose
//! -------
//! Provide the operator algebra that forward models, regularisers, and
//! solvers share: a single [`Operator`](traits::Operator) trait, elementary
//! operators, discrete derivatives, composites, and norm estimation.
//!
//! Key behaviors
//! -------------
//! - [`traits`]: the `Operator` trait, `NormEstimate`, and input checks.
//! - [`basic`]: identity, zero, diagonal, and dense-matrix operators.
//! - [`finite_difference`]: forward differences, the discrete gradient, and
//!   its symmetrised counterpart on vector fields.
//! - [`combinators`]: scaled, summed, and composed operators.
//! - [`block`]: `BlockOperator` grids over block containers.
//! - [`power_method`]: `‖A‖` estimation and the adjoint dot test.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every `direct` / `adjoint` validates its input space before computing
//!   and fails with `GeometryMismatch` otherwise.
//! - Adjoint correctness is a tested property, not a runtime check.
//!
//! Downstream usage
//! ----------------
//! - External forward/back-projection backends implement `Operator` and
//!   declare their domain and range spaces; everything else in the crate
//!   then works with them unchanged.

pub mod basic;
pub mod block;
pub mod combinators;
pub mod finite_difference;
pub mod power_method;
pub mod traits;

pub mod prelude {
    pub use super::basic::{DiagonalOperator, IdentityOperator, MatrixOperator, ZeroOperator};
    pub use super::block::BlockOperator;
    pub use super::combinators::{CompositionOperator, ScaledOperator, SumOperator};
    pub use super::finite_difference::{
        Boundary, FiniteDifferenceOperator, GradientOperator, SymmetrisedGradientOperator,
    };
    pub use super::power_method::{PowerMethodOptions, dot_test, power_method};
    pub use super::traits::{NormEstimate, Operator};
}
