//! functions — objective terms and their proximal calculus.
//!
//! Purpose
//! -------
//! Provide the scalar functions that solvers minimise: data fidelities,
//! norms, constraints, regularisers, and combinators over them. Each term
//! declares which of value, gradient, proximal map, convex conjugate, and
//! conjugate proximal map it implements.
//!
//! Key behaviors
//! -------------
//! - [`traits`]: the `Function` trait, `require`, and the Moreau fallback.
//! - [`norms`]: `L2NormSquared`, `L1Norm`, `MixedL21Norm`.
//! - [`indicator`]: `IndicatorBox`.
//! - [`least_squares`]: `LeastSquares`, `OperatorCompositionFunction`.
//! - [`composition`]: constants, scaling, translation, sums, and
//!   block-separable sums.
//! - [`total_variation`]: `TotalVariation` with a pluggable inner solver.
//! - [`total_generalised_variation`]: second-order TGV, also solved by an
//!   injected inner solver.
//!
//! Invariants & assumptions
//! ------------------------
//! - Functions are stateless and `Send + Sync`; the same instance can be
//!   shared by solvers running on different threads.
//! - Calling an operation a function does not declare fails with
//!   `OptError::UnsupportedOperation`, never with a panic.
//!
//! Downstream usage
//! ----------------
//! - Solvers call `require` for each capability they need when they are
//!   constructed, so missing capabilities surface before the first
//!   iteration.

pub mod composition;
pub mod indicator;
pub mod least_squares;
pub mod norms;
pub mod total_generalised_variation;
pub mod total_variation;
pub mod traits;

pub mod prelude {
    pub use super::composition::{
        BlockFunction, ConstantFunction, ScaledFunction, SumFunction, TranslateFunction,
        ZeroFunction,
    };
    pub use super::indicator::IndicatorBox;
    pub use super::least_squares::{LeastSquares, OperatorCompositionFunction};
    pub use super::norms::{L1Norm, L2NormSquared, MixedL21Norm};
    pub use super::total_generalised_variation::{
        InnerValue, TgvOperators, TgvProblem, TgvProximalSolver, TgvValueProblem,
        TotalGeneralisedVariation,
    };
    pub use super::total_variation::{
        InnerSolution, TotalVariation, TvOptions, TvProblem, TvProximalSolver,
    };
    pub use super::traits::{Function, moreau_proximal_conjugate, require};
}
