//! data — geometries, containers, and reductions.
//!
//! Purpose
//! -------
//! Define the numeric values that flow through the reconstruction stack:
//! geometry descriptors, dense and block containers, and the reductions
//! solvers use for objectives and convergence checks.
//!
//! Key behaviors
//! -------------
//! - [`geometry`]: `Geometry` (shape, labels, spacing, origin) and `Space`
//!   (dense or block), with the compatibility relation.
//! - [`container`]: `DataContainer` and `Container`, with geometry-checked
//!   arithmetic, in-place variants, and flattening.
//! - [`block`]: `BlockContainer` and pointwise helpers for mixed norms.
//! - [`reductions`]: blocked pairwise summation behind `sum`, `dot`, and
//!   norms.
//! - [`errors`]: `DataError` / `DataResult`.
//!
//! Conventions
//! -----------
//! - All scalar data is `f64`.
//! - Geometries are shared through `Arc`; containers own their arrays.
//!
//! Downstream usage
//! ----------------
//! - Operators declare `Space`s for their domain and range and validate
//!   inputs with `Container::check_space`.
//! - Functions and solvers combine containers with the checked arithmetic
//!   and convert `DataError` into `OptError` through `?`.

pub mod block;
pub mod container;
pub mod errors;
pub mod geometry;
pub mod reductions;

pub mod prelude {
    pub use super::block::BlockContainer;
    pub use super::container::{Container, DataContainer};
    pub use super::errors::{DataError, DataResult};
    pub use super::geometry::{Geometry, Space};
    pub use super::reductions::{DEFAULT_PAIRWISE_THRESHOLD, ReductionOptions};
}
