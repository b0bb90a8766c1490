//! data::errors — error surface for geometries and containers.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias shared by geometry construction,
//! container arithmetic, and reductions. Operator and function layers convert
//! these into [`OptError`](crate::optimisation::errors::OptError) through a
//! `From` impl, so callers of the solver stack see a single error type.
//!
//! Conventions
//! -----------
//! - Geometry descriptions inside [`DataError::GeometryMismatch`] are rendered
//!   with the `Display` impl of [`Space`](crate::data::geometry::Space), e.g.
//!   `[y=4, x=5]` or `Block([y=4, x=5], [y=4, x=5])`.
//! - Axis indices are 0-based and follow `ndarray` axis order.
//! - Every variant is cheap to clone and comparable, which keeps test
//!   assertions simple.

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for geometry and container operations.
pub type DataResult<T> = Result<T, DataError>;

/// DataError — failures raised by geometry and container operations.
///
/// Variants
/// --------
/// - `GeometryMismatch`: two operands (or an operand and a declared space)
///   are not compatible. Always a caller construction error.
/// - `ShapeMismatch`: a raw array does not have the shape its geometry
///   declares.
/// - `InvalidGeometry`: a geometry descriptor is malformed (no axes, a
///   zero-length axis, wrong number of labels).
/// - `InvalidSpacing` / `InvalidOrigin`: per-axis physical metadata is not
///   usable.
/// - `EmptyBlock`: a block container or block space was built without parts.
/// - `NotDense` / `NotBlock`: an operation needs one container kind and got
///   the other.
/// - `FlatLengthMismatch`: a flat vector cannot be reshaped into a space.
/// - `InvalidThreshold`: reduction options carry a zero block size.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Operands live in incompatible spaces.
    GeometryMismatch { expected: String, found: String },

    /// Raw array shape disagrees with the declared geometry.
    ShapeMismatch { expected: Vec<usize>, found: Vec<usize> },

    /// Geometry descriptor is malformed.
    InvalidGeometry { reason: &'static str },

    /// Voxel spacing must be finite and strictly positive.
    InvalidSpacing { axis: usize, value: f64 },

    /// Origin coordinates must be finite.
    InvalidOrigin { axis: usize, value: f64 },

    /// Block containers and block spaces need at least one part.
    EmptyBlock,

    /// Operation requires a dense container.
    NotDense { found: String },

    /// Operation requires a block container.
    NotBlock { found: String },

    /// Flat vector length disagrees with the target space size.
    FlatLengthMismatch { expected: usize, found: usize },

    /// Pairwise-summation block size must be positive.
    InvalidThreshold { value: usize },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::GeometryMismatch { expected, found } => {
                write!(f, "Geometry mismatch: expected {expected}, found {found}")
            }
            DataError::ShapeMismatch { expected, found } => {
                write!(f, "Shape mismatch: geometry declares {expected:?}, array has {found:?}")
            }
            DataError::InvalidGeometry { reason } => {
                write!(f, "Invalid geometry: {reason}")
            }
            DataError::InvalidSpacing { axis, value } => {
                write!(f, "Invalid spacing on axis {axis}: {value}, must be finite and > 0")
            }
            DataError::InvalidOrigin { axis, value } => {
                write!(f, "Invalid origin on axis {axis}: {value}, must be finite")
            }
            DataError::EmptyBlock => {
                write!(f, "Block containers need at least one part")
            }
            DataError::NotDense { found } => {
                write!(f, "Expected a dense container, found {found}")
            }
            DataError::NotBlock { found } => {
                write!(f, "Expected a block container, found {found}")
            }
            DataError::FlatLengthMismatch { expected, found } => {
                write!(f, "Flat vector length mismatch: expected {expected}, found {found}")
            }
            DataError::InvalidThreshold { value } => {
                write!(f, "Invalid pairwise summation threshold {value}: must be > 0")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Payload embedding in `Display` messages for the geometry variants.
    //
    // They intentionally DO NOT cover:
    // - Where these errors are raised; that belongs to the geometry and
    //   container tests.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `GeometryMismatch` reports both rendered spaces.
    //
    // Given
    // -----
    // - A mismatch between `[x=3]` and `[x=4]`.
    //
    // Expect
    // ------
    // - Both strings appear in the message.
    fn geometry_mismatch_display_includes_both_spaces() {
        // Arrange
        let err =
            DataError::GeometryMismatch { expected: "[x=3]".to_string(), found: "[x=4]".to_string() };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("[x=3]") && msg.contains("[x=4]"), "got: {msg}");
    }

    #[test]
    // Purpose
    // -------
    // Verify that `InvalidSpacing` reports the axis and offending value.
    //
    // Given
    // -----
    // - Spacing `-0.5` on axis 2.
    //
    // Expect
    // ------
    // - The message contains "2" and "-0.5".
    fn invalid_spacing_display_includes_axis_and_value() {
        // Arrange
        let err = DataError::InvalidSpacing { axis: 2, value: -0.5 };

        // Act
        let msg = err.to_string();

        // Assert
        assert!(msg.contains("axis 2") && msg.contains("-0.5"), "got: {msg}");
    }
}
