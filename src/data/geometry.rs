//! data::geometry — shape, axis semantics, and physical metadata.
//!
//! Purpose
//! -------
//! Describe the logical layout of the arrays that flow through operators and
//! functions. A [`Geometry`] is the descriptor of one dense array; a [`Space`]
//! is either a single geometry or an ordered block of spaces, mirroring how
//! block operators stack or partition their inputs and outputs.
//!
//! Key behaviors
//! -------------
//! - Validate geometry descriptors once, at construction, so containers can
//!   rely on them afterwards.
//! - Provide the compatibility relation [`Geometry::matches`] /
//!   [`Space::matches`] used before every binary container operation and
//!   every operator application.
//! - Allocate constant, random, or reshaped containers for a space.
//!
//! Invariants & assumptions
//! ------------------------
//! - `shape`, `labels`, `spacing`, and `origin` always have the same length
//!   and at least one entry; no axis has length zero.
//! - Compatibility compares shapes and axis labels only. Spacing and origin
//!   are physical metadata used by discretised operators, not by arithmetic.
//! - Geometries are immutable and shared via `Arc`, so cloning a container or
//!   a space never copies the descriptor.
//!
//! Conventions
//! -----------
//! - Default labels follow the `(…, z, y, x)` convention: the last axis is
//!   `x`, the one before it `y`, then `z`; leading extra axes are named
//!   `axis_k`.
//! - Random allocation draws i.i.d. values from `U[0, 1)`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover descriptor validation, the equivalence-relation
//!   properties of `matches`, block-space rendering, and flat round-trips.
use std::{fmt, sync::Arc};

use ndarray::{Array1, ArrayD, IxDyn};
use rand::Rng;

use crate::data::{
    block::BlockContainer,
    container::{Container, DataContainer},
    errors::{DataError, DataResult},
};

/// Geometry — immutable descriptor of a dense array.
///
/// Fields
/// ------
/// - `shape`: number of samples per axis.
/// - `labels`: semantic axis names used by the compatibility relation.
/// - `spacing`: physical voxel size per axis (finite, `> 0`).
/// - `origin`: physical coordinate of the first sample per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    shape: Vec<usize>,
    labels: Vec<String>,
    spacing: Vec<f64>,
    origin: Vec<f64>,
}

impl Geometry {
    /// Build a geometry with default labels, unit spacing, and zero origin.
    ///
    /// # Errors
    /// - [`DataError::InvalidGeometry`] when `shape` is empty or contains a
    ///   zero-length axis.
    pub fn new(shape: &[usize]) -> DataResult<Self> {
        if shape.is_empty() {
            return Err(DataError::InvalidGeometry { reason: "Geometry needs at least one axis." });
        }
        if shape.contains(&0) {
            return Err(DataError::InvalidGeometry { reason: "Axis lengths must be positive." });
        }
        let ndim = shape.len();
        Ok(Self {
            shape: shape.to_vec(),
            labels: default_labels(ndim),
            spacing: vec![1.0; ndim],
            origin: vec![0.0; ndim],
        })
    }

    /// Replace the axis labels.
    ///
    /// # Errors
    /// - [`DataError::InvalidGeometry`] when the number of labels differs
    ///   from the number of axes or a label is repeated.
    pub fn with_labels<I, S>(mut self, labels: I) -> DataResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.shape.len() {
            return Err(DataError::InvalidGeometry {
                reason: "Number of labels must equal the number of axes.",
            });
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(DataError::InvalidGeometry { reason: "Axis labels must be unique." });
            }
        }
        self.labels = labels;
        Ok(self)
    }

    /// Replace the per-axis voxel spacing.
    ///
    /// # Errors
    /// - [`DataError::InvalidGeometry`] on a length mismatch.
    /// - [`DataError::InvalidSpacing`] for a non-finite or non-positive entry.
    pub fn with_spacing(mut self, spacing: &[f64]) -> DataResult<Self> {
        if spacing.len() != self.shape.len() {
            return Err(DataError::InvalidGeometry {
                reason: "Number of spacings must equal the number of axes.",
            });
        }
        for (axis, &value) in spacing.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(DataError::InvalidSpacing { axis, value });
            }
        }
        self.spacing = spacing.to_vec();
        Ok(self)
    }

    /// Replace the per-axis origin.
    ///
    /// # Errors
    /// - [`DataError::InvalidGeometry`] on a length mismatch.
    /// - [`DataError::InvalidOrigin`] for a non-finite entry.
    pub fn with_origin(mut self, origin: &[f64]) -> DataResult<Self> {
        if origin.len() != self.shape.len() {
            return Err(DataError::InvalidGeometry {
                reason: "Number of origin coordinates must equal the number of axes.",
            });
        }
        for (axis, &value) in origin.iter().enumerate() {
            if !value.is_finite() {
                return Err(DataError::InvalidOrigin { axis, value });
            }
        }
        self.origin = origin.to_vec();
        Ok(self)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of samples.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Compatibility relation: equal shapes and equal axis labels.
    ///
    /// This is plain equality on two fields, hence reflexive, symmetric,
    /// and transitive.
    pub fn matches(&self, other: &Geometry) -> bool {
        self.shape == other.shape && self.labels == other.labels
    }

    /// Dense container of this geometry filled with `value`.
    pub fn allocate(&self, value: f64) -> Container {
        Space::dense(self.clone()).allocate(value)
    }

    /// Dense container of this geometry with i.i.d. `U[0, 1)` entries.
    pub fn allocate_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Container {
        Space::dense(self.clone()).random(rng)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (label, n)) in self.labels.iter().zip(&self.shape).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{label}={n}")?;
        }
        write!(f, "]")
    }
}

fn default_labels(ndim: usize) -> Vec<String> {
    const TRAILING: [&str; 3] = ["z", "y", "x"];
    (0..ndim)
        .map(|axis| {
            let from_end = ndim - axis;
            if from_end <= TRAILING.len() {
                TRAILING[TRAILING.len() - from_end].to_string()
            } else {
                format!("axis_{axis}")
            }
        })
        .collect()
}

/// Space — a dense geometry or an ordered block of spaces.
///
/// `Space::Block` is the block geometry of block containers and the
/// domain/range of block operators.
#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    Dense(Arc<Geometry>),
    Block(Vec<Space>),
}

impl Space {
    pub fn dense(geometry: Geometry) -> Self {
        Space::Dense(Arc::new(geometry))
    }

    /// Build a block space.
    ///
    /// # Errors
    /// - [`DataError::EmptyBlock`] when `parts` is empty.
    pub fn block(parts: Vec<Space>) -> DataResult<Self> {
        if parts.is_empty() {
            return Err(DataError::EmptyBlock);
        }
        Ok(Space::Block(parts))
    }

    /// Structural compatibility: dense geometries must match, blocks must
    /// have the same length and pairwise-compatible parts.
    pub fn matches(&self, other: &Space) -> bool {
        match (self, other) {
            (Space::Dense(a), Space::Dense(b)) => a.matches(b),
            (Space::Block(a), Space::Block(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
            }
            _ => false,
        }
    }

    /// Fail with [`DataError::GeometryMismatch`] unless `other` matches.
    pub fn check_matches(&self, other: &Space) -> DataResult<()> {
        if self.matches(other) {
            Ok(())
        } else {
            Err(DataError::GeometryMismatch { expected: self.to_string(), found: other.to_string() })
        }
    }

    /// Total number of scalar entries across all parts.
    pub fn size(&self) -> usize {
        match self {
            Space::Dense(g) => g.size(),
            Space::Block(parts) => parts.iter().map(Space::size).sum(),
        }
    }

    pub fn as_dense(&self) -> DataResult<&Arc<Geometry>> {
        match self {
            Space::Dense(g) => Ok(g),
            Space::Block(_) => Err(DataError::NotDense { found: self.to_string() }),
        }
    }

    pub fn parts(&self) -> DataResult<&[Space]> {
        match self {
            Space::Block(parts) => Ok(parts),
            Space::Dense(_) => Err(DataError::NotBlock { found: self.to_string() }),
        }
    }

    /// Allocate a container filled with `value`.
    pub fn allocate(&self, value: f64) -> Container {
        match self {
            Space::Dense(g) => Container::Dense(DataContainer::full(g.clone(), value)),
            Space::Block(parts) => Container::Block(BlockContainer::from_parts_unchecked(
                parts.iter().map(|p| p.allocate(value)).collect(),
            )),
        }
    }

    /// Allocate a container with i.i.d. `U[0, 1)` entries.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Container {
        match self {
            Space::Dense(g) => {
                let array = ArrayD::from_shape_simple_fn(IxDyn(g.shape()), || rng.r#gen::<f64>());
                Container::Dense(DataContainer::from_parts_unchecked(array, g.clone()))
            }
            Space::Block(parts) => Container::Block(BlockContainer::from_parts_unchecked(
                parts.iter().map(|p| p.random(rng)).collect(),
            )),
        }
    }

    /// Reshape a flat vector (as produced by [`Container::to_flat`]) into a
    /// container of this space.
    ///
    /// # Errors
    /// - [`DataError::FlatLengthMismatch`] when `flat.len() != self.size()`.
    pub fn unflatten(&self, flat: &Array1<f64>) -> DataResult<Container> {
        let expected = self.size();
        if flat.len() != expected {
            return Err(DataError::FlatLengthMismatch { expected, found: flat.len() });
        }
        let values: Vec<f64> = flat.iter().copied().collect();
        let mut offset = 0;
        Ok(self.unflatten_from(&values, &mut offset))
    }

    fn unflatten_from(&self, values: &[f64], offset: &mut usize) -> Container {
        match self {
            Space::Dense(g) => {
                let n = g.size();
                let chunk = values[*offset..*offset + n].to_vec();
                *offset += n;
                let array = ArrayD::from_shape_vec(IxDyn(g.shape()), chunk)
                    .unwrap_or_else(|_| ArrayD::zeros(IxDyn(g.shape())));
                Container::Dense(DataContainer::from_parts_unchecked(array, g.clone()))
            }
            Space::Block(parts) => Container::Block(BlockContainer::from_parts_unchecked(
                parts.iter().map(|p| p.unflatten_from(values, offset)).collect(),
            )),
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Dense(g) => write!(f, "{g}"),
            Space::Block(parts) => {
                write!(f, "Block(")?;
                for (i, p) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
        }
    }
}
