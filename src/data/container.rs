//! data::container — geometry-tagged arrays and their arithmetic.
//!
//! Purpose
//! -------
//! Provide the value type that flows through operators, functions, and
//! solvers. A [`DataContainer`] is a dense `ArrayD<f64>` tagged with its
//! [`Geometry`]; a [`Container`] is either dense or a
//! [`BlockContainer`] of containers.
//!
//! Key behaviors
//! -------------
//! - Every binary operation checks compatibility of the operands' spaces
//!   first and fails with [`DataError::GeometryMismatch`] instead of
//!   broadcasting or silently reshaping.
//! - Non-mutating arithmetic returns a fresh container carrying the
//!   receiver's geometry; the `_assign` variants overwrite the receiver.
//! - Block containers apply every elementwise operation part by part.
//!
//! Invariants & assumptions
//! ------------------------
//! - A dense container's raw shape always equals its geometry's shape. This
//!   is checked in [`DataContainer::new`] and preserved by every operation
//!   here, since none of them reshape.
//! - In-place operations borrow the receiver mutably and the operand
//!   immutably, so the two can never alias.
//!
//! Conventions
//! -----------
//! - `axpby(a, b, y)` computes `a·self + b·y`.
//! - `sign(0) = 0`, matching the subgradient convention used by the L1
//!   proximal map.
//! - Reductions run over every entry regardless of axis labels; block
//!   reductions add the per-part results.
use std::sync::Arc;

use ndarray::{Array1, ArrayD, ArrayViewD, ArrayViewMutD, IxDyn, Zip};

use crate::data::{
    block::BlockContainer,
    errors::{DataError, DataResult},
    geometry::{Geometry, Space},
    reductions::{self, ReductionOptions},
};

/// DataContainer — dense array plus the geometry that describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer {
    array: ArrayD<f64>,
    geometry: Arc<Geometry>,
}

impl DataContainer {
    /// Tag `array` with `geometry`.
    ///
    /// # Errors
    /// - [`DataError::ShapeMismatch`] if `array.shape() != geometry.shape()`.
    pub fn new(array: ArrayD<f64>, geometry: Arc<Geometry>) -> DataResult<Self> {
        if array.shape() != geometry.shape() {
            return Err(DataError::ShapeMismatch {
                expected: geometry.shape().to_vec(),
                found: array.shape().to_vec(),
            });
        }
        Ok(Self { array, geometry })
    }

    /// Build from row-major values.
    ///
    /// # Errors
    /// - [`DataError::FlatLengthMismatch`] if `values.len() != geometry.size()`.
    pub fn from_vec(values: Vec<f64>, geometry: Arc<Geometry>) -> DataResult<Self> {
        if values.len() != geometry.size() {
            return Err(DataError::FlatLengthMismatch {
                expected: geometry.size(),
                found: values.len(),
            });
        }
        let found = values.len();
        let array = ArrayD::from_shape_vec(IxDyn(geometry.shape()), values).map_err(|_| {
            DataError::FlatLengthMismatch { expected: geometry.size(), found }
        })?;
        Ok(Self { array, geometry })
    }

    /// Constant-valued container.
    pub fn full(geometry: Arc<Geometry>, value: f64) -> Self {
        let array = ArrayD::from_elem(IxDyn(geometry.shape()), value);
        Self { array, geometry }
    }

    pub(crate) fn from_parts_unchecked(array: ArrayD<f64>, geometry: Arc<Geometry>) -> Self {
        Self { array, geometry }
    }

    pub fn array(&self) -> &ArrayD<f64> {
        &self.array
    }

    pub fn view(&self) -> ArrayViewD<'_, f64> {
        self.array.view()
    }

    /// Mutable view; the shape is fixed, only values can change.
    pub fn view_mut(&mut self) -> ArrayViewMutD<'_, f64> {
        self.array.view_mut()
    }

    pub fn into_array(self) -> ArrayD<f64> {
        self.array
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    /// Same geometry, new values. Callers guarantee the shape.
    pub(crate) fn with_array(&self, array: ArrayD<f64>) -> Self {
        Self { array, geometry: self.geometry.clone() }
    }
}

/// Container — dense or block value flowing through the operator algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    Dense(DataContainer),
    Block(BlockContainer),
}

impl From<DataContainer> for Container {
    fn from(value: DataContainer) -> Self {
        Container::Dense(value)
    }
}

impl From<BlockContainer> for Container {
    fn from(value: BlockContainer) -> Self {
        Container::Block(value)
    }
}

impl Container {
    // ---- Structure ----

    /// Space this container lives in.
    pub fn space(&self) -> Space {
        match self {
            Container::Dense(d) => Space::Dense(d.geometry.clone()),
            Container::Block(b) => Space::Block(b.parts().iter().map(Container::space).collect()),
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Container::Block(_))
    }

    /// Total number of scalar entries.
    pub fn size(&self) -> usize {
        match self {
            Container::Dense(d) => d.array.len(),
            Container::Block(b) => b.parts().iter().map(Container::size).sum(),
        }
    }

    /// Compatibility with another container (see [`Geometry::matches`]).
    pub fn compatible(&self, other: &Container) -> bool {
        match (self, other) {
            (Container::Dense(a), Container::Dense(b)) => {
                Arc::ptr_eq(&a.geometry, &b.geometry) || a.geometry.matches(&b.geometry)
            }
            (Container::Block(a), Container::Block(b)) => {
                a.len() == b.len() && a.parts().iter().zip(b.parts()).all(|(x, y)| x.compatible(y))
            }
            _ => false,
        }
    }

    /// Fail with [`DataError::GeometryMismatch`] unless compatible.
    pub fn check_compatible(&self, other: &Container) -> DataResult<()> {
        if self.compatible(other) {
            Ok(())
        } else {
            Err(DataError::GeometryMismatch {
                expected: self.space().to_string(),
                found: other.space().to_string(),
            })
        }
    }

    /// Compatibility with a declared space.
    pub fn matches_space(&self, space: &Space) -> bool {
        match (self, space) {
            (Container::Dense(d), Space::Dense(g)) => {
                Arc::ptr_eq(&d.geometry, g) || d.geometry.matches(g)
            }
            (Container::Block(b), Space::Block(parts)) => {
                b.len() == parts.len()
                    && b.parts().iter().zip(parts).all(|(c, s)| c.matches_space(s))
            }
            _ => false,
        }
    }

    /// Fail with [`DataError::GeometryMismatch`] unless the container lives
    /// in `space`.
    pub fn check_space(&self, space: &Space) -> DataResult<()> {
        if self.matches_space(space) {
            Ok(())
        } else {
            Err(DataError::GeometryMismatch {
                expected: space.to_string(),
                found: self.space().to_string(),
            })
        }
    }

    pub fn as_dense(&self) -> DataResult<&DataContainer> {
        match self {
            Container::Dense(d) => Ok(d),
            Container::Block(_) => Err(DataError::NotDense { found: self.space().to_string() }),
        }
    }

    pub fn as_dense_mut(&mut self) -> DataResult<&mut DataContainer> {
        match self {
            Container::Dense(d) => Ok(d),
            Container::Block(_) => Err(DataError::NotDense { found: self.space().to_string() }),
        }
    }

    pub fn as_block(&self) -> DataResult<&BlockContainer> {
        match self {
            Container::Block(b) => Ok(b),
            Container::Dense(_) => Err(DataError::NotBlock { found: self.space().to_string() }),
        }
    }

    pub fn into_dense(self) -> DataResult<DataContainer> {
        match self {
            Container::Dense(d) => Ok(d),
            Container::Block(_) => Err(DataError::NotDense { found: self.space().to_string() }),
        }
    }

    pub fn into_block(self) -> DataResult<BlockContainer> {
        match self {
            Container::Block(b) => Ok(b),
            Container::Dense(_) => Err(DataError::NotBlock { found: self.space().to_string() }),
        }
    }

    // ---- Elementwise kernels ----

    /// Apply `f` entrywise, returning a new container.
    pub fn map<F: Fn(f64) -> f64 + Copy>(&self, f: F) -> Container {
        match self {
            Container::Dense(d) => Container::Dense(d.with_array(d.array.mapv(f))),
            Container::Block(b) => Container::Block(BlockContainer::from_parts_unchecked(
                b.parts().iter().map(|p| p.map(f)).collect(),
            )),
        }
    }

    /// Apply `f` entrywise in place.
    pub fn map_inplace<F: Fn(f64) -> f64 + Copy>(&mut self, f: F) {
        match self {
            Container::Dense(d) => d.array.mapv_inplace(f),
            Container::Block(b) => b.parts_mut_unchecked().iter_mut().for_each(|p| p.map_inplace(f)),
        }
    }

    /// Combine two compatible containers entrywise with `f(self, other)`.
    ///
    /// # Errors
    /// - [`DataError::GeometryMismatch`] if the operands are incompatible.
    pub fn zip_map<F: Fn(f64, f64) -> f64 + Copy>(
        &self, other: &Container, f: F,
    ) -> DataResult<Container> {
        self.check_compatible(other)?;
        let mut out = self.clone();
        out.zip_assign_unchecked(other, f);
        Ok(out)
    }

    /// In-place `self ← f(self, other)`.
    ///
    /// # Errors
    /// - [`DataError::GeometryMismatch`] if the operands are incompatible;
    ///   the receiver is left untouched.
    pub fn zip_assign<F: Fn(f64, f64) -> f64 + Copy>(
        &mut self, other: &Container, f: F,
    ) -> DataResult<()> {
        self.check_compatible(other)?;
        self.zip_assign_unchecked(other, f);
        Ok(())
    }

    fn zip_assign_unchecked<F: Fn(f64, f64) -> f64 + Copy>(&mut self, other: &Container, f: F) {
        match (self, other) {
            (Container::Dense(a), Container::Dense(b)) => {
                Zip::from(&mut a.array).and(&b.array).for_each(|x, &y| *x = f(*x, y));
            }
            (Container::Block(a), Container::Block(b)) => {
                for (x, y) in a.parts_mut_unchecked().iter_mut().zip(b.parts()) {
                    x.zip_assign_unchecked(y, f);
                }
            }
            _ => {}
        }
    }

    // ---- Binary arithmetic ----

    pub fn add(&self, other: &Container) -> DataResult<Container> {
        self.zip_map(other, |a, b| a + b)
    }

    pub fn subtract(&self, other: &Container) -> DataResult<Container> {
        self.zip_map(other, |a, b| a - b)
    }

    pub fn multiply(&self, other: &Container) -> DataResult<Container> {
        self.zip_map(other, |a, b| a * b)
    }

    /// Entrywise quotient; division by zero follows IEEE semantics.
    pub fn divide(&self, other: &Container) -> DataResult<Container> {
        self.zip_map(other, |a, b| a / b)
    }

    pub fn maximum(&self, other: &Container) -> DataResult<Container> {
        self.zip_map(other, f64::max)
    }

    pub fn minimum(&self, other: &Container) -> DataResult<Container> {
        self.zip_map(other, f64::min)
    }

    /// `a·self + b·y`.
    pub fn axpby(&self, a: f64, b: f64, y: &Container) -> DataResult<Container> {
        self.zip_map(y, move |x, y| a * x + b * y)
    }

    pub fn add_assign(&mut self, other: &Container) -> DataResult<()> {
        self.zip_assign(other, |a, b| a + b)
    }

    pub fn subtract_assign(&mut self, other: &Container) -> DataResult<()> {
        self.zip_assign(other, |a, b| a - b)
    }

    pub fn multiply_assign(&mut self, other: &Container) -> DataResult<()> {
        self.zip_assign(other, |a, b| a * b)
    }

    pub fn divide_assign(&mut self, other: &Container) -> DataResult<()> {
        self.zip_assign(other, |a, b| a / b)
    }

    /// In-place `self ← a·self + b·y`.
    pub fn axpby_assign(&mut self, a: f64, b: f64, y: &Container) -> DataResult<()> {
        self.zip_assign(y, move |x, y| a * x + b * y)
    }

    /// Overwrite the receiver's values with `other`'s.
    pub fn assign(&mut self, other: &Container) -> DataResult<()> {
        self.zip_assign(other, |_, b| b)
    }

    // ---- Unary arithmetic ----

    pub fn scaled(&self, c: f64) -> Container {
        self.map(move |v| c * v)
    }

    pub fn scale_assign(&mut self, c: f64) {
        self.map_inplace(move |v| c * v);
    }

    pub fn add_scalar(&self, c: f64) -> Container {
        self.map(move |v| v + c)
    }

    pub fn abs(&self) -> Container {
        self.map(f64::abs)
    }

    /// Entrywise sign with `sign(0) = 0`.
    pub fn sign(&self) -> Container {
        self.map(|v| if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 })
    }

    pub fn sqrt(&self) -> Container {
        self.map(f64::sqrt)
    }

    /// Clamp every entry into `[lower, upper]`.
    pub fn clip(&self, lower: f64, upper: f64) -> Container {
        self.map(move |v| v.max(lower).min(upper))
    }

    pub fn zeros_like(&self) -> Container {
        self.full_like(0.0)
    }

    pub fn full_like(&self, value: f64) -> Container {
        self.map(move |_| value)
    }

    /// `true` when no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        match self {
            Container::Dense(d) => d.array.iter().all(|v| v.is_finite()),
            Container::Block(b) => b.parts().iter().all(Container::is_finite),
        }
    }

    // ---- Reductions ----

    pub fn sum(&self) -> f64 {
        self.sum_with(&ReductionOptions::default())
    }

    pub fn sum_with(&self, opts: &ReductionOptions) -> f64 {
        match self {
            Container::Dense(d) => reductions::sum(&d.array, opts),
            Container::Block(b) => b.parts().iter().map(|p| p.sum_with(opts)).sum(),
        }
    }

    /// Inner product `⟨self, other⟩`.
    ///
    /// # Errors
    /// - [`DataError::GeometryMismatch`] if the operands are incompatible.
    pub fn dot(&self, other: &Container) -> DataResult<f64> {
        self.dot_with(other, &ReductionOptions::default())
    }

    pub fn dot_with(&self, other: &Container, opts: &ReductionOptions) -> DataResult<f64> {
        self.check_compatible(other)?;
        Ok(self.dot_unchecked(other, opts))
    }

    fn dot_unchecked(&self, other: &Container, opts: &ReductionOptions) -> f64 {
        match (self, other) {
            (Container::Dense(a), Container::Dense(b)) => reductions::dot(&a.array, &b.array, opts),
            (Container::Block(a), Container::Block(b)) => {
                a.parts().iter().zip(b.parts()).map(|(x, y)| x.dot_unchecked(y, opts)).sum()
            }
            _ => f64::NAN,
        }
    }

    pub fn squared_norm(&self) -> f64 {
        self.squared_norm_with(&ReductionOptions::default())
    }

    pub fn squared_norm_with(&self, opts: &ReductionOptions) -> f64 {
        match self {
            Container::Dense(d) => reductions::squared_norm(&d.array, opts),
            Container::Block(b) => b.parts().iter().map(|p| p.squared_norm_with(opts)).sum(),
        }
    }

    /// Euclidean norm over all entries (all parts for a block).
    pub fn norm(&self) -> f64 {
        self.squared_norm().sqrt()
    }

    pub fn norm_with(&self, opts: &ReductionOptions) -> f64 {
        self.squared_norm_with(opts).sqrt()
    }

    /// Largest absolute entry across all parts.
    pub fn max_abs(&self) -> f64 {
        match self {
            Container::Dense(d) => reductions::max_abs(&d.array),
            Container::Block(b) => b.parts().iter().map(Container::max_abs).fold(0.0, f64::max),
        }
    }

    // ---- Flattening ----

    /// Concatenate every entry in row-major order, parts in block order.
    pub fn to_flat(&self) -> Array1<f64> {
        let mut out = Vec::with_capacity(self.size());
        self.extend_flat(&mut out);
        Array1::from_vec(out)
    }

    fn extend_flat(&self, out: &mut Vec<f64>) {
        match self {
            Container::Dense(d) => out.extend(d.array.iter().copied()),
            Container::Block(b) => b.parts().iter().for_each(|p| p.extend_flat(out)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Shape validation at construction.
    // - Geometry-checked arithmetic on dense and block containers.
    // - In-place variants leaving the receiver untouched on failure.
    // - Reductions and flattening.
    //
    // They intentionally DO NOT cover:
    // - Pairwise summation accuracy (see `reductions.rs`).
    // -------------------------------------------------------------------------

    fn dense(values: &[f64]) -> Container {
        let g = Arc::new(Geometry::new(&[values.len()]).unwrap());
        Container::Dense(DataContainer::from_vec(values.to_vec(), g).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // Verify that a container rejects an array whose shape differs from its
    // geometry.
    //
    // Given
    // -----
    // - A `[2, 3]` geometry and a `[3, 2]` array.
    //
    // Expect
    // ------
    // - `ShapeMismatch` with both shapes.
    fn new_rejects_shape_mismatch() {
        // Arrange
        let g = Arc::new(Geometry::new(&[2, 3]).unwrap());
        let array = ArrayD::zeros(IxDyn(&[3, 2]));

        // Act
        let err = DataContainer::new(array, g).unwrap_err();

        // Assert
        assert_eq!(err, DataError::ShapeMismatch { expected: vec![2, 3], found: vec![3, 2] });
    }

    #[test]
    // Purpose
    // -------
    // Verify basic arithmetic and `axpby` on compatible dense containers.
    //
    // Given
    // -----
    // - `x = [1, 2, 3]`, `y = [4, 5, 6]`.
    //
    // Expect
    // ------
    // - Sum, product, and `2x − y` computed entrywise; geometry preserved.
    fn dense_arithmetic_is_entrywise() {
        // Arrange
        let x = dense(&[1.0, 2.0, 3.0]);
        let y = dense(&[4.0, 5.0, 6.0]);

        // Act
        let sum = x.add(&y).unwrap();
        let prod = x.multiply(&y).unwrap();
        let comb = x.axpby(2.0, -1.0, &y).unwrap();

        // Assert
        assert_eq!(sum.to_flat().to_vec(), vec![5.0, 7.0, 9.0]);
        assert_eq!(prod.to_flat().to_vec(), vec![4.0, 10.0, 18.0]);
        assert_eq!(comb.to_flat().to_vec(), vec![-2.0, -1.0, 0.0]);
        assert!(sum.compatible(&x));
    }

    #[test]
    // Purpose
    // -------
    // Verify that incompatible arithmetic fails and in-place variants do not
    // touch the receiver on failure.
    //
    // Given
    // -----
    // - Containers of length 3 and 4, and a relabelled length-3 container.
    //
    // Expect
    // ------
    // - `GeometryMismatch` from `add`, `add_assign`, and `dot`; receiver
    //   unchanged.
    fn incompatible_arithmetic_fails_with_geometry_mismatch() {
        // Arrange
        let mut x = dense(&[1.0, 2.0, 3.0]);
        let y = dense(&[1.0, 2.0, 3.0, 4.0]);
        let g = Arc::new(Geometry::new(&[3]).unwrap().with_labels(["angle"]).unwrap());
        let z = Container::Dense(DataContainer::full(g, 1.0));
        let before = x.clone();

        // Act + Assert
        assert!(matches!(x.add(&y), Err(DataError::GeometryMismatch { .. })));
        assert!(matches!(x.add_assign(&z), Err(DataError::GeometryMismatch { .. })));
        assert!(matches!(x.dot(&y), Err(DataError::GeometryMismatch { .. })));
        assert_eq!(x, before);
    }

    #[test]
    // Purpose
    // -------
    // Verify block arithmetic part by part and block reductions.
    //
    // Given
    // -----
    // - Blocks `([1, 2], [3])` and `([1, 1], [1])`.
    //
    // Expect
    // ------
    // - Sum `([2, 3], [4])`; dot `6`; norm² `14`; mismatch against a dense
    //   operand.
    fn block_arithmetic_and_reductions() {
        // Arrange
        let a = Container::Block(
            BlockContainer::new(vec![dense(&[1.0, 2.0]), dense(&[3.0])]).unwrap(),
        );
        let b = Container::Block(
            BlockContainer::new(vec![dense(&[1.0, 1.0]), dense(&[1.0])]).unwrap(),
        );

        // Act
        let sum = a.add(&b).unwrap();

        // Assert
        assert_eq!(sum.to_flat().to_vec(), vec![2.0, 3.0, 4.0]);
        assert_relative_eq!(a.dot(&b).unwrap(), 6.0);
        assert_relative_eq!(a.squared_norm(), 14.0);
        assert_relative_eq!(a.norm(), 14.0_f64.sqrt());
        assert_eq!(a.max_abs(), 3.0);
        assert!(a.add(&dense(&[1.0, 2.0, 3.0])).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Verify unary helpers at their edge values.
    //
    // Given
    // -----
    // - `x = [-2, 0, 3]`.
    //
    // Expect
    // ------
    // - `sign = [-1, 0, 1]`, `clip(-1, 1) = [-1, 0, 1]`, `abs = [2, 0, 3]`.
    fn unary_helpers_follow_conventions() {
        // Arrange
        let x = dense(&[-2.0, 0.0, 3.0]);

        // Act + Assert
        assert_eq!(x.sign().to_flat().to_vec(), vec![-1.0, 0.0, 1.0]);
        assert_eq!(x.clip(-1.0, 1.0).to_flat().to_vec(), vec![-1.0, 0.0, 1.0]);
        assert_eq!(x.abs().to_flat().to_vec(), vec![2.0, 0.0, 3.0]);
        assert_eq!(x.zeros_like().sum(), 0.0);
        assert!(!x.map(|v| v / 0.0).is_finite());
    }
}
