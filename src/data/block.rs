//! data::block — ordered collections of containers.
//!
//! A [`BlockContainer`] is the value type of block spaces: the stacked output
//! of a column block operator, the per-axis components of a discrete
//! gradient, or the primal/dual pair of a partitioned problem. Arithmetic is
//! inherited from [`Container`]; this module adds the pointwise helpers that
//! mixed norms need.
use crate::data::{
    container::Container,
    errors::{DataError, DataResult},
    geometry::Space,
};

/// BlockContainer — non-empty ordered list of containers.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockContainer {
    parts: Vec<Container>,
}

impl BlockContainer {
    /// # Errors
    /// - [`DataError::EmptyBlock`] when `parts` is empty.
    pub fn new(parts: Vec<Container>) -> DataResult<Self> {
        if parts.is_empty() {
            return Err(DataError::EmptyBlock);
        }
        Ok(Self { parts })
    }

    pub(crate) fn from_parts_unchecked(parts: Vec<Container>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[Container] {
        &self.parts
    }

    /// Parts are mutated through `Container` methods only, which never
    /// change a part's geometry.
    pub(crate) fn parts_mut_unchecked(&mut self) -> &mut [Container] {
        &mut self.parts
    }

    pub fn into_parts(self) -> Vec<Container> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Container> {
        self.parts.get(index)
    }

    pub fn space(&self) -> Space {
        Space::Block(self.parts.iter().map(Container::space).collect())
    }

    /// Pointwise Euclidean norm across parts: `√(Σᵢ xᵢ²)`.
    ///
    /// The result lives in the space of the first part.
    ///
    /// # Errors
    /// - [`DataError::GeometryMismatch`] if the parts are not mutually
    ///   compatible.
    pub fn pointwise_norm(&self) -> DataResult<Container> {
        let first = &self.parts[0];
        let mut acc = first.map(|v| v * v);
        for part in &self.parts[1..] {
            acc.zip_assign(part, |a, x| a + x * x)?;
        }
        acc.map_inplace(f64::sqrt);
        Ok(acc)
    }

    /// Multiply every part entrywise by the same `weights`.
    ///
    /// # Errors
    /// - [`DataError::GeometryMismatch`] if `weights` is incompatible with a
    ///   part.
    pub fn pointwise_scale(&self, weights: &Container) -> DataResult<BlockContainer> {
        let parts =
            self.parts.iter().map(|p| p.multiply(weights)).collect::<DataResult<Vec<_>>>()?;
        Ok(Self { parts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{container::DataContainer, geometry::Geometry};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Rejection of empty blocks.
    // - Pointwise norm and scaling across parts.
    // -------------------------------------------------------------------------

    fn dense(values: &[f64]) -> Container {
        let g = Arc::new(Geometry::new(&[values.len()]).unwrap());
        Container::Dense(DataContainer::from_vec(values.to_vec(), g).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // Verify that empty blocks are rejected.
    //
    // Given
    // -----
    // - No parts.
    //
    // Expect
    // ------
    // - `EmptyBlock`.
    fn new_rejects_empty_block() {
        assert_eq!(BlockContainer::new(vec![]), Err(DataError::EmptyBlock));
    }

    #[test]
    // Purpose
    // -------
    // Verify the pointwise norm of a two-component field.
    //
    // Given
    // -----
    // - Components `[3, 0]` and `[4, 2]`.
    //
    // Expect
    // ------
    // - Norms `[5, 2]`; scaling by `[2, 0]` doubles the first column and
    //   zeroes the second.
    fn pointwise_norm_and_scale() {
        // Arrange
        let block = BlockContainer::new(vec![dense(&[3.0, 0.0]), dense(&[4.0, 2.0])]).unwrap();

        // Act
        let norm = block.pointwise_norm().unwrap();
        let scaled = block.pointwise_scale(&dense(&[2.0, 0.0])).unwrap();

        // Assert
        let norm = norm.to_flat();
        assert_relative_eq!(norm[0], 5.0);
        assert_relative_eq!(norm[1], 2.0);
        assert_eq!(Container::Block(scaled).to_flat().to_vec(), vec![6.0, 0.0, 8.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that incompatible parts make the pointwise norm fail.
    //
    // Given
    // -----
    // - Parts of lengths 2 and 3.
    //
    // Expect
    // ------
    // - `GeometryMismatch`.
    fn pointwise_norm_rejects_incompatible_parts() {
        let block = BlockContainer::new(vec![dense(&[1.0, 2.0]), dense(&[1.0, 2.0, 3.0])]).unwrap();
        assert!(matches!(block.pointwise_norm(), Err(DataError::GeometryMismatch { .. })));
    }
}
