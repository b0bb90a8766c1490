//! operators::block — grids of operators acting on block containers.
//!
//! Purpose
//! -------
//! Express stacked and partitioned systems such as `[A; λ∇]` (data term plus
//! regulariser in one operator) or `[A B]` (a shared range with partitioned
//! unknowns) as a single [`Operator`].
//!
//! Key behaviors
//! -------------
//! - `BlockOperator::new(rows, cols, ops)` takes operators in row-major
//!   order. Every operator in row `i` shares a range; every operator in
//!   column `j` shares a domain.
//! - `direct`: `yᵢ = Σⱼ Aᵢⱼ xⱼ`. `adjoint`: `xⱼ = Σᵢ Aᵢⱼᵗ yᵢ`.
//! - A single column takes a plain container as input; a single row returns
//!   a plain container. So `[A; I]` maps `x` to the block `[Ax; x]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ops.len() == rows * cols`, `rows, cols ≥ 1`, checked at construction.
//! - Geometry agreement within rows and columns is checked at construction,
//!   so `direct`/`adjoint` only need to validate their input.
use std::sync::Arc;

use crate::{
    data::{block::BlockContainer, container::Container, geometry::Space},
    operators::{
        power_method::PowerMethodOptions,
        traits::{Operator, check_domain, check_range},
    },
    optimisation::{
        capabilities::{Capabilities, Capability},
        errors::{OptError, OptResult},
    },
};

/// BlockOperator — `rows × cols` grid of operators.
#[derive(Debug, Clone)]
pub struct BlockOperator {
    rows: usize,
    cols: usize,
    ops: Vec<Arc<dyn Operator>>,
    domain: Space,
    range: Space,
}

impl BlockOperator {
    /// Build a block operator from a row-major grid.
    ///
    /// # Errors
    /// - `InvalidBlockShape` if the grid is empty or `ops.len() != rows * cols`.
    /// - `GeometryMismatch` if two operators in a row disagree on their range
    ///   or two operators in a column disagree on their domain.
    pub fn new(rows: usize, cols: usize, ops: Vec<Arc<dyn Operator>>) -> OptResult<Self> {
        if rows == 0 || cols == 0 || ops.len() != rows * cols {
            return Err(OptError::InvalidBlockShape { rows, cols, found: ops.len() });
        }
        for i in 0..rows {
            let reference = ops[i * cols].range();
            for j in 1..cols {
                reference.check_matches(ops[i * cols + j].range())?;
            }
        }
        for j in 0..cols {
            let reference = ops[j].domain();
            for i in 1..rows {
                reference.check_matches(ops[i * cols + j].domain())?;
            }
        }
        let domain = if cols == 1 {
            ops[0].domain().clone()
        } else {
            Space::Block((0..cols).map(|j| ops[j].domain().clone()).collect())
        };
        let range = if rows == 1 {
            ops[0].range().clone()
        } else {
            Space::Block((0..rows).map(|i| ops[i * cols].range().clone()).collect())
        };
        Ok(Self { rows, cols, ops, domain, range })
    }

    /// Stack operators vertically: `[A₀; A₁; …]`.
    pub fn column(ops: Vec<Arc<dyn Operator>>) -> OptResult<Self> {
        let rows = ops.len();
        Self::new(rows, 1, ops)
    }

    /// Place operators side by side: `[A₀ A₁ …]`.
    pub fn row(ops: Vec<Arc<dyn Operator>>) -> OptResult<Self> {
        let cols = ops.len();
        Self::new(1, cols, ops)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Arc<dyn Operator>> {
        if row < self.rows && col < self.cols { self.ops.get(row * self.cols + col) } else { None }
    }

    /// Upper bound `√(Σᵢⱼ ‖Aᵢⱼ‖²)` on the block norm.
    pub fn norm_bound(&self, opts: &PowerMethodOptions) -> OptResult<f64> {
        let mut total = 0.0;
        for op in &self.ops {
            let n = op.norm(opts)?.value;
            total += n * n;
        }
        Ok(total.sqrt())
    }

    fn split<'a>(container: &'a Container, count: usize) -> OptResult<Vec<&'a Container>> {
        if count == 1 {
            Ok(vec![container])
        } else {
            Ok(container.as_block()?.parts().iter().collect())
        }
    }

    fn assemble(parts: Vec<Container>) -> OptResult<Container> {
        if parts.len() == 1 {
            let mut parts = parts;
            parts.pop().ok_or(OptError::EmptyComposition { what: "BlockOperator" })
        } else {
            Ok(Container::Block(BlockContainer::new(parts)?))
        }
    }
}

impl Operator for BlockOperator {
    fn name(&self) -> &str {
        "BlockOperator"
    }

    fn domain(&self) -> &Space {
        &self.domain
    }

    fn range(&self) -> &Space {
        &self.range
    }

    fn capabilities(&self) -> Capabilities {
        self.ops
            .iter()
            .fold(Capabilities::of(&[Capability::Direct, Capability::Adjoint]), |acc, op| {
                acc.intersection(op.capabilities())
            })
    }

    fn direct(&self, x: &Container) -> OptResult<Container> {
        check_domain(self, x)?;
        let xs = Self::split(x, self.cols)?;
        let mut out = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let mut acc = self.ops[i * self.cols].direct(xs[0])?;
            for j in 1..self.cols {
                acc.add_assign(&self.ops[i * self.cols + j].direct(xs[j])?)?;
            }
            out.push(acc);
        }
        Self::assemble(out)
    }

    fn adjoint(&self, y: &Container) -> OptResult<Container> {
        if !self.is_linear() {
            return Err(OptError::unsupported(self.name(), Capability::Adjoint));
        }
        check_range(self, y)?;
        let ys = Self::split(y, self.rows)?;
        let mut out = Vec::with_capacity(self.cols);
        for j in 0..self.cols {
            let mut acc = self.ops[j].adjoint(ys[0])?;
            for i in 1..self.rows {
                acc.add_assign(&self.ops[i * self.cols + j].adjoint(ys[i])?)?;
            }
            out.push(acc);
        }
        Self::assemble(out)
    }
}
