//! data::reductions — numerically stable scalar reductions over arrays.
//!
//! Purpose
//! -------
//! Implement the full-array reductions (`sum`, `dot`, squared norm, max-abs)
//! used by containers, with a blocked pairwise summation that bounds
//! round-off growth on large volumes.
//!
//! Key behaviors
//! -------------
//! - Below `pairwise_threshold` elements, terms are accumulated left to
//!   right. Above it, the index range is halved recursively and partial sums
//!   are combined pairwise, so the error grows like `O(log n)` instead of
//!   `O(n)`.
//! - Reductions ignore axis semantics: they run over the array in logical
//!   (row-major) order.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs to [`dot`] have the same shape; containers check compatibility
//!   before calling in.
//! - `pairwise_threshold >= 1`, enforced by [`ReductionOptions::new`].
use std::borrow::Cow;

use ndarray::ArrayD;

use crate::data::errors::{DataError, DataResult};

/// Default block size below which terms are accumulated sequentially.
pub const DEFAULT_PAIRWISE_THRESHOLD: usize = 1024;

/// ReductionOptions — tuning for container reductions.
///
/// Fields
/// ------
/// - `pairwise_threshold`: block length of the sequential base case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionOptions {
    pub pairwise_threshold: usize,
}

impl ReductionOptions {
    /// Validate and build reduction options.
    ///
    /// # Errors
    /// - [`DataError::InvalidThreshold`] if `pairwise_threshold == 0`.
    pub fn new(pairwise_threshold: usize) -> DataResult<Self> {
        if pairwise_threshold == 0 {
            return Err(DataError::InvalidThreshold { value: pairwise_threshold });
        }
        Ok(Self { pairwise_threshold })
    }
}

impl Default for ReductionOptions {
    fn default() -> Self {
        Self { pairwise_threshold: DEFAULT_PAIRWISE_THRESHOLD }
    }
}

/// Sum of all entries.
pub fn sum(array: &ArrayD<f64>, opts: &ReductionOptions) -> f64 {
    let values = logical_slice(array);
    pairwise(0, values.len(), opts.pairwise_threshold, &|i| values[i])
}

/// Inner product `Σ aᵢ bᵢ` over arrays of equal shape.
pub fn dot(a: &ArrayD<f64>, b: &ArrayD<f64>, opts: &ReductionOptions) -> f64 {
    let (a, b) = (logical_slice(a), logical_slice(b));
    let n = a.len().min(b.len());
    pairwise(0, n, opts.pairwise_threshold, &|i| a[i] * b[i])
}

/// Squared Euclidean norm `Σ aᵢ²`.
pub fn squared_norm(array: &ArrayD<f64>, opts: &ReductionOptions) -> f64 {
    let values = logical_slice(array);
    pairwise(0, values.len(), opts.pairwise_threshold, &|i| values[i] * values[i])
}

/// Largest absolute entry; `0.0` for an empty array, NaN if any entry is NaN.
pub fn max_abs(array: &ArrayD<f64>) -> f64 {
    array.iter().fold(0.0_f64, |acc, &v| {
        if v.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(v.abs()) }
    })
}

fn logical_slice(array: &ArrayD<f64>) -> Cow<'_, [f64]> {
    match array.as_slice() {
        Some(values) => Cow::Borrowed(values),
        None => Cow::Owned(array.iter().copied().collect()),
    }
}

fn pairwise<F: Fn(usize) -> f64>(start: usize, end: usize, block: usize, term: &F) -> f64 {
    let n = end - start;
    if n <= block {
        let mut acc = 0.0;
        for i in start..end {
            acc += term(i);
        }
        acc
    } else {
        let mid = start + n / 2;
        pairwise(start, mid, block, term) + pairwise(mid, end, block, term)
    }
}
