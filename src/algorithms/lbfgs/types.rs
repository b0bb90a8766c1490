//! algorithms::lbfgs::types — flat numeric aliases and solver wiring.
//!
//! The L-BFGS bridge runs argmin on the flattened container: parameters and
//! gradients are `Array1<f64>` in the row-major order of
//! `Container::to_flat` (parts concatenated for block containers). Keeping
//! the aliases here leaves the rest of the bridge free of argmin generics.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Flattened iterate.
pub type Theta = Array1<f64>;

/// Flattened gradient, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters reported by argmin (`"cost_count"`, ...).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default L-BFGS iteration cap.
pub const DEFAULT_LBFGS_MAX_ITER: usize = 300;

/// Default gradient-norm tolerance.
pub const DEFAULT_LBFGS_TOL_GRAD: f64 = 1e-8;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS with the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS with the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
