//! rust_cil — operator algebra, proximal functions, and iterative solvers
//! for tomographic reconstruction, with optional Python bindings.
//!
//! Purpose
//! -------
//! Provide the numerical core of a reconstruction toolkit: geometry-tagged
//! containers, linear operators with adjoints, convex functions with
//! proximal maps and conjugates, and the iterative algorithms that combine
//! them. Scanner-specific projectors plug in by implementing
//! [`operators::traits::Operator`].
//!
//! Key behaviors
//! -------------
//! - [`data`]: `Geometry`, `Space`, dense and block containers, and
//!   geometry-checked arithmetic.
//! - [`operators`]: the `Operator` trait, identity/diagonal/matrix/finite
//!   difference operators, composition, sums, scaling, block operators, and
//!   power-method norm estimates.
//! - [`functions`]: the `Function` trait with capability flags, norms, box
//!   indicators, least squares, total variation, and composition rules.
//! - [`algorithms`]: the `Algorithm` state machine with GD, ISTA, FISTA,
//!   PDHG, CGLS, FGP, and an argmin-backed L-BFGS bridge.
//! - With feature `python-bindings`, the `_rust_cil` extension module
//!   exposes `tv_denoise` and `least_squares_gd`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every binary operation checks geometry compatibility and fails with
//!   `GeometryMismatch` rather than broadcasting.
//! - Operators and functions are stateless `Send + Sync` values; solvers
//!   own their iterates and are `Send`.
//! - Missing capabilities fail with `UnsupportedOperation`, never a panic.
//!
//! Conventions
//! -----------
//! - Errors: `DataError` at the container level, `OptError` everywhere
//!   above it; `OptError` converts to a Python `ValueError` at the FFI
//!   boundary.
//! - Logging is opt-in through feature `obs_slog` and never happens inside
//!   numerical kernels.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end reconstruction
//!   scenarios live in `tests/`.
pub mod algorithms;
pub mod data;
pub mod functions;
pub mod operators;
pub mod optimisation;
pub mod utils;

/// One-line import of the public surface.
pub mod prelude {
    pub use crate::algorithms::prelude::*;
    pub use crate::data::prelude::*;
    pub use crate::functions::prelude::*;
    pub use crate::operators::prelude::*;
    pub use crate::optimisation::prelude::*;
}

#[cfg(feature = "python-bindings")]
use std::sync::Arc;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArrayDyn, PyReadonlyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    algorithms::{
        config::{AlgorithmConfig, DEFAULT_TOLERANCE, StoppingCriterion},
        engine::Algorithm,
        gradient_descent::GradientDescent,
        step_size::StepSize,
    },
    functions::{
        least_squares::LeastSquares,
        total_variation::{DEFAULT_TV_MAX_ITER, DEFAULT_TV_TOL, TotalVariation, TvOptions},
        traits::Function,
    },
    operators::{basic::MatrixOperator, traits::Operator},
    optimisation::errors::OptError,
    utils::{container_from_array, dense_array, extract_f64_array_dyn},
};

/// tv_denoise — TV proximal map of an image of any rank.
///
/// Solves `argmin_z ½‖z − image‖² + α·TV(z)` (optionally with
/// `lower ≤ z ≤ upper`) with the fast gradient projection solver.
///
/// Errors
/// ------
/// - `ValueError` for a negative or non-finite `alpha`, invalid inner
///   options, crossed bounds, or an empty image. `alpha = 0` is accepted
///   and returns the image clipped to the bounds.
/// - `TypeError` if `image` is not convertible to float64.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (
    image, alpha, max_iter = DEFAULT_TV_MAX_ITER, tolerance = DEFAULT_TV_TOL,
    isotropic = true, lower = None, upper = None
))]
#[allow(clippy::too_many_arguments)]
pub fn tv_denoise<'py>(
    py: Python<'py>, image: &Bound<'py, PyAny>, alpha: f64, max_iter: usize, tolerance: f64,
    isotropic: bool, lower: Option<f64>, upper: Option<f64>,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let arr = extract_f64_array_dyn(py, image)?;
    let x = container_from_array(arr.as_array().to_owned())?;

    let mut tv = TotalVariation::new(x.space(), alpha)?
        .with_options(TvOptions::new(max_iter, tolerance)?);
    if !isotropic {
        tv = tv.anisotropic();
    }
    if lower.is_some() || upper.is_some() {
        tv = tv.with_bounds(
            lower.unwrap_or(f64::NEG_INFINITY),
            upper.unwrap_or(f64::INFINITY),
        )?;
    }
    let z = tv.proximal(&x, 1.0)?;
    Ok(dense_array(&z)?.into_pyarray(py))
}

/// least_squares_gd — gradient descent on `½‖Ax − b‖²`.
///
/// Uses `α = 1/‖A‖²` unless `step` is given and stops on a relative
/// objective change of `1e-8` or after `max_iter` iterations.
///
/// Returns
/// -------
/// `(x, objective, iterations, state)` with `state` one of `"Converged"`,
/// `"MaxIterationsReached"`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (matrix, data, max_iter = 100, step = None))]
pub fn least_squares_gd<'py>(
    py: Python<'py>, matrix: PyReadonlyArray2<'py, f64>, data: &Bound<'py, PyAny>,
    max_iter: usize, step: Option<f64>,
) -> PyResult<(Bound<'py, PyArray1<f64>>, f64, usize, String)> {
    let operator = MatrixOperator::new(matrix.as_array().to_owned())?;
    let raw = extract_f64_array_dyn(py, data)?;
    let flat: Array1<f64> = raw.as_array().iter().copied().collect();
    let b = operator.range().unflatten(&flat).map_err(OptError::from)?;
    let x0 = operator.domain().allocate(0.0);

    let f: Arc<dyn Function> = Arc::new(LeastSquares::new(Arc::new(operator), b)?);
    let rule = match step {
        Some(alpha) => StepSize::Fixed(alpha),
        None => StepSize::Lipschitz,
    };
    let solver = GradientDescent::new(f, x0, rule)?;
    let config = AlgorithmConfig::new(
        max_iter,
        DEFAULT_TOLERANCE,
        StoppingCriterion::RelativeObjectiveChange,
        1,
    )?;
    let outcome = Algorithm::new(solver, config)?.run(None)?;
    Ok((
        outcome.solution.to_flat().into_pyarray(py),
        outcome.objective,
        outcome.iterations,
        format!("{:?}", outcome.state),
    ))
}

/// `_rust_cil` — Python extension module.
///
/// Registers the `reconstruction` submodule and makes it importable as
/// `rust_cil.reconstruction`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_cil(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    let reconstruction_mod = PyModule::new(py, "reconstruction")?;
    reconstruction_mod.add_function(wrap_pyfunction!(tv_denoise, &reconstruction_mod)?)?;
    reconstruction_mod.add_function(wrap_pyfunction!(least_squares_gd, &reconstruction_mod)?)?;
    m.add_submodule(&reconstruction_mod)?;

    // Manually add the submodule into sys.modules to allow for dot notation.
    py.import("sys")?
        .getattr("modules")?
        .set_item("rust_cil.reconstruction", reconstruction_mod)?;
    Ok(())
}
