//! utils — conversions between raw arrays and containers, plus the numpy
//! input helper used by the Python bindings.
use std::sync::Arc;

use ndarray::ArrayD;

use crate::{
    data::{
        container::{Container, DataContainer},
        geometry::Geometry,
    },
    optimisation::errors::OptResult,
};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArrayMethods, PyReadonlyArrayDyn};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

/// Wrap `array` in a dense container with default labels and unit spacing.
///
/// # Errors
/// - `Data(InvalidGeometry)` for an array with a zero-length axis or no
///   axes.
pub fn container_from_array(array: ArrayD<f64>) -> OptResult<Container> {
    let geometry = Arc::new(Geometry::new(array.shape())?);
    Ok(Container::from(DataContainer::new(array, geometry)?))
}

/// Copy the values of a dense container out as a plain array.
///
/// # Errors
/// - `Data(NotDense)` for a block container.
pub fn dense_array(container: &Container) -> OptResult<ArrayD<f64>> {
    Ok(container.as_dense()?.array().clone())
}

/// Accept a numpy array of any rank, an object with `to_numpy()`, or a flat
/// sequence of floats.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_array_dyn<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArrayDyn<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArrayDyn<f64>>() {
        return Ok(arr_ro);
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(arr_ro) = obj.extract::<PyReadonlyArrayDyn<f64>>() {
            return Ok(arr_ro);
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a float64 numpy.ndarray, an object with to_numpy(), or a sequence of float64",
        )
    })?;
    Ok(ArrayD::from_shape_vec(ndarray::IxDyn(&[vec.len()]), vec)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?
        .into_pyarray(py)
        .readonly())
}
