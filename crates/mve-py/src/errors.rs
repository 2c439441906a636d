//! Mapping of mve-image errors onto Python exceptions.

use mve_image::Error;
use pyo3::exceptions::{PyMemoryError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::PyErr;

/// Converts an [`Error`] into the matching Python exception.
///
/// | error                                             | exception      |
/// |---------------------------------------------------|----------------|
/// | `InvalidType`, `Shape`, `UnsupportedDtype`, `TypeMismatch` | `TypeError`    |
/// | `InvalidShape`, `Copy`                            | `ValueError`   |
/// | `AllocationFailed`                                | `MemoryError`  |
/// | `BufferBusy`                                      | `RuntimeError` |
pub fn to_py_err(err: Error) -> PyErr {
    let msg = err.to_string();
    match err {
        Error::InvalidType { .. } => PyTypeError::new_err("Invalid Image Type"),
        Error::Shape { .. } => {
            PyTypeError::new_err(format!("Argument should be a 2/3 dimensional array ({msg})"))
        }
        Error::UnsupportedDtype { .. } | Error::TypeMismatch { .. } => PyTypeError::new_err(msg),
        Error::InvalidShape { .. } | Error::Copy(_) => PyValueError::new_err(msg),
        Error::AllocationFailed { .. } => PyMemoryError::new_err(msg),
        Error::BufferBusy => PyRuntimeError::new_err(msg),
    }
}
