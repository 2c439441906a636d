//! Python bindings for mve-image.
//!
//! Exposes the `Image` class, the `image_from_array` function and one
//! `IMAGE_TYPE_*` integer constant per element type.
//!
//! # Example
//! ```python
//! import numpy as np
//! import mve_core
//!
//! img = mve_core.Image(640, 480, 3, mve_core.IMAGE_TYPE_UINT8)
//! img.data[:, :, 0] = 255          # writes straight into the image
//!
//! copy = mve_core.image_from_array(np.ones((4, 4), dtype=np.float32))
//! ```

use pyo3::prelude::*;
use std::sync::OnceLock;

use mve_image::{ImageElementType, StoreConfig};

mod errors;
mod image;

pub use errors::to_py_err;
pub use image::{extract_handle, image_from_array, Image, ImageBuffer};

static CONFIG: OnceLock<StoreConfig> = OnceLock::new();

/// Allocation limits, read from the environment on first use.
pub fn config() -> &'static StoreConfig {
    CONFIG.get_or_init(StoreConfig::from_env)
}

/// Name of the module constant for `ty`, e.g. `IMAGE_TYPE_SINT16`.
fn constant_name(ty: ImageElementType) -> String {
    format!("IMAGE_TYPE_{}", ty.name().to_ascii_uppercase())
}

/// mve_core - multi-typed images with zero-copy numpy views
#[pymodule]
fn mve_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let cfg = config();
    tracing::debug!(max_bytes = ?cfg.max_bytes, "loading mve_core");

    m.add_class::<Image>()?;
    m.add_class::<ImageBuffer>()?;
    m.add_function(wrap_pyfunction!(image_from_array, m)?)?;

    for ty in ImageElementType::ALL {
        m.add(constant_name(ty), ty.raw())?;
    }

    Ok(())
}
