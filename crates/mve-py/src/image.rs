//! Image type with numpy interop.

use numpy::ndarray::{ArrayViewMutD, IxDyn};
use numpy::{
    PyArrayDescrMethods, PyArrayDyn, PyArrayMethods, PyUntypedArray, PyUntypedArrayMethods,
};
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;

use mve_image::bridge::external_tag_to_element_type;
use mve_image::{
    checked_dims, ArrayElement, BufferView, DType, Element, Error, ImageElementType, ImageHandle,
};

use crate::{config, to_py_err};

/// A multi-typed image buffer of width x height x channels elements.
///
/// `data` is a numpy view of the buffer (no copy); writes to it change the
/// image. `clone()` makes an independent deep copy.
///
/// # Example
/// ```python
/// img = mve_core.Image(4, 3, 2, mve_core.IMAGE_TYPE_UINT8)
/// img.data.shape   # (3, 4, 2)
/// img.byte_size    # 24
/// ```
#[pyclass(name = "Image", module = "mve_core", unsendable)]
pub struct Image {
    handle: ImageHandle,
}

#[pymethods]
impl Image {
    /// Allocate a zero-filled image.
    ///
    /// `type` is one of the `IMAGE_TYPE_*` constants.
    #[new]
    #[pyo3(signature = (width, height, channels, r#type))]
    fn new(width: i64, height: i64, channels: i64, r#type: i32) -> PyResult<Self> {
        let ty = ImageElementType::from_raw(r#type)
            .filter(|t| t.is_known())
            .ok_or_else(|| to_py_err(Error::InvalidType { raw: r#type }))?;
        let (width, height, channels) = checked_dims(width, height, channels).map_err(to_py_err)?;
        let handle =
            ImageHandle::create_with(width, height, channels, ty, config()).map_err(to_py_err)?;
        Ok(Self { handle })
    }

    /// Width in pixels.
    #[getter]
    fn width(&self) -> usize {
        self.handle.width()
    }

    /// Height in pixels.
    #[getter]
    fn height(&self) -> usize {
        self.handle.height()
    }

    /// Channels per pixel.
    #[getter]
    fn channels(&self) -> usize {
        self.handle.channels()
    }

    /// Size in bytes.
    #[getter]
    fn byte_size(&self) -> usize {
        self.handle.byte_size()
    }

    /// Element type as an `IMAGE_TYPE_*` value.
    #[getter]
    fn image_type(&self) -> i32 {
        self.handle.element_type().raw()
    }

    /// Numpy array aliasing the image buffer.
    ///
    /// Shape is (height, width) for one channel, else (height, width, channels).
    /// The array keeps the buffer alive.
    #[getter]
    fn data<'py>(slf: &Bound<'py, Self>) -> PyResult<Bound<'py, PyAny>> {
        let view = slf.borrow().handle.view();
        numpy_view(slf.py(), view)
    }

    /// Independent deep copy.
    #[pyo3(name = "clone")]
    fn py_clone(&self) -> PyResult<Self> {
        let handle = self.handle.duplicate_with(config()).map_err(to_py_err)?;
        Ok(Self { handle })
    }

    fn __repr__(&self) -> String {
        self.handle.describe()
    }
}

impl Image {
    /// Wrap an existing handle; shares its buffer.
    pub fn from_handle(handle: ImageHandle) -> Self {
        Self { handle }
    }

    /// Handle to the underlying buffer.
    pub fn handle(&self) -> &ImageHandle {
        &self.handle
    }
}

/// Handle of `obj` if it is an `Image`.
pub fn extract_handle(obj: &Bound<'_, PyAny>) -> Option<ImageHandle> {
    obj.downcast::<Image>()
        .ok()
        .and_then(|img| img.try_borrow().ok().map(|img| img.handle.clone()))
}

/// Base object of arrays returned by `Image.data`.
///
/// Owns the buffer view, and through it the image buffer.
#[pyclass(module = "mve_core", unsendable)]
pub struct ImageBuffer {
    view: BufferView,
}

#[pymethods]
impl ImageBuffer {
    fn __repr__(&self) -> String {
        format!("ImageBuffer({})", self.view.owner().describe())
    }
}

fn numpy_view(py: Python<'_>, view: BufferView) -> PyResult<Bound<'_, PyAny>> {
    match view.element_type() {
        ImageElementType::UInt8 => typed_numpy_view::<u8>(py, view),
        ImageElementType::UInt16 => typed_numpy_view::<u16>(py, view),
        ImageElementType::UInt32 => typed_numpy_view::<u32>(py, view),
        ImageElementType::UInt64 => typed_numpy_view::<u64>(py, view),
        ImageElementType::Int8 => typed_numpy_view::<i8>(py, view),
        ImageElementType::Int16 => typed_numpy_view::<i16>(py, view),
        ImageElementType::Int32 => typed_numpy_view::<i32>(py, view),
        ImageElementType::Int64 => typed_numpy_view::<i64>(py, view),
        ImageElementType::Float32 => typed_numpy_view::<f32>(py, view),
        ImageElementType::Float64 => typed_numpy_view::<f64>(py, view),
        ImageElementType::Unknown => Err(to_py_err(Error::InvalidType { raw: 0 })),
    }
}

fn typed_numpy_view<T>(py: Python<'_>, view: BufferView) -> PyResult<Bound<'_, PyAny>>
where
    T: Element + numpy::Element,
{
    let shape = IxDyn(view.shape());
    let ptr = view.as_mut_ptr().cast::<T>();
    // The view moves into the base object before numpy sees the pointer.
    let base = Bound::new(py, ImageBuffer { view })?;

    // SAFETY: `ptr` addresses `shape.size()` contiguous, initialized `T`s
    // owned by the buffer that `base` keeps alive; numpy holds `base` for the
    // lifetime of the array.
    let array = unsafe { ArrayViewMutD::from_shape_ptr(shape, ptr) };
    let py_array = unsafe { PyArrayDyn::<T>::borrow_from_array(&array, base.into_any()) };
    Ok(py_array.into_any())
}

/// Create an Image by copying a 2D or 3D numpy array.
///
/// Dimension 0 is height, 1 is width, 2 (if present) is channels. The
/// element type comes from the dtype's kind and size; non-native byte order
/// is converted on the way in.
///
/// # Example
/// ```python
/// img = mve_core.image_from_array(np.zeros((480, 640, 3), dtype=np.uint8))
/// img = mve_core.image_from_array(np.zeros((4, 4), dtype=">u2"))
/// ```
#[pyfunction]
#[pyo3(signature = (array))]
pub fn image_from_array(array: &Bound<'_, PyAny>) -> PyResult<Image> {
    let array = array
        .downcast::<PyUntypedArray>()
        .map_err(|_| PyTypeError::new_err("Argument should be a Numpy Array"))?;

    let ndim = array.ndim();
    if ndim != 2 && ndim != 3 {
        return Err(to_py_err(Error::Shape { ndim }));
    }

    let descr = array.dtype();
    let tag = DType::from_kind(descr.kind(), descr.itemsize());
    let ty = external_tag_to_element_type(tag);
    if !ty.is_known() {
        return Err(to_py_err(Error::UnsupportedDtype { dtype: tag }));
    }

    let native = if descr.is_native_byteorder() == Some(false) {
        let native_descr = descr.call_method1("newbyteorder", ("=",))?;
        array.call_method1("astype", (native_descr,))?
    } else {
        array.clone().into_any()
    };

    match ty {
        ImageElementType::UInt8 => import_typed::<u8>(&native),
        ImageElementType::UInt16 => import_typed::<u16>(&native),
        ImageElementType::UInt32 => import_typed::<u32>(&native),
        ImageElementType::UInt64 => import_typed::<u64>(&native),
        ImageElementType::Int8 => import_typed::<i8>(&native),
        ImageElementType::Int16 => import_typed::<i16>(&native),
        ImageElementType::Int32 => import_typed::<i32>(&native),
        ImageElementType::Int64 => import_typed::<i64>(&native),
        ImageElementType::Float32 => import_typed::<f32>(&native),
        ImageElementType::Float64 => import_typed::<f64>(&native),
        ImageElementType::Unknown => Err(to_py_err(Error::UnsupportedDtype { dtype: tag })),
    }
}

fn import_typed<T>(array: &Bound<'_, PyAny>) -> PyResult<Image>
where
    T: ArrayElement + numpy::Element,
{
    let typed = array.downcast::<PyArrayDyn<T>>().map_err(|_| {
        to_py_err(Error::copy(format!(
            "array of dtype {} cannot be read as {}",
            array.getattr("dtype").map(|d| d.to_string()).unwrap_or_default(),
            T::DTYPE
        )))
    })?;
    let readonly = typed.try_readonly()?;
    let handle = ImageHandle::from_array_with(&readonly.as_array(), config()).map_err(to_py_err)?;
    Ok(Image::from_handle(handle))
}
