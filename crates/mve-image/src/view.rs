//! Zero-copy buffer views.
//!
//! A [`BufferView`] describes an image buffer the way an array library sees
//! it: a dtype, a shape, and a pointer to the first element. It owns an
//! [`ImageHandle`], so the buffer outlives every view of it no matter which
//! other handles are dropped.
//!
//! # Shape
//!
//! - `(height, width)` when the image has one channel
//! - `(height, width, channels)` otherwise
//!
//! # Access
//!
//! Rust code reads and writes through [`read`](BufferView::read) and
//! [`write`](BufferView::write), which hand the closure an `ndarray` view and
//! are checked against the buffer's [`RefCell`](std::cell::RefCell). Host
//! bindings use [`as_mut_ptr`](BufferView::as_mut_ptr) together with
//! [`shape`](BufferView::shape) to build their own array object, keeping the
//! view alive as that object's base.
//!
//! ```rust
//! use mve_image::ndarray::{ArrayViewD, ArrayViewMutD};
//! use mve_image::{ImageElementType, ImageHandle};
//!
//! let view = {
//!     let img = ImageHandle::create(4, 3, 1, ImageElementType::UInt16).unwrap();
//!     img.view()
//! }; // `img` dropped here; the view still owns the buffer
//!
//! view.write(|mut a: ArrayViewMutD<'_, u16>| a[[2, 3]] = 500).unwrap();
//! assert_eq!(view.read(|a: ArrayViewD<'_, u16>| a[[2, 3]]).unwrap(), 500);
//! ```

use crate::bridge::element_type_to_external_tag;
use crate::{DType, Element, Error, ImageElementType, ImageHandle, Result};
use ndarray::{ArrayViewD, ArrayViewMutD, IxDyn};
use tracing::trace;

/// Shape/dtype-described alias of an image buffer.
///
/// Cloning a view clones its handle; every clone keeps the buffer alive.
#[derive(Clone)]
pub struct BufferView {
    // Captured together with `ptr`; the pointer is valid while this lives.
    owner: ImageHandle,
    shape: Vec<usize>,
    dtype: DType,
    ptr: *mut u8,
}

impl BufferView {
    pub(crate) fn new(owner: ImageHandle) -> Self {
        let info = owner.info();
        let shape = if info.channels == 1 {
            vec![info.height, info.width]
        } else {
            vec![info.height, info.width, info.channels]
        };
        let ptr = owner.data_ptr();
        trace!(?shape, ty = %info.element_type, "creating buffer view");
        Self {
            dtype: element_type_to_external_tag(info.element_type),
            shape,
            ptr,
            owner,
        }
    }

    /// Array shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions (2 or 3).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Array dtype of the elements.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Image element type.
    #[inline]
    pub fn element_type(&self) -> ImageElementType {
        self.owner.element_type()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Always `false`; images have at least one element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the aliased memory in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.owner.byte_size()
    }

    /// Start of the aliased memory.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Start of the aliased memory, for host arrays that write through it.
    ///
    /// Valid for as long as `self` (or any handle to the same buffer) lives.
    /// Writes through it bypass the buffer's borrow tracking.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Handle this view keeps alive.
    #[inline]
    pub fn owner(&self) -> &ImageHandle {
        &self.owner
    }

    fn check_type<T: Element>(&self) -> Result<()> {
        let expected = self.element_type();
        if T::TYPE == expected {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected,
                got: T::TYPE,
            })
        }
    }

    fn shape_error(&self, err: ndarray::ShapeError) -> Error {
        let info = self.owner.info();
        Error::invalid_shape(info.width, info.height, info.channels, err.to_string())
    }

    /// Runs `f` with a read-only array view of the buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::TypeMismatch`] unless `T` is the element type
    /// - [`Error::BufferBusy`] if the buffer is mutably borrowed
    pub fn read<T: Element, R>(&self, f: impl FnOnce(ArrayViewD<'_, T>) -> R) -> Result<R> {
        self.check_type::<T>()?;
        let image = self.owner.borrow()?;
        let slice = image.as_slice::<T>().ok_or(Error::TypeMismatch {
            expected: image.element_type(),
            got: T::TYPE,
        })?;
        let array = ArrayViewD::from_shape(IxDyn(&self.shape), slice)
            .map_err(|e| self.shape_error(e))?;
        Ok(f(array))
    }

    /// Runs `f` with a mutable array view of the buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::TypeMismatch`] unless `T` is the element type
    /// - [`Error::BufferBusy`] if the buffer is borrowed
    pub fn write<T: Element, R>(&self, f: impl FnOnce(ArrayViewMutD<'_, T>) -> R) -> Result<R> {
        self.check_type::<T>()?;
        let mut image = self.owner.borrow_mut()?;
        let expected = image.element_type();
        let slice = image.as_slice_mut::<T>().ok_or(Error::TypeMismatch {
            expected,
            got: T::TYPE,
        })?;
        let array = ArrayViewMutD::from_shape(IxDyn(&self.shape), slice)
            .map_err(|e| self.shape_error(e))?;
        Ok(f(array))
    }
}

impl std::fmt::Debug for BufferView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferView")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype)
            .field("ptr", &self.ptr)
            .finish()
    }
}
