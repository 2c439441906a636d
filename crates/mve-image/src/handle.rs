//! Reference-counted image handles.
//!
//! An [`ImageHandle`] shares ownership of exactly one [`NativeImage`].
//! Cloning the handle is cheap and aliases the same buffer; the buffer is
//! freed when the last handle is dropped. Views created with
//! [`ImageHandle::view`] hold a handle of their own, so they keep the buffer
//! alive too.
//!
//! # Sharing vs. copying
//!
//! ```rust
//! use mve_image::{ImageElementType, ImageHandle};
//!
//! let a = ImageHandle::create(4, 3, 2, ImageElementType::UInt8).unwrap();
//!
//! // Shares the buffer (refcount + 1)
//! let shared = a.clone();
//! assert!(a.ptr_eq(&shared));
//!
//! // Independent deep copy
//! let copy = a.duplicate().unwrap();
//! assert!(!a.ptr_eq(&copy));
//! assert_eq!(copy.describe(), "Image(4 x 3 x uint8[2])");
//! ```
//!
//! # Threading
//!
//! Handles use [`Rc`] and [`RefCell`] and are therefore `!Send`: the whole
//! layer is single-threaded.

use crate::{
    BufferView, Element, Error, ImageElementType, NativeImage, Result, StoreConfig,
};
use ndarray::{ArrayD, ArrayViewD};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Immutable buffer metadata, cached so accessors never borrow the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Interleaved channels per pixel.
    pub channels: usize,
    /// Element type.
    pub element_type: ImageElementType,
}

impl ImageInfo {
    /// Number of scalar elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height * self.channels
    }

    /// Always `false`; images have at least one element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage size in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.len() * self.element_type.size()
    }
}

struct Shared {
    info: ImageInfo,
    // Start of storage, captured once from exclusive access. The buffer is
    // never resized, so this stays valid while `image` lives.
    data: *mut u8,
    image: RefCell<NativeImage>,
}

/// Shared-ownership handle to one image buffer.
///
/// `Clone` increments the reference count. Use [`duplicate`](Self::duplicate)
/// for a deep copy.
#[derive(Clone)]
pub struct ImageHandle {
    shared: Rc<Shared>,
}

impl ImageHandle {
    /// Allocates a zero-filled image.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidType`] if `ty` is `Unknown`
    /// - [`Error::InvalidShape`] if any dimension is zero or the size overflows
    /// - [`Error::AllocationFailed`] if memory cannot be reserved
    pub fn create(
        width: usize,
        height: usize,
        channels: usize,
        ty: ImageElementType,
    ) -> Result<Self> {
        Self::create_with(width, height, channels, ty, &StoreConfig::default())
    }

    /// Allocates a zero-filled image under `config`'s limits.
    pub fn create_with(
        width: usize,
        height: usize,
        channels: usize,
        ty: ImageElementType,
        config: &StoreConfig,
    ) -> Result<Self> {
        NativeImage::allocate(width, height, channels, ty, config).map(Self::from_native)
    }

    /// Takes ownership of an existing buffer.
    pub fn from_native(mut image: NativeImage) -> Self {
        let info = ImageInfo {
            width: image.width(),
            height: image.height(),
            channels: image.channels(),
            element_type: image.element_type(),
        };
        let data = image.as_mut_ptr();
        Self {
            shared: Rc::new(Shared {
                info,
                data,
                image: RefCell::new(image),
            }),
        }
    }

    /// Buffer metadata.
    #[inline]
    pub fn info(&self) -> ImageInfo {
        self.shared.info
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.shared.info.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.shared.info.height
    }

    /// Interleaved channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.shared.info.channels
    }

    /// Storage size in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.shared.info.byte_size()
    }

    /// Element type.
    #[inline]
    pub fn element_type(&self) -> ImageElementType {
        self.shared.info.element_type
    }

    /// Name of the element type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.element_type().name()
    }

    /// Zero-copy view of the whole buffer.
    ///
    /// The view keeps this handle's buffer alive until it is dropped.
    pub fn view(&self) -> BufferView {
        BufferView::new(self.clone())
    }

    /// Deep copy into a new, unshared buffer.
    pub fn duplicate(&self) -> Result<Self> {
        self.duplicate_with(&StoreConfig::default())
    }

    /// Deep copy under `config`'s limits.
    pub fn duplicate_with(&self, config: &StoreConfig) -> Result<Self> {
        let image = self.borrow()?.duplicate(config)?;
        Ok(Self::from_native(image))
    }

    /// Human-readable summary: `Image(<w> x <h> x <type>[<channels>])`.
    pub fn describe(&self) -> String {
        format!(
            "Image({} x {} x {}[{}])",
            self.width(),
            self.height(),
            self.type_name(),
            self.channels()
        )
    }

    /// Owned copy of the contents in view shape.
    ///
    /// Fails with [`Error::TypeMismatch`] unless `T` is the element type.
    pub fn to_array<T: Element>(&self) -> Result<ArrayD<T>> {
        self.view().read(|array: ArrayViewD<'_, T>| array.to_owned())
    }

    /// Whether both handles share one buffer.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Number of live handles (views included) sharing the buffer.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.shared)
    }

    /// Shared access to the buffer.
    pub fn borrow(&self) -> Result<Ref<'_, NativeImage>> {
        self.shared.image.try_borrow().map_err(|_| Error::BufferBusy)
    }

    /// Exclusive access to the elements.
    ///
    /// Only the element values can change; the buffer itself, its dimensions
    /// and its element type stay fixed for the life of the handle.
    ///
    /// # Errors
    ///
    /// - [`Error::TypeMismatch`] unless `T` is the element type
    /// - [`Error::BufferBusy`] if the buffer is borrowed
    pub fn elements_mut<T: Element>(&self) -> Result<RefMut<'_, [T]>> {
        let expected = self.element_type();
        if T::TYPE != expected {
            return Err(Error::TypeMismatch {
                expected,
                got: T::TYPE,
            });
        }
        RefMut::filter_map(self.borrow_mut()?, |image| image.as_slice_mut::<T>()).map_err(|_| {
            Error::TypeMismatch {
                expected,
                got: T::TYPE,
            }
        })
    }

    // Never exposed: replacing the whole buffer would invalidate `data`.
    pub(crate) fn borrow_mut(&self) -> Result<RefMut<'_, NativeImage>> {
        self.shared.image.try_borrow_mut().map_err(|_| Error::BufferBusy)
    }

    #[inline]
    pub(crate) fn data_ptr(&self) -> *mut u8 {
        self.shared.data
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .field("element_type", &self.element_type())
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_metadata() {
        let img = ImageHandle::create(4, 3, 2, ImageElementType::UInt8).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 3);
        assert_eq!(img.channels(), 2);
        assert_eq!(img.byte_size(), 24);
        assert_eq!(img.element_type(), ImageElementType::UInt8);
        assert_eq!(img.borrow().unwrap().byte_size(), 24);
    }

    #[test]
    fn test_create_unknown() {
        let err = ImageHandle::create(4, 3, 2, ImageElementType::Unknown).unwrap_err();
        assert!(matches!(err, Error::InvalidType { raw: 0 }));
    }

    #[test]
    fn test_clone_shares() {
        let a = ImageHandle::create(2, 2, 1, ImageElementType::Int32).unwrap();
        assert_eq!(a.ref_count(), 1);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.ref_count(), 2);
        b.elements_mut::<i32>().unwrap()[0] = 42;
        assert_eq!(a.borrow().unwrap().as_slice::<i32>().unwrap()[0], 42);
        drop(b);
        assert_eq!(a.ref_count(), 1);
    }

    #[test]
    fn test_duplicate() {
        let a = ImageHandle::create(3, 2, 1, ImageElementType::Float32).unwrap();
        a.elements_mut::<f32>().unwrap()[5] = 0.25;
        let b = a.duplicate().unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(b.ref_count(), 1);
        assert_eq!(a.info(), b.info());
        assert_eq!(*a.borrow().unwrap(), *b.borrow().unwrap());
    }

    #[test]
    fn test_duplicate_while_borrowed() {
        let a = ImageHandle::create(1, 1, 1, ImageElementType::UInt8).unwrap();
        let _guard = a.elements_mut::<u8>().unwrap();
        assert!(matches!(a.duplicate(), Err(Error::BufferBusy)));
    }

    fn assert_consistent(img: &ImageHandle, view: &BufferView) {
        let image = img.borrow().unwrap();
        assert_eq!(view.as_ptr(), image.as_ptr());
        assert_eq!(img.width(), image.width());
        assert_eq!(img.height(), image.height());
        assert_eq!(img.channels(), image.channels());
        assert_eq!(img.element_type(), image.element_type());
        assert_eq!(img.byte_size(), image.byte_size());
    }

    #[test]
    fn test_mutation_keeps_buffer_in_place() {
        let img = ImageHandle::create(2, 2, 1, ImageElementType::UInt8).unwrap();
        let view = img.view();
        assert_consistent(&img, &view);

        img.elements_mut::<u8>().unwrap().fill(7);
        assert_consistent(&img, &view);

        view.write(|mut a: ndarray::ArrayViewMutD<'_, u8>| a[[1, 1]] = 9).unwrap();
        assert_consistent(&img, &view);

        img.clone().elements_mut::<u8>().unwrap()[0] = 1;
        assert_consistent(&img, &view);

        assert_eq!(img.borrow().unwrap().as_slice::<u8>().unwrap(), &[1, 7, 7, 9]);
    }

    #[test]
    fn test_elements_mut_checks() {
        let img = ImageHandle::create(2, 2, 1, ImageElementType::UInt16).unwrap();
        assert!(matches!(
            img.elements_mut::<f64>(),
            Err(Error::TypeMismatch {
                expected: ImageElementType::UInt16,
                got: ImageElementType::Float64
            })
        ));
        let _read = img.borrow().unwrap();
        assert!(matches!(img.elements_mut::<u16>(), Err(Error::BufferBusy)));
    }

    #[test]
    fn test_describe() {
        let img = ImageHandle::create(4, 3, 2, ImageElementType::UInt8).unwrap();
        assert_eq!(img.describe(), "Image(4 x 3 x uint8[2])");
        let img = ImageHandle::create(640, 480, 1, ImageElementType::Int16).unwrap();
        assert_eq!(img.to_string(), "Image(640 x 480 x sint16[1])");
    }

    #[test]
    fn test_from_native() {
        let native = NativeImage::from_vec(2, 1, 1, vec![7u16, 9]).unwrap();
        let img = ImageHandle::from_native(native);
        assert_eq!(img.type_name(), "uint16");
        assert_eq!(img.to_array::<u16>().unwrap().into_raw_vec_and_offset().0, vec![7, 9]);
    }

    #[test]
    fn test_to_array_wrong_type() {
        let img = ImageHandle::create(2, 2, 1, ImageElementType::UInt8).unwrap();
        let err = img.to_array::<f32>().unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: ImageElementType::UInt8,
                got: ImageElementType::Float32
            }
        ));
    }
}
