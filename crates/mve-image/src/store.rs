//! Typed pixel storage.
//!
//! [`NativeImage`] is the buffer every [`ImageHandle`](crate::ImageHandle)
//! owns: dimensions plus one contiguous, row-major, channel-interleaved
//! vector of a single scalar type.
//!
//! # Memory Layout
//!
//! ```text
//! Memory: [c0 c1 c2 c0 c1 c2 ...]  <- Row 0
//!         [c0 c1 c2 c0 c1 c2 ...]  <- Row 1
//!         ...
//! ```
//!
//! Element `(y, x, c)` lives at index `(y * width + x) * channels + c`.
//!
//! # Pointer stability
//!
//! Storage is allocated once and never resized, so [`NativeImage::as_ptr`]
//! returns the same address for the whole life of the buffer. Views rely on
//! this.
//!
//! # Dispatch
//!
//! [`PixelData`] has one variant per concrete [`ImageElementType`]. Every
//! operation is a single exhaustive match, so a new element type fails to
//! compile until each operation handles it.

use crate::{Element, Error, ImageElementType, Result, StoreConfig};
use std::any::Any;
use tracing::debug;

/// Element vector of one concrete type.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! dispatch {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            PixelData::U8($v) => $body,
            PixelData::U16($v) => $body,
            PixelData::U32($v) => $body,
            PixelData::U64($v) => $body,
            PixelData::I8($v) => $body,
            PixelData::I16($v) => $body,
            PixelData::I32($v) => $body,
            PixelData::I64($v) => $body,
            PixelData::F32($v) => $body,
            PixelData::F64($v) => $body,
        }
    };
}

/// Zero-filled vector, reporting allocator failure instead of aborting.
fn zeroed<T: Element>(len: usize) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| Error::allocation_failed(len.saturating_mul(size_of::<T>()), e.to_string()))?;
    data.resize(len, T::default());
    Ok(data)
}

fn copied<T: Element>(src: &[T]) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(src.len())
        .map_err(|e| Error::allocation_failed(std::mem::size_of_val(src), e.to_string()))?;
    data.extend_from_slice(src);
    Ok(data)
}

impl PixelData {
    /// Allocates `len` zeroed elements of `ty`.
    ///
    /// Fails with [`Error::InvalidType`] for `Unknown`.
    pub fn allocate(ty: ImageElementType, len: usize) -> Result<Self> {
        Ok(match ty {
            ImageElementType::UInt8 => Self::U8(zeroed(len)?),
            ImageElementType::UInt16 => Self::U16(zeroed(len)?),
            ImageElementType::UInt32 => Self::U32(zeroed(len)?),
            ImageElementType::UInt64 => Self::U64(zeroed(len)?),
            ImageElementType::Int8 => Self::I8(zeroed(len)?),
            ImageElementType::Int16 => Self::I16(zeroed(len)?),
            ImageElementType::Int32 => Self::I32(zeroed(len)?),
            ImageElementType::Int64 => Self::I64(zeroed(len)?),
            ImageElementType::Float32 => Self::F32(zeroed(len)?),
            ImageElementType::Float64 => Self::F64(zeroed(len)?),
            ImageElementType::Unknown => return Err(Error::InvalidType { raw: ty.raw() }),
        })
    }

    /// Element type of the stored scalars.
    pub fn element_type(&self) -> ImageElementType {
        match self {
            Self::U8(_) => ImageElementType::UInt8,
            Self::U16(_) => ImageElementType::UInt16,
            Self::U32(_) => ImageElementType::UInt32,
            Self::U64(_) => ImageElementType::UInt64,
            Self::I8(_) => ImageElementType::Int8,
            Self::I16(_) => ImageElementType::Int16,
            Self::I32(_) => ImageElementType::Int32,
            Self::I64(_) => ImageElementType::Int64,
            Self::F32(_) => ImageElementType::Float32,
            Self::F64(_) => ImageElementType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    /// Whether there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deep copy with fallible allocation.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(match self {
            Self::U8(v) => Self::U8(copied(v)?),
            Self::U16(v) => Self::U16(copied(v)?),
            Self::U32(v) => Self::U32(copied(v)?),
            Self::U64(v) => Self::U64(copied(v)?),
            Self::I8(v) => Self::I8(copied(v)?),
            Self::I16(v) => Self::I16(copied(v)?),
            Self::I32(v) => Self::I32(copied(v)?),
            Self::I64(v) => Self::I64(copied(v)?),
            Self::F32(v) => Self::F32(copied(v)?),
            Self::F64(v) => Self::F64(copied(v)?),
        })
    }

    /// Start of storage.
    pub fn as_ptr(&self) -> *const u8 {
        dispatch!(self, v => v.as_ptr().cast::<u8>())
    }

    /// Mutable start of storage.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        dispatch!(self, v => v.as_mut_ptr().cast::<u8>())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        dispatch!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    /// Typed slice, or `None` if `T` is not the stored scalar.
    pub fn as_slice<T: 'static>(&self) -> Option<&[T]> {
        dispatch!(self, v => (v as &dyn Any).downcast_ref::<Vec<T>>().map(Vec::as_slice))
    }

    /// Mutable typed slice, or `None` if `T` is not the stored scalar.
    pub fn as_slice_mut<T: 'static>(&mut self) -> Option<&mut [T]> {
        dispatch!(self, v => (v as &mut dyn Any).downcast_mut::<Vec<T>>().map(Vec::as_mut_slice))
    }
}

impl<T: Element> From<Vec<T>> for PixelData {
    fn from(data: Vec<T>) -> Self {
        T::wrap(data)
    }
}

/// Validates signed host dimensions and converts them to sizes.
///
/// Negative or zero values fail with [`Error::InvalidShape`].
pub fn checked_dims(width: i64, height: i64, channels: i64) -> Result<(usize, usize, usize)> {
    let conv = |v: i64| usize::try_from(v).ok().filter(|&v| v > 0);
    match (conv(width), conv(height), conv(channels)) {
        (Some(w), Some(h), Some(c)) => Ok((w, h, c)),
        _ => Err(Error::invalid_shape(
            width,
            height,
            channels,
            "dimensions must be positive",
        )),
    }
}

/// Element count and byte size for the given dimensions.
fn buffer_size(
    width: usize,
    height: usize,
    channels: usize,
    ty: ImageElementType,
) -> Result<(usize, usize)> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(Error::invalid_shape(
            width,
            height,
            channels,
            "dimensions must be positive",
        ));
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .and_then(|n| n.checked_mul(ty.size()).map(|bytes| (n, bytes)))
        .filter(|&(_, bytes)| bytes <= isize::MAX as usize)
        .ok_or_else(|| Error::invalid_shape(width, height, channels, "buffer size overflows"))
}

/// Multi-typed image buffer.
#[derive(Debug, PartialEq)]
pub struct NativeImage {
    width: usize,
    height: usize,
    channels: usize,
    data: PixelData,
}

impl NativeImage {
    /// Allocates a zero-filled buffer.
    ///
    /// Checks, in order: element type ([`Error::InvalidType`]), dimensions
    /// ([`Error::InvalidShape`]), configured limit and allocator
    /// ([`Error::AllocationFailed`]). Nothing is allocated on failure.
    pub fn allocate(
        width: usize,
        height: usize,
        channels: usize,
        ty: ImageElementType,
        config: &StoreConfig,
    ) -> Result<Self> {
        if !ty.is_known() {
            return Err(Error::InvalidType { raw: ty.raw() });
        }
        let (len, bytes) = buffer_size(width, height, channels, ty)?;
        if !config.allows(bytes) {
            return Err(Error::allocation_failed(
                bytes,
                format!("exceeds limit of {} bytes", config.max_bytes.unwrap_or_default()),
            ));
        }
        debug!(width, height, channels, %ty, bytes, "allocating image");
        Ok(Self {
            width,
            height,
            channels,
            data: PixelData::allocate(ty, len)?,
        })
    }

    /// Builds a buffer from existing elements.
    ///
    /// `data.len()` must equal `width * height * channels`.
    pub fn from_vec<T: Element>(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self> {
        let (len, _) = buffer_size(width, height, channels, T::TYPE)?;
        if data.len() != len {
            return Err(Error::invalid_shape(
                width,
                height,
                channels,
                format!("expected {} elements, got {}", len, data.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            channels,
            data: data.into(),
        })
    }

    /// Independent deep copy.
    pub fn duplicate(&self, config: &StoreConfig) -> Result<Self> {
        let bytes = self.byte_size();
        if !config.allows(bytes) {
            return Err(Error::allocation_failed(
                bytes,
                format!("exceeds limit of {} bytes", config.max_bytes.unwrap_or_default()),
            ));
        }
        debug!(width = self.width, height = self.height, bytes, "duplicating image");
        Ok(Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: self.data.try_clone()?,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Interleaved channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Element type.
    #[inline]
    pub fn element_type(&self) -> ImageElementType {
        self.data.element_type()
    }

    /// Name of the element type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.element_type().name()
    }

    /// Total storage size in bytes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.data.len() * self.element_type().size()
    }

    /// Underlying element vector.
    #[inline]
    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Start of storage. Valid while `self` is alive.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    /// Mutable start of storage. Valid while `self` is alive.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    /// Storage as bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Typed elements, or `None` if `T` is not the element type.
    #[inline]
    pub fn as_slice<T: 'static>(&self) -> Option<&[T]> {
        self.data.as_slice()
    }

    /// Mutable typed elements, or `None` if `T` is not the element type.
    #[inline]
    pub fn as_slice_mut<T: 'static>(&mut self) -> Option<&mut [T]> {
        self.data.as_slice_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(w: usize, h: usize, c: usize, ty: ImageElementType) -> Result<NativeImage> {
        NativeImage::allocate(w, h, c, ty, &StoreConfig::default())
    }

    #[test]
    fn test_allocate_every_type() {
        for ty in ImageElementType::ALL.into_iter().filter(|t| t.is_known()) {
            let img = alloc(4, 3, 2, ty).unwrap();
            assert_eq!(img.element_type(), ty);
            assert_eq!(img.data().len(), 24);
            assert_eq!(img.byte_size(), 24 * ty.size());
            assert_eq!(img.as_bytes().len(), img.byte_size());
            assert!(img.as_bytes().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_allocate_unknown() {
        let err = alloc(4, 3, 2, ImageElementType::Unknown).unwrap_err();
        assert!(matches!(err, Error::InvalidType { raw: 0 }));
    }

    #[test]
    fn test_allocate_zero_dims() {
        for (w, h, c) in [(0, 3, 1), (4, 0, 1), (4, 3, 0)] {
            let err = alloc(w, h, c, ImageElementType::UInt8).unwrap_err();
            assert!(err.is_shape_error(), "{w}x{h}x{c}");
        }
    }

    #[test]
    fn test_allocate_overflow() {
        let err = alloc(usize::MAX, 2, 1, ImageElementType::UInt8).unwrap_err();
        assert!(err.is_shape_error());
        let err = alloc(usize::MAX / 4, 1, 1, ImageElementType::Float64).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_allocate_over_limit() {
        let cfg = StoreConfig::with_max_bytes(16);
        let err = NativeImage::allocate(4, 4, 1, ImageElementType::UInt16, &cfg).unwrap_err();
        assert!(err.is_allocation_error());
        assert!(NativeImage::allocate(4, 4, 1, ImageElementType::UInt8, &cfg).is_ok());
    }

    #[test]
    fn test_typed_slices() {
        let mut img = alloc(2, 2, 1, ImageElementType::Int16).unwrap();
        assert!(img.as_slice::<u16>().is_none());
        img.as_slice_mut::<i16>().unwrap()[3] = -7;
        assert_eq!(img.as_slice::<i16>().unwrap(), &[0, 0, 0, -7]);
    }

    #[test]
    fn test_from_vec() {
        let img = NativeImage::from_vec(2, 1, 3, vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(img.element_type(), ImageElementType::Float64);
        assert_eq!(img.type_name(), "double");
        assert_eq!(img.byte_size(), 48);

        let err = NativeImage::from_vec(2, 2, 1, vec![0u8; 3]).unwrap_err();
        assert!(err.to_string().contains("expected 4 elements, got 3"));
    }

    #[test]
    fn test_duplicate_is_deep() {
        let mut a = NativeImage::from_vec(3, 1, 1, vec![1u32, 2, 3]).unwrap();
        let b = a.duplicate(&StoreConfig::default()).unwrap();
        assert_ne!(a.as_ptr(), b.as_ptr());
        a.as_slice_mut::<u32>().unwrap()[0] = 9;
        assert_eq!(b.as_slice::<u32>().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_duplicate_over_limit() {
        let a = NativeImage::from_vec(4, 1, 1, vec![0u64; 4]).unwrap();
        let err = a.duplicate(&StoreConfig::with_max_bytes(8)).unwrap_err();
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_checked_dims() {
        assert_eq!(checked_dims(4, 3, 2).unwrap(), (4, 3, 2));
        assert!(checked_dims(-1, 3, 2).unwrap_err().is_shape_error());
        assert!(checked_dims(4, 0, 2).unwrap_err().is_shape_error());
        let err = checked_dims(4, 3, -5).unwrap_err();
        assert!(err.to_string().contains("4x3x-5"));
    }
}
