//! Importing images from n-dimensional arrays.
//!
//! [`ImageHandle::from_array`] copies a rank-2 `(height, width)` or rank-3
//! `(height, width, channels)` array into a freshly allocated buffer. The
//! caller's array is only read; the new image never aliases it.
//!
//! Elements are copied in logical row-major order, so the source may have
//! any memory layout (strided, transposed, sliced).
//!
//! ```rust
//! use mve_image::ndarray::Array3;
//! use mve_image::{ImageElementType, ImageHandle};
//!
//! let array = Array3::<f32>::from_elem((3, 4, 5), 0.5);
//! let img = ImageHandle::from_array(&array).unwrap();
//! assert_eq!((img.height(), img.width(), img.channels()), (3, 4, 5));
//! assert_eq!(img.element_type(), ImageElementType::Float32);
//! ```

use crate::bridge::external_tag_to_element_type;
use crate::{ArrayElement, Error, ImageHandle, NativeImage, Result, StoreConfig};
use ndarray::{ArrayBase, Data, Dimension};
use tracing::debug;

impl ImageHandle {
    /// Copies an array into a new image.
    ///
    /// # Errors
    ///
    /// - [`Error::Shape`] if the array is not rank 2 or 3
    /// - [`Error::UnsupportedDtype`] if the element type has no image type
    /// - [`Error::InvalidShape`] if an axis is empty
    /// - [`Error::Copy`] if the elements cannot be transferred
    /// - [`Error::AllocationFailed`] if memory cannot be reserved
    pub fn from_array<A, S, D>(array: &ArrayBase<S, D>) -> Result<Self>
    where
        A: ArrayElement,
        S: Data<Elem = A>,
        D: Dimension,
    {
        Self::from_array_with(array, &StoreConfig::default())
    }

    /// Copies an array into a new image under `config`'s limits.
    pub fn from_array_with<A, S, D>(array: &ArrayBase<S, D>, config: &StoreConfig) -> Result<Self>
    where
        A: ArrayElement,
        S: Data<Elem = A>,
        D: Dimension,
    {
        let (height, width, channels) = match *array.shape() {
            [h, w] => (h, w, 1),
            [h, w, c] => (h, w, c),
            _ => return Err(Error::Shape { ndim: array.ndim() }),
        };

        let ty = external_tag_to_element_type(A::DTYPE);
        if !ty.is_known() {
            return Err(Error::UnsupportedDtype { dtype: A::DTYPE });
        }

        // Dropped on any error below, so a half-filled image never escapes.
        let mut image = NativeImage::allocate(width, height, channels, ty, config)?;
        copy_into(&mut image, array)?;

        debug!(width, height, channels, %ty, "imported image from array");
        Ok(Self::from_native(image))
    }
}

fn copy_into<A, S, D>(image: &mut NativeImage, array: &ArrayBase<S, D>) -> Result<()>
where
    A: ArrayElement,
    S: Data<Elem = A>,
    D: Dimension,
{
    let ty = image.element_type();
    let dst = image.as_slice_mut::<A>().ok_or_else(|| {
        Error::copy(format!("{} elements cannot be stored in a {} buffer", A::DTYPE, ty))
    })?;
    if dst.len() != array.len() {
        return Err(Error::copy(format!(
            "buffer holds {} elements, array has {}",
            dst.len(),
            array.len()
        )));
    }
    for (d, s) in dst.iter_mut().zip(array.iter()) {
        *d = *s;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DType, ImageElementType};
    use half::f16;
    use ndarray::{Array, Array1, Array2, Array3, Array4, ArrayViewD, s};
    use num_complex::Complex;

    #[test]
    fn test_rank2_shape() {
        let array = Array2::<u8>::zeros((3, 4));
        let img = ImageHandle::from_array(&array).unwrap();
        assert_eq!(img.height(), 3);
        assert_eq!(img.width(), 4);
        assert_eq!(img.channels(), 1);
        assert_eq!(img.element_type(), ImageElementType::UInt8);
    }

    #[test]
    fn test_rank3_shape() {
        let array = Array3::<i16>::zeros((3, 4, 5));
        let img = ImageHandle::from_array(&array).unwrap();
        assert_eq!(img.channels(), 5);
        assert_eq!(img.byte_size(), 3 * 4 * 5 * 2);
    }

    #[test]
    fn test_bad_rank() {
        let err = ImageHandle::from_array(&Array1::<u8>::zeros(4)).unwrap_err();
        assert!(matches!(err, Error::Shape { ndim: 1 }));
        let err = ImageHandle::from_array(&Array4::<u8>::zeros((1, 2, 3, 4))).unwrap_err();
        assert!(matches!(err, Error::Shape { ndim: 4 }));
    }

    #[test]
    fn test_unsupported_dtypes() {
        let err = ImageHandle::from_array(&Array2::<Complex<f64>>::zeros((2, 2))).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDtype { dtype: DType::Complex128 }));
        let err = ImageHandle::from_array(&Array2::from_elem((2, 2), f16::ONE)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDtype { dtype: DType::Float16 }));
        let err = ImageHandle::from_array(&Array2::from_elem((2, 2), true)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDtype { dtype: DType::Bool }));
    }

    #[test]
    fn test_rank_checked_before_dtype() {
        let err = ImageHandle::from_array(&Array1::<Complex<f32>>::zeros(3)).unwrap_err();
        assert!(matches!(err, Error::Shape { ndim: 1 }));
    }

    #[test]
    fn test_empty_axis() {
        let err = ImageHandle::from_array(&Array2::<f32>::zeros((0, 4))).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_copy_does_not_alias() {
        let mut array = Array::from_shape_vec((2, 3), vec![1u32, 2, 3, 4, 5, 6]).unwrap();
        let img = ImageHandle::from_array(&array).unwrap();
        array[[0, 0]] = 99;
        let first = img.view().read(|a: ArrayViewD<'_, u32>| a[[0, 0]]).unwrap();
        assert_eq!(first, 1);
    }

    #[test]
    fn test_non_contiguous_source() {
        let base = Array::from_shape_fn((4, 6), |(y, x)| (y * 10 + x) as i32);
        let strided = base.slice(s![..;2, 1..;2]);
        let img = ImageHandle::from_array(&strided).unwrap();
        assert_eq!((img.height(), img.width()), (2, 3));
        let copied = img.to_array::<i32>().unwrap();
        assert_eq!(copied, strided.into_dyn());

        let transposed = base.t();
        let img = ImageHandle::from_array(&transposed).unwrap();
        assert_eq!((img.height(), img.width()), (6, 4));
        assert_eq!(img.to_array::<i32>().unwrap(), transposed.into_dyn());
    }

    #[test]
    fn test_limit_applies() {
        let array = Array2::<f64>::zeros((8, 8));
        let err = ImageHandle::from_array_with(&array, &StoreConfig::with_max_bytes(64)).unwrap_err();
        assert!(err.is_allocation_error());
    }
}
