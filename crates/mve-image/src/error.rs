//! Error types for mve-image operations.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the single [`Error`] enum below.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of:
//! - Image allocation (element type, dimensions, memory)
//! - Array import (rank, dtype, element transfer)
//! - Typed access through a [`BufferView`](crate::BufferView)
//!
//! There is no variant for "handle without a buffer": an
//! [`ImageHandle`](crate::ImageHandle) always owns storage, so that state
//! cannot be observed.
//!
//! # Usage
//!
//! ```rust
//! use mve_image::{Error, ImageElementType, ImageHandle};
//!
//! let err = ImageHandle::create(4, 0, 1, ImageElementType::UInt8).unwrap_err();
//! assert!(err.is_shape_error());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use crate::{DType, ImageElementType};
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating, importing or accessing images.
///
/// # Categories
///
/// - **Type errors**: [`InvalidType`](Error::InvalidType), [`UnsupportedDtype`](Error::UnsupportedDtype),
///   [`TypeMismatch`](Error::TypeMismatch)
/// - **Shape errors**: [`Shape`](Error::Shape), [`InvalidShape`](Error::InvalidShape)
/// - **Transfer errors**: [`Copy`](Error::Copy)
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed)
/// - **Access errors**: [`BufferBusy`](Error::BufferBusy)
#[derive(Debug, Error)]
pub enum Error {
    /// The requested element type is `Unknown` or not a known discriminant.
    ///
    /// `raw` is the integer tag that was rejected.
    #[error("invalid image type: {raw}")]
    InvalidType {
        /// Rejected raw type tag
        raw: i32,
    },

    /// Imported array has a rank other than 2 or 3.
    #[error("array should be 2 or 3 dimensional, got {ndim} dimensions")]
    Shape {
        /// Rank of the rejected array
        ndim: usize,
    },

    /// Requested dimensions are zero, negative, or overflow the address space.
    #[error("invalid dimensions: {width}x{height}x{channels} ({reason})")]
    InvalidShape {
        /// Requested width
        width: i64,
        /// Requested height
        height: i64,
        /// Requested channel count
        channels: i64,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// The array's element dtype has no image element type.
    #[error("unsupported array dtype: {dtype}")]
    UnsupportedDtype {
        /// Rejected dtype
        dtype: DType,
    },

    /// Element transfer between an array and an image buffer failed.
    #[error("copy failed: {0}")]
    Copy(String),

    /// Typed access used a scalar type different from the buffer's.
    #[error("type mismatch: buffer holds {expected}, accessed as {got}")]
    TypeMismatch {
        /// Element type of the buffer
        expected: ImageElementType,
        /// Element type requested by the caller
        got: ImageElementType,
    },

    /// The buffer is already borrowed in a conflicting way.
    #[error("image buffer is already borrowed")]
    BufferBusy,

    /// Memory allocation failed or exceeded the configured limit.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidShape`] error.
    #[inline]
    pub fn invalid_shape(
        width: impl TryInto<i64>,
        height: impl TryInto<i64>,
        channels: impl TryInto<i64>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidShape {
            width: width.try_into().unwrap_or(i64::MAX),
            height: height.try_into().unwrap_or(i64::MAX),
            channels: channels.try_into().unwrap_or(i64::MAX),
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::Copy`] error.
    #[inline]
    pub fn copy(msg: impl Into<String>) -> Self {
        Self::Copy(msg.into())
    }

    /// Returns `true` for rank and dimension errors.
    #[inline]
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Self::Shape { .. } | Self::InvalidShape { .. })
    }

    /// Returns `true` for element type and dtype errors.
    #[inline]
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidType { .. } | Self::UnsupportedDtype { .. } | Self::TypeMismatch { .. }
        )
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_shape_message() {
        let err = Error::invalid_shape(4usize, 0usize, 1usize, "zero height");
        let msg = err.to_string();
        assert!(msg.contains("4x0x1"));
        assert!(msg.contains("zero height"));
        assert!(err.is_shape_error());
        assert!(!err.is_type_error());
    }

    #[test]
    fn test_oversized_dimension_saturates() {
        let err = Error::invalid_shape(u64::MAX, 1, 1, "too wide");
        match err {
            Error::InvalidShape { width, .. } => assert_eq!(width, i64::MAX),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_type_errors() {
        assert!(Error::InvalidType { raw: 42 }.is_type_error());
        assert!(Error::UnsupportedDtype { dtype: DType::Complex64 }.is_type_error());
        let err = Error::TypeMismatch {
            expected: ImageElementType::UInt8,
            got: ImageElementType::Float32,
        };
        assert_eq!(err.to_string(), "type mismatch: buffer holds uint8, accessed as float");
    }

    #[test]
    fn test_allocation_failed() {
        let err = Error::allocation_failed(1 << 30, "limit is 1024 bytes");
        assert!(err.to_string().contains("limit is 1024 bytes"));
        assert!(err.is_allocation_error());
    }

    #[test]
    fn test_rank_message() {
        assert_eq!(
            Error::Shape { ndim: 4 }.to_string(),
            "array should be 2 or 3 dimensional, got 4 dimensions"
        );
    }
}
