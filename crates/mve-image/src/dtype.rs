//! Array element tags.
//!
//! [`DType`] is the tag an n-dimensional array library attaches to its
//! element type. It is a superset of [`ImageElementType`](crate::ImageElementType):
//! arrays can hold booleans, half floats and complex numbers, none of which
//! an image buffer can store.
//!
//! [`ArrayElement`] gives every Rust scalar that can appear in an array its
//! tag at compile time, so [`ImageHandle::from_array`](crate::ImageHandle::from_array)
//! can resolve the image type from the array's element type.

use half::f16;
use num_complex::Complex;
use std::fmt;

/// Element tag of an n-dimensional array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Sentinel for "no type".
    NoType,
    /// Boolean.
    Bool,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 16-bit half float.
    Float16,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Complex of two 32-bit floats.
    Complex64,
    /// Complex of two 64-bit floats.
    Complex128,
}

impl DType {
    /// Every tag.
    pub const ALL: [DType; 15] = [
        Self::NoType,
        Self::Bool,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float16,
        Self::Float32,
        Self::Float64,
        Self::Complex64,
        Self::Complex128,
    ];

    /// Size in bytes of one element. `0` for `NoType`.
    pub const fn size(self) -> usize {
        match self {
            Self::NoType => 0,
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
        }
    }

    /// Array-library spelling (`"float32"`, `"complex128"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoType => "notype",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
        }
    }
}

impl DType {
    /// Tag for an array-interface kind code and item size.
    ///
    /// `kind` is the numpy `dtype.kind` character (`b i u f c`). Byte order
    /// is not part of the tag. Anything else is [`DType::NoType`].
    ///
    /// ```rust
    /// use mve_image::DType;
    ///
    /// assert_eq!(DType::from_kind(b'u', 2), DType::UInt16);
    /// assert_eq!(DType::from_kind(b'U', 4), DType::NoType);
    /// ```
    pub const fn from_kind(kind: u8, itemsize: usize) -> Self {
        match (kind, itemsize) {
            (b'b', 1) => Self::Bool,
            (b'i', 1) => Self::Int8,
            (b'i', 2) => Self::Int16,
            (b'i', 4) => Self::Int32,
            (b'i', 8) => Self::Int64,
            (b'u', 1) => Self::UInt8,
            (b'u', 2) => Self::UInt16,
            (b'u', 4) => Self::UInt32,
            (b'u', 8) => Self::UInt64,
            (b'f', 2) => Self::Float16,
            (b'f', 4) => Self::Float32,
            (b'f', 8) => Self::Float64,
            (b'c', 8) => Self::Complex64,
            (b'c', 16) => Self::Complex128,
            _ => Self::NoType,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar that can be the element of an importable array.
pub trait ArrayElement: Copy + 'static {
    /// Tag of this scalar.
    const DTYPE: DType;
}

macro_rules! impl_array_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl ArrayElement for $t {
                const DTYPE: DType = DType::$variant;
            }
        )*
    };
}

impl_array_element! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f16 => Float16,
    f32 => Float32,
    f64 => Float64,
    Complex<f32> => Complex64,
    Complex<f64> => Complex128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_scalars() {
        assert_eq!(<bool as ArrayElement>::DTYPE.size(), size_of::<bool>());
        assert_eq!(<f16 as ArrayElement>::DTYPE.size(), size_of::<f16>());
        assert_eq!(<Complex<f32> as ArrayElement>::DTYPE.size(), size_of::<Complex<f32>>());
        assert_eq!(<Complex<f64> as ArrayElement>::DTYPE.size(), size_of::<Complex<f64>>());
        assert_eq!(DType::NoType.size(), 0);
    }

    #[test]
    fn test_from_kind_round_trip() {
        for dtype in DType::ALL.into_iter().filter(|d| *d != DType::NoType) {
            let kind = match dtype {
                DType::Bool => b'b',
                DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => b'i',
                DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => b'u',
                DType::Float16 | DType::Float32 | DType::Float64 => b'f',
                DType::Complex64 | DType::Complex128 => b'c',
                DType::NoType => unreachable!(),
            };
            assert_eq!(DType::from_kind(kind, dtype.size()), dtype, "{dtype}");
        }
    }

    #[test]
    fn test_from_kind_unsupported() {
        assert_eq!(DType::from_kind(b'U', 4), DType::NoType);
        assert_eq!(DType::from_kind(b'O', 8), DType::NoType);
        assert_eq!(DType::from_kind(b'f', 16), DType::NoType);
        assert_eq!(DType::from_kind(b'i', 3), DType::NoType);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::Complex128.to_string(), "complex128");
        assert_eq!(DType::Float32.to_string(), "float32");
    }
}
