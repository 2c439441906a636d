//! Image element types.
//!
//! An image stores `width * height * channels` scalars of one
//! [`ImageElementType`]. The set is closed: ten concrete storage types plus
//! the [`Unknown`](ImageElementType::Unknown) fallback.
//!
//! # Stable discriminants
//!
//! The integer value of each variant is part of the host-facing API (the
//! `IMAGE_TYPE_*` constants and the `image_type` property), so variants must
//! never be reordered.
//!
//! | variant   | raw | size | name      |
//! |-----------|-----|------|-----------|
//! | `Unknown` | 0   | 0    | `unknown` |
//! | `UInt8`   | 1   | 1    | `uint8`   |
//! | `UInt16`  | 2   | 2    | `uint16`  |
//! | `UInt32`  | 3   | 4    | `uint32`  |
//! | `UInt64`  | 4   | 8    | `uint64`  |
//! | `Int8`    | 5   | 1    | `sint8`   |
//! | `Int16`   | 6   | 2    | `sint16`  |
//! | `Int32`   | 7   | 4    | `sint32`  |
//! | `Int64`   | 8   | 8    | `sint64`  |
//! | `Float32` | 9   | 4    | `float`   |
//! | `Float64` | 10  | 8    | `double`  |
//!
//! Signed names keep the historical `s` prefix.
//!
//! # Storage scalars
//!
//! [`Element`] is implemented for exactly the ten Rust scalars that back a
//! buffer. It is sealed; adding an element type means adding a variant here,
//! a storage arm in [`crate::store`], and an entry in
//! [`ImageElementType::ALL`].

use crate::store::PixelData;
use std::fmt;

/// Scalar storage kind of one image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ImageElementType {
    /// No concrete type. Fallback for unrecognized tags.
    #[default]
    Unknown = 0,
    /// 8-bit unsigned integer.
    UInt8 = 1,
    /// 16-bit unsigned integer.
    UInt16 = 2,
    /// 32-bit unsigned integer.
    UInt32 = 3,
    /// 64-bit unsigned integer.
    UInt64 = 4,
    /// 8-bit signed integer.
    Int8 = 5,
    /// 16-bit signed integer.
    Int16 = 6,
    /// 32-bit signed integer.
    Int32 = 7,
    /// 64-bit signed integer.
    Int64 = 8,
    /// 32-bit IEEE float.
    Float32 = 9,
    /// 64-bit IEEE float.
    Float64 = 10,
}

impl ImageElementType {
    /// Every variant, in discriminant order.
    pub const ALL: [ImageElementType; 11] = [
        Self::Unknown,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
    ];

    /// Looks up a variant by its stable integer value.
    ///
    /// Returns `None` for values outside `0..=10`.
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Unknown),
            1 => Some(Self::UInt8),
            2 => Some(Self::UInt16),
            3 => Some(Self::UInt32),
            4 => Some(Self::UInt64),
            5 => Some(Self::Int8),
            6 => Some(Self::Int16),
            7 => Some(Self::Int32),
            8 => Some(Self::Int64),
            9 => Some(Self::Float32),
            10 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Stable integer value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// Byte width of one element. `0` for `Unknown`.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Canonical lowercase name (`"uint8"`, `"sint8"`, `"float"`, ...).
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Int8 => "sint8",
            Self::Int16 => "sint16",
            Self::Int32 => "sint32",
            Self::Int64 => "sint64",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }

    /// Whether this is a concrete storage type.
    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ImageElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust scalar that can back an image buffer.
///
/// Implemented for `u8, u16, u32, u64, i8, i16, i32, i64, f32, f64`.
pub trait Element:
    sealed::Sealed + bytemuck::Pod + Default + PartialEq + fmt::Debug + 'static
{
    /// Element type tag of this scalar.
    const TYPE: ImageElementType;

    /// Moves a vector of this scalar into its storage variant.
    #[doc(hidden)]
    fn wrap(data: Vec<Self>) -> PixelData;
}

macro_rules! impl_element {
    ($($t:ty => $variant:ident / $storage:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}
            impl Element for $t {
                const TYPE: ImageElementType = ImageElementType::$variant;

                #[inline]
                fn wrap(data: Vec<Self>) -> PixelData {
                    PixelData::$storage(data)
                }
            }
        )*
    };
}

impl_element! {
    u8 => UInt8 / U8,
    u16 => UInt16 / U16,
    u32 => UInt32 / U32,
    u64 => UInt64 / U64,
    i8 => Int8 / I8,
    i16 => Int16 / I16,
    i32 => Int32 / I32,
    i64 => Int64 / I64,
    f32 => Float32 / F32,
    f64 => Float64 / F64,
}
