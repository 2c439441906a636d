//! Translation between image element types and array dtypes.
//!
//! All four lookups are total. Anything without a counterpart maps to the
//! sentinel on the other side ([`DType::NoType`] or
//! [`ImageElementType::Unknown`]) instead of failing; callers that need a
//! concrete type check for the sentinel themselves.
//!
//! ```rust
//! use mve_image::bridge::{element_type_to_external_tag, external_tag_to_element_type};
//! use mve_image::{DType, ImageElementType};
//!
//! let tag = element_type_to_external_tag(ImageElementType::Float32);
//! assert_eq!(tag, DType::Float32);
//! assert_eq!(external_tag_to_element_type(DType::Complex64), ImageElementType::Unknown);
//! ```

use crate::{DType, ImageElementType};

/// Array dtype that stores the same scalars as `ty`.
pub const fn element_type_to_external_tag(ty: ImageElementType) -> DType {
    match ty {
        ImageElementType::UInt8 => DType::UInt8,
        ImageElementType::UInt16 => DType::UInt16,
        ImageElementType::UInt32 => DType::UInt32,
        ImageElementType::UInt64 => DType::UInt64,
        ImageElementType::Int8 => DType::Int8,
        ImageElementType::Int16 => DType::Int16,
        ImageElementType::Int32 => DType::Int32,
        ImageElementType::Int64 => DType::Int64,
        ImageElementType::Float32 => DType::Float32,
        ImageElementType::Float64 => DType::Float64,
        ImageElementType::Unknown => DType::NoType,
    }
}

/// Image element type for an array dtype; `Unknown` when none exists.
pub const fn external_tag_to_element_type(dtype: DType) -> ImageElementType {
    match dtype {
        DType::UInt8 => ImageElementType::UInt8,
        DType::UInt16 => ImageElementType::UInt16,
        DType::UInt32 => ImageElementType::UInt32,
        DType::UInt64 => ImageElementType::UInt64,
        DType::Int8 => ImageElementType::Int8,
        DType::Int16 => ImageElementType::Int16,
        DType::Int32 => ImageElementType::Int32,
        DType::Int64 => ImageElementType::Int64,
        DType::Float32 => ImageElementType::Float32,
        DType::Float64 => ImageElementType::Float64,
        DType::NoType
        | DType::Bool
        | DType::Float16
        | DType::Complex64
        | DType::Complex128 => ImageElementType::Unknown,
    }
}

/// Byte width of one element of `ty`.
#[inline]
pub const fn element_size(ty: ImageElementType) -> usize {
    ty.size()
}

/// Canonical display name of `ty`.
#[inline]
pub const fn display_name(ty: ImageElementType) -> &'static str {
    ty.name()
}

impl From<ImageElementType> for DType {
    fn from(ty: ImageElementType) -> Self {
        element_type_to_external_tag(ty)
    }
}

impl From<DType> for ImageElementType {
    fn from(dtype: DType) -> Self {
        external_tag_to_element_type(dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_known_types() {
        for ty in ImageElementType::ALL.into_iter().filter(|t| t.is_known()) {
            let tag = element_type_to_external_tag(ty);
            assert_ne!(tag, DType::NoType, "{ty} has no dtype");
            assert_eq!(external_tag_to_element_type(tag), ty);
        }
    }

    #[test]
    fn test_unknown_maps_to_sentinel() {
        assert_eq!(element_type_to_external_tag(ImageElementType::Unknown), DType::NoType);
        assert_eq!(external_tag_to_element_type(DType::NoType), ImageElementType::Unknown);
    }

    #[test]
    fn test_every_dtype_resolves() {
        let mut known = 0;
        for dtype in DType::ALL {
            let ty = external_tag_to_element_type(dtype);
            if ty.is_known() {
                known += 1;
                assert_eq!(element_type_to_external_tag(ty), dtype);
                assert_eq!(element_size(ty), dtype.size());
            }
        }
        // One dtype per concrete element type.
        assert_eq!(known, ImageElementType::ALL.len() - 1);
    }

    #[test]
    fn test_unsupported_dtypes() {
        for dtype in [DType::Bool, DType::Float16, DType::Complex64, DType::Complex128] {
            assert_eq!(ImageElementType::from(dtype), ImageElementType::Unknown);
        }
    }

    #[test]
    fn test_element_size_table() {
        let expected = [0, 1, 2, 4, 8, 1, 2, 4, 8, 4, 8];
        for (ty, size) in ImageElementType::ALL.into_iter().zip(expected) {
            assert_eq!(element_size(ty), size, "{ty}");
        }
    }

    #[test]
    fn test_display_names() {
        let names: Vec<_> = ImageElementType::ALL.into_iter().map(display_name).collect();
        assert_eq!(
            names,
            [
                "unknown", "uint8", "uint16", "uint32", "uint64", "sint8", "sint16", "sint32",
                "sint64", "float", "double"
            ]
        );
    }
}
