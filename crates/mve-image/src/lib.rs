//! # mve-image
//!
//! Reference-counted, multi-typed image buffers with zero-copy array views.
//!
//! This crate is the Rust side of the `mve_core` Python module:
//!
//! - [`ImageElementType`] - The ten storage scalars plus `Unknown`
//! - [`DType`], [`bridge`] - Translation to and from array dtypes
//! - [`NativeImage`] - Typed contiguous storage
//! - [`ImageHandle`] - Shared-ownership handle to one buffer
//! - [`BufferView`] - Array-shaped alias that keeps its buffer alive
//!
//! ## Ownership
//!
//! ```text
//! BufferView ──owns──> ImageHandle ──Rc──> NativeImage
//!                      ImageHandle ──Rc──┘
//! ```
//!
//! A buffer is freed when the last handle is dropped, and every view owns a
//! handle. Reading a view after all other handles are gone is therefore
//! always valid:
//!
//! ```rust
//! use mve_image::ndarray::{array, ArrayViewD};
//! use mve_image::ImageHandle;
//!
//! let img = ImageHandle::from_array(&array![[1u8, 2], [3, 4]]).unwrap();
//! let view = img.view();
//! drop(img);
//! assert_eq!(view.read(|a: ArrayViewD<'_, u8>| a.sum()).unwrap(), 10);
//! ```
//!
//! ## Threading
//!
//! Everything here is single-threaded (`Rc`/`RefCell`).
//!
//! ## Logging
//!
//! Allocation, duplication and import are reported through [`tracing`] at
//! `debug` level. Install a subscriber in the embedding application to see
//! them.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bridge;
pub mod config;
pub mod dtype;
pub mod element;
pub mod error;
pub mod handle;
pub mod import;
pub mod store;
pub mod view;

// Re-exports for convenience
pub use config::{StoreConfig, MAX_BYTES_ENV};
pub use dtype::{ArrayElement, DType};
pub use element::{Element, ImageElementType};
pub use error::{Error, Result};
pub use handle::{ImageHandle, ImageInfo};
pub use store::{checked_dims, NativeImage, PixelData};
pub use view::BufferView;

pub use ndarray;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bridge::{
        display_name, element_size, element_type_to_external_tag, external_tag_to_element_type,
    };
    pub use crate::{
        ArrayElement, BufferView, DType, Element, Error, ImageElementType, ImageHandle,
        NativeImage, Result, StoreConfig,
    };
}
