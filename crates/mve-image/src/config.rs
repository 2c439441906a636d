//! Allocation settings.
//!
//! [`StoreConfig`] bounds how much memory a single image buffer may take.
//! The default is unlimited; embedders (the Python module, for one) build it
//! from the environment with [`StoreConfig::from_env`].

use tracing::warn;

/// Environment variable holding the per-buffer byte limit.
pub const MAX_BYTES_ENV: &str = "MVE_IMAGE_MAX_BYTES";

/// Limits applied when allocating or duplicating image buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreConfig {
    /// Largest buffer, in bytes, that may be allocated. `None` is unlimited.
    pub max_bytes: Option<usize>,
}

impl StoreConfig {
    /// Config with a byte limit.
    pub const fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes: Some(max_bytes),
        }
    }

    /// Reads [`MAX_BYTES_ENV`]. Missing or unparsable values leave the limit unset.
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(MAX_BYTES_ENV).ok().as_deref())
    }

    fn from_value(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        match raw.parse::<usize>() {
            Ok(max_bytes) => Self::with_max_bytes(max_bytes),
            Err(e) => {
                warn!("ignoring {}={:?}: {}", MAX_BYTES_ENV, raw, e);
                Self::default()
            }
        }
    }

    /// Whether a buffer of `bytes` fits the limit.
    #[inline]
    pub fn allows(&self, bytes: usize) -> bool {
        self.max_bytes.is_none_or(|max| bytes <= max)
    }
}
