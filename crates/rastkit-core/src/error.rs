//! Error types for rastkit-core operations.
//!
//! Covers the failure modes of the foundational types: building raster views
//! over caller-owned buffers, constructing value ranges and broadcasting
//! per-band fallback values.
//!
//! # Usage
//!
//! ```rust
//! use rastkit_core::{Error, Result};
//!
//! fn check_band(band: usize, bands: usize) -> Result<()> {
//!     if band >= bands {
//!         return Err(Error::BandOutOfRange { band, bands });
//!     }
//!     Ok(())
//! }
//! assert!(check_band(3, 3).is_err());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::raster`] - Layout validation
//! - [`crate::range`] - Bound validation
//! - `rastkit-ops` - Wrapped into `OpsError`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building core raster types.
///
/// # Categories
///
/// - **Layout errors**: [`BufferTooSmall`](Error::BufferTooSmall), [`InvalidLayout`](Error::InvalidLayout)
/// - **Band errors**: [`BandOutOfRange`](Error::BandOutOfRange), [`FallbackLength`](Error::FallbackLength)
/// - **Range errors**: [`InvalidRange`](Error::InvalidRange)
/// - **Dimension errors**: [`InvalidDimensions`](Error::InvalidDimensions)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The buffer cannot hold every sample addressed by the layout.
    ///
    /// `required` is the smallest buffer length for which every
    /// `(x, y, band)` offset is in bounds.
    #[error("buffer of {len} samples is smaller than the {required} samples addressed by the layout")]
    BufferTooSmall {
        /// Minimum buffer length required
        required: usize,
        /// Actual buffer length
        len: usize,
    },

    /// The layout itself is inconsistent (zero strides, wrong offset count).
    #[error("invalid raster layout: {0}")]
    InvalidLayout(String),

    /// A band index is not present in the raster.
    #[error("band {band} out of range for raster with {bands} bands")]
    BandOutOfRange {
        /// Requested band
        band: usize,
        /// Number of bands
        bands: usize,
    },

    /// Lower bound is greater than upper bound.
    #[error("invalid value range: lower bound {lower} is greater than upper bound {upper}")]
    InvalidRange {
        /// Lower bound (as f64 for display)
        lower: f64,
        /// Upper bound (as f64 for display)
        upper: f64,
    },

    /// Fallback values cannot be broadcast to the band count.
    #[error("{got} fallback values cannot be applied to {bands} bands")]
    FallbackLength {
        /// Number of fallback values supplied
        got: usize,
        /// Number of destination bands
        bands: usize,
    },

    /// Invalid raster dimensions.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidLayout`] error.
    #[inline]
    pub fn invalid_layout(msg: impl Into<String>) -> Self {
        Self::InvalidLayout(msg.into())
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error comes from a raster layout check.
    #[inline]
    pub fn is_layout_error(&self) -> bool {
        matches!(self, Self::BufferTooSmall { .. } | Self::InvalidLayout(_))
    }
}
