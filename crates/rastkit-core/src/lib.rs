//! # rastkit-core
//!
//! Core types for tiled raster compute kernels.
//!
//! This crate provides the foundational types used by every rastkit operator:
//!
//! - [`SampleKind`], [`Sample`] - The six numeric sample types and their
//!   saturating conversions
//! - [`ValueRange`], [`NoData`] - No-data classification in the native type
//! - [`Rect`] - Tile and region geometry
//! - [`RasterView`], [`RasterViewMut`], [`Raster`] - Strided banded views over
//!   caller-owned buffers
//! - [`Roi`] - Region of Interest with lazily memoized rasterization
//! - [`MaskEvaluator`], [`MaskCase`] - Per-source ROI / alpha evaluation
//!
//! ## Crate Structure
//!
//! ```text
//! rastkit-core (this crate)
//!    ^
//!    |
//!    +-- rastkit-ops (mosaic, band combine, dither, scale)
//!    +-- rastkit-tests, rastkit-bench
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialization for configuration enums and [`Rect`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod kind;
pub mod mask;
pub mod range;
pub mod raster;
pub mod rect;
pub mod roi;

pub use error::{Error, Result};
pub use kind::{unsigned_byte_from_slot, unsigned_short_from_slot, Sample, SampleKind};
pub use mask::{AlphaMode, MaskCase, MaskEvaluator, MaskResult};
pub use range::{NoData, ValueRange};
pub use raster::{AnyRaster, AnyRasterMut, Raster, RasterLayout, RasterView, RasterViewMut};
pub use rect::Rect;
pub use roi::{MaskRoi, Roi, RoiShape};

/// Expands per-band fallback values to `bands` entries.
///
/// A single value is broadcast to every band; otherwise the count must match.
///
/// ```rust
/// use rastkit_core::broadcast_fallback;
///
/// assert_eq!(broadcast_fallback(&[0.0], 3).unwrap(), vec![0.0, 0.0, 0.0]);
/// assert!(broadcast_fallback(&[1.0, 2.0], 3).is_err());
/// ```
pub fn broadcast_fallback(values: &[f64], bands: usize) -> Result<Vec<f64>> {
    match values.len() {
        1 => Ok(vec![values[0]; bands]),
        n if n == bands => Ok(values.to_vec()),
        n => Err(Error::FallbackLength { got: n, bands }),
    }
}

/// Prelude module for convenient imports.
///
/// ```
/// use rastkit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::kind::{Sample, SampleKind};
    pub use crate::mask::{AlphaMode, MaskCase, MaskEvaluator, MaskResult};
    pub use crate::range::{NoData, ValueRange};
    pub use crate::raster::{AnyRaster, AnyRasterMut, Raster, RasterLayout, RasterView, RasterViewMut};
    pub use crate::rect::Rect;
    pub use crate::roi::{Roi, RoiShape};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_fallback() {
        assert_eq!(broadcast_fallback(&[5.0], 1).unwrap(), vec![5.0]);
        assert_eq!(broadcast_fallback(&[1.0, 2.0], 2).unwrap(), vec![1.0, 2.0]);
        assert_eq!(
            broadcast_fallback(&[], 2).unwrap_err(),
            Error::FallbackLength { got: 0, bands: 2 }
        );
    }
}
