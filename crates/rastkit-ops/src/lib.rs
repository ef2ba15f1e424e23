//! # rastkit-ops
//!
//! Masked per-tile raster operators.
//!
//! Every operator is built once from a validated configuration and then
//! computes destination tiles from caller-provided source tiles. Sources may
//! carry no-data ranges, a region of interest and (for mosaics) alpha.
//!
//! # Modules
//!
//! - [`mosaic`] - Overlay and weighted blend of N sources
//! - [`band_combine`] - Affine per-pixel band mixing with a constant column
//! - [`dither`] - Error-diffusion quantization to a color map
//! - [`scale`] - Affine scale resampling with exact rational stepping
//! - [`tiling`] - Tile grids and a tile-parallel driver
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Raster, Rect, ValueRange};
//! use rastkit_ops::band_combine::{BandCombine, BandCombineConfig};
//!
//! let rect = Rect::from_size(2, 1);
//! let src = Raster::from_vec(rect, 2, vec![10u8, 20, 0, 20]).unwrap();
//!
//! // out = b0 + b1, skipping no-data bands
//! let config = BandCombineConfig::new(2, vec![vec![1.0, 1.0, 0.0]])
//!     .with_no_data(ValueRange::point(0));
//! let op = BandCombine::<u8>::new(config).unwrap();
//!
//! let mut out = Raster::new(rect, 1, 0u8);
//! op.compute_tile(&src.view(), &mut out.view_mut(), rect).unwrap();
//! assert_eq!(out.data(), &[30, 20]);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default) - rayon-backed [`tiling::render_tiles`]
//! - `serde` - Serialization for configuration enums

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod band_combine;
pub mod dither;
pub mod mosaic;
pub mod scale;
pub mod tiling;

pub use error::{OpsError, OpsResult};
pub use mosaic::MosaicType;
pub use scale::Interpolation;

/// Prelude module for convenient imports.
///
/// ```
/// use rastkit_ops::prelude::*;
/// ```
pub mod prelude {
    pub use crate::band_combine::{BandCombine, BandCombineConfig};
    pub use crate::dither::{ColorMap, DitherConfig, ErrorDiffusion, ErrorKernel};
    pub use crate::error::{OpsError, OpsResult};
    pub use crate::mosaic::{Mosaic, MosaicConfig, MosaicSource, MosaicType, SourceTile};
    pub use crate::scale::{Interpolation, Scale, ScaleConfig};
    pub use crate::tiling::{render_tiles, TileGrid};
}
