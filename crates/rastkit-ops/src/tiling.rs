//! Tile grids and a tile-parallel driver.
//!
//! Mosaic, band combine and scale compute every destination tile
//! independently. [`render_tiles`] runs a per-tile closure over a
//! [`TileGrid`] and assembles the results; with the `parallel` feature the
//! tiles are computed on the rayon thread pool.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Raster, Rect};
//! use rastkit_ops::band_combine::{BandCombine, BandCombineConfig};
//! use rastkit_ops::tiling::{render_tiles, TileGrid};
//!
//! let src = Raster::from_fn(Rect::from_size(64, 64), 1, |x, _, _| x as u8);
//! let op = BandCombine::<u8>::new(BandCombineConfig::new(1, vec![vec![1.0, 10.0]])).unwrap();
//! let grid = TileGrid::new(src.bounds(), 16, 16).unwrap();
//! let out = render_tiles(&grid, 1, |tile, dst| op.compute_tile(&src.view(), dst, tile)).unwrap();
//! assert_eq!(out.get(5, 40, 0), 15);
//! ```

use crate::{OpsError, OpsResult};
use rastkit_core::{Raster, RasterViewMut, Rect, Sample};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Regular grid of tiles covering a rectangle.
///
/// Tiles are laid out row-major from the top-left corner; the last column
/// and row are clipped to the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    bounds: Rect,
    tile_width: u32,
    tile_height: u32,
}

impl TileGrid {
    /// Creates a grid over `bounds`.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for a zero tile size.
    pub fn new(bounds: Rect, tile_width: u32, tile_height: u32) -> OpsResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(OpsError::InvalidParameter(format!(
                "tile size {tile_width}x{tile_height} must be positive"
            )));
        }
        Ok(Self {
            bounds,
            tile_width,
            tile_height,
        })
    }

    /// Covered rectangle.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Tile columns and rows.
    pub fn dims(&self) -> (u32, u32) {
        (
            self.bounds.width.div_ceil(self.tile_width),
            self.bounds.height.div_ceil(self.tile_height),
        )
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        let (cols, rows) = self.dims();
        cols as usize * rows as usize
    }

    /// Returns `true` for an empty bounds rectangle.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile at grid position `(col, row)`, clipped to the bounds.
    pub fn tile(&self, col: u32, row: u32) -> Rect {
        let x = self.bounds.x + (col * self.tile_width) as i32;
        let y = self.bounds.y + (row * self.tile_height) as i32;
        Rect::from_bounds(
            x,
            y,
            (x + self.tile_width as i32).min(self.bounds.right()),
            (y + self.tile_height as i32).min(self.bounds.bottom()),
        )
    }

    /// All tiles, row-major.
    pub fn tiles(&self) -> Vec<Rect> {
        let (cols, rows) = self.dims();
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| self.tile(col, row)))
            .collect()
    }
}

/// Computes every tile of `grid` with `compute` and assembles the output.
///
/// `compute` receives the tile rectangle and a destination view covering
/// exactly that tile. The first error aborts the render.
pub fn render_tiles<T, F>(grid: &TileGrid, bands: usize, compute: F) -> OpsResult<Raster<T>>
where
    T: Sample,
    F: Fn(Rect, &mut RasterViewMut<'_, T>) -> OpsResult<()> + Sync,
{
    let tiles = grid.tiles();
    debug!(
        bounds = %grid.bounds(),
        tiles = tiles.len(),
        parallel = cfg!(feature = "parallel"),
        "rendering tiles"
    );

    let run = |tile: &Rect| -> OpsResult<Raster<T>> {
        let mut out = Raster::new(*tile, bands, T::default());
        compute(*tile, &mut out.view_mut())?;
        Ok(out)
    };

    #[cfg(feature = "parallel")]
    let rendered: Vec<Raster<T>> = tiles.par_iter().map(run).collect::<OpsResult<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let rendered: Vec<Raster<T>> = tiles.iter().map(run).collect::<OpsResult<_>>()?;

    let mut image = Raster::new(grid.bounds(), bands, T::default());
    for tile in &rendered {
        image.copy_from(tile);
    }
    Ok(image)
}
