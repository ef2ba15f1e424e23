//! Multi-source mosaicking.
//!
//! Combines N aligned source tiles into one destination tile, per pixel and
//! per band:
//!
//! - [`MosaicType::Overlay`] - the first source (in priority order) with a
//!   valid, contributing sample wins
//! - [`MosaicType::Blend`] - weighted average over every contributing source
//!
//! Each source may carry a no-data range, a [`Roi`] and an alpha channel.
//! Pixels where nothing contributes get the per-band fallback value.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Raster, Rect};
//! use rastkit_ops::mosaic::{Mosaic, MosaicConfig, MosaicSource, MosaicType, SourceTile};
//!
//! let tile = Rect::from_size(4, 4);
//! let a = Raster::new(tile, 1, 10u8);
//! let b = Raster::new(tile, 1, 20u8);
//!
//! let config = MosaicConfig::new(MosaicType::Blend)
//!     .with_source(MosaicSource::new(1))
//!     .with_source(MosaicSource::new(1));
//! let mosaic = Mosaic::<u8>::new(config).unwrap();
//!
//! let mut out = Raster::new(tile, 1, 0u8);
//! let sources = [SourceTile::new(a.view()), SourceTile::new(b.view())];
//! mosaic.compute_tile(&sources, &mut out.view_mut(), tile).unwrap();
//! assert!(out.data().iter().all(|&v| v == 15));
//! ```

use crate::{OpsError, OpsResult};
use rastkit_core::{
    broadcast_fallback, AlphaMode, AnyRaster, AnyRasterMut, MaskCase, MaskEvaluator, MaskResult,
    NoData, RasterView, RasterViewMut, Rect, Roi, Sample, SampleKind, ValueRange,
};
use tracing::{debug, trace};

/// Compositing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MosaicType {
    /// First valid source wins.
    #[default]
    Overlay,
    /// Weighted average of all valid sources.
    Blend,
}

/// Static description of one mosaic source.
#[derive(Debug, Clone)]
pub struct MosaicSource<T: Sample> {
    /// Band count the source tiles will have.
    pub bands: usize,
    /// Sample kind the source tiles will have.
    pub kind: SampleKind,
    /// Samples inside this range are not data.
    pub no_data: Option<ValueRange<T>>,
    /// Region outside which the source does not contribute.
    pub roi: Option<Roi>,
    /// Whether tiles of this source come with an alpha channel.
    pub has_alpha: bool,
}

impl<T: Sample> MosaicSource<T> {
    /// Source with `bands` bands of kind `T` and no masks.
    pub fn new(bands: usize) -> Self {
        Self {
            bands,
            kind: T::KIND,
            no_data: None,
            roi: None,
            has_alpha: false,
        }
    }

    /// Describes a source from one of its tiles.
    pub fn describing(tile: &AnyRaster<'_>) -> Self {
        Self {
            kind: tile.kind(),
            ..Self::new(tile.bands())
        }
    }

    /// Sets the no-data range.
    pub fn with_no_data(mut self, range: ValueRange<T>) -> Self {
        self.no_data = Some(range);
        self
    }

    /// Sets the region of interest.
    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Declares an alpha channel.
    pub fn with_alpha(mut self) -> Self {
        self.has_alpha = true;
        self
    }
}

/// Mosaic configuration.
#[derive(Debug, Clone)]
pub struct MosaicConfig<T: Sample> {
    /// Compositing policy.
    pub mosaic_type: MosaicType,
    /// Requested alpha handling. Overlay always uses bitmask alpha.
    pub alpha_mode: AlphaMode,
    /// Sources in priority order.
    pub sources: Vec<MosaicSource<T>>,
    /// Per-band fallback; one value is broadcast.
    pub fallback: Vec<f64>,
}

impl<T: Sample> Default for MosaicConfig<T> {
    fn default() -> Self {
        Self {
            mosaic_type: MosaicType::default(),
            alpha_mode: AlphaMode::default(),
            sources: Vec::new(),
            fallback: vec![0.0],
        }
    }
}

impl<T: Sample> MosaicConfig<T> {
    /// Empty configuration with the given policy.
    pub fn new(mosaic_type: MosaicType) -> Self {
        Self {
            mosaic_type,
            ..Self::default()
        }
    }

    /// Sets the alpha handling mode.
    pub fn with_alpha_mode(mut self, mode: AlphaMode) -> Self {
        self.alpha_mode = mode;
        self
    }

    /// Appends a source with the lowest priority so far.
    pub fn with_source(mut self, source: MosaicSource<T>) -> Self {
        self.sources.push(source);
        self
    }

    /// Sets the destination fallback values.
    pub fn with_fallback(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.fallback = values.into();
        self
    }
}

/// One source's tile for a `compute_tile` call.
#[derive(Debug, Clone)]
pub struct SourceTile<'a, T: Sample> {
    /// Sample data.
    pub raster: RasterView<'a, T>,
    /// Single-band alpha, of any kind.
    pub alpha: Option<AnyRaster<'a>>,
}

impl<'a, T: Sample> SourceTile<'a, T> {
    /// Tile without alpha.
    pub fn new(raster: RasterView<'a, T>) -> Self {
        Self { raster, alpha: None }
    }

    /// Attaches an alpha channel.
    pub fn with_alpha(mut self, alpha: impl Into<AnyRaster<'a>>) -> Self {
        self.alpha = Some(alpha.into());
        self
    }
}

/// Runtime-kind counterpart of [`SourceTile`].
#[derive(Debug, Clone)]
pub struct AnySourceTile<'a> {
    /// Sample data.
    pub raster: AnyRaster<'a>,
    /// Single-band alpha.
    pub alpha: Option<AnyRaster<'a>>,
}

impl<'a> AnySourceTile<'a> {
    /// Tile without alpha.
    pub fn new(raster: impl Into<AnyRaster<'a>>) -> Self {
        Self {
            raster: raster.into(),
            alpha: None,
        }
    }

    /// Attaches an alpha channel.
    pub fn with_alpha(mut self, alpha: impl Into<AnyRaster<'a>>) -> Self {
        self.alpha = Some(alpha.into());
        self
    }
}

#[derive(Debug)]
struct PreparedSource<T: Sample> {
    no_data: Option<NoData<T>>,
    roi: Option<Roi>,
    has_alpha: bool,
}

/// Validated mosaic operator.
///
/// Immutable after construction; tiles may be computed from any number of
/// threads.
#[derive(Debug)]
pub struct Mosaic<T: Sample> {
    mosaic_type: MosaicType,
    alpha_mode: AlphaMode,
    sources: Vec<PreparedSource<T>>,
    bands: usize,
    fallback: Vec<T>,
    case: MaskCase,
}

impl<T: Sample> Mosaic<T> {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidParameter`] without sources
    /// - [`OpsError::KindMismatch`] if a source is not of kind `T`
    /// - [`OpsError::BandMismatch`] if band counts differ
    /// - [`OpsError::Core`] for a bad fallback length
    pub fn new(config: MosaicConfig<T>) -> OpsResult<Self> {
        let Some(first) = config.sources.first() else {
            return Err(OpsError::InvalidParameter(
                "mosaic needs at least one source".into(),
            ));
        };
        let bands = first.bands;
        if bands == 0 {
            return Err(OpsError::InvalidParameter("sources must have bands".into()));
        }
        for (i, src) in config.sources.iter().enumerate() {
            if src.kind != T::KIND {
                return Err(OpsError::KindMismatch {
                    source_index: i,
                    expected: T::KIND,
                    got: src.kind,
                });
            }
            if src.bands != bands {
                return Err(OpsError::BandMismatch {
                    source_index: i,
                    expected: bands,
                    got: src.bands,
                });
            }
        }
        let fallback = broadcast_fallback(&config.fallback, bands)?
            .into_iter()
            .map(T::from_f64)
            .collect();

        let all_alpha = config.sources.iter().all(|s| s.has_alpha);
        let alpha_mode = if config.alpha_mode == AlphaMode::Bitmask
            || config.mosaic_type == MosaicType::Overlay
            || !all_alpha
        {
            AlphaMode::Bitmask
        } else {
            AlphaMode::Weighted
        };

        let has_mask = config.sources.iter().any(|s| s.roi.is_some() || s.has_alpha);
        let has_no_data = config.sources.iter().any(|s| s.no_data.is_some());
        let case = MaskCase::select(has_mask, has_no_data);

        let sources: Vec<_> = config
            .sources
            .into_iter()
            .map(|s| PreparedSource {
                no_data: s.no_data.map(NoData::new),
                roi: s.roi,
                has_alpha: s.has_alpha,
            })
            .collect();

        debug!(
            sources = sources.len(),
            bands,
            kind = %T::KIND,
            mosaic_type = ?config.mosaic_type,
            ?alpha_mode,
            ?case,
            "mosaic configured"
        );

        Ok(Self {
            mosaic_type: config.mosaic_type,
            alpha_mode,
            sources,
            bands,
            fallback,
            case,
        })
    }

    /// Compositing policy.
    pub fn mosaic_type(&self) -> MosaicType {
        self.mosaic_type
    }

    /// Effective alpha mode after the overlay / partial-alpha rules.
    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Selected inner-loop variant.
    pub fn mask_case(&self) -> MaskCase {
        self.case
    }

    /// Band count of sources and destination.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Per-band fallback in the destination kind.
    pub fn fallback(&self) -> &[T] {
        &self.fallback
    }

    /// Computes `rect` of the destination from one tile per source.
    ///
    /// Source tiles need not cover `rect`; uncovered samples are absent.
    ///
    /// # Errors
    ///
    /// [`OpsError::TileMismatch`] or [`OpsError::BandMismatch`] when the
    /// tiles do not match the configuration. Nothing is written then.
    pub fn compute_tile(
        &self,
        tiles: &[SourceTile<'_, T>],
        dst: &mut RasterViewMut<'_, T>,
        rect: Rect,
    ) -> OpsResult<()> {
        self.check_tiles(tiles, dst, rect)?;
        trace!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            sources = tiles.len(),
            "mosaic tile"
        );
        if rect.is_empty() {
            return Ok(());
        }
        match self.case {
            MaskCase::NoMask => self.composite::<false, false>(tiles, dst, rect),
            MaskCase::MaskOnly => self.composite::<true, false>(tiles, dst, rect),
            MaskCase::NoDataOnly => self.composite::<false, true>(tiles, dst, rect),
            MaskCase::General => self.composite::<true, true>(tiles, dst, rect),
        }
        Ok(())
    }

    /// Runtime-kind entry point.
    ///
    /// # Errors
    ///
    /// [`OpsError::KindMismatch`] naming the first source whose kind is not
    /// `T`, [`OpsError::TileMismatch`] for a destination of another kind,
    /// plus everything [`compute_tile`](Self::compute_tile) checks.
    pub fn compute_any(
        &self,
        tiles: &[AnySourceTile<'_>],
        dst: &mut AnyRasterMut<'_>,
        rect: Rect,
    ) -> OpsResult<()> {
        let typed = tiles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let raster = t.raster.downcast::<T>().ok_or(OpsError::KindMismatch {
                    source_index: i,
                    expected: T::KIND,
                    got: t.raster.kind(),
                })?;
                Ok(SourceTile {
                    raster,
                    alpha: t.alpha.clone(),
                })
            })
            .collect::<OpsResult<Vec<_>>>()?;
        let dst_kind = dst.kind();
        let dst = dst.downcast_mut::<T>().ok_or_else(|| {
            OpsError::TileMismatch(format!(
                "destination kind {} does not match mosaic kind {}",
                dst_kind,
                T::KIND
            ))
        })?;
        self.compute_tile(&typed, dst, rect)
    }

    fn check_tiles(
        &self,
        tiles: &[SourceTile<'_, T>],
        dst: &RasterViewMut<'_, T>,
        rect: Rect,
    ) -> OpsResult<()> {
        if tiles.len() != self.sources.len() {
            return Err(OpsError::TileMismatch(format!(
                "got {} source tiles for {} sources",
                tiles.len(),
                self.sources.len()
            )));
        }
        for (i, (tile, src)) in tiles.iter().zip(&self.sources).enumerate() {
            if tile.raster.bands() != self.bands {
                return Err(OpsError::BandMismatch {
                    source_index: i,
                    expected: self.bands,
                    got: tile.raster.bands(),
                });
            }
            if tile.alpha.is_some() != src.has_alpha {
                return Err(OpsError::TileMismatch(format!(
                    "source {} alpha tile {}",
                    i,
                    if src.has_alpha { "missing" } else { "not configured" }
                )));
            }
        }
        if dst.bands() != self.bands {
            return Err(OpsError::TileMismatch(format!(
                "destination has {} bands, expected {}",
                dst.bands(),
                self.bands
            )));
        }
        if !dst.bounds().contains_rect(&rect) {
            return Err(OpsError::TileMismatch(format!(
                "{} not inside destination {}",
                rect,
                dst.bounds()
            )));
        }
        Ok(())
    }

    fn composite<const MASK: bool, const NODATA: bool>(
        &self,
        tiles: &[SourceTile<'_, T>],
        dst: &mut RasterViewMut<'_, T>,
        rect: Rect,
    ) {
        let n = tiles.len();
        let mut evaluators = Vec::with_capacity(n);
        let mut active = Vec::with_capacity(n);
        for (tile, src) in tiles.iter().zip(&self.sources) {
            let covered = tile.raster.bounds().overlaps(&rect);
            let eval = if MASK {
                self.tile_evaluator(tile, src, rect)
            } else {
                Some(MaskEvaluator::unmasked())
            };
            active.push(covered && eval.is_some());
            evaluators.push(eval.unwrap_or_else(MaskEvaluator::unmasked));
        }

        let mut masks = vec![MaskResult::EXCLUDED; n];
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                for s in 0..n {
                    masks[s] = if !active[s] || !tiles[s].raster.bounds().contains(x, y) {
                        MaskResult::EXCLUDED
                    } else if MASK {
                        evaluators[s].evaluate(x, y)
                    } else {
                        MaskResult::OPAQUE
                    };
                }
                for b in 0..self.bands {
                    let value = match self.mosaic_type {
                        MosaicType::Overlay => self.overlay_sample::<NODATA>(tiles, &masks, x, y, b),
                        MosaicType::Blend => self.blend_sample::<NODATA>(tiles, &masks, x, y, b),
                    };
                    dst.set(x, y, b, value);
                }
            }
        }
    }

    /// Evaluator for one source over `rect`, `None` if it cannot contribute.
    fn tile_evaluator<'r>(
        &'r self,
        tile: &'r SourceTile<'_, T>,
        src: &'r PreparedSource<T>,
        rect: Rect,
    ) -> Option<MaskEvaluator<'r>> {
        if let Some(alpha) = tile.alpha.as_ref() {
            return Some(MaskEvaluator::new(src.roi.as_ref(), Some(alpha), self.alpha_mode));
        }
        match src.roi.as_ref() {
            Some(roi) if roi.contains_rect(&rect) => Some(MaskEvaluator::unmasked()),
            Some(roi) if !roi.intersects(&rect) => None,
            Some(roi) => Some(MaskEvaluator::new(Some(roi), None, self.alpha_mode)),
            None => Some(MaskEvaluator::unmasked()),
        }
    }

    #[inline]
    fn is_no_data<const NODATA: bool>(&self, s: usize, v: T) -> bool {
        NODATA
            && self.sources[s]
                .no_data
                .as_ref()
                .is_some_and(|nd| nd.is_nodata(v))
    }

    #[inline]
    fn overlay_sample<const NODATA: bool>(
        &self,
        tiles: &[SourceTile<'_, T>],
        masks: &[MaskResult],
        x: i32,
        y: i32,
        b: usize,
    ) -> T {
        for (s, tile) in tiles.iter().enumerate() {
            if !masks[s].contributes() {
                continue;
            }
            let v = tile.raster.get(x, y, b);
            if self.is_no_data::<NODATA>(s, v) {
                continue;
            }
            return v;
        }
        self.fallback[b]
    }

    #[inline]
    fn blend_sample<const NODATA: bool>(
        &self,
        tiles: &[SourceTile<'_, T>],
        masks: &[MaskResult],
        x: i32,
        y: i32,
        b: usize,
    ) -> T {
        let mut num = 0.0;
        let mut den = 0.0;
        for (s, tile) in tiles.iter().enumerate() {
            if !masks[s].contributes() {
                continue;
            }
            let v = tile.raster.get(x, y, b);
            if self.is_no_data::<NODATA>(s, v) {
                continue;
            }
            let w = masks[s].weight;
            num += w * v.to_f64();
            den += w;
        }
        if den == 0.0 {
            self.fallback[b]
        } else {
            T::from_f64(num / den)
        }
    }
}
