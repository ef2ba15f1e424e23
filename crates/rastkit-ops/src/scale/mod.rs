//! Affine scale resampling.
//!
//! Maps destination pixel centers to source coordinates with
//!
//! ```text
//! src = (dst + 0.5 - trans) / scale
//! ```
//!
//! and samples with:
//!
//! - [`Interpolation::Nearest`] - the source pixel containing `src`
//! - [`Interpolation::Bilinear`] - the four pixels around `src - 0.5`
//!
//! Scale and translation are held as [`Rational`]s and stepped exactly per
//! column and row (see [`rational`]). Integer kinds interpolate in fixed
//! point with [`SUBSAMPLE_BITS`] fractional bits; float kinds in `f64`.
//!
//! # Masking
//!
//! The ROI is in source coordinates. Each bilinear corner gets weight 1 when
//! it lies in the source tile, inside the ROI and is not no-data, else 0.
//! Surviving corners are averaged along x, the two rows then blended along
//! y; with no survivor the background is written. Nearest writes the
//! background when its source pixel fails the same tests.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Raster, Rect};
//! use rastkit_ops::scale::{Scale, ScaleConfig};
//!
//! let src = Raster::from_vec(Rect::from_size(2, 2), 1, vec![1u8, 2, 3, 4]).unwrap();
//! let op = Scale::<u8>::new(ScaleConfig::new(1, 2.0, 2.0)).unwrap();
//! let bounds = op.dest_bounds(src.bounds());
//! assert_eq!(bounds, Rect::from_size(4, 4));
//!
//! let mut dst = Raster::new(bounds, 1, 0u8);
//! op.compute_tile(&src.view(), &mut dst.view_mut(), bounds).unwrap();
//! assert_eq!(&dst.data()[..8], &[1, 1, 2, 2, 1, 1, 2, 2]);
//! ```

pub mod rational;

pub use rational::{AxisMap, AxisSteps, Rational};

use crate::{OpsError, OpsResult};
use rastkit_core::{
    broadcast_fallback, AnyRaster, AnyRasterMut, MaskCase, NoData, RasterView, RasterViewMut, Rect, Roi, Sample, ValueRange,
};
use tracing::{debug, trace};

/// Fractional bits of the integer interpolation weights.
pub const SUBSAMPLE_BITS: u32 = 8;

const ONE: i64 = 1 << SUBSAMPLE_BITS;

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
    /// Nearest neighbour.
    #[default]
    Nearest,
    /// Bilinear over a 2x2 neighbourhood.
    Bilinear,
}

/// Scale configuration.
#[derive(Debug, Clone)]
pub struct ScaleConfig<T: Sample> {
    /// Band count of source and destination.
    pub bands: usize,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Horizontal translation, in destination pixels.
    pub trans_x: f64,
    /// Vertical translation, in destination pixels.
    pub trans_y: f64,
    /// Resampling filter.
    pub interpolation: Interpolation,
    /// Source-space region outside which samples are ignored.
    pub roi: Option<Roi>,
    /// Source samples inside this range are ignored.
    pub no_data: Option<ValueRange<T>>,
    /// Written where nothing can be sampled; one value is broadcast.
    pub background: Vec<f64>,
}

impl<T: Sample> ScaleConfig<T> {
    /// Nearest-neighbour scaling without translation.
    pub fn new(bands: usize, scale_x: f64, scale_y: f64) -> Self {
        Self {
            bands,
            scale_x,
            scale_y,
            trans_x: 0.0,
            trans_y: 0.0,
            interpolation: Interpolation::default(),
            roi: None,
            no_data: None,
            background: vec![0.0],
        }
    }

    /// Sets the translation.
    pub fn with_translation(mut self, trans_x: f64, trans_y: f64) -> Self {
        self.trans_x = trans_x;
        self.trans_y = trans_y;
        self
    }

    /// Sets the resampling filter.
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Sets the source-space region of interest.
    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Sets the no-data range.
    pub fn with_no_data(mut self, range: ValueRange<T>) -> Self {
        self.no_data = Some(range);
        self
    }

    /// Sets the background values.
    pub fn with_background(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.background = values.into();
        self
    }
}

fn rational_param(name: &str, value: f64) -> OpsResult<Rational> {
    Rational::from_f64(value)
        .ok_or_else(|| OpsError::InvalidParameter(format!("{name} = {value} is not representable")))
}

/// One precomputed column or row position.
#[derive(Debug, Clone, Copy)]
struct Tap {
    pos: i32,
    frac: f64,
    fixed: i64,
}

/// Validated scale operator.
#[derive(Debug)]
pub struct Scale<T: Sample> {
    bands: usize,
    scale: (Rational, Rational),
    trans: (Rational, Rational),
    map_x: AxisMap,
    map_y: AxisMap,
    interpolation: Interpolation,
    roi: Option<Roi>,
    no_data: Option<NoData<T>>,
    background: Vec<T>,
    case: MaskCase,
}

impl<T: Sample> Scale<T> {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidParameter`] for a non-positive or non-finite scale,
    ///   a non-finite translation or zero bands
    /// - [`OpsError::Core`] for a bad background length
    pub fn new(config: ScaleConfig<T>) -> OpsResult<Self> {
        if config.bands == 0 {
            return Err(OpsError::InvalidParameter("scale needs at least one band".into()));
        }
        for (name, s) in [("scale_x", config.scale_x), ("scale_y", config.scale_y)] {
            if !s.is_finite() || s <= 0.0 {
                return Err(OpsError::InvalidParameter(format!(
                    "{name} must be finite and positive, got {s}"
                )));
            }
        }
        let sx = rational_param("scale_x", config.scale_x)?;
        let sy = rational_param("scale_y", config.scale_y)?;
        let tx = rational_param("trans_x", config.trans_x)?;
        let ty = rational_param("trans_y", config.trans_y)?;
        if sx.num() <= 0 || sy.num() <= 0 {
            return Err(OpsError::InvalidParameter(format!(
                "scale ({}, {}) too small to represent",
                config.scale_x, config.scale_y
            )));
        }
        let bilinear = config.interpolation == Interpolation::Bilinear;
        let background = broadcast_fallback(&config.background, config.bands)?
            .into_iter()
            .map(T::from_f64)
            .collect();
        let case = MaskCase::select(config.roi.is_some(), config.no_data.is_some());

        debug!(
            scale_x = %sx,
            scale_y = %sy,
            trans_x = %tx,
            trans_y = %ty,
            interpolation = ?config.interpolation,
            ?case,
            "scale configured"
        );

        Ok(Self {
            bands: config.bands,
            scale: (sx, sy),
            trans: (tx, ty),
            map_x: AxisMap::new(sx, tx, bilinear),
            map_y: AxisMap::new(sy, ty, bilinear),
            interpolation: config.interpolation,
            roi: config.roi,
            no_data: config.no_data.map(NoData::new),
            background,
            case,
        })
    }

    /// Exact scale factors in use.
    pub fn scale(&self) -> (Rational, Rational) {
        self.scale
    }

    /// Exact translation in use.
    pub fn translation(&self) -> (Rational, Rational) {
        self.trans
    }

    /// Selected masking variant.
    pub fn mask_case(&self) -> MaskCase {
        self.case
    }

    /// Destination pixels whose centers map into `src`.
    pub fn dest_bounds(&self, src: Rect) -> Rect {
        let axis = |s: Rational, t: Rational, lo: i32, len: u32| {
            let first = (s.to_f64() * lo as f64 + t.to_f64() - 0.5).ceil();
            let end = (s.to_f64() * (lo as f64 + len as f64) + t.to_f64() - 0.5).ceil();
            (first as i32, (end - first).max(0.0) as u32)
        };
        let (x, w) = axis(self.scale.0, self.trans.0, src.x, src.width);
        let (y, h) = axis(self.scale.1, self.trans.1, src.y, src.height);
        Rect::new(x, y, w, h)
    }

    /// Source pixels read when computing `dst`.
    pub fn source_rect(&self, dst: Rect) -> Rect {
        if dst.is_empty() {
            return Rect::new(0, 0, 0, 0);
        }
        let extra = i64::from(self.interpolation == Interpolation::Bilinear);
        let axis = |map: &AxisMap, lo: i32, len: u32| {
            let first = map.position(lo as i64).0;
            let last = map.position(lo as i64 + len as i64 - 1).0 + extra;
            (first, last)
        };
        let (x0, x1) = axis(&self.map_x, dst.x, dst.width);
        let (y0, y1) = axis(&self.map_y, dst.y, dst.height);
        Rect::from_bounds(clamp_i32(x0), clamp_i32(y0), clamp_i32(x1 + 1), clamp_i32(y1 + 1))
    }

    /// Computes `rect` of the destination.
    ///
    /// The source tile should cover [`source_rect`](Self::source_rect);
    /// samples it lacks count as missing.
    ///
    /// # Errors
    ///
    /// [`OpsError::BandMismatch`] or [`OpsError::TileMismatch`] when the
    /// tiles do not fit the configuration.
    pub fn compute_tile(
        &self,
        src: &RasterView<'_, T>,
        dst: &mut RasterViewMut<'_, T>,
        rect: Rect,
    ) -> OpsResult<()> {
        if src.bands() != self.bands {
            return Err(OpsError::BandMismatch {
                source_index: 0,
                expected: self.bands,
                got: src.bands(),
            });
        }
        if dst.bands() != self.bands || !dst.bounds().contains_rect(&rect) {
            return Err(OpsError::TileMismatch(format!(
                "destination {} with {} bands cannot hold {} with {} bands",
                dst.bounds(),
                dst.bands(),
                rect,
                self.bands
            )));
        }
        trace!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "scale tile"
        );
        if rect.is_empty() {
            return Ok(());
        }

        let mut case = self.case;
        if let Some(roi) = &self.roi {
            let needed = self.source_rect(rect);
            if !roi.intersects(&needed) {
                dst.fill_rect(rect, &self.background);
                return Ok(());
            }
            if roi.contains_rect(&needed) {
                case = MaskCase::select(false, case.has_no_data());
            }
        }

        let xs = self.taps(&self.map_x, rect.x, rect.width);
        let ys = self.taps(&self.map_y, rect.y, rect.height);
        match (self.interpolation, case) {
            (Interpolation::Nearest, MaskCase::NoMask) => self.nearest::<false, false>(src, dst, rect, &xs, &ys),
            (Interpolation::Nearest, MaskCase::MaskOnly) => self.nearest::<true, false>(src, dst, rect, &xs, &ys),
            (Interpolation::Nearest, MaskCase::NoDataOnly) => self.nearest::<false, true>(src, dst, rect, &xs, &ys),
            (Interpolation::Nearest, MaskCase::General) => self.nearest::<true, true>(src, dst, rect, &xs, &ys),
            (Interpolation::Bilinear, MaskCase::NoMask) => self.bilinear::<false, false>(src, dst, rect, &xs, &ys),
            (Interpolation::Bilinear, MaskCase::MaskOnly) => self.bilinear::<true, false>(src, dst, rect, &xs, &ys),
            (Interpolation::Bilinear, MaskCase::NoDataOnly) => self.bilinear::<false, true>(src, dst, rect, &xs, &ys),
            (Interpolation::Bilinear, MaskCase::General) => self.bilinear::<true, true>(src, dst, rect, &xs, &ys),
        }
        Ok(())
    }

    /// [`compute_tile`](Self::compute_tile) over tagged tiles.
    ///
    /// # Errors
    ///
    /// [`OpsError::KindMismatch`] when the source is not `T`,
    /// [`OpsError::TileMismatch`] when the destination is not.
    pub fn compute_any(
        &self,
        src: &AnyRaster<'_>,
        dst: &mut AnyRasterMut<'_>,
        rect: Rect,
    ) -> OpsResult<()> {
        let typed = src.downcast::<T>().ok_or(OpsError::KindMismatch {
            source_index: 0,
            expected: T::KIND,
            got: src.kind(),
        })?;
        let dst_kind = dst.kind();
        let dst = dst.downcast_mut::<T>().ok_or_else(|| {
            OpsError::TileMismatch(format!("destination kind {} does not match {}", dst_kind, T::KIND))
        })?;
        self.compute_tile(&typed, dst, rect)
    }

    fn taps(&self, map: &AxisMap, start: i32, len: u32) -> Vec<Tap> {
        let den = map.denominator();
        map.steps(start as i64)
            .take(len as usize)
            .map(|(pos, frac)| Tap {
                pos: clamp_i32(pos),
                frac: frac as f64 / den as f64,
                fixed: ((frac << SUBSAMPLE_BITS) / den) as i64,
            })
            .collect()
    }

    #[inline]
    fn usable<const ROI: bool>(&self, src: &RasterView<'_, T>, x: i32, y: i32) -> bool {
        src.bounds().contains(x, y) && (!ROI || self.roi.as_ref().is_some_and(|r| r.contains(x, y)))
    }

    #[inline]
    fn sample<const NODATA: bool>(&self, src: &RasterView<'_, T>, ok: bool, x: i32, y: i32, b: usize) -> Option<T> {
        if !ok {
            return None;
        }
        let v = src.get(x, y, b);
        if NODATA && self.no_data.as_ref().is_some_and(|nd| nd.is_nodata(v)) {
            return None;
        }
        Some(v)
    }

    fn nearest<const ROI: bool, const NODATA: bool>(
        &self,
        src: &RasterView<'_, T>,
        dst: &mut RasterViewMut<'_, T>,
        rect: Rect,
        xs: &[Tap],
        ys: &[Tap],
    ) {
        for (row, ty) in ys.iter().enumerate() {
            let y = rect.y + row as i32;
            for (col, tx) in xs.iter().enumerate() {
                let x = rect.x + col as i32;
                let ok = self.usable::<ROI>(src, tx.pos, ty.pos);
                for b in 0..self.bands {
                    let v = self
                        .sample::<NODATA>(src, ok, tx.pos, ty.pos, b)
                        .unwrap_or(self.background[b]);
                    dst.set(x, y, b, v);
                }
            }
        }
    }

    fn bilinear<const ROI: bool, const NODATA: bool>(
        &self,
        src: &RasterView<'_, T>,
        dst: &mut RasterViewMut<'_, T>,
        rect: Rect,
        xs: &[Tap],
        ys: &[Tap],
    ) {
        for (row, ty) in ys.iter().enumerate() {
            let y = rect.y + row as i32;
            let (y0, y1) = (ty.pos, ty.pos.saturating_add(1));
            for (col, tx) in xs.iter().enumerate() {
                let x = rect.x + col as i32;
                let (x0, x1) = (tx.pos, tx.pos.saturating_add(1));
                let ok = [
                    self.usable::<ROI>(src, x0, y0),
                    self.usable::<ROI>(src, x1, y0),
                    self.usable::<ROI>(src, x0, y1),
                    self.usable::<ROI>(src, x1, y1),
                ];
                for b in 0..self.bands {
                    let s00 = self.sample::<NODATA>(src, ok[0], x0, y0, b);
                    let s10 = self.sample::<NODATA>(src, ok[1], x1, y0, b);
                    let s01 = self.sample::<NODATA>(src, ok[2], x0, y1, b);
                    let s11 = self.sample::<NODATA>(src, ok[3], x1, y1, b);
                    let v = if T::IS_FLOAT {
                        blend_float(s00, s10, s01, s11, tx.frac, ty.frac)
                    } else {
                        blend_fixed(s00, s10, s01, s11, tx.fixed, ty.fixed)
                    };
                    dst.set(x, y, b, v.unwrap_or(self.background[b]));
                }
            }
        }
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Linear blend of two optional samples; one survivor is taken as is.
#[inline]
fn lerp_opt<V>(a: Option<V>, b: Option<V>, lerp: impl Fn(V, V) -> V) -> Option<V> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

#[inline]
fn blend_float<T: Sample>(
    s00: Option<T>,
    s10: Option<T>,
    s01: Option<T>,
    s11: Option<T>,
    fx: f64,
    fy: f64,
) -> Option<T> {
    let lerp = |f: f64| move |a: f64, b: f64| a + (b - a) * f;
    let top = lerp_opt(s00.map(T::to_f64), s10.map(T::to_f64), lerp(fx));
    let bottom = lerp_opt(s01.map(T::to_f64), s11.map(T::to_f64), lerp(fx));
    lerp_opt(top, bottom, lerp(fy)).map(T::from_f64)
}

#[inline]
fn blend_fixed<T: Sample>(
    s00: Option<T>,
    s10: Option<T>,
    s01: Option<T>,
    s11: Option<T>,
    fx: i64,
    fy: i64,
) -> Option<T> {
    // samples carry SUBSAMPLE_BITS fractional bits; each axis multiplies by an
    // 8-bit weight and shifts back once, the final shift rounds to integer
    let row = |a: Option<T>, b: Option<T>| {
        lerp_opt(a.map(|v| v.to_i64() * ONE), b.map(|v| v.to_i64() * ONE), |a, b| {
            (a * (ONE - fx) + b * fx) >> SUBSAMPLE_BITS
        })
    };
    let top = row(s00, s10);
    let bottom = row(s01, s11);
    let half = ONE / 2;
    lerp_opt(top, bottom, |a, b| (a * (ONE - fy) + b * fy) >> SUBSAMPLE_BITS)
        .map(|v| T::from_f64(((v + half) >> SUBSAMPLE_BITS) as f64))
}
