//! Linear band recombination.
//!
//! Each destination band is an affine combination of the source bands:
//!
//! ```text
//! dst[i] = m[i][n] + sum_k m[i][k] * src[k]      (n = source bands)
//! ```
//!
//! Source bands whose sample is no-data drop out of the sum. A pixel where
//! every source band is no-data, or which lies outside the ROI, gets the
//! fallback value; the constant term alone never makes a pixel valid.
//!
//! The output kind `D` may differ from the input kind `T`; results are
//! rounded and saturated into `D`.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Raster, Rect};
//! use rastkit_ops::band_combine::{BandCombine, BandCombineConfig};
//!
//! let rect = Rect::from_size(2, 2);
//! let src = Raster::from_fn(rect, 2, |_, _, b| if b == 0 { 3u8 } else { 4 });
//! let op = BandCombine::<u8>::new(BandCombineConfig::new(2, vec![vec![1.0, 1.0, 0.0]])).unwrap();
//!
//! let mut dst = Raster::new(rect, 1, 0u8);
//! op.compute_tile(&src.view(), &mut dst.view_mut(), rect).unwrap();
//! assert!(dst.data().iter().all(|&v| v == 7));
//! ```

use crate::{OpsError, OpsResult};
use rastkit_core::{
    broadcast_fallback, AnyRaster, AnyRasterMut, MaskCase, NoData, RasterView, RasterViewMut, Rect,
    Roi, Sample, ValueRange,
};
use tracing::{debug, trace};

/// Band combine configuration.
#[derive(Debug, Clone)]
pub struct BandCombineConfig<T: Sample> {
    /// Number of source bands.
    pub source_bands: usize,
    /// One row per destination band, `source_bands + 1` columns.
    pub matrix: Vec<Vec<f64>>,
    /// Source samples inside this range are excluded.
    pub no_data: Option<ValueRange<T>>,
    /// Pixels outside the ROI get the fallback.
    pub roi: Option<Roi>,
    /// Per destination band; one value is broadcast.
    pub fallback: Vec<f64>,
}

impl<T: Sample> BandCombineConfig<T> {
    /// Creates a configuration from a matrix.
    pub fn new(source_bands: usize, matrix: Vec<Vec<f64>>) -> Self {
        Self {
            source_bands,
            matrix,
            no_data: None,
            roi: None,
            fallback: vec![0.0],
        }
    }

    /// Matrix copying every band unchanged.
    pub fn identity(bands: usize) -> Self {
        let matrix = (0..bands)
            .map(|i| {
                let mut row = vec![0.0; bands + 1];
                row[i] = 1.0;
                row
            })
            .collect();
        Self::new(bands, matrix)
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

    /// Sets the destination fallback values.
    pub fn with_fallback(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.fallback = values.into();
        self
    }
}

/// Validated band combine operator from `T` samples to `D` samples.
#[derive(Debug)]
pub struct BandCombine<T: Sample, D: Sample = T> {
    source_bands: usize,
    matrix: Vec<Vec<f64>>,
    no_data: Option<NoData<T>>,
    roi: Option<Roi>,
    fallback: Vec<D>,
    case: MaskCase,
}

impl<T: Sample, D: Sample> BandCombine<T, D> {
    /// Validates the matrix and fallback.
    ///
    /// # Errors
    ///
    /// - [`OpsError::EmptyMatrix`] for a matrix without rows
    /// - [`OpsError::MatrixShape`] for a row that is not `source_bands + 1` long
    /// - [`OpsError::InvalidParameter`] for zero source bands
    pub fn new(config: BandCombineConfig<T>) -> OpsResult<Self> {
        if config.source_bands == 0 {
            return Err(OpsError::InvalidParameter(
                "band combine needs at least one source band".into(),
            ));
        }
        if config.matrix.is_empty() {
            return Err(OpsError::EmptyMatrix);
        }
        let expected = config.source_bands + 1;
        if let Some((row, r)) = config
            .matrix
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != expected)
        {
            return Err(OpsError::MatrixShape {
                row,
                expected,
                got: r.len(),
            });
        }
        let fallback = broadcast_fallback(&config.fallback, config.matrix.len())?
            .into_iter()
            .map(D::from_f64)
            .collect();
        let case = MaskCase::select(config.roi.is_some(), config.no_data.is_some());

        debug!(
            source_bands = config.source_bands,
            dest_bands = config.matrix.len(),
            src_kind = %T::KIND,
            dst_kind = %D::KIND,
            ?case,
            "band combine configured"
        );

        Ok(Self {
            source_bands: config.source_bands,
            matrix: config.matrix,
            no_data: config.no_data.map(NoData::new),
            roi: config.roi,
            fallback,
            case,
        })
    }

    /// Number of source bands.
    pub fn source_bands(&self) -> usize {
        self.source_bands
    }

    /// Number of destination bands.
    pub fn dest_bands(&self) -> usize {
        self.matrix.len()
    }

    /// Selected inner-loop variant.
    pub fn mask_case(&self) -> MaskCase {
        self.case
    }

    /// Computes `rect` of the destination.
    ///
    /// # Errors
    ///
    /// [`OpsError::BandMismatch`] or [`OpsError::TileMismatch`] if the tiles
    /// do not fit the configuration or do not cover `rect`.
    pub fn compute_tile(
        &self,
        src: &RasterView<'_, T>,
        dst: &mut RasterViewMut<'_, D>,
        rect: Rect,
    ) -> OpsResult<()> {
        if src.bands() != self.source_bands {
            return Err(OpsError::BandMismatch {
                source_index: 0,
                expected: self.source_bands,
                got: src.bands(),
            });
        }
        if dst.bands() != self.dest_bands() {
            return Err(OpsError::TileMismatch(format!(
                "destination has {} bands, matrix has {} rows",
                dst.bands(),
                self.dest_bands()
            )));
        }
        if !src.bounds().contains_rect(&rect) || !dst.bounds().contains_rect(&rect) {
            return Err(OpsError::TileMismatch(format!(
                "{} not covered by source {} and destination {}",
                rect,
                src.bounds(),
                dst.bounds()
            )));
        }
        trace!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "band combine tile"
        );
        if rect.is_empty() {
            return Ok(());
        }

        let mut case = self.case;
        if let Some(roi) = &self.roi {
            if !roi.intersects(&rect) {
                dst.fill_rect(rect, &self.fallback);
                return Ok(());
            }
            if roi.contains_rect(&rect) {
                case = MaskCase::select(false, case.has_no_data());
            }
        }
        match case {
            MaskCase::NoMask => self.combine::<false, false>(src, dst, rect),
            MaskCase::MaskOnly => self.combine::<true, false>(src, dst, rect),
            MaskCase::NoDataOnly => self.combine::<false, true>(src, dst, rect),
            MaskCase::General => self.combine::<true, true>(src, dst, rect),
        }
        Ok(())
    }

    /// Runtime-kind entry point.
    ///
    /// # Errors
    ///
    /// [`OpsError::KindMismatch`] if the source is not `T`,
    /// [`OpsError::TileMismatch`] if the destination is not `D`.
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
        let dst = dst.downcast_mut::<D>().ok_or_else(|| {
            OpsError::TileMismatch(format!(
                "destination kind {} does not match {}",
                dst_kind,
                D::KIND
            ))
        })?;
        self.compute_tile(&typed, dst, rect)
    }

    fn combine<const ROI: bool, const NODATA: bool>(
        &self,
        src: &RasterView<'_, T>,
        dst: &mut RasterViewMut<'_, D>,
        rect: Rect,
    ) {
        let n = self.source_bands;
        let mut samples = vec![0.0f64; n];
        let mut valid = vec![true; n];
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if ROI && !self.roi.as_ref().is_some_and(|r| r.contains(x, y)) {
                    for (i, &f) in self.fallback.iter().enumerate() {
                        dst.set(x, y, i, f);
                    }
                    continue;
                }
                let mut any_valid = !NODATA;
                for k in 0..n {
                    let v = src.get(x, y, k);
                    samples[k] = v.to_f64();
                    if NODATA {
                        valid[k] = !self.no_data.as_ref().is_some_and(|nd| nd.is_nodata(v));
                        any_valid |= valid[k];
                    }
                }
                for (i, row) in self.matrix.iter().enumerate() {
                    if !any_valid {
                        dst.set(x, y, i, self.fallback[i]);
                        continue;
                    }
                    let mut acc = row[n];
                    for k in 0..n {
                        if !NODATA || valid[k] {
                            acc += row[k] * samples[k];
                        }
                    }
                    dst.set(x, y, i, D::from_f64(acc));
                }
            }
        }
    }
}
