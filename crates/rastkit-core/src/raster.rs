//! Strided raster views over caller-owned sample buffers.
//!
//! This module provides the tile containers every kernel reads and writes:
//! - [`RasterLayout`] - Geometry and addressing of a banded raster
//! - [`RasterView`] - Immutable view over `&[T]`
//! - [`RasterViewMut`] - Mutable view over `&mut [T]`
//! - [`Raster`] - Owned buffer, for hosts and tests
//! - [`AnyRaster`], [`AnyRasterMut`] - Views tagged with their [`SampleKind`]
//!
//! # Memory Layout
//!
//! Sample `(x, y, band)` lives at
//!
//! ```text
//! band_offsets[band] + (y - origin_y) * scanline_stride + (x - origin_x) * pixel_stride
//! ```
//!
//! which covers pixel-interleaved (`RGBRGB...`), band-sequential (planar) and
//! padded layouts. Views never allocate or free the buffer they look at.
//!
//! # Usage
//!
//! ```rust
//! use rastkit_core::{RasterView, Rect};
//!
//! let data = [1u8, 2, 3, 4, 5, 6];
//! // 3x1 pixels, 2 bands, interleaved, starting at x = 10
//! let view = RasterView::interleaved(3, 1, 2, &data).unwrap().with_origin(10, 0);
//! assert_eq!(view.bounds(), Rect::new(10, 0, 3, 1));
//! assert_eq!(view.get(11, 0, 1), 4);
//! assert_eq!(view.get_or(13, 0, 0, 99), 99); // border-extended read
//! ```
//!
//! # Dependencies
//!
//! - [`crate::kind::Sample`] - Sample storage trait
//! - [`crate::rect::Rect`] - Bounds
//! - [`crate::error::Error`] - Layout errors
//!
//! # Used By
//!
//! - [`crate::mask`] - Alpha sampling
//! - `rastkit-ops` - All kernels

use crate::kind::{unsigned_byte_from_slot, unsigned_short_from_slot};
use crate::{Error, Rect, Result, Sample, SampleKind};

/// Geometry and addressing of a banded raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterLayout {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Offset of the first sample of each band
    pub band_offsets: Vec<usize>,
    /// Distance between horizontally adjacent samples of one band
    pub pixel_stride: usize,
    /// Distance between vertically adjacent samples of one band
    pub scanline_stride: usize,
    /// Raster x coordinate of the first column
    pub origin_x: i32,
    /// Raster y coordinate of the first row
    pub origin_y: i32,
}

impl RasterLayout {
    /// Pixel-interleaved layout (`b0 b1 b2 b0 b1 b2 ...`) without padding.
    pub fn interleaved(width: u32, height: u32, bands: usize) -> Self {
        Self {
            width,
            height,
            band_offsets: (0..bands).collect(),
            pixel_stride: bands.max(1),
            scanline_stride: width as usize * bands.max(1),
            origin_x: 0,
            origin_y: 0,
        }
    }

    /// Band-sequential layout: one full plane per band.
    pub fn banded(width: u32, height: u32, bands: usize) -> Self {
        let plane = width as usize * height as usize;
        Self {
            width,
            height,
            band_offsets: (0..bands).map(|b| b * plane).collect(),
            pixel_stride: 1,
            scanline_stride: width as usize,
            origin_x: 0,
            origin_y: 0,
        }
    }

    /// Moves the raster origin.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    /// Number of bands.
    #[inline]
    pub fn bands(&self) -> usize {
        self.band_offsets.len()
    }

    /// Raster-space bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.origin_x, self.origin_y, self.width, self.height)
    }

    /// Smallest buffer length for which every sample is addressable.
    pub fn required_len(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let last = (self.height as usize - 1) * self.scanline_stride
            + (self.width as usize - 1) * self.pixel_stride;
        self.band_offsets
            .iter()
            .map(|off| off + last + 1)
            .max()
            .unwrap_or(0)
    }

    /// Checks the layout against a buffer of `len` samples.
    pub fn validate(&self, len: usize) -> Result<()> {
        if self.band_offsets.is_empty() {
            return Err(Error::invalid_layout("raster must have at least one band"));
        }
        if self.pixel_stride == 0 {
            return Err(Error::invalid_layout("pixel stride must be > 0"));
        }
        if self.scanline_stride == 0 && self.height > 1 {
            return Err(Error::invalid_layout("scanline stride must be > 0"));
        }
        let required = self.required_len();
        if len < required {
            return Err(Error::BufferTooSmall { required, len });
        }
        Ok(())
    }

    /// Flat buffer offset of `(x, y, band)`; the point must be in bounds.
    #[inline]
    pub fn offset(&self, x: i32, y: i32, band: usize) -> usize {
        debug_assert!(self.bounds().contains(x, y), "({x}, {y}) outside {}", self.bounds());
        self.band_offsets[band]
            + (y - self.origin_y) as usize * self.scanline_stride
            + (x - self.origin_x) as usize * self.pixel_stride
    }
}

/// Immutable strided view over a sample buffer.
#[derive(Debug, Clone)]
pub struct RasterView<'a, T: Sample> {
    data: &'a [T],
    layout: RasterLayout,
}

impl<'a, T: Sample> RasterView<'a, T> {
    /// Creates a view, checking that every sample is inside `data`.
    pub fn new(data: &'a [T], layout: RasterLayout) -> Result<Self> {
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Pixel-interleaved view at origin (0, 0).
    pub fn interleaved(width: u32, height: u32, bands: usize, data: &'a [T]) -> Result<Self> {
        Self::new(data, RasterLayout::interleaved(width, height, bands))
    }

    /// Moves the view origin.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.layout = self.layout.with_origin(x, y);
        self
    }

    /// Layout of this view.
    #[inline]
    pub fn layout(&self) -> &RasterLayout {
        &self.layout
    }

    /// Raster-space bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.layout.bounds()
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Number of bands.
    #[inline]
    pub fn bands(&self) -> usize {
        self.layout.bands()
    }

    /// Sample kind of this view.
    #[inline]
    pub fn kind(&self) -> SampleKind {
        T::KIND
    }

    /// Underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Sample at `(x, y, band)`. The point must lie inside [`bounds`](Self::bounds).
    #[inline]
    pub fn get(&self, x: i32, y: i32, band: usize) -> T {
        self.data[self.layout.offset(x, y, band)]
    }

    /// Sample at `(x, y, band)`, or `None` outside the view.
    #[inline]
    pub fn try_get(&self, x: i32, y: i32, band: usize) -> Option<T> {
        if self.bounds().contains(x, y) {
            Some(self.get(x, y, band))
        } else {
            None
        }
    }

    /// Border-extended read: `fill` outside the view.
    #[inline]
    pub fn get_or(&self, x: i32, y: i32, band: usize, fill: T) -> T {
        self.try_get(x, y, band).unwrap_or(fill)
    }
}

/// Mutable strided view over a sample buffer.
#[derive(Debug)]
pub struct RasterViewMut<'a, T: Sample> {
    data: &'a mut [T],
    layout: RasterLayout,
}

impl<'a, T: Sample> RasterViewMut<'a, T> {
    /// Creates a view, checking that every sample is inside `data`.
    pub fn new(data: &'a mut [T], layout: RasterLayout) -> Result<Self> {
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Pixel-interleaved view at origin (0, 0).
    pub fn interleaved(width: u32, height: u32, bands: usize, data: &'a mut [T]) -> Result<Self> {
        Self::new(data, RasterLayout::interleaved(width, height, bands))
    }

    /// Moves the view origin.
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.layout = self.layout.with_origin(x, y);
        self
    }

    /// Layout of this view.
    #[inline]
    pub fn layout(&self) -> &RasterLayout {
        &self.layout
    }

    /// Raster-space bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.layout.bounds()
    }

    /// Number of bands.
    #[inline]
    pub fn bands(&self) -> usize {
        self.layout.bands()
    }

    /// Sample at `(x, y, band)`.
    #[inline]
    pub fn get(&self, x: i32, y: i32, band: usize) -> T {
        self.data[self.layout.offset(x, y, band)]
    }

    /// Writes the sample at `(x, y, band)`.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, band: usize, value: T) {
        let off = self.layout.offset(x, y, band);
        self.data[off] = value;
    }

    /// Writes `values[band]` to every pixel of `rect` (clipped to the view).
    pub fn fill_rect(&mut self, rect: Rect, values: &[T]) {
        let Some(rect) = rect.intersect(&self.bounds()) else {
            return;
        };
        for (x, y) in rect.iter_coords() {
            for (b, v) in values.iter().enumerate().take(self.bands()) {
                self.set(x, y, b, *v);
            }
        }
    }

    /// Reborrows as an immutable view.
    pub fn as_view(&self) -> RasterView<'_, T> {
        RasterView {
            data: &*self.data,
            layout: self.layout.clone(),
        }
    }
}

/// Owned interleaved raster.
///
/// The engine itself only works on views; `Raster` is what hosts and tests
/// use to own tile storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T: Sample> {
    data: Vec<T>,
    layout: RasterLayout,
}

impl<T: Sample> Raster<T> {
    /// Creates a raster covering `bounds` filled with `fill`.
    pub fn new(bounds: Rect, bands: usize, fill: T) -> Self {
        let layout =
            RasterLayout::interleaved(bounds.width, bounds.height, bands).with_origin(bounds.x, bounds.y);
        let len = layout.required_len();
        Self {
            data: vec![fill; len],
            layout,
        }
    }

    /// Wraps interleaved data covering `bounds`.
    pub fn from_vec(bounds: Rect, bands: usize, data: Vec<T>) -> Result<Self> {
        let layout =
            RasterLayout::interleaved(bounds.width, bounds.height, bands).with_origin(bounds.x, bounds.y);
        let expected = layout.required_len();
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                bounds.width,
                bounds.height,
                format!("expected {} samples for {} bands, got {}", expected, bands, data.len()),
            ));
        }
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Builds a raster by evaluating `f(x, y, band)` over `bounds`.
    pub fn from_fn(bounds: Rect, bands: usize, mut f: impl FnMut(i32, i32, usize) -> T) -> Self {
        let mut raster = Self::new(bounds, bands, T::default());
        for (x, y) in bounds.iter_coords() {
            for b in 0..bands {
                let v = f(x, y, b);
                raster.set(x, y, b, v);
            }
        }
        raster
    }

    /// Copies `rect` out of `source`, filling uncovered samples with `fill`.
    ///
    /// This is the constant border extension a host applies before handing
    /// a neighborhood kernel its source tile.
    pub fn extend(source: &RasterView<'_, T>, rect: Rect, fill: T) -> Self {
        let bands = source.bands();
        Self::from_fn(rect, bands, |x, y, b| source.get_or(x, y, b, fill))
    }

    /// Raster-space bounds.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.layout.bounds()
    }

    /// Number of bands.
    #[inline]
    pub fn bands(&self) -> usize {
        self.layout.bands()
    }

    /// Underlying interleaved samples.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Consumes the raster, returning its samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Sample at `(x, y, band)`.
    #[inline]
    pub fn get(&self, x: i32, y: i32, band: usize) -> T {
        self.data[self.layout.offset(x, y, band)]
    }

    /// Writes the sample at `(x, y, band)`.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, band: usize, value: T) {
        let off = self.layout.offset(x, y, band);
        self.data[off] = value;
    }

    /// Immutable view over the whole raster.
    pub fn view(&self) -> RasterView<'_, T> {
        RasterView {
            data: self.data.as_slice(),
            layout: self.layout.clone(),
        }
    }

    /// Mutable view over the whole raster.
    pub fn view_mut(&mut self) -> RasterViewMut<'_, T> {
        RasterViewMut {
            data: self.data.as_mut_slice(),
            layout: self.layout.clone(),
        }
    }

    /// Copies the covered part of another raster into this one.
    pub fn copy_from(&mut self, other: &Raster<T>) {
        let Some(rect) = self.bounds().intersect(&other.bounds()) else {
            return;
        };
        let bands = self.bands().min(other.bands());
        for (x, y) in rect.iter_coords() {
            for b in 0..bands {
                self.set(x, y, b, other.get(x, y, b));
            }
        }
    }
}

impl Raster<u16> {
    /// Wraps unsigned 16-bit data that a host stores in signed 16-bit slots.
    pub fn from_i16_slots(bounds: Rect, bands: usize, slots: &[i16]) -> Result<Self> {
        let data = slots.iter().map(|&s| unsigned_short_from_slot(s)).collect();
        Self::from_vec(bounds, bands, data)
    }
}

impl Raster<u8> {
    /// Wraps unsigned 8-bit data that a host stores in signed 8-bit slots.
    pub fn from_i8_slots(bounds: Rect, bands: usize, slots: &[i8]) -> Result<Self> {
        let data = slots.iter().map(|&s| unsigned_byte_from_slot(s)).collect();
        Self::from_vec(bounds, bands, data)
    }
}

macro_rules! any_raster {
    ($name:ident, $view:ident) => {
        impl<'a> $name<'a> {
            /// Sample kind of the wrapped view.
            pub fn kind(&self) -> SampleKind {
                match self {
                    Self::U8(_) => SampleKind::U8,
                    Self::U16(_) => SampleKind::U16,
                    Self::S16(_) => SampleKind::S16,
                    Self::S32(_) => SampleKind::S32,
                    Self::F32(_) => SampleKind::F32,
                    Self::F64(_) => SampleKind::F64,
                }
            }

            /// Raster-space bounds.
            pub fn bounds(&self) -> Rect {
                match self {
                    Self::U8(v) => v.bounds(),
                    Self::U16(v) => v.bounds(),
                    Self::S16(v) => v.bounds(),
                    Self::S32(v) => v.bounds(),
                    Self::F32(v) => v.bounds(),
                    Self::F64(v) => v.bounds(),
                }
            }

            /// Number of bands.
            pub fn bands(&self) -> usize {
                match self {
                    Self::U8(v) => v.bands(),
                    Self::U16(v) => v.bands(),
                    Self::S16(v) => v.bands(),
                    Self::S32(v) => v.bands(),
                    Self::F32(v) => v.bands(),
                    Self::F64(v) => v.bands(),
                }
            }

            /// Sample at `(x, y, band)` widened to `f64`.
            pub fn sample_f64(&self, x: i32, y: i32, band: usize) -> f64 {
                match self {
                    Self::U8(v) => v.get(x, y, band).to_f64(),
                    Self::U16(v) => v.get(x, y, band).to_f64(),
                    Self::S16(v) => v.get(x, y, band).to_f64(),
                    Self::S32(v) => v.get(x, y, band).to_f64(),
                    Self::F32(v) => v.get(x, y, band).to_f64(),
                    Self::F64(v) => v.get(x, y, band).to_f64(),
                }
            }
        }

        impl<'a> From<$view<'a, u8>> for $name<'a> {
            fn from(v: $view<'a, u8>) -> Self {
                Self::U8(v)
            }
        }
        impl<'a> From<$view<'a, u16>> for $name<'a> {
            fn from(v: $view<'a, u16>) -> Self {
                Self::U16(v)
            }
        }
        impl<'a> From<$view<'a, i16>> for $name<'a> {
            fn from(v: $view<'a, i16>) -> Self {
                Self::S16(v)
            }
        }
        impl<'a> From<$view<'a, i32>> for $name<'a> {
            fn from(v: $view<'a, i32>) -> Self {
                Self::S32(v)
            }
        }
        impl<'a> From<$view<'a, f32>> for $name<'a> {
            fn from(v: $view<'a, f32>) -> Self {
                Self::F32(v)
            }
        }
        impl<'a> From<$view<'a, f64>> for $name<'a> {
            fn from(v: $view<'a, f64>) -> Self {
                Self::F64(v)
            }
        }
    };
}

/// Immutable view tagged with its runtime sample kind.
///
/// Used where the kind is only known at runtime: alpha channels, whose kind
/// may differ from the data they weight, and the dynamic kernel entry points.
#[derive(Debug, Clone)]
pub enum AnyRaster<'a> {
    /// 8-bit unsigned samples
    U8(RasterView<'a, u8>),
    /// 16-bit unsigned samples
    U16(RasterView<'a, u16>),
    /// 16-bit signed samples
    S16(RasterView<'a, i16>),
    /// 32-bit signed samples
    S32(RasterView<'a, i32>),
    /// 32-bit float samples
    F32(RasterView<'a, f32>),
    /// 64-bit float samples
    F64(RasterView<'a, f64>),
}

/// Mutable view tagged with its runtime sample kind.
#[derive(Debug)]
pub enum AnyRasterMut<'a> {
    /// 8-bit unsigned samples
    U8(RasterViewMut<'a, u8>),
    /// 16-bit unsigned samples
    U16(RasterViewMut<'a, u16>),
    /// 16-bit signed samples
    S16(RasterViewMut<'a, i16>),
    /// 32-bit signed samples
    S32(RasterViewMut<'a, i32>),
    /// 32-bit float samples
    F32(RasterViewMut<'a, f32>),
    /// 64-bit float samples
    F64(RasterViewMut<'a, f64>),
}

any_raster!(AnyRaster, RasterView);
any_raster!(AnyRasterMut, RasterViewMut);

impl<'a> AnyRaster<'a> {
    /// Typed view, or `None` if `T` is not the wrapped kind.
    #[inline]
    pub fn downcast<T: Sample>(&self) -> Option<RasterView<'a, T>> {
        T::from_any(self)
    }
}

impl<'a> AnyRasterMut<'a> {
    /// Typed mutable view, or `None` if `T` is not the wrapped kind.
    #[inline]
    pub fn downcast_mut<T: Sample>(&mut self) -> Option<&mut RasterViewMut<'a, T>> {
        T::from_any_mut(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_addressing() {
        let data: Vec<u16> = (0..24).collect();
        let view = RasterView::interleaved(4, 2, 3, &data).unwrap();
        assert_eq!(view.get(0, 0, 0), 0);
        assert_eq!(view.get(1, 0, 2), 5);
        assert_eq!(view.get(0, 1, 1), 13);
        assert_eq!(view.kind(), SampleKind::U16);
    }

    #[test]
    fn test_banded_addressing() {
        let data: Vec<u8> = (0..8).collect();
        let view = RasterView::new(&data, RasterLayout::banded(2, 2, 2)).unwrap();
        assert_eq!(view.get(1, 1, 0), 3);
        assert_eq!(view.get(0, 0, 1), 4);
        assert_eq!(view.get(1, 1, 1), 7);
    }

    #[test]
    fn test_padded_scanlines() {
        // 2x2 single band with one padding sample per row
        let data = [1i16, 2, -1, 3, 4];
        let layout = RasterLayout {
            width: 2,
            height: 2,
            band_offsets: vec![0],
            pixel_stride: 1,
            scanline_stride: 3,
            origin_x: 5,
            origin_y: 7,
        };
        let view = RasterView::new(&data, layout).unwrap();
        assert_eq!(view.get(5, 8, 0), 3);
        assert_eq!(view.get(6, 8, 0), 4);
    }

    #[test]
    fn test_layout_validation() {
        let data = [0u8; 5];
        let err = RasterView::interleaved(3, 2, 1, &data).unwrap_err();
        assert_eq!(err, Error::BufferTooSmall { required: 6, len: 5 });

        let mut layout = RasterLayout::interleaved(2, 2, 1);
        layout.pixel_stride = 0;
        assert!(RasterView::new(&data, layout).is_err());

        let layout = RasterLayout::interleaved(2, 2, 0);
        assert!(layout.validate(100).unwrap_err().is_layout_error());
    }

    #[test]
    fn test_border_extended_reads() {
        let data = [7u8, 8, 9, 10];
        let view = RasterView::interleaved(2, 2, 1, &data).unwrap().with_origin(-1, -1);
        assert_eq!(view.try_get(-1, -1, 0), Some(7));
        assert_eq!(view.try_get(1, 0, 0), None);
        assert_eq!(view.get_or(-2, 0, 0, u8::BORDER_FILL), 0);

        let extended = Raster::extend(&view, Rect::new(-2, -2, 4, 4), 255);
        assert_eq!(extended.get(-2, -2, 0), 255);
        assert_eq!(extended.get(0, 0, 0), 10);
        assert_eq!(extended.get(1, 1, 0), 255);
    }

    #[test]
    fn test_raster_view_mut() {
        let mut raster = Raster::new(Rect::new(0, 0, 3, 3), 2, 0i32);
        {
            let mut view = raster.view_mut();
            view.set(1, 1, 1, -5);
            view.fill_rect(Rect::new(2, 0, 5, 1), &[9, 8]);
            assert_eq!(view.as_view().get(1, 1, 1), -5);
        }
        assert_eq!(raster.get(1, 1, 1), -5);
        assert_eq!(raster.get(2, 0, 0), 9);
        assert_eq!(raster.get(2, 0, 1), 8);
        assert_eq!(raster.get(1, 0, 0), 0);
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(Raster::from_vec(Rect::from_size(2, 2), 1, vec![0u8; 3]).is_err());
        let r = Raster::from_vec(Rect::from_size(2, 2), 1, vec![0u8, 1, 2, 3]).unwrap();
        assert_eq!(r.get(1, 1, 0), 3);
    }

    #[test]
    fn test_signed_slot_constructors() {
        let rect = Rect::from_size(2, 1);
        let wide = Raster::from_i16_slots(rect, 1, &[-1, 1234]).unwrap();
        assert_eq!(wide.data(), &[65535u16, 1234]);
        let byte = Raster::from_i8_slots(rect, 2, &[-128, 127, -1, 0]).unwrap();
        assert_eq!(byte.data(), &[128u8, 127, 255, 0]);
        assert!(Raster::from_i16_slots(rect, 2, &[0, 0, 0]).is_err());
    }

    #[test]
    fn test_any_raster_dispatch() {
        let data = [1.5f32, 2.5];
        let any: AnyRaster = RasterView::interleaved(2, 1, 1, &data).unwrap().into();
        assert_eq!(any.kind(), SampleKind::F32);
        assert_eq!(any.bands(), 1);
        assert_eq!(any.sample_f64(1, 0, 0), 2.5);
        assert_eq!(any.bounds(), Rect::new(0, 0, 2, 1));
        assert!(any.downcast::<f32>().is_some());
        assert!(any.downcast::<f64>().is_none());

        let mut out = [0u16; 2];
        let mut any_mut: AnyRasterMut = RasterViewMut::interleaved(2, 1, 1, &mut out).unwrap().into();
        assert!(any_mut.downcast_mut::<u8>().is_none());
        let typed = any_mut.downcast_mut::<u16>().unwrap();
        typed.set(1, 0, 0, 40000);
        assert_eq!(out[1], 40000);
    }
}
