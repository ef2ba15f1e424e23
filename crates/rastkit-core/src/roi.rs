//! Region of Interest predicates.
//!
//! A [`Roi`] answers "does pixel (x, y) take part in the computation?". The
//! geometry behind it is any [`RoiShape`]; two are provided:
//!
//! - [`Rect`] - axis-aligned rectangle
//! - [`MaskRoi`] - byte raster, samples at or above a threshold are inside
//!
//! Non-rectangular shapes are rasterized into a byte image the first time a
//! kernel needs per-pixel answers. The image is memoized in a [`OnceLock`], so
//! it is built at most once per `Roi` even when several tile threads ask for
//! it at the same time.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Rect, Roi};
//!
//! let roi = Roi::from_rect(Rect::new(2, 2, 4, 4));
//! assert!(roi.contains(3, 3));
//! assert!(!roi.contains(6, 3));
//! assert!(roi.contains_rect(&Rect::new(2, 2, 2, 2)));
//! assert!(!roi.intersects(&Rect::new(10, 10, 4, 4)));
//! ```

use crate::{Raster, Rect};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Point-containment geometry behind a [`Roi`].
pub trait RoiShape: Send + Sync + std::fmt::Debug {
    /// Returns `true` if the pixel is inside the region.
    fn contains(&self, x: i32, y: i32) -> bool;

    /// Bounding box of the region; nothing outside it is contained.
    fn bounds(&self) -> Rect;

    /// Whether containment can be answered from [`bounds`](Self::bounds) alone.
    fn is_rectangular(&self) -> bool {
        false
    }
}

impl RoiShape for Rect {
    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        Rect::contains(self, x, y)
    }

    fn bounds(&self) -> Rect {
        *self
    }

    fn is_rectangular(&self) -> bool {
        true
    }
}

/// Raster mask region: inside where the first band is `>= threshold`.
#[derive(Debug, Clone)]
pub struct MaskRoi {
    mask: Raster<u8>,
    threshold: u8,
}

impl MaskRoi {
    /// Creates a mask region. A threshold of 0 is raised to 1.
    pub fn new(mask: Raster<u8>, threshold: u8) -> Self {
        Self {
            mask,
            threshold: threshold.max(1),
        }
    }
}

impl RoiShape for MaskRoi {
    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        self.mask.bounds().contains(x, y) && self.mask.get(x, y, 0) >= self.threshold
    }

    fn bounds(&self) -> Rect {
        self.mask.bounds()
    }
}

/// Rasterized region plus its summed-area table.
struct RoiImage {
    raster: Raster<u8>,
    /// `(width + 1) * (height + 1)` inclusive prefix counts of inside pixels.
    counts: Vec<u64>,
}

impl RoiImage {
    fn build(shape: &dyn RoiShape) -> Self {
        let bounds = shape.bounds();
        let raster = Raster::from_fn(bounds, 1, |x, y, _| u8::from(shape.contains(x, y)));
        let w = bounds.width as usize;
        let h = bounds.height as usize;
        let stride = w + 1;
        let mut counts = vec![0u64; stride * (h + 1)];
        for row in 0..h {
            let mut run = 0u64;
            for col in 0..w {
                let x = bounds.x + col as i32;
                let y = bounds.y + row as i32;
                run += u64::from(raster.get(x, y, 0));
                counts[(row + 1) * stride + col + 1] = counts[row * stride + col + 1] + run;
            }
        }
        Self { raster, counts }
    }

    /// Inside pixels of `rect`, which must lie within the raster bounds.
    fn count(&self, rect: &Rect) -> u64 {
        let bounds = self.raster.bounds();
        let stride = bounds.width as usize + 1;
        let x0 = (rect.x - bounds.x) as usize;
        let y0 = (rect.y - bounds.y) as usize;
        let x1 = x0 + rect.width as usize;
        let y1 = y0 + rect.height as usize;
        let at = |x: usize, y: usize| self.counts[y * stride + x];
        at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)
    }
}

struct RoiInner {
    shape: Box<dyn RoiShape>,
    image: OnceLock<RoiImage>,
    builds: AtomicUsize,
}

/// Shared, immutable Region of Interest.
///
/// Cloning is cheap; clones share the memoized image.
#[derive(Clone)]
pub struct Roi {
    inner: Arc<RoiInner>,
}

impl Roi {
    /// Wraps any shape.
    pub fn new(shape: impl RoiShape + 'static) -> Self {
        Self {
            inner: Arc::new(RoiInner {
                shape: Box::new(shape),
                image: OnceLock::new(),
                builds: AtomicUsize::new(0),
            }),
        }
    }

    /// Rectangular region.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect)
    }

    /// Raster mask region, see [`MaskRoi`].
    pub fn from_mask(mask: Raster<u8>, threshold: u8) -> Self {
        Self::new(MaskRoi::new(mask, threshold))
    }

    /// Bounding box of the region.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.inner.shape.bounds()
    }

    /// Rasterized region: 1 inside, 0 outside, covering [`bounds`](Self::bounds).
    ///
    /// Built on first call and cached for the lifetime of the `Roi`.
    pub fn image(&self) -> &Raster<u8> {
        &self.rasterized().raster
    }

    fn rasterized(&self) -> &RoiImage {
        self.inner.image.get_or_init(|| {
            self.inner.builds.fetch_add(1, Ordering::Relaxed);
            debug!(bounds = %self.inner.shape.bounds(), "rasterizing ROI");
            RoiImage::build(self.inner.shape.as_ref())
        })
    }

    /// Number of times the rasterized image has been built (0 or 1).
    pub fn image_builds(&self) -> usize {
        self.inner.builds.load(Ordering::Relaxed)
    }

    /// Returns `true` if the pixel is inside the region.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let shape = &self.inner.shape;
        if shape.is_rectangular() {
            return shape.contains(x, y);
        }
        let image = self.image();
        image.bounds().contains(x, y) && image.get(x, y, 0) != 0
    }

    /// Returns `true` if every pixel of `rect` is inside the region.
    ///
    /// Used once per tile to skip per-pixel tests. Bounds decide first; other
    /// shapes are answered from the summed-area table of the rasterized image.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        if rect.is_empty() {
            return true;
        }
        if !self.bounds().contains_rect(rect) {
            return false;
        }
        if self.inner.shape.is_rectangular() {
            return true;
        }
        self.rasterized().count(rect) == rect.area()
    }

    /// Returns `true` if at least one pixel of `rect` is inside the region.
    pub fn intersects(&self, rect: &Rect) -> bool {
        let Some(overlap) = self.bounds().intersect(rect) else {
            return false;
        };
        if self.inner.shape.is_rectangular() {
            return true;
        }
        self.rasterized().count(&overlap) > 0
    }
}

impl std::fmt::Debug for Roi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Roi")
            .field("shape", &self.inner.shape)
            .field("rasterized", &self.inner.image.get().is_some())
            .finish()
    }
}
