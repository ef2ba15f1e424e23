//! Integer rectangles in raster coordinates.
//!
//! Tiles, source coverage and ROI bounds are all expressed as [`Rect`]s.
//!
//! # Coordinate System
//!
//! - Origin (0, 0) is the top-left of the image, but tiles may start anywhere
//!   (including negative coordinates for border-extended sources)
//! - X increases to the right, Y increases downward
//! - Left/top edges are inclusive, right/bottom edges exclusive
//!
//! ```text
//! (x,y) ─────────► X
//!   │   ┌──────────┐
//!   │   │   Tile   │ height
//!   │   └──────────┘
//!   ▼      width
//!   Y
//! ```
//!
//! # Usage
//!
//! ```rust
//! use rastkit_core::Rect;
//!
//! let tile = Rect::new(0, 0, 64, 64);
//! let needed = tile.expand(1, 1, 2, 2);
//! assert_eq!(needed, Rect::new(-1, -1, 67, 67));
//! assert!(needed.contains_rect(&tile));
//! ```

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// A rectangle with zero width or height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at (0, 0) with given dimensions.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Creates a rectangle from its inclusive top-left and exclusive
    /// bottom-right corners. Returns an empty rectangle if they are inverted.
    #[inline]
    pub fn from_bounds(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let w = (x1 as i64 - x0 as i64).max(0) as u32;
        let h = (y1 as i64 - y0 as i64).max(0) as u32;
        Self::new(x0, y0, w, h)
    }

    /// X coordinate of the right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Y coordinate of the bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Area of the rectangle in pixels.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the point (px, py) is inside this rectangle.
    ///
    /// ```rust
    /// use rastkit_core::Rect;
    ///
    /// let rect = Rect::new(-2, 0, 4, 4);
    /// assert!(rect.contains(-2, 0));
    /// assert!(rect.contains(1, 3));
    /// assert!(!rect.contains(2, 3));
    /// ```
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` if this rectangle fully contains another.
    ///
    /// Every rectangle contains an empty one.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns `true` if the rectangles share at least one pixel.
    #[inline]
    pub const fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Intersection of two rectangles, `None` if they don't overlap.
    ///
    /// ```rust
    /// use rastkit_core::Rect;
    ///
    /// let a = Rect::new(0, 0, 100, 100);
    /// let b = Rect::new(50, 50, 100, 100);
    /// assert_eq!(a.intersect(&b), Some(Rect::new(50, 50, 50, 50)));
    /// ```
    #[inline]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::from_bounds(x, y, right, bottom))
        } else {
            None
        }
    }

    /// Bounding box of both rectangles.
    #[inline]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::from_bounds(x, y, right, bottom)
    }

    /// This rectangle translated by (dx, dy).
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grows the rectangle by the given border on each side.
    ///
    /// Used to compute the source area a neighborhood kernel needs.
    #[inline]
    pub fn expand(&self, left: u32, top: u32, right: u32, bottom: u32) -> Rect {
        Rect::new(
            self.x - left as i32,
            self.y - top as i32,
            self.width + left + right,
            self.height + top + bottom,
        )
    }

    /// Iterates all (x, y) coordinates row by row.
    ///
    /// ```rust
    /// use rastkit_core::Rect;
    ///
    /// let coords: Vec<_> = Rect::new(1, 1, 2, 2).iter_coords().collect();
    /// assert_eq!(coords, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    /// ```
    #[inline]
    pub fn iter_coords(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.y..self.bottom()).flat_map(move |y| (self.x..self.right()).map(move |x| (x, y)))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}
