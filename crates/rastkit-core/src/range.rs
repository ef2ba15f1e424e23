//! Value ranges used to classify samples as no-data.
//!
//! A [`ValueRange`] is an interval over one sample type whose bounds are
//! individually inclusive or exclusive. Membership is always tested in the
//! native type, so an 8-bit no-data value of 50 matches byte 50 exactly.
//!
//! [`NoData`] wraps a range for use inside kernels; for byte data it carries a
//! 256-entry lookup table that answers exactly like the range.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{NoData, ValueRange};
//!
//! let range = ValueRange::point(50u8);
//! assert!(range.contains(50));
//! assert!(!range.contains(51));
//!
//! let nodata = NoData::new(ValueRange::new(10u8, true, 20, false).unwrap());
//! assert!(nodata.is_nodata(10));
//! assert!(!nodata.is_nodata(20));
//! ```

use crate::{Error, Result, Sample};

/// Interval over a sample type with per-bound inclusivity.
///
/// # Invariants
///
/// - `lower <= upper`
/// - immutable after construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange<T: Sample> {
    lower: T,
    lower_inclusive: bool,
    upper: T,
    upper_inclusive: bool,
    nan_included: bool,
}

impl<T: Sample> ValueRange<T> {
    /// Creates a range, rejecting `lower > upper` and NaN bounds.
    pub fn new(lower: T, lower_inclusive: bool, upper: T, upper_inclusive: bool) -> Result<Self> {
        // `!(a <= b)` also rejects NaN bounds.
        if !(lower <= upper) {
            return Err(Error::InvalidRange {
                lower: lower.to_f64(),
                upper: upper.to_f64(),
            });
        }
        Ok(Self {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
            nan_included: false,
        })
    }

    /// Single-value range `[value, value]`.
    pub fn point(value: T) -> Self {
        Self {
            lower: value,
            lower_inclusive: true,
            upper: value,
            upper_inclusive: true,
            nan_included: false,
        }
    }

    /// Everything at or above `lower`.
    pub fn at_least(lower: T) -> Self {
        Self {
            lower,
            lower_inclusive: true,
            upper: T::MAX,
            upper_inclusive: true,
            nan_included: false,
        }
    }

    /// Everything at or below `upper`.
    pub fn at_most(upper: T) -> Self {
        Self {
            lower: T::MIN,
            lower_inclusive: true,
            upper,
            upper_inclusive: true,
            nan_included: false,
        }
    }

    /// A range containing no value.
    fn empty() -> Self {
        Self {
            lower: T::MAX,
            lower_inclusive: false,
            upper: T::MAX,
            upper_inclusive: true,
            nan_included: false,
        }
    }

    /// Builds a range from `f64` bounds.
    ///
    /// For integer kinds fractional bounds are moved inward to the nearest
    /// representable integer that keeps the same membership, so
    /// `contains` on a stored sample gives the same answer as testing the
    /// sample's exact value against the double bounds. Bounds beyond the
    /// kind's extremes are clamped without overflow.
    pub fn from_f64_bounds(
        lower: f64,
        lower_inclusive: bool,
        upper: f64,
        upper_inclusive: bool,
    ) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(Error::InvalidRange { lower, upper });
        }
        if T::IS_FLOAT {
            return Self::new(T::from_f64(lower), lower_inclusive, T::from_f64(upper), upper_inclusive);
        }

        let min = T::MIN.to_f64();
        let max = T::MAX.to_f64();

        // Smallest integer member implied by the lower bound.
        let lo = if lower.fract() == 0.0 && !lower_inclusive {
            lower + 1.0
        } else {
            lower.ceil()
        };
        // Largest integer member implied by the upper bound.
        let hi = if upper.fract() == 0.0 && !upper_inclusive {
            upper - 1.0
        } else {
            upper.floor()
        };

        if lo > hi || lo > max || hi < min {
            return Ok(Self::empty());
        }
        Self::new(T::from_f64(lo.max(min)), true, T::from_f64(hi.min(max)), true)
    }

    /// Also treat NaN samples as members (float kinds only).
    pub fn with_nan_included(mut self, nan_included: bool) -> Self {
        self.nan_included = nan_included && T::IS_FLOAT;
        self
    }

    /// Lower bound.
    #[inline]
    pub fn lower(&self) -> T {
        self.lower
    }

    /// Upper bound.
    #[inline]
    pub fn upper(&self) -> T {
        self.upper
    }

    /// Whether the lower bound is part of the range.
    #[inline]
    pub fn is_lower_inclusive(&self) -> bool {
        self.lower_inclusive
    }

    /// Whether the upper bound is part of the range.
    #[inline]
    pub fn is_upper_inclusive(&self) -> bool {
        self.upper_inclusive
    }

    /// Whether NaN samples are members.
    #[inline]
    pub fn is_nan_included(&self) -> bool {
        self.nan_included
    }

    /// Whether this is a single-value inclusive range.
    #[inline]
    pub fn is_point(&self) -> bool {
        self.lower == self.upper && self.lower_inclusive && self.upper_inclusive
    }

    /// Tests membership in the native sample type.
    #[inline]
    pub fn contains(&self, v: T) -> bool {
        if v.is_nan() {
            return self.nan_included;
        }
        let above = if self.lower_inclusive {
            v >= self.lower
        } else {
            v > self.lower
        };
        let below = if self.upper_inclusive {
            v <= self.upper
        } else {
            v < self.upper
        };
        above && below
    }
}

impl<T: Sample> std::fmt::Display for ValueRange<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{:?}, {:?}{}",
            if self.lower_inclusive { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inclusive { ']' } else { ')' },
        )
    }
}

/// No-data test used inside kernels.
///
/// Byte ranges are expanded into a lookup table at construction.
#[derive(Debug, Clone)]
pub struct NoData<T: Sample> {
    range: ValueRange<T>,
    table: Option<Box<[bool; 256]>>,
}

impl<T: Sample> NoData<T> {
    /// Wraps a range, precomputing the byte table when `T` is `u8`.
    pub fn new(range: ValueRange<T>) -> Self {
        let table = if T::lut_index(T::MIN).is_some() {
            let mut table = Box::new([false; 256]);
            for (i, slot) in table.iter_mut().enumerate() {
                *slot = range.contains(T::from_f64(i as f64));
            }
            Some(table)
        } else {
            None
        };
        Self { range, table }
    }

    /// Underlying range.
    #[inline]
    pub fn range(&self) -> &ValueRange<T> {
        &self.range
    }

    /// Whether a lookup table is in use.
    #[inline]
    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Returns `true` if `v` is a no-data sample.
    #[inline]
    pub fn is_nodata(&self, v: T) -> bool {
        if let (Some(table), Some(i)) = (&self.table, v.lut_index()) {
            return table[i];
        }
        self.range.contains(v)
    }
}

impl<T: Sample> From<ValueRange<T>> for NoData<T> {
    fn from(range: ValueRange<T>) -> Self {
        Self::new(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_exclusive_bounds() {
        let r = ValueRange::new(10i16, false, 20, true).unwrap();
        assert!(!r.contains(10));
        assert!(r.contains(11));
        assert!(r.contains(20));
        assert!(!r.contains(21));
        assert_eq!(r.to_string(), "(10, 20]");
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(ValueRange::new(5u8, true, 4, true).is_err());
        assert!(ValueRange::new(f32::NAN, true, 1.0, true).is_err());
        assert!(ValueRange::<u8>::from_f64_bounds(3.0, true, 1.0, true).is_err());
    }

    #[test]
    fn test_point_range() {
        let r = ValueRange::point(-3.25f64);
        assert!(r.is_point());
        assert!(r.contains(-3.25));
        assert!(!r.contains(-3.2499999));
    }

    #[test]
    fn test_extreme_bounds_do_not_overflow() {
        let r = ValueRange::point(i32::MIN);
        assert!(r.contains(i32::MIN));
        assert!(!r.contains(i32::MIN + 1));

        let r = ValueRange::new(i32::MAX - 1, false, i32::MAX, true).unwrap();
        assert!(r.contains(i32::MAX));
        assert!(!r.contains(i32::MAX - 1));

        let r = ValueRange::<u16>::at_least(65535);
        assert!(r.contains(65535));
        assert!(!r.contains(65534));
    }

    #[test]
    fn test_from_f64_bounds_integer_kinds() {
        let r = ValueRange::<u8>::from_f64_bounds(50.0, true, 50.0, true).unwrap();
        assert!(r.contains(50));
        assert!(!r.contains(49));
        assert!(!r.contains(51));

        // (10.5, 20.0) holds 11..=19
        let r = ValueRange::<u8>::from_f64_bounds(10.5, false, 20.0, false).unwrap();
        assert!(!r.contains(10));
        assert!(r.contains(11));
        assert!(r.contains(19));
        assert!(!r.contains(20));

        // bounds outside the kind clamp
        let r = ValueRange::<u8>::from_f64_bounds(-1e9, true, 1e9, true).unwrap();
        assert!(r.contains(0) && r.contains(255));

        // entirely above the kind is empty
        let r = ValueRange::<u8>::from_f64_bounds(300.0, true, 400.0, true).unwrap();
        assert!((0..=255u8).all(|v| !r.contains(v)));
    }

    #[test]
    fn test_nan_handling() {
        let r = ValueRange::point(0.0f32);
        assert!(!r.contains(f32::NAN));
        let r = r.with_nan_included(true);
        assert!(r.contains(f32::NAN));
        // ignored for integer kinds
        assert!(!ValueRange::point(1u8).with_nan_included(true).is_nan_included());
    }

    #[test]
    fn test_byte_table_matches_range() {
        let ranges = [
            ValueRange::new(10u8, true, 20, true).unwrap(),
            ValueRange::new(0u8, false, 255, false).unwrap(),
            ValueRange::point(255u8),
            ValueRange::point(0u8),
        ];
        for range in ranges {
            let nodata = NoData::new(range);
            assert!(nodata.has_table());
            for v in 0..=255u8 {
                assert_eq!(nodata.is_nodata(v), range.contains(v), "value {v} range {range}");
            }
        }
    }

    #[test]
    fn test_no_table_for_wider_kinds() {
        let nodata = NoData::new(ValueRange::point(7u16));
        assert!(!nodata.has_table());
        assert!(nodata.is_nodata(7));
        assert!(!nodata.is_nodata(263));
    }
}
