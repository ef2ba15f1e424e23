//! Numeric sample kinds and the [`Sample`] trait.
//!
//! Every kernel in rastkit is generic over the storage type of its samples.
//! Six primitive kinds are supported:
//!
//! | Kind  | Rust type | Range                         |
//! |-------|-----------|-------------------------------|
//! | `U8`  | `u8`      | 0 ..= 255                     |
//! | `U16` | `u16`     | 0 ..= 65535                   |
//! | `S16` | `i16`     | -32768 ..= 32767              |
//! | `S32` | `i32`     | -2^31 ..= 2^31 - 1            |
//! | `F32` | `f32`     | ±3.4e38                       |
//! | `F64` | `f64`     | ±1.8e308                      |
//!
//! Conversions from `f64` saturate and round to nearest; they never wrap.
//!
//! # Example
//!
//! ```rust
//! use rastkit_core::{Sample, SampleKind};
//!
//! assert_eq!(u8::from_f64(300.0), 255);
//! assert_eq!(u8::from_f64(-4.0), 0);
//! assert_eq!(i16::from_f64(12.5), 13);
//! assert_eq!(u8::KIND, SampleKind::U8);
//! assert_eq!(SampleKind::U16.clamp_round(70000.0), 65535.0);
//! ```

use crate::{AnyRaster, AnyRasterMut, RasterView, RasterViewMut};

/// Runtime tag for one of the six supported sample types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleKind {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    S16,
    /// 32-bit signed integer.
    S32,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl SampleKind {
    /// All kinds, in declaration order.
    pub const ALL: [SampleKind; 6] = [
        SampleKind::U8,
        SampleKind::U16,
        SampleKind::S16,
        SampleKind::S32,
        SampleKind::F32,
        SampleKind::F64,
    ];

    /// Number of bits per sample.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 | Self::S16 => 16,
            Self::S32 | Self::F32 => 32,
            Self::F64 => 64,
        }
    }

    /// Whether negative values are representable.
    #[inline]
    pub const fn is_signed(&self) -> bool {
        !matches!(self, Self::U8 | Self::U16)
    }

    /// Whether this is a floating-point kind.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Smallest representable value.
    #[inline]
    pub const fn min_value(&self) -> f64 {
        match self {
            Self::U8 | Self::U16 => 0.0,
            Self::S16 => i16::MIN as f64,
            Self::S32 => i32::MIN as f64,
            Self::F32 => f32::MIN as f64,
            Self::F64 => f64::MIN,
        }
    }

    /// Largest representable value.
    #[inline]
    pub const fn max_value(&self) -> f64 {
        match self {
            Self::U8 => u8::MAX as f64,
            Self::U16 => u16::MAX as f64,
            Self::S16 => i16::MAX as f64,
            Self::S32 => i32::MAX as f64,
            Self::F32 => f32::MAX as f64,
            Self::F64 => f64::MAX,
        }
    }

    /// Clamps `v` into this kind's range, rounding to nearest for integers.
    ///
    /// NaN maps to 0 for integer kinds and stays NaN for float kinds.
    #[inline]
    pub fn clamp_round(&self, v: f64) -> f64 {
        if self.is_float() {
            if v.is_nan() {
                return v;
            }
            return v.clamp(self.min_value(), self.max_value());
        }
        if v.is_nan() {
            return 0.0;
        }
        v.round().clamp(self.min_value(), self.max_value())
    }

    /// Divisor normalizing an alpha sample of this kind to `[0, 1]`.
    ///
    /// Signed 16-bit alpha uses `i16::MAX`, not the unsigned range.
    #[inline]
    pub const fn alpha_divisor(&self) -> f64 {
        match self {
            Self::U8 => 255.0,
            Self::U16 => 65535.0,
            Self::S16 => i16::MAX as f64,
            Self::S32 => i32::MAX as f64,
            Self::F32 | Self::F64 => 1.0,
        }
    }

    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl std::fmt::Display for SampleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Storage type of raster samples.
///
/// Implemented for `u8`, `u16`, `i16`, `i32`, `f32` and `f64`. Kernels are
/// written once against this trait and monomorphized per kind.
pub trait Sample: Copy + PartialOrd + Default + Send + Sync + std::fmt::Debug + 'static {
    /// Runtime tag of this type.
    const KIND: SampleKind;

    /// Whether this is a floating-point type.
    const IS_FLOAT: bool;

    /// Smallest representable value.
    const MIN: Self;

    /// Largest representable value.
    const MAX: Self;

    /// Value used to fill border-extended samples.
    ///
    /// This is the minimum representable value. Kernels never rely on it to
    /// detect missing data; coverage is tested geometrically.
    const BORDER_FILL: Self;

    /// Widens to `f64` (exact for all integer kinds).
    fn to_f64(self) -> f64;

    /// Narrows from `f64`, saturating and rounding to nearest.
    fn from_f64(v: f64) -> Self;

    /// Widens to `i64` for fixed-point arithmetic; floats truncate.
    fn to_i64(self) -> i64;

    /// Index into a 256-entry lookup table, for byte data only.
    #[inline]
    fn lut_index(self) -> Option<usize> {
        None
    }

    /// Returns `true` for NaN samples.
    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    /// Typed view out of a tagged view, `None` if the kind differs.
    fn from_any<'a>(raster: &AnyRaster<'a>) -> Option<RasterView<'a, Self>>;

    /// Typed mutable view out of a tagged one, `None` if the kind differs.
    fn from_any_mut<'r, 'a>(raster: &'r mut AnyRasterMut<'a>) -> Option<&'r mut RasterViewMut<'a, Self>>;
}

macro_rules! impl_downcast {
    ($kind:ident) => {
        #[inline]
        fn from_any<'a>(raster: &AnyRaster<'a>) -> Option<RasterView<'a, Self>> {
            match raster {
                AnyRaster::$kind(v) => Some(v.clone()),
                _ => None,
            }
        }

        #[inline]
        fn from_any_mut<'r, 'a>(
            raster: &'r mut AnyRasterMut<'a>,
        ) -> Option<&'r mut RasterViewMut<'a, Self>> {
            match raster {
                AnyRasterMut::$kind(v) => Some(v),
                _ => None,
            }
        }
    };
}

macro_rules! impl_int_sample {
    ($t:ty, $kind:ident) => {
        impl Sample for $t {
            const KIND: SampleKind = SampleKind::$kind;
            const IS_FLOAT: bool = false;
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const BORDER_FILL: Self = <$t>::MIN;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                if v.is_nan() {
                    return 0;
                }
                v.round().clamp(<$t>::MIN as f64, <$t>::MAX as f64) as $t
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            impl_downcast!($kind);
        }
    };
}

macro_rules! impl_float_sample {
    ($t:ty, $kind:ident) => {
        impl Sample for $t {
            const KIND: SampleKind = SampleKind::$kind;
            const IS_FLOAT: bool = true;
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const BORDER_FILL: Self = <$t>::MIN;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                if v.is_nan() {
                    return <$t>::NAN;
                }
                v.clamp(<$t>::MIN as f64, <$t>::MAX as f64) as $t
            }

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            impl_downcast!($kind);
        }
    };
}

impl_int_sample!(u16, U16);
impl_int_sample!(i16, S16);
impl_int_sample!(i32, S32);
impl_float_sample!(f32, F32);
impl_float_sample!(f64, F64);

impl Sample for u8 {
    const KIND: SampleKind = SampleKind::U8;
    const IS_FLOAT: bool = false;
    const MIN: Self = 0;
    const MAX: Self = 255;
    const BORDER_FILL: Self = 0;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            return 0;
        }
        v.round().clamp(0.0, 255.0) as u8
    }

    #[inline]
    fn to_i64(self) -> i64 {
        self as i64
    }

    #[inline]
    fn lut_index(self) -> Option<usize> {
        Some(self as usize)
    }

    impl_downcast!(U8);
}

/// Reads an unsigned 16-bit sample held in a signed 16-bit slot.
#[inline]
pub fn unsigned_short_from_slot(slot: i16) -> u16 {
    (slot as i32 & 0xFFFF) as u16
}

/// Reads an unsigned 8-bit sample held in a signed 8-bit slot.
#[inline]
pub fn unsigned_byte_from_slot(slot: i8) -> u8 {
    (slot as i32 & 0xFF) as u8
}
