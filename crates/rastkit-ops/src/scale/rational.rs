//! Exact rational coordinate mapping.
//!
//! Scale and translation are approximated once as [`Rational`]s. The source
//! coordinate of destination pixel `d` is then `(a + d * b) / c` for integers
//! `a`, `b`, `c`, and an [`AxisSteps`] walks it one pixel at a time by adding
//! `b`, folding fractional overflow into the integer part. Nothing is ever
//! recomputed by multiplication, so there is no drift over wide images.

use std::fmt;

/// Reduced fraction `num / den` with `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    num: i64,
    den: i64,
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Rational {
    /// Denominator bound used for scale and translation parameters.
    pub const MAX_DENOMINATOR: i64 = 1 << 16;

    /// Zero.
    pub const ZERO: Rational = Rational { num: 0, den: 1 };

    /// Creates a reduced fraction, `None` for a zero denominator.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num as i128, den as i128);
        let (mut n, mut d) = (num as i128 / g, den as i128 / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        Some(Self {
            num: i64::try_from(n).ok()?,
            den: i64::try_from(d).ok()?,
        })
    }

    /// Whole number.
    pub const fn integer(v: i64) -> Self {
        Self { num: v, den: 1 }
    }

    /// Best continued-fraction convergent of `value` with `den <= max_den`.
    ///
    /// Returns `None` for non-finite or out-of-range values.
    pub fn approximate(value: f64, max_den: i64) -> Option<Self> {
        if !value.is_finite() || value.abs() >= (1u64 << 52) as f64 || max_den < 1 {
            return None;
        }
        let (mut h1, mut h2) = (1i128, 0i128);
        let (mut k1, mut k2) = (0i128, 1i128);
        let mut x = value;
        for _ in 0..64 {
            let a = x.floor();
            let ai = a as i128;
            let h = ai * h1 + h2;
            let k = ai * k1 + k2;
            if k > max_den as i128 {
                break;
            }
            (h2, h1) = (h1, h);
            (k2, k1) = (k1, k);
            let frac = x - a;
            if frac <= 1e-12 || (h as f64 / k as f64 - value).abs() <= f64::EPSILON * value.abs() {
                break;
            }
            x = 1.0 / frac;
        }
        Self::new(i64::try_from(h1).ok()?, i64::try_from(k1).ok()?)
    }

    /// Approximation with [`MAX_DENOMINATOR`](Self::MAX_DENOMINATOR).
    pub fn from_f64(value: f64) -> Option<Self> {
        Self::approximate(value, Self::MAX_DENOMINATOR)
    }

    /// Numerator.
    pub fn num(&self) -> i64 {
        self.num
    }

    /// Denominator, always positive.
    pub fn den(&self) -> i64 {
        self.den
    }

    /// Nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Largest integer not above the value.
    pub fn floor(&self) -> i64 {
        self.num.div_euclid(self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Destination-to-source mapping along one axis: `src(d) = (a + d * b) / c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMap {
    a: i128,
    b: i128,
    c: i128,
}

impl AxisMap {
    /// Maps pixel centers: `src = (d + 0.5 - trans) / scale`.
    ///
    /// With `bilinear` the result is shifted by `-0.5` so the integer part is
    /// the upper-left interpolation corner. `scale` must be positive.
    pub fn new(scale: Rational, trans: Rational, bilinear: bool) -> Self {
        let (sn, sd) = (scale.num as i128, scale.den as i128);
        let (tn, td) = (trans.num as i128, trans.den as i128);
        let mut a = (td - 2 * tn) * sd;
        let mut b = 2 * td * sd;
        let mut c = 2 * td * sn;
        if bilinear {
            a = 2 * a - c;
            b *= 2;
            c *= 2;
        }
        let g = gcd(gcd(a, b), c).max(1);
        Self {
            a: a / g,
            b: b / g,
            c: c / g,
        }
    }

    /// Integer part and fractional numerator of `src(d)`, computed directly.
    pub fn position(&self, d: i64) -> (i64, i128) {
        let n = self.a + d as i128 * self.b;
        (n.div_euclid(self.c) as i64, n.rem_euclid(self.c))
    }

    /// Denominator of the fractional part.
    pub fn denominator(&self) -> i128 {
        self.c
    }

    /// Incremental walk starting at destination coordinate `start`.
    pub fn steps(&self, start: i64) -> AxisSteps {
        let (int, frac) = self.position(start);
        AxisSteps {
            int,
            frac,
            step_int: self.b.div_euclid(self.c) as i64,
            step_frac: self.b.rem_euclid(self.c),
            den: self.c,
        }
    }
}

/// Iterator of `(source integer, fractional numerator)` pairs.
#[derive(Debug, Clone)]
pub struct AxisSteps {
    int: i64,
    frac: i128,
    step_int: i64,
    step_frac: i128,
    den: i128,
}

impl Iterator for AxisSteps {
    type Item = (i64, i128);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let current = (self.int, self.frac);
        self.int += self.step_int;
        self.frac += self.step_frac;
        if self.frac >= self.den {
            self.frac -= self.den;
            self.int += 1;
        }
        Some(current)
    }
}
