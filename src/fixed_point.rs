//! 17.14 Fixed-Point Real Numbers
//!
//! The kernel has no floating point, so fractional quantities (load
//! averages, CPU accounting) are kept as signed 32-bit integers scaled
//! by 2^14: 1 sign bit, 17 integer bits and 14 fraction bits.
//!
//! ```text
//!  31 30             14 13            0
//! ┌──┬────────────────┬───────────────┐
//! │S │    integer     │   fraction    │
//! └──┴────────────────┴───────────────┘
//! ```
//!
//! Products and quotients are formed in 64 bits before rescaling, and any
//! result that does not fit the 32-bit word saturates instead of wrapping.

use core::ops::{Add, Div, Mul, Neg, Sub};

/// Number of fraction bits.
pub const FRACTION_BITS: u32 = 14;

/// Raw value of 1.0.
const ONE: i64 = 1 << FRACTION_BITS;

/// Raw value of 0.5.
const HALF: i64 = 1 << (FRACTION_BITS - 1);

/// A 17.14 scaled real number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Real(i32);

impl Real {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE as i32);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);

    /// Reinterpret a raw scaled word.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw scaled word.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert an integer. Values beyond the 17-bit integer range saturate.
    #[inline]
    pub fn from_int(n: i32) -> Self {
        saturate(n as i64 * ONE)
    }

    /// Convert to the nearest integer, ties away from zero.
    #[inline]
    pub fn to_int(self) -> i32 {
        let x = self.0 as i64;
        let biased = if x >= 0 { x + HALF } else { x - HALF };
        (biased / ONE) as i32
    }

    /// Convert to an integer, truncating toward zero.
    #[inline]
    pub fn to_int_trunc(self) -> i32 {
        self.0 / ONE as i32
    }

    /// Add an integer.
    #[inline]
    pub fn add_int(self, n: i32) -> Self {
        saturate(self.0 as i64 + n as i64 * ONE)
    }

    /// Multiply by an integer.
    #[inline]
    pub fn mul_int(self, n: i32) -> Self {
        saturate(self.0 as i64 * n as i64)
    }

    /// Divide by an integer, rounding to nearest.
    #[inline]
    pub fn div_int(self, n: i32) -> Self {
        match n {
            0 => self.div_by_zero(),
            _ => saturate(div_round(self.0 as i64, n as i64)),
        }
    }

    /// Divide, returning `None` for a zero divisor.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        Some(saturate(div_round((self.0 as i64) << FRACTION_BITS, rhs.0 as i64)))
    }

    fn div_by_zero(self) -> Self {
        match self.0 {
            0 => Self::ZERO,
            x if x > 0 => Self::MAX,
            _ => Self::MIN,
        }
    }
}

impl Add for Real {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Real {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Mul for Real {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        saturate(div_round(self.0 as i64 * rhs.0 as i64, ONE))
    }
}

impl Div for Real {
    type Output = Self;

    /// Division by zero saturates toward the sign of the dividend.
    fn div(self, rhs: Self) -> Self {
        self.checked_div(rhs).unwrap_or_else(|| self.div_by_zero())
    }
}

impl Neg for Real {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

/// Clamp a 64-bit intermediate into the 32-bit word.
#[inline]
fn saturate(wide: i64) -> Real {
    Real(wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

/// Integer division rounded to nearest, ties away from zero.
#[inline]
fn div_round(n: i64, d: i64) -> i64 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d.abs() {
        if (n < 0) == (d < 0) {
            q + 1
        } else {
            q - 1
        }
    } else {
        q
    }
}

/// Scale an integer into a real.
pub fn int_to_real(n: i32) -> Real {
    Real::from_int(n)
}

/// Round a real to the nearest integer, ties away from zero.
pub fn real_to_int(x: Real) -> i32 {
    x.to_int()
}

pub fn real_add(x: Real, y: Real) -> Real {
    x + y
}

pub fn real_subtract(x: Real, y: Real) -> Real {
    x - y
}

pub fn real_multiply(x: Real, y: Real) -> Real {
    x * y
}

pub fn real_divide(x: Real, y: Real) -> Real {
    x / y
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Largest integer with an exact representation.
    const INT_MAX: i32 = (1 << 17) - 1;
    const INT_MIN: i32 = -(1 << 17);

    fn real(int: i32, frac_raw: i32) -> Real {
        Real::from_raw(int * (1 << FRACTION_BITS) + frac_raw)
    }

    #[test]
    fn test_int_round_trip() {
        for n in (INT_MIN..=INT_MAX).step_by(97) {
            assert_eq!(real_to_int(int_to_real(n)), n);
        }
        for n in [INT_MIN, -1, 0, 1, INT_MAX] {
            assert_eq!(real_to_int(int_to_real(n)), n);
        }
    }

    #[test]
    fn test_rounding_ties_away_from_zero() {
        let half = 1 << 13;
        assert_eq!(real(2, half).to_int(), 3);
        assert_eq!((-real(2, half)).to_int(), -3);
        assert_eq!(real(2, half - 1).to_int(), 2);
        assert_eq!((-real(2, half - 1)).to_int(), -2);
        assert_eq!(real(2, half).to_int_trunc(), 2);
    }

    #[test]
    fn test_add_subtract() {
        let a = int_to_real(7);
        let b = real(1, 1 << 13);
        assert_eq!(real_add(a, b), real(8, 1 << 13));
        assert_eq!(real_subtract(a, b), real(5, 1 << 13));
    }

    #[test]
    fn test_multiply_does_not_wrap() {
        // 300 * 200: the raw product is ~1.6e13, far beyond 32 bits.
        let x = int_to_real(300);
        let y = int_to_real(200);
        assert_eq!(real_to_int(real_multiply(x, y)), 60_000);
        assert_eq!(real_to_int(real_multiply(-x, y)), -60_000);
    }

    #[test]
    fn test_multiply_fractions() {
        // 2.5 * 0.5 = 1.25
        let x = real(2, 1 << 13);
        let y = real(0, 1 << 13);
        assert_eq!(real_multiply(x, y), real(1, 1 << 12));
    }

    #[test]
    fn test_divide_keeps_fraction() {
        // 1 / 3 keeps 14 fraction bits: 16384 / 3 = 5461.33
        let third = real_divide(int_to_real(1), int_to_real(3));
        assert_eq!(third.raw(), 5461);
        // 59 / 60, the load-average decay factor
        let decay = real_divide(int_to_real(59), int_to_real(60));
        assert_eq!(decay.raw(), 16111);
    }

    #[test]
    fn test_multiply_divide_precision() {
        let xs = [
            real(-1000, 4096),
            real(-3, 8192),
            Real::from_raw(17),
            Real::ONE,
            real(77, 12_345),
            real(1234, 8192),
        ];
        let ys = [Real::ONE, real(1, 8192), int_to_real(3), real(10, 4096), int_to_real(100)];
        for &x in &xs {
            for &y in &ys {
                let back = real_divide(real_multiply(x, y), y);
                assert!(
                    (back.raw() - x.raw()).abs() <= 1,
                    "x={:?} y={:?} back={:?}",
                    x,
                    y,
                    back
                );
            }
        }
    }

    #[test]
    fn test_saturation() {
        assert_eq!(int_to_real(INT_MAX + 10), Real::MAX);
        assert_eq!(int_to_real(i32::MIN), Real::MIN);
        assert_eq!(real_multiply(int_to_real(100_000), int_to_real(100_000)), Real::MAX);
        assert_eq!(real_add(Real::MAX, Real::ONE), Real::MAX);
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(int_to_real(5).checked_div(Real::ZERO), None);
        assert_eq!(real_divide(int_to_real(5), Real::ZERO), Real::MAX);
        assert_eq!(real_divide(int_to_real(-5), Real::ZERO), Real::MIN);
        assert_eq!(real_divide(Real::ZERO, Real::ZERO), Real::ZERO);
        assert_eq!(int_to_real(5).div_int(0), Real::MAX);
    }

    #[test]
    fn test_mixed_integer_ops() {
        let x = real(2, 1 << 13);
        assert_eq!(x.mul_int(3), real(7, 1 << 13));
        assert_eq!(x.div_int(2), real(1, 1 << 12));
        assert_eq!(x.add_int(-3), -real(0, 1 << 13));
    }
}
