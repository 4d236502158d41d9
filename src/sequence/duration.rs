// Duration - Exact rational time value
// All engine arithmetic is exact; floating point would let zero-duration
// groups slip through equality checks.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use num_rational::Ratio;
use num_traits::{Signed, Zero};

/// An exact rational amount of musical time.
///
/// The unit is a whole note: `Duration::new(1, 4)` is a quarter note.
/// Supports addition, subtraction, comparison, exact floor division with
/// remainder, and snapping to a grid. Event deltas are always >= 0;
/// intermediate arithmetic (remaining-time computations) may go negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Duration(Ratio<i64>);

impl Duration {
    /// Creates a duration from an integer numerator and denominator.
    ///
    /// Panics if `den` is zero.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "Duration denominator must be non-zero");
        Self(Ratio::new(num, den))
    }

    /// The zero duration.
    pub fn zero() -> Self {
        Self(Ratio::zero())
    }

    /// Numerator of the reduced fraction.
    pub fn numer(&self) -> i64 {
        *self.0.numer()
    }

    /// Denominator of the reduced fraction (always positive).
    pub fn denom(&self) -> i64 {
        *self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Exact floor division with remainder.
    ///
    /// Returns `(q, r)` such that `self == rhs * q + r` and `0 <= r < rhs`.
    /// Panics if `rhs` is not positive.
    pub fn div_rem(self, rhs: Self) -> (i64, Self) {
        assert!(rhs.is_positive(), "div_rem divisor must be positive");
        let q = (self.0 / rhs.0).floor().to_integer();
        let r = self - rhs * q;
        (q, r)
    }

    /// Snaps to the nearest multiple of `grid`; ties round up.
    ///
    /// Panics if `grid` is not positive.
    pub fn snap_to(self, grid: Self) -> Self {
        let (q, r) = self.div_rem(grid);
        if r + r >= grid { grid * (q + 1) } else { grid * q }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Duration {
    fn from(whole: i64) -> Self {
        Self(Ratio::from_integer(whole))
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Duration {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * Ratio::from_integer(rhs))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}
