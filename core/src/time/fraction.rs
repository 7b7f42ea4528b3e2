// Copyright (c) 2023 Mike Tsao. All rights reserved.

use anyhow::{anyhow, Error};
use core::{
    cmp::Ordering,
    fmt::{self, Display},
    ops::{Add, Div, Mul, Neg, Sub},
};
use serde::{Deserialize, Serialize};

/// An exact rational number. The denominator is always positive and the
/// fraction is always stored in lowest terms, so two equal values always have
/// identical representations.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "FractionParts")]
pub struct Fraction {
    n: i64,
    d: i64,
}
#[derive(Deserialize)]
struct FractionParts {
    n: i64,
    d: i64,
}
impl TryFrom<FractionParts> for Fraction {
    type Error = Error;

    fn try_from(parts: FractionParts) -> Result<Self, Self::Error> {
        Self::new_with(parts.n, parts.d)
    }
}
impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}
#[allow(missing_docs)]
impl Fraction {
    pub const ZERO: Fraction = Fraction { n: 0, d: 1 };
    pub const ONE: Fraction = Fraction { n: 1, d: 1 };

    /// Creates a new [Fraction] n/d. Fails if d is zero.
    pub fn new_with(n: i64, d: i64) -> anyhow::Result<Self, Error> {
        Self::reduced(n as i128, d as i128)
    }

    /// A whole number.
    pub const fn new_with_integer(n: i64) -> Self {
        Self { n, d: 1 }
    }

    // Reduces in i128 and then narrows, so intermediate products can't
    // overflow. Fails only if the reduced value doesn't fit in i64.
    fn reduced(n: i128, d: i128) -> anyhow::Result<Self, Error> {
        if d == 0 {
            return Err(anyhow!("Fraction denominator can't be zero."));
        }
        let (n, d) = if d < 0 { (-n, -d) } else { (n, d) };
        let divisor = gcd(n.unsigned_abs(), d.unsigned_abs()).max(1) as i128;
        let (n, d) = (n / divisor, d / divisor);
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(n), Ok(d)) => Ok(Self { n, d }),
            _ => Err(anyhow!("Fraction {n}/{d} is out of range.")),
        }
    }

    // The operators panic on overflow, as integer arithmetic does.
    fn reduced_or_panic(n: i128, d: i128) -> Self {
        match Self::reduced(n, d) {
            Ok(f) => f,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn checked_add(&self, rhs: &Self) -> anyhow::Result<Self, Error> {
        let (a, b, c, d) = self.widened(rhs);
        Self::reduced(a * d + c * b, b * d)
    }

    pub fn checked_sub(&self, rhs: &Self) -> anyhow::Result<Self, Error> {
        let (a, b, c, d) = self.widened(rhs);
        Self::reduced(a * d - c * b, b * d)
    }

    pub fn checked_mul(&self, rhs: &Self) -> anyhow::Result<Self, Error> {
        let (a, b, c, d) = self.widened(rhs);
        Self::reduced(a * c, b * d)
    }

    /// Fails on division by zero as well as on overflow.
    pub fn checked_div(&self, rhs: &Self) -> anyhow::Result<Self, Error> {
        if rhs.is_zero() {
            return Err(anyhow!("Can't divide a Fraction by zero."));
        }
        let (a, b, c, d) = self.widened(rhs);
        Self::reduced(a * d, b * c)
    }

    pub fn checked_neg(&self) -> anyhow::Result<Self, Error> {
        Self::reduced(-(self.n as i128), self.d as i128)
    }

    fn widened(&self, rhs: &Self) -> (i128, i128, i128, i128) {
        (
            self.n as i128,
            self.d as i128,
            rhs.n as i128,
            rhs.d as i128,
        )
    }

    pub const fn numerator(&self) -> i64 {
        self.n
    }

    pub const fn denominator(&self) -> i64 {
        self.d
    }

    pub fn as_f64(&self) -> f64 {
        self.n as f64 / self.d as f64
    }

    pub fn is_zero(&self) -> bool {
        self.n == 0
    }

    /// The multiplicative inverse. Fails for zero.
    pub fn recip(&self) -> anyhow::Result<Self, Error> {
        Self::new_with(self.d, self.n)
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.n, self.d)
    }
}
impl From<i64> for Fraction {
    fn from(value: i64) -> Self {
        Self::new_with_integer(value)
    }
}
impl From<Fraction> for f64 {
    fn from(value: Fraction) -> Self {
        value.as_f64()
    }
}
// Cross-multiplied in i128 so that neither precision nor range is lost.
impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Fraction {}
impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.n as i128 * other.d as i128).cmp(&(other.n as i128 * self.d as i128))
    }
}
impl Add for Fraction {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let (a, b, c, d) = self.widened(&rhs);
        Self::reduced_or_panic(a * d + c * b, b * d)
    }
}
impl Sub for Fraction {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let (a, b, c, d) = self.widened(&rhs);
        Self::reduced_or_panic(a * d - c * b, b * d)
    }
}
impl Mul for Fraction {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let (a, b, c, d) = self.widened(&rhs);
        Self::reduced_or_panic(a * c, b * d)
    }
}
impl Mul<i64> for Fraction {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::reduced_or_panic(self.n as i128 * rhs as i128, self.d as i128)
    }
}
impl Div for Fraction {
    type Output = Self;

    /// Panics on division by zero, like integer division does.
    fn div(self, rhs: Self) -> Self::Output {
        assert!(rhs.n != 0, "attempt to divide a Fraction by zero");
        let (a, b, c, d) = self.widened(&rhs);
        Self::reduced_or_panic(a * d, b * c)
    }
}
impl Neg for Fraction {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::reduced_or_panic(-(self.n as i128), self.d as i128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_are_reduced_with_positive_denominator() {
        let f = Fraction::new_with(6, -8).unwrap();
        assert_eq!(f.numerator(), -3);
        assert_eq!(f.denominator(), 4);
        assert_eq!(f.to_string(), "-3/4");

        let zero = Fraction::new_with(0, -5).unwrap();
        assert_eq!(zero, Fraction::ZERO);
        assert_eq!(zero.denominator(), 1);
    }

    #[test]
    fn zero_denominator_is_rejected() {
        assert!(Fraction::new_with(1, 0).is_err());
        assert!(Fraction::ZERO.recip().is_err());
        assert!(serde_json::from_str::<Fraction>(r#"{"n": 1, "d": 0}"#).is_err());
        assert_eq!(
            serde_json::from_str::<Fraction>(r#"{"n": 2, "d": -4}"#).unwrap(),
            Fraction::new_with(-1, 2).unwrap()
        );
    }

    #[test]
    fn comparison_does_not_lose_precision() {
        // These two differ by far less than f64 can represent near 1.0.
        let a = Fraction::new_with(i64::MAX - 1, i64::MAX).unwrap();
        let b = Fraction::new_with(i64::MAX - 2, i64::MAX - 1).unwrap();
        assert_eq!(a.as_f64(), b.as_f64());
        assert!(a > b);
        assert_ne!(a, b);
    }

    #[test]
    fn arithmetic_is_exact() {
        let third = Fraction::new_with(1, 3).unwrap();
        let sixth = Fraction::new_with(1, 6).unwrap();
        assert_eq!(third + sixth, Fraction::new_with(1, 2).unwrap());
        assert_eq!(third - sixth, sixth);
        assert_eq!(third * sixth, Fraction::new_with(1, 18).unwrap());
        assert_eq!(third / sixth, Fraction::from(2));
        assert_eq!(-third * 3, Fraction::from(-1));
        assert_eq!(sixth.recip().unwrap(), Fraction::from(6));
    }

    #[test]
    fn large_denominators_do_not_overflow() {
        // Both denominators are just above sqrt(i64::MAX), so their product
        // doesn't fit in i64.
        let a = Fraction::new_with(1, 3_037_000_500).unwrap();
        let b = Fraction::new_with(1, 6_074_001_000).unwrap();
        assert_eq!(a + b, Fraction::new_with(3, 6_074_001_000).unwrap());
        assert_eq!(a - b, b);
        assert_eq!(a / b, Fraction::from(2));
        assert_eq!(a.checked_add(&b).unwrap(), a + b);

        // Here the reduced sum itself is out of range.
        let c = Fraction::new_with(1, 3_037_000_501).unwrap();
        assert!(a.checked_add(&c).is_err());
        assert!(a.checked_mul(&c).is_err());
        assert!(a.checked_div(&Fraction::ZERO).is_err());

        let min = Fraction::new_with_integer(i64::MIN);
        assert!(min.checked_neg().is_err());
        assert_eq!(
            Fraction::new_with_integer(i64::MAX).checked_neg().unwrap(),
            Fraction::new_with_integer(-i64::MAX)
        );
    }

    #[test]
    #[should_panic]
    fn out_of_range_operators_panic() {
        let a = Fraction::new_with(1, 3_037_000_500).unwrap();
        let c = Fraction::new_with(1, 3_037_000_501).unwrap();
        let _ = a * c;
    }
}
