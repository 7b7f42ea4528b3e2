// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{meter::Meter, time_point::TimePoint};
use crate::transport_locked::EPSILON;
use core::{
    cmp::Ordering,
    fmt::{self, Display},
    ops::Mul,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumCount, EnumIter, IntoStaticStr};
use thiserror::Error;

/// The unit in which a position or duration is expressed. Ticks are quarter
/// notes; beats and bars depend on the active [Meter].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    IntoStaticStr,
    StrumDisplay,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DomainType {
    /// Quarter notes.
    #[default]
    Ticks,
    /// Beats of the active meter.
    Beats,
    /// Bars of the active meter.
    Bars,
}

/// Raised when values from different [DomainType]s are combined without a
/// [Meter] to reconcile them. This is a configuration error on the caller's
/// side, not something to retry.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TimeDomainError {
    /// The operation needed a value in `expected` but got one in `found`.
    #[error("expected a value in {expected}, but found one in {found}")]
    Mismatch {
        #[allow(missing_docs)]
        expected: DomainType,
        #[allow(missing_docs)]
        found: DomainType,
    },
    /// A grid computation received NaN or an infinity.
    #[error("time value is not finite")]
    NotFinite,
    /// A grid's period must be greater than zero.
    #[error("grid period must be positive")]
    NonPositivePeriod,
}
impl TimeDomainError {
    /// Returns Ok if the two domains are the same.
    pub fn check(expected: DomainType, found: DomainType) -> Result<(), TimeDomainError> {
        if expected == found {
            Ok(())
        } else {
            Err(TimeDomainError::Mismatch { expected, found })
        }
    }
}

/// A transport position expressed in a particular [DomainType].
///
/// Two [DomainTimePoint]s can be compared only if they share a domain. The
/// [PartialOrd] implementation returns None otherwise; convert one of them
/// with [DomainTimePoint::as_type()] first.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainTimePoint {
    value: f64,
    domain: DomainType,
}
impl Display for DomainTimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.domain)
    }
}
impl PartialEq for DomainTimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.value == other.value
    }
}
impl PartialOrd for DomainTimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.domain == other.domain {
            self.value.partial_cmp(&other.value)
        } else {
            None
        }
    }
}
#[allow(missing_docs)]
impl DomainTimePoint {
    pub const fn new_with(value: f64, domain: DomainType) -> Self {
        Self { value, domain }
    }

    pub const fn ticks(value: f64) -> Self {
        Self::new_with(value, DomainType::Ticks)
    }

    pub const fn beats(value: f64) -> Self {
        Self::new_with(value, DomainType::Beats)
    }

    pub const fn bars(value: f64) -> Self {
        Self::new_with(value, DomainType::Bars)
    }

    /// The position of `time` in the given domain.
    pub fn from_time_point(time: &TimePoint, domain: DomainType) -> Self {
        Self::new_with(time.get(domain), domain)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn domain(&self) -> DomainType {
        self.domain
    }

    /// Converts to another domain using the given meter.
    pub fn as_type(&self, domain: DomainType, meter: &Meter) -> Self {
        Self::new_with(meter.convert(self.value, self.domain, domain), domain)
    }

    pub fn checked_add(&self, duration: &DomainDuration) -> Result<Self, TimeDomainError> {
        TimeDomainError::check(self.domain, duration.domain())?;
        Ok(Self::new_with(self.value + duration.value(), self.domain))
    }

    pub fn checked_sub(&self, duration: &DomainDuration) -> Result<Self, TimeDomainError> {
        TimeDomainError::check(self.domain, duration.domain())?;
        Ok(Self::new_with(self.value - duration.value(), self.domain))
    }

    /// The signed duration from `earlier` to self.
    pub fn checked_distance(&self, earlier: &Self) -> Result<DomainDuration, TimeDomainError> {
        TimeDomainError::check(self.domain, earlier.domain)?;
        Ok(DomainDuration::new_with(
            self.value - earlier.value,
            self.domain,
        ))
    }

    /// Adds a duration of any domain. The result is in self's domain.
    pub fn add_with_meter(&self, duration: &DomainDuration, meter: &Meter) -> Self {
        Self::new_with(
            self.value + duration.as_type(self.domain, meter).value(),
            self.domain,
        )
    }

    /// Whether `time` has reached (or passed) this point. Comparison happens
    /// in this point's domain, through the meter that `time` carries, and
    /// tolerates floating-point error up to [EPSILON].
    pub fn has_elapsed(&self, time: &TimePoint) -> bool {
        time.get(self.domain) + EPSILON >= self.value
    }
}

/// A length of time expressed in a particular [DomainType].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainDuration {
    value: f64,
    domain: DomainType,
}
impl Default for DomainDuration {
    fn default() -> Self {
        Self::ticks(1.0)
    }
}
impl Display for DomainDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.domain)
    }
}
impl PartialEq for DomainDuration {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.value == other.value
    }
}
impl PartialOrd for DomainDuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.domain == other.domain {
            self.value.partial_cmp(&other.value)
        } else {
            None
        }
    }
}
impl Mul<f64> for DomainDuration {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new_with(self.value * rhs, self.domain)
    }
}
#[allow(missing_docs)]
impl DomainDuration {
    pub const fn new_with(value: f64, domain: DomainType) -> Self {
        Self { value, domain }
    }

    pub const fn ticks(value: f64) -> Self {
        Self::new_with(value, DomainType::Ticks)
    }

    pub const fn beats(value: f64) -> Self {
        Self::new_with(value, DomainType::Beats)
    }

    pub const fn bars(value: f64) -> Self {
        Self::new_with(value, DomainType::Bars)
    }

    pub const fn zero(domain: DomainType) -> Self {
        Self::new_with(0.0, domain)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn domain(&self) -> DomainType {
        self.domain
    }

    /// Converts to another domain using the given meter.
    pub fn as_type(&self, domain: DomainType, meter: &Meter) -> Self {
        Self::new_with(meter.convert(self.value, self.domain, domain), domain)
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, TimeDomainError> {
        TimeDomainError::check(self.domain, other.domain)?;
        Ok(Self::new_with(self.value + other.value, self.domain))
    }
}
