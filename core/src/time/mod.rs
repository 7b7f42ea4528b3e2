// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Exact and domain-tagged representations of musical time.

pub use domain::{DomainDuration, DomainTimePoint, DomainType, TimeDomainError};
pub use fraction::Fraction;
pub use meter::Meter;
pub use time_point::TimePoint;

mod domain;
mod fraction;
mod meter;
mod time_point;
