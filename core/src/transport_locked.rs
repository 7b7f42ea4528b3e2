// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Scheduling against a periodic grid that is locked to the transport.
//!
//! A grid is the set of instants `offset + k * period` for every integer `k`,
//! in a single [DomainType]. Floating-point transport positions almost never
//! land exactly on a grid line, and they sometimes land a hair before one, so
//! every decision here is made with an [EPSILON] tolerance. The goal is
//! exactly one event per grid line: never two, never zero.

use crate::{
    phase::Phase,
    time::{DomainDuration, DomainTimePoint, TimeDomainError, TimePoint},
};

/// Positions closer than this are treated as equal.
pub const EPSILON: f64 = 1e-8;

/// Pure functions that compute grid instants. Nothing here keeps state; the
/// caller supplies "now" every time.
///
/// The `*_value` functions work on raw `f64`s in an implied common domain.
/// The [DomainTimePoint] functions insist that point, period, and offset share
/// a domain, and return [TimeDomainError] if they don't. The [TimePoint]
/// functions convert through the time point's meter, so they can't fail; they
/// expect a positive, finite period.
#[derive(Debug)]
pub struct TransportLocked;
impl TransportLocked {
    /// `x` modulo `period`, always in `[0, period)` even when `x` is negative.
    pub fn modulo(x: f64, period: f64) -> f64 {
        let remainder = x.rem_euclid(period);
        // A tiny negative x rounds up to exactly `period`.
        if remainder >= period {
            0.0
        } else {
            remainder
        }
    }

    /// The next grid instant after `t`.
    ///
    /// If `is_first_value` is set and `t` is on a grid line, `t` itself is
    /// returned, so that a freshly started or relocated schedule fires right
    /// away. If `t` is within `epsilon` before a grid line, that line is
    /// considered already reached and the one after it is returned.
    pub fn next_value(t: f64, period: f64, offset: f64, is_first_value: bool, epsilon: f64) -> f64 {
        let remainder = Self::modulo(t - offset, period);
        if is_first_value && remainder < epsilon {
            t - remainder
        } else if period - remainder < epsilon {
            t - remainder + 2.0 * period
        } else {
            t - remainder + period
        }
    }

    /// The fractional position of `t` between two grid lines, in `[0, 1)`.
    pub fn phase_of_value(t: f64, period: f64, offset: f64) -> f64 {
        Self::modulo(t - offset, period) / period
    }

    /// [TransportLocked::next_value()] for a domain-tagged point.
    pub fn next(
        t: &DomainTimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
        is_first_value: bool,
    ) -> Result<DomainTimePoint, TimeDomainError> {
        Self::check_grid(t, period, offset)?;
        Ok(DomainTimePoint::new_with(
            Self::next_value(
                t.value(),
                period.value(),
                offset.value(),
                is_first_value,
                EPSILON,
            ),
            t.domain(),
        ))
    }

    /// [TransportLocked::phase_of_value()] for a domain-tagged point.
    pub fn phase_of(
        t: &DomainTimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
    ) -> Result<Phase, TimeDomainError> {
        Self::check_grid(t, period, offset)?;
        Ok(Phase::new(Self::phase_of_value(
            t.value(),
            period.value(),
            offset.value(),
        )))
    }

    /// The next grid instant after `time`, expressed in the period's domain.
    /// The offset is converted to that domain through the time's meter.
    pub fn next_from_time_point(
        time: &TimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
        is_first_value: bool,
    ) -> DomainTimePoint {
        let domain = period.domain();
        let offset = offset.as_type(domain, time.meter());
        DomainTimePoint::new_with(
            Self::next_value(
                time.get(domain),
                period.value(),
                offset.value(),
                is_first_value,
                EPSILON,
            ),
            domain,
        )
    }

    /// Where `time` sits between two grid lines.
    pub fn phase_of_time_point(
        time: &TimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
    ) -> Phase {
        let domain = period.domain();
        Phase::new(Self::phase_of_value(
            time.get(domain),
            period.value(),
            offset.as_type(domain, time.meter()).value(),
        ))
    }

    /// Schedules the instant after `last_trigger_time`, if that instant is
    /// still ahead of `current_time`. Continuing from the last trigger keeps
    /// the rhythm intact when the grid changes under a running schedule.
    ///
    /// If the continuation is already behind `current_time` (the transport
    /// jumped, or the grid moved too far), the schedule restarts from
    /// `current_time` as if it were the first value. Without a
    /// `last_trigger_time`, it schedules from `current_time` honoring
    /// `is_first_value`.
    pub fn next_from_either(
        last_trigger_time: Option<&DomainTimePoint>,
        current_time: &TimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
        is_first_value: bool,
    ) -> DomainTimePoint {
        let Some(last_trigger_time) = last_trigger_time else {
            return Self::next_from_time_point(current_time, period, offset, is_first_value);
        };

        let domain = period.domain();
        let meter = current_time.meter();
        let continuation = Self::next_value(
            last_trigger_time.as_type(domain, meter).value(),
            period.value(),
            offset.as_type(domain, meter).value(),
            false,
            EPSILON,
        );
        if continuation + EPSILON >= current_time.get(domain) {
            DomainTimePoint::new_with(continuation, domain)
        } else {
            Self::next_from_time_point(current_time, period, offset, true)
        }
    }

    /// Re-aligns a previously scheduled `target` to a grid that has just
    /// changed, by snapping it to the nearest line of the new grid. If that
    /// line is already behind `current_time`, the target is dropped and the
    /// next line after `current_time` is returned instead.
    pub fn adjusted(
        target: &DomainTimePoint,
        current_time: &TimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
    ) -> DomainTimePoint {
        let domain = period.domain();
        let meter = current_time.meter();
        let target = target.as_type(domain, meter).value();
        let offset_value = offset.as_type(domain, meter).value();
        let p = period.value();
        let snapped = offset_value + ((target - offset_value) / p).round() * p;
        if snapped + EPSILON < current_time.get(domain) {
            Self::next_from_time_point(current_time, period, offset, false)
        } else {
            DomainTimePoint::new_with(snapped, domain)
        }
    }

    fn check_grid(
        t: &DomainTimePoint,
        period: &DomainDuration,
        offset: &DomainDuration,
    ) -> Result<(), TimeDomainError> {
        TimeDomainError::check(t.domain(), period.domain())?;
        TimeDomainError::check(t.domain(), offset.domain())?;
        if !(t.value().is_finite() && period.value().is_finite() && offset.value().is_finite())
        {
            return Err(TimeDomainError::NotFinite);
        }
        if period.value() <= 0.0 {
            return Err(TimeDomainError::NonPositivePeriod);
        }
        Ok(())
    }
}
