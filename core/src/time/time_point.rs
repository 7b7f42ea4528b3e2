// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{domain::DomainType, meter::Meter};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A snapshot of the transport: where it is, which meter is in effect, and
/// whether it's running. The scheduling core receives one of these on every
/// step.
///
/// Successive [TimePoint]s are not required to increase. Seeks, loops, and
/// pauses all show up as discontinuities that the gates in
/// [crate::gates] detect.
#[derive(Clone, Copy, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
pub struct TimePoint {
    tick: f64,
    meter: Meter,
    #[derivative(Default(value = "true"))]
    transport_running: bool,
}
impl Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {:.4} (bar {:.4} in {}){}",
            self.tick,
            self.bar(),
            self.meter,
            if self.transport_running {
                ""
            } else {
                " [paused]"
            }
        )
    }
}
#[allow(missing_docs)]
impl TimePoint {
    pub fn new_with(tick: f64, meter: Meter, transport_running: bool) -> Self {
        Self {
            tick,
            meter,
            transport_running,
        }
    }

    /// A running transport at the given tick in common time.
    pub fn new_with_tick(tick: f64) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    pub fn tick(&self) -> f64 {
        self.tick
    }

    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    pub fn transport_running(&self) -> bool {
        self.transport_running
    }

    /// The fractional bar position. Bar 0 starts at tick 0.
    pub fn bar(&self) -> f64 {
        self.meter.ticks2bars(self.tick)
    }

    /// The fractional beat position counted from tick 0.
    pub fn absolute_beat(&self) -> f64 {
        self.meter.ticks2beats(self.tick)
    }

    /// The fractional beat position within the current bar.
    pub fn relative_beat(&self) -> f64 {
        self.meter.ticks2beats(self.tick - self.bar_start_tick())
    }

    /// The tick at which the current bar started.
    pub fn bar_start_tick(&self) -> f64 {
        self.meter.bars2ticks(self.bar().floor())
    }

    /// The position expressed in the given domain.
    pub fn get(&self, domain: DomainType) -> f64 {
        match domain {
            DomainType::Ticks => self.tick,
            DomainType::Beats => self.absolute_beat(),
            DomainType::Bars => self.bar(),
        }
    }

    pub fn with_tick(&self, tick: f64) -> Self {
        Self { tick, ..*self }
    }

    pub fn with_meter(&self, meter: Meter) -> Self {
        Self { meter, ..*self }
    }

    pub fn with_transport_running(&self, transport_running: bool) -> Self {
        Self {
            transport_running,
            ..*self
        }
    }

    /// Moves forward (or backward, if negative) by the given number of ticks.
    pub fn incremented(&self, delta_ticks: f64) -> Self {
        self.with_tick(self.tick + delta_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn default_is_running_at_zero_in_common_time() {
        let t = TimePoint::default();
        assert_eq!(t.tick(), 0.0);
        assert_eq!(*t.meter(), Meter::COMMON_TIME);
        assert!(t.transport_running());
    }

    #[test]
    fn derived_positions_follow_the_meter() {
        let t = TimePoint::new_with(10.5, Meter::new_with(3, 4).unwrap(), true);
        assert_eq!(t.bar(), 3.5);
        assert_eq!(t.absolute_beat(), 10.5);
        assert_eq!(t.bar_start_tick(), 9.0);
        assert_eq!(t.relative_beat(), 1.5);
        assert_eq!(t.get(DomainType::Ticks), 10.5);

        let t = t.with_meter(Meter::new_with(6, 8).unwrap());
        assert_eq!(t.bar(), 3.5);
        assert_eq!(t.absolute_beat(), 21.0);
        assert!(approx_eq!(f64, t.relative_beat(), 3.0, epsilon = 1e-12));
    }

    #[test]
    fn modifiers_leave_other_fields_alone() {
        let t = TimePoint::new_with_tick(2.0).with_transport_running(false);
        let moved = t.incremented(-0.5);
        assert_eq!(moved.tick(), 1.5);
        assert!(!moved.transport_running());
        assert_eq!(moved.meter(), t.meter());
        assert!(t.to_string().ends_with("[paused]"));
    }
}
