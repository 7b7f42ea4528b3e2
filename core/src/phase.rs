// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! A position on a circle, normalized to [0, 1).

use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    ops::{Add, Sub},
};
use strum_macros::{Display as StrumDisplay, EnumIter};

/// Which way around the circle a phase moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, StrumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Direction {
    #[allow(missing_docs)]
    Forward,
    #[allow(missing_docs)]
    Backward,
    /// Start and end are (approximately) the same.
    Unchanged,
}

/// A [Phase] is a wraparound value in [0, 1). Adding 0.25 to 0.875 gives
/// 0.125.
///
/// Directions are never stored. They are derived from two phases by taking
/// the shorter way around the circle, so a move from 0.9 to 0.1 is forward
/// (0.2 of travel, wrapping through zero), not backward (0.8 of travel).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Phase(f64);
impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
impl From<f64> for Phase {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}
impl From<Phase> for f64 {
    fn from(value: Phase) -> Self {
        value.0
    }
}
impl Add<f64> for Phase {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        Self::new(self.0 + rhs)
    }
}
impl Sub<f64> for Phase {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self::Output {
        Self::new(self.0 - rhs)
    }
}
#[allow(missing_docs)]
impl Phase {
    /// Below this, two phases are considered the same.
    pub const EPSILON: f64 = 1e-8;

    pub const ZERO: Phase = Phase(0.0);

    /// Wraps any finite value into [0, 1). Non-finite values become zero.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        let wrapped = value.rem_euclid(1.0);
        // rem_euclid() of a tiny negative number rounds up to exactly 1.0.
        if wrapped >= 1.0 {
            Self::ZERO
        } else {
            Self(wrapped)
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    /// The opposite point on the circle.
    pub fn inverted(&self) -> Self {
        Self::new(self.0 + 0.5)
    }

    /// Classifies the shorter way around the circle from `start` to `end`.
    pub fn direction(start: Phase, end: Phase) -> Direction {
        Self::direction_with_epsilon(start, end, Self::EPSILON)
    }

    pub fn direction_with_epsilon(start: Phase, end: Phase, epsilon: f64) -> Direction {
        let delta = end.0 - start.0;
        if delta.abs() < epsilon || (1.0 - delta.abs()) < epsilon {
            Direction::Unchanged
        } else if (-1.0..-0.5).contains(&delta) || (0.0..0.5).contains(&delta) {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }

    /// The unsigned amount of travel from `start` to `end` when moving in
    /// `direction`, wrapping through zero if needed.
    pub fn abs_delta_phase(start: Phase, end: Phase, direction: Direction) -> f64 {
        let delta = end.0 - start.0;
        match direction {
            Direction::Forward => {
                if delta >= 0.0 {
                    delta
                } else {
                    1.0 + delta
                }
            }
            Direction::Backward => {
                if delta <= 0.0 {
                    -delta
                } else {
                    1.0 - delta
                }
            }
            Direction::Unchanged => 0.0,
        }
    }

    /// The length of the shorter arc between the two phases.
    pub fn distance(start: Phase, end: Phase) -> f64 {
        Self::abs_delta_phase(start, end, Self::direction(start, end))
    }

    /// Whether `position` lies on the arc that runs from `start` to `end` in
    /// `direction`. If the arc wraps through zero, it's checked as two
    /// separate intervals.
    ///
    /// An [Direction::Unchanged] arc is a single point, which contains
    /// `position` only if either endpoint is inclusive.
    pub fn contains(
        start: Phase,
        end: Phase,
        position: Phase,
        direction: Direction,
        end_inclusive: bool,
        start_inclusive: bool,
    ) -> bool {
        let (s, e, p) = (start.0, end.0, position.0);
        match direction {
            Direction::Forward => {
                if s <= e {
                    Self::in_interval(p, s, e, start_inclusive, end_inclusive)
                } else {
                    // [start, 1) U [0, end]
                    Self::in_interval(p, s, 1.0, start_inclusive, false)
                        || Self::in_interval(p, 0.0, e, true, end_inclusive)
                }
            }
            Direction::Backward => {
                if e <= s {
                    Self::in_interval(p, e, s, end_inclusive, start_inclusive)
                } else {
                    // [0, start] U [end, 1)
                    Self::in_interval(p, 0.0, s, true, start_inclusive)
                        || Self::in_interval(p, e, 1.0, end_inclusive, false)
                }
            }
            Direction::Unchanged => {
                (start_inclusive || end_inclusive) && (p - s).abs() < Self::EPSILON
            }
        }
    }

    /// True if phase zero lies strictly inside the arc from `start` to `end`
    /// in `direction`. Landing exactly on zero, or leaving from it, isn't a
    /// wrap.
    pub fn wraps_around(start: Phase, end: Phase, direction: Direction) -> bool {
        match direction {
            Direction::Forward => end.0 < start.0 && end.0 > 0.0,
            Direction::Backward => start.0 < end.0 && start.0 > 0.0,
            Direction::Unchanged => false,
        }
    }

    fn in_interval(p: f64, low: f64, high: f64, low_inclusive: bool, high_inclusive: bool) -> bool {
        let above = if low_inclusive { p >= low } else { p > low };
        let below = if high_inclusive { p <= high } else { p < high };
        above && below
    }
}
