// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{domain::DomainType, fraction::Fraction};
use anyhow::{anyhow, Error};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// [Meter] is a time signature. A tick is a quarter note, so a bar of 4/4 lasts
/// four ticks and a bar of 6/8 lasts three ticks.
///
/// The top number is the number of beats in a bar. The bottom number is the
/// value of a beat, expressed as a reciprocal: a bottom of 8 means that a beat
/// is an eighth note, which is half a tick.
///
/// [Meter] doesn't know anything about tempo. Transport positions are measured
/// in ticks, and a [Meter] only converts between ticks, beats, and bars.
#[derive(Clone, Copy, Debug, Derivative, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case", try_from = "MeterParts")]
pub struct Meter {
    /// The number of beats in a bar.
    #[derivative(Default(value = "4"))]
    numerator: u32,

    /// The value of a beat.
    #[derivative(Default(value = "4"))]
    denominator: u32,
}
// Unvalidated wire form, checked by [Meter::new_with()] on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MeterParts {
    numerator: u32,
    denominator: u32,
}
impl TryFrom<MeterParts> for Meter {
    type Error = Error;

    fn try_from(parts: MeterParts) -> Result<Self, Self::Error> {
        Self::new_with(parts.numerator, parts.denominator)
    }
}
impl Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
#[allow(missing_docs)]
impl Meter {
    /// Common time, 4/4.
    pub const COMMON_TIME: Self = Meter {
        numerator: 4,
        denominator: 4,
    };

    /// Ticks are quarter notes, so a whole note is this many ticks.
    pub const TICKS_PER_WHOLE_NOTE: f64 = 4.0;

    pub fn new_with(numerator: u32, denominator: u32) -> anyhow::Result<Self, Error> {
        if numerator == 0 {
            Err(anyhow!("Meter numerator can't be zero."))
        } else if denominator == 0 {
            Err(anyhow!("Meter denominator can't be zero."))
        } else {
            Ok(Self {
                numerator,
                denominator,
            })
        }
    }

    /// Builds a [Meter] from a [Fraction]. Because fractions are kept in
    /// lowest terms, 6/8 comes back as 3/4; use [Meter::new_with()] when the
    /// beat grouping matters.
    pub fn from_fraction(fraction: &Fraction) -> anyhow::Result<Self, Error> {
        let numerator = u32::try_from(fraction.numerator())
            .map_err(|_| anyhow!("Meter numerator {} is out of range.", fraction.numerator()))?;
        let denominator = u32::try_from(fraction.denominator()).map_err(|_| {
            anyhow!(
                "Meter denominator {} is out of range.",
                fraction.denominator()
            )
        })?;
        Self::new_with(numerator, denominator)
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// The length of a bar as a fraction of a whole note.
    pub fn as_fraction(&self) -> Fraction {
        // The constructor guarantees a nonzero denominator.
        Fraction::new_with(self.numerator as i64, self.denominator as i64)
            .unwrap_or(Fraction::ONE)
    }

    /// Ticks per bar.
    pub fn duration(&self) -> f64 {
        Self::TICKS_PER_WHOLE_NOTE * self.numerator as f64 / self.denominator as f64
    }

    /// Ticks per beat.
    pub fn subdivision_duration(&self) -> f64 {
        Self::TICKS_PER_WHOLE_NOTE / self.denominator as f64
    }

    pub fn ticks2beats(&self, ticks: f64) -> f64 {
        ticks / self.subdivision_duration()
    }

    pub fn ticks2bars(&self, ticks: f64) -> f64 {
        ticks / self.duration()
    }

    pub fn beats2ticks(&self, beats: f64) -> f64 {
        beats * self.subdivision_duration()
    }

    pub fn bars2ticks(&self, bars: f64) -> f64 {
        bars * self.duration()
    }

    pub fn beats2bars(&self, beats: f64) -> f64 {
        beats / self.numerator as f64
    }

    pub fn bars2beats(&self, bars: f64) -> f64 {
        bars * self.numerator as f64
    }

    /// Converts a value (a position or a duration; the math is the same) from
    /// one domain to another.
    pub fn convert(&self, value: f64, from: DomainType, to: DomainType) -> f64 {
        match (from, to) {
            (DomainType::Ticks, DomainType::Ticks)
            | (DomainType::Beats, DomainType::Beats)
            | (DomainType::Bars, DomainType::Bars) => value,
            (DomainType::Ticks, DomainType::Beats) => self.ticks2beats(value),
            (DomainType::Ticks, DomainType::Bars) => self.ticks2bars(value),
            (DomainType::Beats, DomainType::Ticks) => self.beats2ticks(value),
            (DomainType::Beats, DomainType::Bars) => self.beats2bars(value),
            (DomainType::Bars, DomainType::Ticks) => self.bars2ticks(value),
            (DomainType::Bars, DomainType::Beats) => self.bars2beats(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn default_is_common_time() {
        let m = Meter::default();
        assert_eq!(m, Meter::COMMON_TIME);
        assert_eq!(m.duration(), 4.0);
        assert_eq!(m.subdivision_duration(), 1.0);
        assert_eq!(m.to_string(), "4/4");
    }

    #[test]
    fn invalid_meters_are_rejected() {
        assert!(Meter::new_with(0, 4).is_err());
        assert!(Meter::new_with(4, 0).is_err());
        assert!(Meter::from_fraction(&Fraction::new_with(-3, 4).unwrap()).is_err());
        assert!(Meter::new_with(7, 8).is_ok());
    }

    #[test]
    fn deserializing_validates() {
        let m: Meter = serde_json::from_str(r#"{"numerator": 6, "denominator": 8}"#).unwrap();
        assert_eq!(m, Meter::new_with(6, 8).unwrap());
        assert!(serde_json::from_str::<Meter>(r#"{"numerator": 0, "denominator": 4}"#).is_err());
        assert!(serde_json::from_str::<Meter>(r#"{"numerator": 3, "denominator": 0}"#).is_err());
        assert_eq!(
            serde_json::from_str::<Meter>(&serde_json::to_string(&Meter::COMMON_TIME).unwrap())
                .unwrap(),
            Meter::COMMON_TIME
        );
    }

    #[test]
    fn compound_meters_convert_through_eighths() {
        let m = Meter::new_with(6, 8).unwrap();
        assert_eq!(m.duration(), 3.0);
        assert_eq!(m.subdivision_duration(), 0.5);
        assert_eq!(m.ticks2beats(3.0), 6.0);
        assert_eq!(m.ticks2bars(4.5), 1.5);
        assert_eq!(m.bars2beats(2.0), 12.0);
        assert_eq!(m.beats2bars(3.0), 0.5);
        assert_eq!(m.as_fraction(), Fraction::new_with(3, 4).unwrap());
    }

    #[test]
    fn from_fraction_keeps_reduced_terms() {
        let m = Meter::from_fraction(&Fraction::new_with(6, 8).unwrap()).unwrap();
        assert_eq!((m.numerator(), m.denominator()), (3, 4));
    }

    #[test]
    fn conversions_are_consistent_in_every_direction() {
        let m = Meter::new_with(5, 4).unwrap();
        for from in DomainType::iter() {
            for to in DomainType::iter() {
                let there = m.convert(7.25, from, to);
                let back = m.convert(there, to, from);
                assert!(
                    approx_eq!(f64, back, 7.25, epsilon = 1e-12),
                    "{from} -> {to} -> {from} gave {back}"
                );
            }
        }
        assert_eq!(m.convert(10.0, DomainType::Ticks, DomainType::Bars), 2.0);
    }
}
