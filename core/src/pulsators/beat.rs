// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{PulsatorState, Pulsates};
use crate::{
    pulse::{Pulse, Pulses},
    time::{DomainDuration, DomainTimePoint, DomainType, Meter, TimePoint},
    transport_locked::{TransportLocked, EPSILON},
    trigger::Trigger,
    uid::TriggerIdFactory,
};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A grid that restarts at every bar line: the instants
/// `bar_start + offset + k * duration` that fall inside the bar.
#[derive(Clone, Copy, Debug, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
pub struct TimeSpecification {
    #[allow(missing_docs)]
    #[derivative(Default(value = "DomainDuration::beats(1.0)"))]
    pub duration: DomainDuration,

    /// Where the grid starts relative to the bar line.
    #[derivative(Default(value = "DomainDuration::beats(0.0)"))]
    pub offset: DomainDuration,
}
impl TimeSpecification {
    #[allow(missing_docs)]
    pub fn new_with(duration: DomainDuration, offset: DomainDuration) -> Self {
        Self { duration, offset }
    }

    /// The first instant of this grid after `after` (or at it, if
    /// `is_first_value`), in ticks. Looks no further than the following bar;
    /// None means the grid has no instants inside a bar of this meter.
    pub fn next_tick(&self, meter: &Meter, after: f64, is_first_value: bool) -> Option<f64> {
        let bar_length = meter.duration();
        let duration = self.duration.as_type(DomainType::Ticks, meter).value();
        let offset = self.offset.as_type(DomainType::Ticks, meter).value();
        if !(duration > 0.0 && duration.is_finite() && offset.is_finite() && after.is_finite()) {
            return None;
        }

        let bar_start = meter.bars2ticks(meter.ticks2bars(after).floor());
        let in_bar =
            TransportLocked::next_value(after - bar_start, duration, offset, is_first_value, EPSILON);
        if in_bar < bar_length - EPSILON {
            return Some(bar_start + in_bar);
        }

        let next_bar_start = bar_start + bar_length;
        let mut in_next_bar = TransportLocked::next_value(0.0, duration, offset, true, EPSILON);
        if !is_first_value && next_bar_start + in_next_bar < after + EPSILON {
            in_next_bar = TransportLocked::next_value(in_next_bar, duration, offset, false, EPSILON);
        }
        (in_next_bar < bar_length - EPSILON).then_some(next_bar_start + in_next_bar)
    }
}

/// Parameters of a [BeatPulsator].
#[derive(Clone, Copy, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[builder_struct_attr(allow(missing_docs))]
#[serde(rename_all = "kebab-case")]
pub struct BeatPulsatorConfig {
    #[allow(missing_docs)]
    pub specification: TimeSpecification,

    /// Gate length as a multiple of the specification's duration.
    #[derivative(Default(value = "1.0"))]
    pub legato: f64,
}

/// A self-clocked pulsator whose grid is laid out bar by bar, so that it
/// stays locked to bar lines even when the grid doesn't divide the bar
/// evenly.
///
/// Changes to the configuration or to the meter take effect at the next
/// pulse: the instant already scheduled is kept.
#[derive(Clone, Debug)]
pub struct BeatPulsator {
    config: BeatPulsatorConfig,
    ids: Arc<TriggerIdFactory>,
    state: PulsatorState,
    pulses: Pulses,
    next_trigger_time: Option<DomainTimePoint>,
}
impl BeatPulsator {
    #[allow(missing_docs)]
    pub fn new_with(config: BeatPulsatorConfig, ids: Arc<TriggerIdFactory>) -> Self {
        Self {
            config: Self::sanitized(config),
            ids,
            state: Default::default(),
            pulses: Default::default(),
            next_trigger_time: None,
        }
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &BeatPulsatorConfig {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn set_specification(&mut self, specification: TimeSpecification) {
        self.config.specification = specification;
    }

    /// Negative values are treated as zero.
    pub fn set_legato(&mut self, legato: f64) {
        self.config = Self::sanitized(BeatPulsatorConfig {
            legato,
            ..self.config
        });
    }

    fn sanitized(mut config: BeatPulsatorConfig) -> BeatPulsatorConfig {
        config.legato = config.legato.max(0.0);
        if !config.legato.is_finite() {
            config.legato = 0.0;
        }
        config
    }

    fn schedule(&self, time: &TimePoint, after: f64, is_first_value: bool) -> Option<DomainTimePoint> {
        self.config
            .specification
            .next_tick(time.meter(), after, is_first_value)
            .map(DomainTimePoint::ticks)
    }
}
impl Pulsates for BeatPulsator {
    fn state(&self) -> PulsatorState {
        self.state
    }

    fn start(&mut self, time: &TimePoint, first_pulse_time: Option<DomainTimePoint>) {
        if self.is_running() {
            return;
        }
        self.state = PulsatorState::Running;
        self.next_trigger_time = match first_pulse_time {
            Some(first_pulse_time) => Some(first_pulse_time),
            None => self.schedule(time, time.tick(), true),
        };
        log::debug!(
            "beat pulsator started at {time}, first pulse at {:?}",
            self.next_trigger_time
        );
    }

    fn stop(&mut self) -> Vec<Trigger> {
        // Imported gates can be open even while stopped.
        let offs = self.pulses.flush();
        if self.is_running() {
            self.state = PulsatorState::Stopped;
            self.next_trigger_time = None;
            log::debug!("beat pulsator stopped, closing {} gates", offs.len());
        }
        offs
    }

    fn poll(&mut self, time: &TimePoint) -> Vec<Trigger> {
        if !self.is_running() {
            return Vec::default();
        }
        let mut triggers = self.pulses.drain_elapsed(time);
        if self.next_trigger_time.is_none() {
            // The grid had no instants; the configuration may have changed.
            self.next_trigger_time = self.schedule(time, time.tick(), true);
        }
        if let Some(trigger_time) = self.next_trigger_time {
            if trigger_time.has_elapsed(time) {
                let length = self.config.specification.duration * self.config.legato;
                let off_time = trigger_time.add_with_meter(&length, time.meter());
                let id = self.ids.mint_next();
                log::trace!("pulse {id} on at {trigger_time}, off at {off_time}");
                triggers.push(self.pulses.new_pulse(trigger_time, Some(off_time), id));

                let last_tick = trigger_time.as_type(DomainType::Ticks, time.meter()).value();
                self.next_trigger_time = match self.schedule(time, last_tick, false) {
                    Some(next) if next.value() + EPSILON >= time.tick() => Some(next),
                    _ => self.schedule(time, time.tick(), false),
                };
            }
        }
        triggers
    }

    fn handle_time_skip(&mut self, new_time: &TimePoint) -> Vec<Trigger> {
        let offs = self.pulses.flush();
        if self.is_running() {
            self.next_trigger_time = self.schedule(new_time, new_time.tick(), true);
        }
        log::debug!(
            "beat pulsator skipped to {new_time}, next pulse at {:?}",
            self.next_trigger_time
        );
        offs
    }

    fn export_pulses(&mut self) -> Vec<Pulse> {
        self.pulses.export()
    }

    fn import_pulses(&mut self, pulses: Vec<Pulse>) {
        log::debug!("beat pulsator took over {} gates", pulses.len());
        self.pulses.import(pulses);
    }

    fn next_scheduled_pulse_on(&self) -> Option<DomainTimePoint> {
        self.next_trigger_time
    }
}
