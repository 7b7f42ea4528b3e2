// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{PulsatorState, Pulsates};
use crate::{
    pulse::{Pulse, Pulses},
    time::{DomainDuration, DomainTimePoint, TimePoint},
    trigger::Trigger,
    uid::TriggerIdFactory,
};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters of a [TriggeredPulsator].
#[derive(Clone, Copy, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[builder_struct_attr(allow(missing_docs))]
#[serde(rename_all = "kebab-case")]
pub struct TriggeredPulsatorConfig {
    /// How long each gate stays open.
    #[derivative(Default(value = "DomainDuration::beats(1.0)"))]
    pub duration: DomainDuration,
}

/// Opens a gate for each incoming `pulse_on` and closes it after a fixed
/// duration. It never schedules anything on its own.
#[derive(Clone, Debug)]
pub struct TriggeredPulsator {
    config: TriggeredPulsatorConfig,
    ids: Arc<TriggerIdFactory>,
    state: PulsatorState,
    pulses: Pulses,
}
impl TriggeredPulsator {
    #[allow(missing_docs)]
    pub fn new_with(config: TriggeredPulsatorConfig, ids: Arc<TriggerIdFactory>) -> Self {
        Self {
            config: Self::sanitized(config),
            ids,
            state: Default::default(),
            pulses: Default::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &TriggeredPulsatorConfig {
        &self.config
    }

    /// Applies to gates opened from now on. Negative durations become zero.
    pub fn set_duration(&mut self, duration: DomainDuration) {
        self.config = Self::sanitized(TriggeredPulsatorConfig { duration });
    }

    fn sanitized(mut config: TriggeredPulsatorConfig) -> TriggeredPulsatorConfig {
        let value = config.duration.value();
        if !value.is_finite() || value < 0.0 {
            config.duration = DomainDuration::zero(config.duration.domain());
        }
        config
    }
}
impl Pulsates for TriggeredPulsator {
    fn state(&self) -> PulsatorState {
        self.state
    }

    fn start(&mut self, time: &TimePoint, _first_pulse_time: Option<DomainTimePoint>) {
        if !self.is_running() {
            self.state = PulsatorState::Running;
            log::debug!("triggered pulsator started at {time}");
        }
    }

    fn stop(&mut self) -> Vec<Trigger> {
        // Imported gates can be open even while stopped.
        let offs = self.pulses.flush();
        if self.is_running() {
            self.state = PulsatorState::Stopped;
            log::debug!("triggered pulsator stopped, closing {} gates", offs.len());
        }
        offs
    }

    fn poll(&mut self, time: &TimePoint) -> Vec<Trigger> {
        if !self.is_running() {
            return Vec::default();
        }
        self.pulses.drain_elapsed(time)
    }

    fn handle_external_triggers(&mut self, time: &TimePoint, incoming: &[Trigger]) -> Vec<Trigger> {
        if !self.is_running() {
            return Vec::default();
        }
        let mut triggers = Vec::default();
        for trigger in incoming.iter().filter(|t| t.is_pulse_on()) {
            let id = if trigger.id().is_some() {
                trigger.id()
            } else {
                self.ids.mint_next()
            };
            if let Some(off) = self.pulses.flush_id(id) {
                log::warn!("pulse {id} retriggered while still open");
                triggers.push(off);
            }
            let on_time = DomainTimePoint::from_time_point(time, self.config.duration.domain());
            let off_time = on_time.add_with_meter(&self.config.duration, time.meter());
            log::trace!("pulse {id} on at {on_time}, off at {off_time}");
            triggers.push(self.pulses.new_pulse(on_time, Some(off_time), id));
        }
        triggers
    }

    /// Closes every open gate. Durations are measured from where each gate
    /// opened, and that position means nothing on the far side of a jump.
    fn handle_time_skip(&mut self, new_time: &TimePoint) -> Vec<Trigger> {
        let offs = self.pulses.flush();
        log::debug!(
            "triggered pulsator skipped to {new_time}, closing {} gates",
            offs.len()
        );
        offs
    }

    fn export_pulses(&mut self) -> Vec<Pulse> {
        self.pulses.export()
    }

    fn import_pulses(&mut self, pulses: Vec<Pulse>) {
        log::debug!("triggered pulsator took over {} gates", pulses.len());
        self.pulses.import(pulses);
    }
}
