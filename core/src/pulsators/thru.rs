// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{PulsatorState, Pulsates};
use crate::{
    pulse::{Pulse, Pulses},
    time::{DomainTimePoint, DomainType, TimePoint},
    trigger::Trigger,
    uid::{TriggerId, TriggerIdFactory},
};
use std::{collections::VecDeque, sync::Arc};

/// Passes upstream triggers through unchanged, remembering which gates are
/// open so that [Pulsates::stop()] can close them. It schedules nothing of
/// its own, so time skips don't affect it.
///
/// A `pulse_on` without an id gets a fresh one. A `pulse_off` without an id
/// closes the oldest gate that was opened that way. Gates taken over from
/// another pulsator keep their closing times, and [Pulsates::poll()] closes
/// them when they come due.
#[derive(Clone, Debug)]
pub struct ThruPulsator {
    ids: Arc<TriggerIdFactory>,
    state: PulsatorState,
    pulses: Pulses,
    anonymous: VecDeque<TriggerId>,
}
impl ThruPulsator {
    #[allow(missing_docs)]
    pub fn new_with(ids: Arc<TriggerIdFactory>) -> Self {
        Self {
            ids,
            state: Default::default(),
            pulses: Default::default(),
            anonymous: Default::default(),
        }
    }

    /// Ids of the gates currently open, ascending.
    pub fn open_ids(&self) -> Vec<TriggerId> {
        self.pulses.iter().map(Pulse::id).collect()
    }

    fn handle_pulse_on(&mut self, time: &TimePoint, id: TriggerId, triggers: &mut Vec<Trigger>) {
        let id = if id.is_some() {
            id
        } else {
            let id = self.ids.mint_next();
            self.anonymous.push_back(id);
            id
        };
        if let Some(off) = self.pulses.flush_id(id) {
            log::warn!("pulse {id} opened again while still open");
            triggers.push(off);
        }
        let on_time = DomainTimePoint::from_time_point(time, DomainType::Ticks);
        log::trace!("pulse {id} on at {on_time}");
        triggers.push(self.pulses.new_pulse(on_time, None, id));
    }

    fn handle_pulse_off(&mut self, id: TriggerId, triggers: &mut Vec<Trigger>) {
        let id = if id.is_some() {
            self.anonymous.retain(|anonymous_id| *anonymous_id != id);
            Some(id)
        } else {
            self.anonymous.pop_front()
        };
        match id.and_then(|id| self.pulses.flush_id(id)) {
            Some(off) => {
                log::trace!("pulse {} off", off.id());
                triggers.push(off);
            }
            None => log::warn!("dropping pulse_off for {id:?}, which isn't open"),
        }
    }
}
impl Pulsates for ThruPulsator {
    fn state(&self) -> PulsatorState {
        self.state
    }

    fn start(&mut self, time: &TimePoint, _first_pulse_time: Option<DomainTimePoint>) {
        if !self.is_running() {
            self.state = PulsatorState::Running;
            log::debug!("thru pulsator started at {time}");
        }
    }

    fn stop(&mut self) -> Vec<Trigger> {
        // Imported gates can be open even while stopped.
        let offs = self.pulses.flush();
        if self.is_running() {
            self.state = PulsatorState::Stopped;
            self.anonymous.clear();
            log::debug!("thru pulsator stopped, closing {} gates", offs.len());
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
        let mut triggers = Vec::with_capacity(incoming.len());
        for trigger in incoming {
            if trigger.is_pulse_on() {
                self.handle_pulse_on(time, trigger.id(), &mut triggers);
            } else {
                self.handle_pulse_off(trigger.id(), &mut triggers);
            }
        }
        triggers
    }

    fn handle_time_skip(&mut self, _new_time: &TimePoint) -> Vec<Trigger> {
        Vec::default()
    }

    fn export_pulses(&mut self) -> Vec<Pulse> {
        self.anonymous.clear();
        self.pulses.export()
    }

    fn import_pulses(&mut self, pulses: Vec<Pulse>) {
        log::debug!("thru pulsator took over {} gates", pulses.len());
        self.pulses.import(pulses);
    }
}
