// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Open gates and the collection that owns them.

use crate::{
    time::{DomainTimePoint, TimePoint},
    trigger::Trigger,
    uid::TriggerId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A gate that has opened and hasn't yet closed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Pulse {
    id: TriggerId,
    trigger_time: DomainTimePoint,
    pulse_off_time: Option<DomainTimePoint>,
}
#[allow(missing_docs)]
impl Pulse {
    pub fn new_with(
        id: TriggerId,
        trigger_time: DomainTimePoint,
        pulse_off_time: Option<DomainTimePoint>,
    ) -> Self {
        Self {
            id,
            trigger_time,
            pulse_off_time,
        }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn trigger_time(&self) -> DomainTimePoint {
        self.trigger_time
    }

    /// None means the gate stays open until something closes it explicitly.
    pub fn pulse_off_time(&self) -> Option<DomainTimePoint> {
        self.pulse_off_time
    }

    /// Whether the gate has a closing time and `time` has reached it.
    pub fn elapsed(&self, time: &TimePoint) -> bool {
        self.pulse_off_time
            .is_some_and(|off_time| off_time.has_elapsed(time))
    }

    pub fn pulse_on(&self) -> Trigger {
        Trigger::pulse_on(self.id)
    }

    pub fn pulse_off(&self) -> Trigger {
        Trigger::pulse_off(self.id)
    }
}

/// The open [Pulse]s of a single pulsator, indexed by id.
///
/// Everything that closes gates returns the `pulse_off` [Trigger]s in
/// ascending id order, which is the order the gates were opened when ids come
/// from one [TriggerIdFactory](crate::uid::TriggerIdFactory).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pulses {
    pulses: BTreeMap<TriggerId, Pulse>,
}
impl Pulses {
    /// Opens a gate and returns its `pulse_on`. An open gate with the same id
    /// is replaced without emitting anything; callers that care should
    /// [Pulses::flush_id()] first.
    pub fn new_pulse(
        &mut self,
        trigger_time: DomainTimePoint,
        pulse_off_time: Option<DomainTimePoint>,
        id: TriggerId,
    ) -> Trigger {
        let pulse = Pulse::new_with(id, trigger_time, pulse_off_time);
        self.add(pulse);
        pulse.pulse_on()
    }

    /// Adds an existing pulse, returning whatever it displaced.
    pub fn add(&mut self, pulse: Pulse) -> Option<Pulse> {
        self.pulses.insert(pulse.id(), pulse)
    }

    /// Removes every pulse that has elapsed as of `time` and returns their
    /// `pulse_off`s.
    pub fn drain_elapsed(&mut self, time: &TimePoint) -> Vec<Trigger> {
        let mut offs = Vec::default();
        self.pulses.retain(|_, pulse| {
            if pulse.elapsed(time) {
                offs.push(pulse.pulse_off());
                false
            } else {
                true
            }
        });
        offs
    }

    /// Closes every open gate, elapsed or not.
    pub fn flush(&mut self) -> Vec<Trigger> {
        std::mem::take(&mut self.pulses)
            .into_values()
            .map(|pulse| pulse.pulse_off())
            .collect()
    }

    /// Closes the gate with the given id, if it's open.
    pub fn flush_id(&mut self, id: TriggerId) -> Option<Trigger> {
        self.pulses.remove(&id).map(|pulse| pulse.pulse_off())
    }

    /// Moves every open pulse out, leaving this collection empty. Nothing is
    /// emitted; the gates are still open, just owned by someone else now.
    pub fn export(&mut self) -> Vec<Pulse> {
        std::mem::take(&mut self.pulses).into_values().collect()
    }

    /// Takes ownership of pulses exported elsewhere. Incoming pulses replace
    /// open pulses with the same id.
    pub fn import(&mut self, pulses: impl IntoIterator<Item = Pulse>) {
        self.pulses
            .extend(pulses.into_iter().map(|pulse| (pulse.id(), pulse)));
    }

    #[allow(missing_docs)]
    pub fn get(&self, id: TriggerId) -> Option<&Pulse> {
        self.pulses.get(&id)
    }

    #[allow(missing_docs)]
    pub fn contains(&self, id: TriggerId) -> bool {
        self.pulses.contains_key(&id)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// Open pulses in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Pulse> {
        self.pulses.values()
    }
}
