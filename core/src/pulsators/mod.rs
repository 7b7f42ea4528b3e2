// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! State machines that turn transport time (and, for some, upstream triggers)
//! into gate [Trigger]s.

pub use auto::{AutoPulsator, AutoPulsatorConfig, AutoPulsatorConfigBuilder};
pub use beat::{BeatPulsator, BeatPulsatorConfig, BeatPulsatorConfigBuilder, TimeSpecification};
pub use thru::ThruPulsator;
pub use triggered::{TriggeredPulsator, TriggeredPulsatorConfig, TriggeredPulsatorConfigBuilder};

use crate::{
    gates::{JumpGateConfig, TimeEvent, TimeEventGate},
    pulse::Pulse,
    time::{DomainTimePoint, TimePoint},
    trigger::Trigger,
    uid::TriggerIdFactory,
};
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::{Display as StrumDisplay, EnumIter, IntoStaticStr};

mod auto;
mod beat;
mod thru;
mod triggered;

/// Whether a pulsator is producing triggers.
#[derive(
    Clone,
    Copy,
    Debug,
    Derivative,
    PartialEq,
    Eq,
    EnumIter,
    IntoStaticStr,
    StrumDisplay,
    Serialize,
    Deserialize,
)]
#[derivative(Default)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PulsatorState {
    #[allow(missing_docs)]
    #[derivative(Default)]
    Stopped,
    #[allow(missing_docs)]
    Running,
}

/// The interface every pulsator shares. Time only moves forward through
/// these calls; there are no timers. One caller drives a given instance.
///
/// Every method that can close gates returns the closing `pulse_off`s, so
/// each `pulse_on` a pulsator emits is eventually matched by exactly one
/// `pulse_off` with the same id.
#[allow(unused_variables)]
pub trait Pulsates {
    #[allow(missing_docs)]
    fn state(&self) -> PulsatorState;

    #[allow(missing_docs)]
    fn is_running(&self) -> bool {
        self.state() == PulsatorState::Running
    }

    /// Moves from stopped to running and works out the first instant to fire,
    /// which is `first_pulse_time` if given. Does nothing if already running.
    fn start(&mut self, time: &TimePoint, first_pulse_time: Option<DomainTimePoint>);

    /// Moves to stopped and closes every open gate. A second stop returns
    /// nothing.
    fn stop(&mut self) -> Vec<Trigger>;

    /// Advances to `time` and returns whatever is due. Does nothing unless
    /// running.
    fn poll(&mut self, time: &TimePoint) -> Vec<Trigger>;

    /// Reacts to triggers arriving from upstream. Self-clocked pulsators
    /// ignore them.
    fn handle_external_triggers(&mut self, time: &TimePoint, incoming: &[Trigger]) -> Vec<Trigger> {
        Vec::default()
    }

    /// Reconciles a discontinuity in the timeline, such as a seek or loop.
    fn handle_time_skip(&mut self, new_time: &TimePoint) -> Vec<Trigger>;

    /// Hands over the open gates without closing them. See
    /// [Pulsates::import_pulses()].
    fn export_pulses(&mut self) -> Vec<Pulse>;

    /// Takes over gates exported from another pulsator. They close on their
    /// own schedule, or on [Pulsates::stop()].
    fn import_pulses(&mut self, pulses: Vec<Pulse>);

    /// The next instant this pulsator will open a gate on its own, if it
    /// schedules them at all.
    fn next_scheduled_pulse_on(&self) -> Option<DomainTimePoint> {
        None
    }
}

/// Everything needed to recreate a [Pulsator]'s parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PulsatorConfig {
    #[allow(missing_docs)]
    Auto(AutoPulsatorConfig),
    #[allow(missing_docs)]
    Triggered(TriggeredPulsatorConfig),
    #[allow(missing_docs)]
    Thru,
    #[allow(missing_docs)]
    Beat(BeatPulsatorConfig),
}
impl Default for PulsatorConfig {
    fn default() -> Self {
        Self::Auto(AutoPulsatorConfig::default())
    }
}

/// The closed set of pulsators.
#[derive(Clone, Debug)]
pub enum Pulsator {
    #[allow(missing_docs)]
    Auto(AutoPulsator),
    #[allow(missing_docs)]
    Triggered(TriggeredPulsator),
    #[allow(missing_docs)]
    Thru(ThruPulsator),
    #[allow(missing_docs)]
    Beat(BeatPulsator),
}
impl Pulsator {
    /// Builds the variant that `config` describes. Every pulsator in a
    /// session should share the same `ids`.
    pub fn new_with(config: PulsatorConfig, ids: Arc<TriggerIdFactory>) -> Self {
        match config {
            PulsatorConfig::Auto(config) => Self::Auto(AutoPulsator::new_with(config, ids)),
            PulsatorConfig::Triggered(config) => {
                Self::Triggered(TriggeredPulsator::new_with(config, ids))
            }
            PulsatorConfig::Thru => Self::Thru(ThruPulsator::new_with(ids)),
            PulsatorConfig::Beat(config) => Self::Beat(BeatPulsator::new_with(config, ids)),
        }
    }

    /// The parameters that would rebuild this pulsator.
    pub fn config(&self) -> PulsatorConfig {
        match self {
            Pulsator::Auto(p) => PulsatorConfig::Auto(*p.config()),
            Pulsator::Triggered(p) => PulsatorConfig::Triggered(*p.config()),
            Pulsator::Thru(_) => PulsatorConfig::Thru,
            Pulsator::Beat(p) => PulsatorConfig::Beat(*p.config()),
        }
    }

    /// Swaps in a pulsator built from `config`, carrying the open gates over
    /// so they still close. The new pulsator starts running at `time` if the
    /// old one was.
    pub fn replace_with(&mut self, config: PulsatorConfig, ids: Arc<TriggerIdFactory>, time: &TimePoint) {
        let was_running = self.is_running();
        let pulses = self.export_pulses();
        let mut replacement = Self::new_with(config, ids);
        if was_running {
            replacement.start(time, None);
        }
        replacement.import_pulses(pulses);
        log::debug!(
            "replaced {} pulsator with {}",
            self.name(),
            replacement.name()
        );
        *self = replacement;
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &'static str {
        match self {
            Pulsator::Auto(_) => "auto",
            Pulsator::Triggered(_) => "triggered",
            Pulsator::Thru(_) => "thru",
            Pulsator::Beat(_) => "beat",
        }
    }
}
impl Pulsates for Pulsator {
    fn state(&self) -> PulsatorState {
        match self {
            Pulsator::Auto(p) => p.state(),
            Pulsator::Triggered(p) => p.state(),
            Pulsator::Thru(p) => p.state(),
            Pulsator::Beat(p) => p.state(),
        }
    }

    fn start(&mut self, time: &TimePoint, first_pulse_time: Option<DomainTimePoint>) {
        match self {
            Pulsator::Auto(p) => p.start(time, first_pulse_time),
            Pulsator::Triggered(p) => p.start(time, first_pulse_time),
            Pulsator::Thru(p) => p.start(time, first_pulse_time),
            Pulsator::Beat(p) => p.start(time, first_pulse_time),
        }
    }

    fn stop(&mut self) -> Vec<Trigger> {
        match self {
            Pulsator::Auto(p) => p.stop(),
            Pulsator::Triggered(p) => p.stop(),
            Pulsator::Thru(p) => p.stop(),
            Pulsator::Beat(p) => p.stop(),
        }
    }

    fn poll(&mut self, time: &TimePoint) -> Vec<Trigger> {
        match self {
            Pulsator::Auto(p) => p.poll(time),
            Pulsator::Triggered(p) => p.poll(time),
            Pulsator::Thru(p) => p.poll(time),
            Pulsator::Beat(p) => p.poll(time),
        }
    }

    fn handle_external_triggers(&mut self, time: &TimePoint, incoming: &[Trigger]) -> Vec<Trigger> {
        match self {
            Pulsator::Auto(p) => p.handle_external_triggers(time, incoming),
            Pulsator::Triggered(p) => p.handle_external_triggers(time, incoming),
            Pulsator::Thru(p) => p.handle_external_triggers(time, incoming),
            Pulsator::Beat(p) => p.handle_external_triggers(time, incoming),
        }
    }

    fn handle_time_skip(&mut self, new_time: &TimePoint) -> Vec<Trigger> {
        match self {
            Pulsator::Auto(p) => p.handle_time_skip(new_time),
            Pulsator::Triggered(p) => p.handle_time_skip(new_time),
            Pulsator::Thru(p) => p.handle_time_skip(new_time),
            Pulsator::Beat(p) => p.handle_time_skip(new_time),
        }
    }

    fn export_pulses(&mut self) -> Vec<Pulse> {
        match self {
            Pulsator::Auto(p) => p.export_pulses(),
            Pulsator::Triggered(p) => p.export_pulses(),
            Pulsator::Thru(p) => p.export_pulses(),
            Pulsator::Beat(p) => p.export_pulses(),
        }
    }

    fn import_pulses(&mut self, pulses: Vec<Pulse>) {
        match self {
            Pulsator::Auto(p) => p.import_pulses(pulses),
            Pulsator::Triggered(p) => p.import_pulses(pulses),
            Pulsator::Thru(p) => p.import_pulses(pulses),
            Pulsator::Beat(p) => p.import_pulses(pulses),
        }
    }

    fn next_scheduled_pulse_on(&self) -> Option<DomainTimePoint> {
        match self {
            Pulsator::Auto(p) => p.next_scheduled_pulse_on(),
            Pulsator::Triggered(p) => p.next_scheduled_pulse_on(),
            Pulsator::Thru(p) => p.next_scheduled_pulse_on(),
            Pulsator::Beat(p) => p.next_scheduled_pulse_on(),
        }
    }
}

/// A [Pulsator] that follows the transport on its own. Each
/// [GatedPulsator::process()] call is one step of a node: pauses stop the
/// pulsator, resumes restart it, and jumps are handed to
/// [Pulsates::handle_time_skip()] before the usual polling.
#[derive(Debug)]
pub struct GatedPulsator {
    pulsator: Pulsator,
    gate: TimeEventGate,
}
impl GatedPulsator {
    #[allow(missing_docs)]
    pub fn new_with(pulsator: Pulsator, jump_gate_config: JumpGateConfig) -> Self {
        Self {
            pulsator,
            gate: TimeEventGate::new_with(jump_gate_config),
        }
    }

    #[allow(missing_docs)]
    pub fn pulsator(&self) -> &Pulsator {
        &self.pulsator
    }

    #[allow(missing_docs)]
    pub fn pulsator_mut(&mut self) -> &mut Pulsator {
        &mut self.pulsator
    }

    /// Handles transport changes, then polls and forwards `incoming`. Returns
    /// everything emitted along the way, in order.
    pub fn process(&mut self, time: &TimePoint, incoming: &[Trigger]) -> Vec<Trigger> {
        let mut triggers = Vec::default();
        match self.gate.poll(time) {
            Some(TimeEvent::TransportPaused) => return self.pulsator.stop(),
            Some(TimeEvent::TransportResumed) => self.pulsator.start(time, None),
            Some(TimeEvent::Jumped) => triggers.extend(self.pulsator.handle_time_skip(time)),
            None => {}
        }
        if time.transport_running() {
            triggers.extend(self.pulsator.poll(time));
            triggers.extend(self.pulsator.handle_external_triggers(time, incoming));
        }
        triggers
    }
}
