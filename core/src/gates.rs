// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Detectors for timeline discontinuities. Feed them every [TimePoint] a
//! pulsator sees, and they report when the transport seeks, loops, pauses, or
//! resumes.

use crate::{
    time::{DomainDuration, DomainType, TimePoint},
    transport_locked::EPSILON,
};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumIter};

/// Configures a [JumpGate].
#[derive(Clone, Copy, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[builder_struct_attr(allow(missing_docs))]
#[serde(rename_all = "kebab-case")]
pub struct JumpGateConfig {
    /// Forward movement larger than this counts as a jump. Any domain works;
    /// it's converted through the current meter on each poll.
    #[derivative(Default(value = "DomainDuration::ticks(1.0)"))]
    pub threshold: DomainDuration,
}

/// Reports when time moves backward, or forward by more than a threshold,
/// between successive polls.
#[derive(Debug, Default)]
pub struct JumpGate {
    config: JumpGateConfig,
    last_time: Option<TimePoint>,
}
impl JumpGate {
    #[allow(missing_docs)]
    pub fn new_with(config: JumpGateConfig) -> Self {
        Self {
            config,
            last_time: None,
        }
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &JumpGateConfig {
        &self.config
    }

    /// Changes the threshold. It's measured against the next poll.
    pub fn set_threshold(&mut self, threshold: DomainDuration) {
        self.config.threshold = threshold;
    }

    /// Returns true if `time` is discontinuous with the previously polled
    /// time. The first poll after creation or [JumpGate::reset()] never is.
    pub fn poll(&mut self, time: &TimePoint) -> bool {
        let jumped = self.last_time.is_some_and(|last_time| {
            let delta = time.tick() - last_time.tick();
            let threshold = self
                .config
                .threshold
                .as_type(DomainType::Ticks, time.meter())
                .value()
                .max(0.0);
            delta < -EPSILON || delta > threshold + EPSILON
        });
        if jumped {
            log::trace!(
                "jump from {:?} to {}",
                self.last_time.map(|t| t.tick()),
                time.tick()
            );
        }
        self.last_time = Some(*time);
        jumped
    }

    /// Forgets the last seen time.
    pub fn reset(&mut self) {
        self.last_time = None;
    }
}

/// A discontinuity reported by a [TimeEventGate].
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, StrumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TimeEvent {
    /// The transport was running and now isn't.
    TransportPaused,
    /// The transport wasn't running and now is.
    TransportResumed,
    /// The position moved discontinuously. See [JumpGate].
    Jumped,
}

/// Combines a [JumpGate] with transport-state tracking. At most one event is
/// reported per poll; a pause or resume wins over a jump seen at the same
/// time.
#[derive(Debug, Default)]
pub struct TimeEventGate {
    jump_gate: JumpGate,
    was_running: Option<bool>,
}
impl TimeEventGate {
    #[allow(missing_docs)]
    pub fn new_with(config: JumpGateConfig) -> Self {
        Self {
            jump_gate: JumpGate::new_with(config),
            was_running: None,
        }
    }

    /// Returns the event, if any, that `time` represents relative to the
    /// previously polled time. The first poll only records state.
    pub fn poll(&mut self, time: &TimePoint) -> Option<TimeEvent> {
        let jumped = self.jump_gate.poll(time);
        let is_running = time.transport_running();
        let event = match self.was_running.replace(is_running) {
            None => None,
            Some(true) if !is_running => Some(TimeEvent::TransportPaused),
            Some(false) if is_running => Some(TimeEvent::TransportResumed),
            Some(_) if jumped => Some(TimeEvent::Jumped),
            Some(_) => None,
        };
        if let Some(event) = event {
            log::debug!("{event} at {time}");
        }
        event
    }

    /// Forgets all history, so the next poll reports nothing.
    pub fn reset(&mut self) {
        self.jump_gate.reset();
        self.was_running = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Meter;

    #[test]
    fn first_poll_never_jumps() {
        let mut gate = JumpGate::default();
        assert!(!gate.poll(&TimePoint::new_with_tick(1000.0)));
        assert!(!gate.poll(&TimePoint::new_with_tick(1000.5)));
        assert!(gate.poll(&TimePoint::new_with_tick(0.0)));
        gate.reset();
        assert!(!gate.poll(&TimePoint::new_with_tick(50.0)));
    }

    #[test]
    fn small_steps_are_continuous() {
        let mut gate = JumpGate::default();
        let mut time = TimePoint::default();
        for _ in 0..100 {
            assert!(!gate.poll(&time));
            time = time.incremented(0.25);
        }
        let time = TimePoint::new_with_tick(100.0);
        assert!(gate.poll(&time));
        // Exactly the threshold still counts as continuous.
        assert!(!gate.poll(&time.incremented(1.0)));
        // Standing still isn't a jump either.
        assert!(!gate.poll(&time.incremented(1.0)));
        assert!(gate.poll(&time.incremented(2.0 + 1e-3)));
        assert!(gate.poll(&time.incremented(2.0)));
    }

    #[test]
    fn threshold_converts_through_meter() {
        let mut gate = JumpGate::new_with(
            JumpGateConfigBuilder::default()
                .threshold(DomainDuration::bars(1.0))
                .build()
                .unwrap(),
        );
        let three_four = Meter::new_with(3, 4).unwrap();
        assert!(!gate.poll(&TimePoint::new_with(0.0, three_four, true)));
        assert!(!gate.poll(&TimePoint::new_with(3.0, three_four, true)));
        assert!(gate.poll(&TimePoint::new_with(6.5, three_four, true)));

        gate.set_threshold(DomainDuration::beats(0.5));
        assert!(gate.poll(&TimePoint::new_with(7.25, three_four, true)));
        assert!(!gate.poll(&TimePoint::new_with(7.5, three_four, true)));
    }

    #[test]
    fn transport_events_take_precedence() {
        let mut gate = TimeEventGate::default();
        let running = TimePoint::new_with_tick(10.0);
        assert_eq!(gate.poll(&running.with_transport_running(false)), None);
        assert_eq!(
            gate.poll(&running.incremented(0.1)),
            Some(TimeEvent::TransportResumed)
        );
        assert_eq!(gate.poll(&running.incremented(0.2)), None);
        assert_eq!(
            gate.poll(&running.with_tick(0.0).with_transport_running(false)),
            Some(TimeEvent::TransportPaused)
        );
        assert_eq!(
            gate.poll(&running.with_tick(0.0).with_transport_running(false)),
            None
        );
        assert_eq!(gate.poll(&running.with_tick(0.0)), Some(TimeEvent::TransportResumed));
        assert_eq!(gate.poll(&running.with_tick(64.0)), Some(TimeEvent::Jumped));

        gate.reset();
        assert_eq!(gate.poll(&running.with_tick(0.0)), None);
    }

    #[test]
    fn config_loads_from_json() {
        let config: JumpGateConfig =
            serde_json::from_str(r#"{"threshold": {"value": 2.0, "domain": "beats"}}"#).unwrap();
        assert_eq!(config.threshold, DomainDuration::beats(2.0));
        assert_eq!(JumpGateConfig::default().threshold, DomainDuration::ticks(1.0));
    }
}
