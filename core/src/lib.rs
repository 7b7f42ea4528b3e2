// Copyright (c) 2023 Mike Tsao. All rights reserved.

#![warn(missing_docs)]

//! Timing core for musically synchronized gates: exact and domain-tagged
//! musical time, drift-free grid scheduling, and the pulsators that turn
//! transport time into paired on/off triggers.

/// Detects seeks, loops, pauses, and resumes in the transport.
pub mod gates;
/// Positions on a circle, with wraparound-aware comparisons.
pub mod phase;
/// Open gates and the collection that owns them.
pub mod pulse;
/// Self-clocked, triggered, and pass-through gate generators.
pub mod pulsators;
/// Provides a random-number generator for debugging and testing.
pub mod rng;
/// Fractions, meters, time domains, and transport snapshots.
pub mod time;
/// Next-instant calculations against a transport-locked grid.
pub mod transport_locked;
/// Gate edges.
pub mod trigger;
/// Unique trigger identifiers.
pub mod uid;

/// Recommended imports for easy onboarding.
pub mod prelude {
    pub use super::gates::{JumpGate, JumpGateConfig, TimeEvent, TimeEventGate};
    pub use super::phase::{Direction, Phase};
    pub use super::pulse::{Pulse, Pulses};
    pub use super::pulsators::{
        AutoPulsator, AutoPulsatorConfig, AutoPulsatorConfigBuilder, BeatPulsator,
        BeatPulsatorConfig, GatedPulsator, Pulsates, Pulsator, PulsatorConfig, PulsatorState,
        ThruPulsator, TimeSpecification, TriggeredPulsator, TriggeredPulsatorConfig,
    };
    pub use super::time::{
        DomainDuration, DomainTimePoint, DomainType, Fraction, Meter, TimeDomainError, TimePoint,
    };
    pub use super::transport_locked::TransportLocked;
    pub use super::trigger::{Trigger, TriggerType};
    pub use super::uid::{TriggerId, TriggerIdFactory};
}
