// Copyright (c) 2023 Mike Tsao. All rights reserved.

#![warn(missing_docs)]

//! The `ensnare-pulse` crate generates musically synchronized gates.
//!
//! A host advances a transport and hands each position to a pulsator as a
//! [TimePoint](time::TimePoint). The pulsator answers with the
//! [Triggers](triggers::Trigger) that are due: a `pulse_on` when a gate opens
//! and, later, a `pulse_off` with the same id when it closes.

pub mod time {
    //! Musical time in three interchangeable domains.
    //!
    //! Positions and durations can be expressed in ticks (quarter notes),
    //! beats, or bars. Beats and bars depend on the [Meter], so values in
    //! different domains can be combined only by converting through one.
    //! [DomainTimePoint] and [DomainDuration] carry their domain with them and
    //! refuse to mix silently, returning [TimeDomainError] instead.

    pub use ensnare_pulse_core::{
        phase::{Direction, Phase},
        time::{
            DomainDuration, DomainTimePoint, DomainType, Fraction, Meter, TimeDomainError,
            TimePoint,
        },
    };

    /// The most commonly used imports.
    pub mod prelude {
        pub use super::{DomainDuration, DomainTimePoint, DomainType, Meter, TimePoint};
    }
}

pub mod scheduling {
    //! Grid arithmetic and discontinuity detection.
    //!
    //! [TransportLocked] computes the next instant of a periodic grid while
    //! tolerating floating-point error at grid lines, so a schedule fires
    //! exactly once per line. [TimeEventGate] watches successive time points
    //! for seeks, loops, pauses, and resumes.

    pub use ensnare_pulse_core::{
        gates::{
            JumpGate, JumpGateConfig, JumpGateConfigBuilder, TimeEvent, TimeEventGate,
        },
        transport_locked::{TransportLocked, EPSILON},
    };

    /// The most commonly used imports.
    pub mod prelude {
        pub use super::{TimeEvent, TimeEventGate, TransportLocked};
    }
}

pub mod triggers {
    //! Gate edges and the identities that pair them.
    //!
    //! Every gate gets a [TriggerId] from the session's [TriggerIdFactory].
    //! Its `pulse_on` and `pulse_off` [Trigger]s both carry that id, and the
    //! open gate itself is tracked as a [Pulse].

    pub use ensnare_pulse_core::{
        pulse::{Pulse, Pulses},
        trigger::{Trigger, TriggerType},
        uid::{TriggerId, TriggerIdFactory},
    };

    /// The most commonly used imports.
    pub mod prelude {
        pub use super::{Trigger, TriggerId, TriggerIdFactory};
    }
}

pub mod pulsators {
    //! State machines that produce gates.
    //!
    //! - [AutoPulsator] fires on a free-running periodic grid.
    //! - [BeatPulsator] fires on a grid that restarts at each bar line.
    //! - [TriggeredPulsator] opens a fixed-length gate for each upstream
    //!   `pulse_on`.
    //! - [ThruPulsator] passes upstream gates through and closes whatever is
    //!   still open when it stops.
    //!
    //! [Pulsator] wraps all four behind the [Pulsates] trait, and
    //! [PulsatorConfig] describes any of them in serializable form.

    pub use ensnare_pulse_core::pulsators::*;

    /// The most commonly used imports.
    pub mod prelude {
        pub use super::{GatedPulsator, Pulsates, Pulsator, PulsatorConfig, PulsatorState};
    }
}

/// A collection of imports that are useful to users of this crate. `use
/// ensnare_pulse::prelude::*;` for easier onboarding.
pub mod prelude {
    pub use super::{
        pulsators::prelude::*, scheduling::prelude::*, time::prelude::*, triggers::prelude::*,
    };
}
