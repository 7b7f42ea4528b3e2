// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::uid::TriggerId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use strum_macros::{EnumIter, IntoStaticStr};

/// Whether a [Trigger] opens or closes a gate.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TriggerType {
    #[allow(missing_docs)]
    PulseOn,
    #[allow(missing_docs)]
    PulseOff,
}

/// One gate edge. Triggers live only as long as the call that returned them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Trigger {
    trigger_type: TriggerType,
    id: TriggerId,
}
impl Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.trigger_type.into();
        write!(f, "{name}({})", self.id)
    }
}
#[allow(missing_docs)]
impl Trigger {
    pub fn new_with(trigger_type: TriggerType, id: TriggerId) -> Self {
        Self { trigger_type, id }
    }

    pub fn pulse_on(id: TriggerId) -> Self {
        Self::new_with(TriggerType::PulseOn, id)
    }

    pub fn pulse_off(id: TriggerId) -> Self {
        Self::new_with(TriggerType::PulseOff, id)
    }

    pub fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn is_pulse_on(&self) -> bool {
        self.trigger_type == TriggerType::PulseOn
    }

    pub fn is_pulse_off(&self) -> bool {
        self.trigger_type == TriggerType::PulseOff
    }

    /// True if self is the `pulse_off` that closes the gate `on` opened.
    pub fn terminates(&self, on: &Trigger) -> bool {
        self.is_pulse_off() && on.is_pulse_on() && self.id == on.id
    }

    pub fn contains_pulse_on(triggers: &[Trigger]) -> bool {
        triggers.iter().any(Trigger::is_pulse_on)
    }

    pub fn contains_pulse_off(triggers: &[Trigger]) -> bool {
        triggers.iter().any(Trigger::is_pulse_off)
    }

    /// The ids of every trigger of the given type, in order.
    pub fn ids_of(trigger_type: TriggerType, triggers: &[Trigger]) -> Vec<TriggerId> {
        triggers
            .iter()
            .filter(|t| t.trigger_type == trigger_type)
            .map(|t| t.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_terminates_only_its_own_on() {
        let on = Trigger::pulse_on(TriggerId(3));
        assert!(Trigger::pulse_off(TriggerId(3)).terminates(&on));
        assert!(!Trigger::pulse_off(TriggerId(4)).terminates(&on));
        assert!(!Trigger::pulse_on(TriggerId(3)).terminates(&on));
        assert!(!on.terminates(&Trigger::pulse_off(TriggerId(3))));
    }

    #[test]
    fn slice_helpers() {
        let triggers = [
            Trigger::pulse_off(TriggerId(1)),
            Trigger::pulse_on(TriggerId(2)),
            Trigger::pulse_off(TriggerId(5)),
        ];
        assert!(Trigger::contains_pulse_on(&triggers));
        assert!(Trigger::contains_pulse_off(&triggers));
        assert!(!Trigger::contains_pulse_on(&triggers[..1]));
        assert!(!Trigger::contains_pulse_off(&[]));
        assert_eq!(
            Trigger::ids_of(TriggerType::PulseOff, &triggers),
            vec![TriggerId(1), TriggerId(5)]
        );
        assert_eq!(
            Trigger::ids_of(TriggerType::PulseOn, &triggers),
            vec![TriggerId(2)]
        );
    }

    #[test]
    fn display_names_type_and_id() {
        assert_eq!(Trigger::pulse_on(TriggerId(9)).to_string(), "pulse-on(9)");
        assert_eq!(Trigger::pulse_off(TriggerId(2)).to_string(), "pulse-off(2)");
    }
}
