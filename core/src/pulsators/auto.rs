// Copyright (c) 2023 Mike Tsao. All rights reserved.

use super::{PulsatorState, Pulsates};
use crate::{
    pulse::{Pulse, Pulses},
    time::{DomainDuration, DomainTimePoint, TimePoint},
    transport_locked::{TransportLocked, EPSILON},
    trigger::Trigger,
    uid::TriggerIdFactory,
};
use derivative::Derivative;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters of an [AutoPulsator].
#[derive(Clone, Copy, Debug, Builder, Derivative, PartialEq, Serialize, Deserialize)]
#[derivative(Default)]
#[builder(default)]
#[builder_struct_attr(allow(missing_docs))]
#[serde(rename_all = "kebab-case")]
pub struct AutoPulsatorConfig {
    /// Distance between successive pulse-ons.
    #[derivative(Default(value = "DomainDuration::ticks(1.0)"))]
    pub period: DomainDuration,

    /// Shifts the grid away from zero.
    #[derivative(Default(value = "DomainDuration::ticks(0.0)"))]
    pub offset: DomainDuration,

    /// Gate length as a multiple of the period. 1.0 closes each gate exactly
    /// as the next opens; more than that overlaps them.
    #[derivative(Default(value = "1.0"))]
    pub legato: f64,

    /// If true, parameter changes wait for the next pulse to take effect.
    /// If false, the pending pulse moves to the new grid right away.
    #[derivative(Default(value = "true"))]
    pub sample_and_hold: bool,
}

/// A self-clocked pulsator that fires on a periodic grid.
#[derive(Clone, Debug)]
pub struct AutoPulsator {
    config: AutoPulsatorConfig,
    ids: Arc<TriggerIdFactory>,
    state: PulsatorState,
    pulses: Pulses,
    next_trigger_time: Option<DomainTimePoint>,
    last_trigger_time: Option<DomainTimePoint>,
    needs_realignment: bool,
}
impl AutoPulsator {
    /// Periods are never allowed to shrink below this, in whatever domain
    /// they're expressed.
    pub const MIN_PERIOD: f64 = 1.0 / 1024.0;

    #[allow(missing_docs)]
    pub fn new_with(config: AutoPulsatorConfig, ids: Arc<TriggerIdFactory>) -> Self {
        Self {
            config: Self::sanitized(config),
            ids,
            state: Default::default(),
            pulses: Default::default(),
            next_trigger_time: None,
            last_trigger_time: None,
            needs_realignment: false,
        }
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &AutoPulsatorConfig {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn set_period(&mut self, period: DomainDuration) {
        self.update_config(AutoPulsatorConfig {
            period,
            ..self.config
        });
    }

    #[allow(missing_docs)]
    pub fn set_offset(&mut self, offset: DomainDuration) {
        self.update_config(AutoPulsatorConfig {
            offset,
            ..self.config
        });
    }

    /// Negative values are treated as zero.
    pub fn set_legato(&mut self, legato: f64) {
        self.update_config(AutoPulsatorConfig {
            legato,
            ..self.config
        });
    }

    #[allow(missing_docs)]
    pub fn set_sample_and_hold(&mut self, sample_and_hold: bool) {
        self.config.sample_and_hold = sample_and_hold;
    }

    /// Replaces every parameter at once. Gates that are already open keep
    /// their closing times.
    pub fn update_config(&mut self, config: AutoPulsatorConfig) {
        let config = Self::sanitized(config);
        let grid_changed =
            config.period != self.config.period || config.offset != self.config.offset;
        self.config = config;
        if grid_changed && !self.config.sample_and_hold && self.next_trigger_time.is_some() {
            self.needs_realignment = true;
        }
    }

    fn sanitized(mut config: AutoPulsatorConfig) -> AutoPulsatorConfig {
        let period = config.period.value();
        if !period.is_finite() {
            config.period = AutoPulsatorConfig::default().period;
        } else if period < Self::MIN_PERIOD {
            config.period = DomainDuration::new_with(Self::MIN_PERIOD, config.period.domain());
        }
        if !config.offset.value().is_finite() {
            config.offset = DomainDuration::zero(config.offset.domain());
        }
        config.legato = config.legato.max(0.0);
        if !config.legato.is_finite() {
            config.legato = 0.0;
        }
        config
    }

    fn realign(&mut self, time: &TimePoint) {
        self.needs_realignment = false;
        let Some(target) = self.next_trigger_time else {
            return;
        };
        let adjusted =
            TransportLocked::adjusted(&target, time, &self.config.period, &self.config.offset);

        // Snapping backward must not land on a line that has already fired.
        let already_fired = self.last_trigger_time.is_some_and(|last| {
            last.as_type(adjusted.domain(), time.meter()).value() + EPSILON >= adjusted.value()
        });
        self.next_trigger_time = Some(if already_fired {
            TransportLocked::next_from_either(
                self.last_trigger_time.as_ref(),
                time,
                &self.config.period,
                &self.config.offset,
                false,
            )
        } else {
            adjusted
        });
        log::debug!(
            "realigned pending pulse from {target} to {:?}",
            self.next_trigger_time
        );
    }
}
impl Pulsates for AutoPulsator {
    fn state(&self) -> PulsatorState {
        self.state
    }

    fn start(&mut self, time: &TimePoint, first_pulse_time: Option<DomainTimePoint>) {
        if self.is_running() {
            return;
        }
        self.state = PulsatorState::Running;
        self.last_trigger_time = None;
        self.needs_realignment = false;
        self.next_trigger_time = Some(first_pulse_time.unwrap_or_else(|| {
            TransportLocked::next_from_time_point(
                time,
                &self.config.period,
                &self.config.offset,
                true,
            )
        }));
        log::debug!(
            "auto pulsator started at {time}, first pulse at {:?}",
            self.next_trigger_time
        );
    }

    fn stop(&mut self) -> Vec<Trigger> {
        // Imported gates can be open even while stopped.
        let offs = self.pulses.flush();
        if self.is_running() {
            self.state = PulsatorState::Stopped;
            self.next_trigger_time = None;
            self.last_trigger_time = None;
            self.needs_realignment = false;
            log::debug!("auto pulsator stopped, closing {} gates", offs.len());
        }
        offs
    }

    fn poll(&mut self, time: &TimePoint) -> Vec<Trigger> {
        if !self.is_running() {
            return Vec::default();
        }
        let mut triggers = self.pulses.drain_elapsed(time);
        if self.needs_realignment {
            self.realign(time);
        }
        if let Some(trigger_time) = self.next_trigger_time {
            if trigger_time.has_elapsed(time) {
                let length = self.config.period * self.config.legato;
                let off_time = trigger_time.add_with_meter(&length, time.meter());
                let id = self.ids.mint_next();
                log::trace!("pulse {id} on at {trigger_time}, off at {off_time}");
                triggers.push(self.pulses.new_pulse(trigger_time, Some(off_time), id));

                self.last_trigger_time = Some(trigger_time);
                self.next_trigger_time = Some(TransportLocked::next_from_either(
                    Some(&trigger_time),
                    time,
                    &self.config.period,
                    &self.config.offset,
                    false,
                ));
            }
        }
        triggers
    }

    fn handle_time_skip(&mut self, new_time: &TimePoint) -> Vec<Trigger> {
        let offs = self.pulses.flush();
        if self.is_running() {
            self.last_trigger_time = None;
            self.needs_realignment = false;
            self.next_trigger_time = Some(TransportLocked::next_from_time_point(
                new_time,
                &self.config.period,
                &self.config.offset,
                true,
            ));
        }
        log::debug!(
            "auto pulsator skipped to {new_time}, next pulse at {:?}",
            self.next_trigger_time
        );
        offs
    }

    fn export_pulses(&mut self) -> Vec<Pulse> {
        self.pulses.export()
    }

    fn import_pulses(&mut self, pulses: Vec<Pulse>) {
        log::debug!("auto pulsator took over {} gates", pulses.len());
        self.pulses.import(pulses);
    }

    fn next_scheduled_pulse_on(&self) -> Option<DomainTimePoint> {
        self.next_trigger_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{time::DomainType, trigger::TriggerType, uid::TriggerId};
    use more_asserts::{assert_ge, assert_le};

    const STEP: f64 = 1e-3;

    fn pulsator(period: f64, legato: f64) -> AutoPulsator {
        AutoPulsator::new_with(
            AutoPulsatorConfigBuilder::default()
                .period(DomainDuration::ticks(period))
                .legato(legato)
                .build()
                .unwrap(),
            Arc::new(TriggerIdFactory::default()),
        )
    }

    fn at(tick: f64) -> TimePoint {
        TimePoint::new_with_tick(tick)
    }

    #[test]
    fn stopped_pulsator_is_silent() {
        let mut p = pulsator(1.0, 0.5);
        assert!(p.poll(&at(0.0)).is_empty());
        assert!(p.stop().is_empty());
        assert_eq!(p.next_scheduled_pulse_on(), None);
    }

    #[test]
    fn legato_one_closes_and_opens_together() {
        let mut p = pulsator(2.0, 1.0);
        p.start(&at(0.0), None);
        assert_eq!(p.poll(&at(STEP)), vec![Trigger::pulse_on(TriggerId(1))]);
        assert!(p.poll(&at(1.0 + STEP)).is_empty());
        assert_eq!(
            p.poll(&at(2.0 + STEP)),
            vec![
                Trigger::pulse_off(TriggerId(1)),
                Trigger::pulse_on(TriggerId(2))
            ]
        );
    }

    #[test]
    fn short_legato_leaves_a_gap() {
        let mut p = pulsator(2.0, 0.5);
        p.start(&at(0.0), None);
        assert_eq!(p.poll(&at(STEP)), vec![Trigger::pulse_on(TriggerId(1))]);
        assert_eq!(p.poll(&at(1.0 + STEP)), vec![Trigger::pulse_off(TriggerId(1))]);
        assert_eq!(p.poll(&at(2.0 + STEP)), vec![Trigger::pulse_on(TriggerId(2))]);
    }

    #[test]
    fn long_legato_overlaps() {
        let mut p = pulsator(2.0, 1.5);
        p.start(&at(0.0), None);
        assert_eq!(p.poll(&at(STEP)), vec![Trigger::pulse_on(TriggerId(1))]);
        assert_eq!(p.poll(&at(2.0 + STEP)), vec![Trigger::pulse_on(TriggerId(2))]);
        assert_eq!(p.poll(&at(3.0 + STEP)), vec![Trigger::pulse_off(TriggerId(1))]);
        assert_eq!(p.poll(&at(4.0 + STEP)), vec![Trigger::pulse_on(TriggerId(3))]);
        assert_eq!(p.poll(&at(5.0 + STEP)), vec![Trigger::pulse_off(TriggerId(2))]);
    }

    #[test]
    fn zero_legato_closes_on_next_poll() {
        let mut p = pulsator(1.0, 0.0);
        p.start(&at(0.0), None);
        assert_eq!(p.poll(&at(0.0)), vec![Trigger::pulse_on(TriggerId(1))]);
        assert_eq!(p.poll(&at(0.0)), vec![Trigger::pulse_off(TriggerId(1))]);

        p.set_legato(-3.0);
        assert_eq!(p.config().legato, 0.0);
    }

    #[test]
    fn stop_closes_every_open_gate_once() {
        let mut p = pulsator(1.0, 3.5);
        p.start(&at(0.0), None);
        let mut tick = 0.0;
        let mut open = 0;
        while tick < 3.0 {
            open += Trigger::ids_of(TriggerType::PulseOn, &p.poll(&at(tick))).len();
            tick += 0.25;
        }
        assert_eq!(open, 3);
        assert_eq!(p.stop().len(), 3);
        assert!(p.stop().is_empty());
        assert!(!p.is_running());
    }

    #[test]
    fn start_is_idempotent_and_honors_first_time() {
        let mut p = pulsator(1.0, 0.5);
        p.start(&at(0.3), Some(DomainTimePoint::ticks(0.75)));
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(0.75)));
        p.start(&at(0.4), None);
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(0.75)));
        assert!(p.poll(&at(0.5)).is_empty());
        assert_eq!(p.poll(&at(0.8)).len(), 1);
        // The grid continues from where the first pulse landed.
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(1.0)));
    }

    #[test]
    fn at_most_one_pulse_per_poll() {
        let mut p = pulsator(0.25, 0.5);
        p.start(&at(0.0), None);
        let triggers = p.poll(&at(10.0));
        assert_eq!(triggers, vec![Trigger::pulse_on(TriggerId(1))]);
        // After a long gap, scheduling resumes from the present.
        let next = p.next_scheduled_pulse_on().unwrap();
        assert_ge!(next.value(), 10.0);
        assert_le!(next.value(), 10.25);
    }

    #[test]
    fn sample_and_hold_keeps_pending_pulse() {
        let mut p = pulsator(2.0, 0.5);
        p.start(&at(0.0), None);
        p.poll(&at(0.0));
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(2.0)));

        p.set_period(DomainDuration::ticks(3.0));
        p.poll(&at(0.5));
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(2.0)));
        p.poll(&at(2.0));
        // The new period takes effect from the retrigger.
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(3.0)));
    }

    #[test]
    fn immediate_mode_realigns_pending_pulse() {
        let mut p = pulsator(2.0, 0.5);
        p.set_sample_and_hold(false);
        p.start(&at(0.0), None);
        p.poll(&at(0.0));

        p.set_period(DomainDuration::ticks(1.5));
        p.poll(&at(0.5));
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(1.5)));

        // The nearest line of the new grid has already passed.
        p.set_offset(DomainDuration::ticks(1.0));
        p.poll(&at(1.2));
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(2.5)));

        assert_eq!(p.poll(&at(2.5)), vec![Trigger::pulse_on(TriggerId(2))]);
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(4.0)));

        // A line that already fired is never chosen again.
        p.update_config(AutoPulsatorConfig {
            period: DomainDuration::ticks(4.0),
            offset: DomainDuration::ticks(2.5),
            ..*p.config()
        });
        assert!(p.poll(&at(2.5)).is_empty());
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(6.5)));
    }

    #[test]
    fn period_changes_domain_mid_run() {
        let mut p = pulsator(1.0, 1.0);
        p.start(&at(0.0), None);
        p.poll(&at(0.0));
        p.set_period(DomainDuration::bars(1.0));
        p.poll(&at(1.0));
        let next = p.next_scheduled_pulse_on().unwrap();
        assert_eq!(next.domain(), DomainType::Bars);
        assert_eq!(next.value(), 1.0);
    }

    #[test]
    fn time_skip_closes_gates_and_restarts_grid() {
        let mut p = pulsator(1.0, 1.0);
        p.start(&at(0.0), None);
        p.poll(&at(0.0));
        assert_eq!(
            p.handle_time_skip(&at(7.0)),
            vec![Trigger::pulse_off(TriggerId(1))]
        );
        assert_eq!(p.next_scheduled_pulse_on(), Some(DomainTimePoint::ticks(7.0)));
        assert_eq!(p.poll(&at(7.0)), vec![Trigger::pulse_on(TriggerId(2))]);
    }

    #[test]
    fn ignores_external_triggers() {
        let mut p = pulsator(1.0, 1.0);
        p.start(&at(0.0), None);
        assert!(p
            .handle_external_triggers(&at(0.0), &[Trigger::pulse_on(TriggerId(99))])
            .is_empty());
    }

    #[test]
    fn clamps_degenerate_periods() {
        let mut p = pulsator(0.0, 1.0);
        assert_eq!(p.config().period.value(), AutoPulsator::MIN_PERIOD);
        p.set_period(DomainDuration::beats(f64::NAN));
        assert_eq!(p.config().period, DomainDuration::ticks(1.0));
    }
}
