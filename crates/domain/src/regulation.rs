//! Regulation state machine: debounced, hysteretic relay decisions.
//!
//! [`Regulator`] is a pure state machine: the caller supplies the current
//! monotonic time and humidity difference, and gets back the transitions that
//! happened. Each transition may carry a [`RelayCommand`] for the actuator.
//! Timers are plain `Instant`s so the machine is fully deterministic in tests.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::event::EventKind;

/// Thresholds and timings for one evaluation, derived from settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegulationParams {
    pub on_threshold: f64,
    pub off_threshold: f64,
    pub on_delay: Duration,
    pub off_delay: Duration,
    pub max_on_time: Duration,
}

/// Automatic regulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulationState {
    #[default]
    Idle,
    PendingOn,
    RelayOn,
}

impl RegulationState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PendingOn => "pending_on",
            Self::RelayOn => "relay_on",
        }
    }
}

impl std::fmt::Display for RegulationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command the regulator asks the actuator to execute immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    TurnOn,
    TurnOff,
}

/// Something that happened during a [`Regulator::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Idle → `PendingOn`.
    PendingOnStarted { diff: f64 },
    /// `PendingOn` → Idle; `diff` is `None` when the outside reading vanished.
    PendingOnCancelled { diff: Option<f64> },
    /// `PendingOn` → `RelayOn`.
    RelayTurnedOn { diff: f64 },
    /// `RelayOn` → Idle by the safety cutoff.
    MaxOnTimeExceeded { on_for: Duration },
    /// Off-debounce started while staying in `RelayOn`.
    PendingOffStarted { diff: f64 },
    /// Off-debounce cancelled while staying in `RelayOn`.
    PendingOffCancelled { diff: f64 },
    /// `RelayOn` → Idle after the off-debounce elapsed.
    RelayTurnedOff { diff: f64 },
}

impl Transition {
    /// Relay command to issue for this transition, if any.
    #[must_use]
    pub fn command(&self) -> Option<RelayCommand> {
        match self {
            Self::RelayTurnedOn { .. } => Some(RelayCommand::TurnOn),
            Self::MaxOnTimeExceeded { .. } | Self::RelayTurnedOff { .. } => {
                Some(RelayCommand::TurnOff)
            }
            Self::PendingOnStarted { .. }
            | Self::PendingOnCancelled { .. }
            | Self::PendingOffStarted { .. }
            | Self::PendingOffCancelled { .. } => None,
        }
    }

    /// Event kind under which this transition is logged.
    #[must_use]
    pub fn event_kind(&self) -> EventKind {
        match self {
            Self::PendingOnStarted { .. } => EventKind::PendingOnStarted,
            Self::PendingOnCancelled { .. } => EventKind::PendingOnCancelled,
            Self::RelayTurnedOn { .. } => EventKind::RelayTurnedOn,
            Self::MaxOnTimeExceeded { .. } => EventKind::MaxOnTimeExceeded,
            Self::PendingOffStarted { .. } => EventKind::PendingOffStarted,
            Self::PendingOffCancelled { .. } => EventKind::PendingOffCancelled,
            Self::RelayTurnedOff { .. } => EventKind::RelayTurnedOff,
        }
    }

    /// Human-readable description for the event log.
    #[must_use]
    pub fn message(&self, params: &RegulationParams) -> String {
        match self {
            Self::PendingOnStarted { diff } => format!(
                "Diff {diff:.2} > {}, on-timer started.",
                params.on_threshold
            ),
            Self::PendingOnCancelled { .. } => {
                "Condition no longer met during on-delay.".to_string()
            }
            Self::RelayTurnedOn { .. } => "Relay turned on after on-delay.".to_string(),
            Self::MaxOnTimeExceeded { .. } => {
                "Maximum on-time exceeded, relay turned off.".to_string()
            }
            Self::PendingOffStarted { diff } => format!(
                "Diff {diff:.2} < {}, off-timer started.",
                params.off_threshold
            ),
            Self::PendingOffCancelled { .. } => {
                "Diff back above off-threshold, off-timer cancelled.".to_string()
            }
            Self::RelayTurnedOff { .. } => "Relay turned off after off-delay.".to_string(),
        }
    }
}

/// The automatic regulation state machine.
///
/// Exactly one state branch is evaluated per [`step`](Self::step). In
/// `RelayOn`, starting the off-debounce and its expiry may both happen in the
/// same step when `off_delay` is zero.
#[derive(Debug, Clone, Default)]
pub struct Regulator {
    state: RegulationState,
    pending_on_start: Option<Instant>,
    relay_on_start: Option<Instant>,
    pending_off_start: Option<Instant>,
}

impl Regulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> RegulationState {
        self.state
    }

    /// Whether an off-debounce is currently running.
    #[must_use]
    pub fn is_pending_off(&self) -> bool {
        self.pending_off_start.is_some()
    }

    /// Back to `Idle` with every timer cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Evaluate one cycle.
    ///
    /// `diff` is inside minus outside absolute humidity, `None` when the
    /// outside reading is unavailable.
    pub fn step(
        &mut self,
        now: Instant,
        diff: Option<f64>,
        params: &RegulationParams,
    ) -> Vec<Transition> {
        match self.state {
            RegulationState::Idle => self.step_idle(now, diff, params),
            RegulationState::PendingOn => self.step_pending_on(now, diff, params),
            RegulationState::RelayOn => self.step_relay_on(now, diff, params),
        }
    }

    fn step_idle(
        &mut self,
        now: Instant,
        diff: Option<f64>,
        params: &RegulationParams,
    ) -> Vec<Transition> {
        match diff {
            Some(diff) if diff > params.on_threshold => {
                self.state = RegulationState::PendingOn;
                self.pending_on_start = Some(now);
                vec![Transition::PendingOnStarted { diff }]
            }
            _ => Vec::new(),
        }
    }

    fn step_pending_on(
        &mut self,
        now: Instant,
        diff: Option<f64>,
        params: &RegulationParams,
    ) -> Vec<Transition> {
        let diff = match diff {
            Some(diff) if diff > params.on_threshold => diff,
            other => {
                self.reset();
                return vec![Transition::PendingOnCancelled { diff: other }];
            }
        };
        let started = *self.pending_on_start.get_or_insert(now);
        if now.saturating_duration_since(started) < params.on_delay {
            return Vec::new();
        }
        self.state = RegulationState::RelayOn;
        self.pending_on_start = None;
        self.relay_on_start = Some(now);
        vec![Transition::RelayTurnedOn { diff }]
    }

    fn step_relay_on(
        &mut self,
        now: Instant,
        diff: Option<f64>,
        params: &RegulationParams,
    ) -> Vec<Transition> {
        let on_since = *self.relay_on_start.get_or_insert(now);
        let on_for = now.saturating_duration_since(on_since);
        if on_for >= params.max_on_time {
            self.reset();
            return vec![Transition::MaxOnTimeExceeded { on_for }];
        }

        // Without an outside reading the off-debounce is frozen.
        let Some(diff) = diff else {
            return Vec::new();
        };

        let mut transitions = Vec::new();
        if diff < params.off_threshold {
            if self.pending_off_start.is_none() {
                self.pending_off_start = Some(now);
                transitions.push(Transition::PendingOffStarted { diff });
            }
        } else if self.pending_off_start.take().is_some() {
            transitions.push(Transition::PendingOffCancelled { diff });
        }

        if let Some(off_since) = self.pending_off_start
            && now.saturating_duration_since(off_since) >= params.off_delay
        {
            self.reset();
            transitions.push(Transition::RelayTurnedOff { diff });
        }
        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(on_delay: u64, off_delay: u64, max_on_time: u64) -> RegulationParams {
        RegulationParams {
            on_threshold: 2.0,
            off_threshold: 1.7,
            on_delay: Duration::from_secs(on_delay),
            off_delay: Duration::from_secs(off_delay),
            max_on_time: Duration::from_secs(max_on_time),
        }
    }

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    fn commands(transitions: &[Transition]) -> Vec<RelayCommand> {
        transitions.iter().filter_map(Transition::command).collect()
    }

    #[test]
    fn should_stay_idle_when_diff_at_or_below_threshold() {
        let base = Instant::now();
        let p = params(60, 300, 300);
        let mut regulator = Regulator::new();

        assert!(regulator.step(base, Some(2.0), &p).is_empty());
        assert!(regulator.step(at(base, 1), None, &p).is_empty());
        assert_eq!(regulator.state(), RegulationState::Idle);
    }

    #[test]
    fn should_turn_on_exactly_once_after_on_delay() {
        let base = Instant::now();
        let p = params(60, 300, 600);
        let mut regulator = Regulator::new();
        let mut issued = Vec::new();

        for secs in (0..=120).step_by(10) {
            let transitions = regulator.step(at(base, secs), Some(2.5), &p);
            issued.extend(commands(&transitions));
        }

        assert_eq!(issued, vec![RelayCommand::TurnOn]);
        assert_eq!(regulator.state(), RegulationState::RelayOn);
    }

    #[test]
    fn should_turn_on_when_delay_elapsed_exactly() {
        let base = Instant::now();
        let p = params(60, 300, 300);
        let mut regulator = Regulator::new();

        regulator.step(base, Some(2.5), &p);
        assert!(regulator.step(at(base, 59), Some(2.5), &p).is_empty());
        let transitions = regulator.step(at(base, 60), Some(2.5), &p);

        assert_eq!(transitions, vec![Transition::RelayTurnedOn { diff: 2.5 }]);
    }

    #[test]
    fn should_cancel_pending_on_when_diff_drops_before_delay() {
        let base = Instant::now();
        let p = params(60, 300, 300);
        let mut regulator = Regulator::new();

        regulator.step(base, Some(2.5), &p);
        let transitions = regulator.step(at(base, 30), Some(2.0), &p);

        assert_eq!(
            transitions,
            vec![Transition::PendingOnCancelled { diff: Some(2.0) }]
        );
        assert!(commands(&transitions).is_empty());
        assert_eq!(regulator.state(), RegulationState::Idle);
    }

    #[test]
    fn should_cancel_pending_on_when_outside_reading_vanishes() {
        let base = Instant::now();
        let p = params(60, 300, 300);
        let mut regulator = Regulator::new();

        regulator.step(base, Some(2.5), &p);
        let transitions = regulator.step(at(base, 1), None, &p);

        assert_eq!(
            transitions,
            vec![Transition::PendingOnCancelled { diff: None }]
        );
    }

    #[test]
    fn should_force_off_at_max_on_time_regardless_of_diff() {
        let base = Instant::now();
        let p = params(0, 300, 300);
        let mut regulator = Regulator::new();

        regulator.step(base, Some(5.0), &p);
        regulator.step(at(base, 1), Some(5.0), &p);
        assert_eq!(regulator.state(), RegulationState::RelayOn);

        assert!(regulator.step(at(base, 300), Some(5.0), &p).is_empty());
        let transitions = regulator.step(at(base, 301), Some(5.0), &p);

        assert_eq!(
            transitions,
            vec![Transition::MaxOnTimeExceeded {
                on_for: Duration::from_secs(300)
            }]
        );
        assert_eq!(commands(&transitions), vec![RelayCommand::TurnOff]);
        assert_eq!(regulator.state(), RegulationState::Idle);
    }

    #[test]
    fn should_turn_off_after_off_delay() {
        let base = Instant::now();
        let p = params(0, 30, 600);
        let mut regulator = Regulator::new();
        regulator.step(base, Some(3.0), &p);
        regulator.step(base, Some(3.0), &p);

        let started = regulator.step(at(base, 10), Some(1.0), &p);
        assert_eq!(started, vec![Transition::PendingOffStarted { diff: 1.0 }]);
        assert!(regulator.step(at(base, 30), Some(1.0), &p).is_empty());
        let off = regulator.step(at(base, 40), Some(1.2), &p);

        assert_eq!(off, vec![Transition::RelayTurnedOff { diff: 1.2 }]);
        assert_eq!(regulator.state(), RegulationState::Idle);
    }

    #[test]
    fn should_start_and_expire_off_debounce_in_one_step_when_delay_is_zero() {
        let base = Instant::now();
        let p = params(0, 0, 600);
        let mut regulator = Regulator::new();
        regulator.step(base, Some(3.0), &p);
        regulator.step(base, Some(3.0), &p);

        let transitions = regulator.step(at(base, 1), Some(1.0), &p);

        assert_eq!(
            transitions,
            vec![
                Transition::PendingOffStarted { diff: 1.0 },
                Transition::RelayTurnedOff { diff: 1.0 },
            ]
        );
    }

    #[test]
    fn should_cancel_off_debounce_when_diff_recovers() {
        let base = Instant::now();
        let p = params(0, 30, 600);
        let mut regulator = Regulator::new();
        regulator.step(base, Some(3.0), &p);
        regulator.step(base, Some(3.0), &p);
        regulator.step(at(base, 5), Some(1.0), &p);

        let transitions = regulator.step(at(base, 10), Some(1.7), &p);

        assert_eq!(
            transitions,
            vec![Transition::PendingOffCancelled { diff: 1.7 }]
        );
        assert!(!regulator.is_pending_off());
        assert_eq!(regulator.state(), RegulationState::RelayOn);
    }

    #[test]
    fn should_freeze_off_debounce_while_diff_undefined() {
        let base = Instant::now();
        let p = params(0, 30, 600);
        let mut regulator = Regulator::new();
        regulator.step(base, Some(3.0), &p);
        regulator.step(base, Some(3.0), &p);
        regulator.step(at(base, 5), Some(1.0), &p);

        let transitions = regulator.step(at(base, 100), None, &p);

        assert!(transitions.is_empty());
        assert!(regulator.is_pending_off());
        assert_eq!(regulator.state(), RegulationState::RelayOn);
    }

    #[test]
    fn should_only_leave_relay_on_through_cutoff_without_outside_reading() {
        let base = Instant::now();
        let p = params(0, 30, 120);
        let mut regulator = Regulator::new();
        regulator.step(base, Some(3.0), &p);
        regulator.step(base, Some(3.0), &p);

        for secs in (10..120).step_by(10) {
            assert!(regulator.step(at(base, secs), None, &p).is_empty());
        }
        let transitions = regulator.step(at(base, 120), None, &p);

        assert_eq!(commands(&transitions), vec![RelayCommand::TurnOff]);
    }

    #[test]
    fn should_clear_every_timer_on_reset() {
        let base = Instant::now();
        let p = params(60, 300, 300);
        let mut regulator = Regulator::new();
        regulator.step(base, Some(2.5), &p);

        regulator.reset();
        assert_eq!(regulator.state(), RegulationState::Idle);

        regulator.step(at(base, 100), Some(2.5), &p);
        assert!(regulator.step(at(base, 159), Some(2.5), &p).is_empty());
        let transitions = regulator.step(at(base, 160), Some(2.5), &p);
        assert_eq!(commands(&transitions), vec![RelayCommand::TurnOn]);
    }

    #[test]
    fn should_display_snake_case_state_names() {
        assert_eq!(RegulationState::PendingOn.to_string(), "pending_on");
        let json = serde_json::to_string(&RegulationState::RelayOn).unwrap();
        assert_eq!(json, "\"relay_on\"");
    }

    #[test]
    fn should_map_transitions_to_event_kinds() {
        assert_eq!(
            Transition::MaxOnTimeExceeded {
                on_for: Duration::ZERO
            }
            .event_kind(),
            EventKind::MaxOnTimeExceeded
        );
        assert_eq!(
            Transition::PendingOffStarted { diff: 1.0 }.event_kind(),
            EventKind::PendingOffStarted
        );
    }
}
