//! Actuator controller: delayed, mode-arbitrated, emergency-latching relay control.
//!
//! All mutable state lives behind one mutex that is never held across an
//! `.await`. Deferred actions run as one-shot tokio tasks; every task captures
//! the generation current when it was scheduled and does nothing unless that
//! generation is still current when it fires. Superseding, cancelling, the
//! emergency stop, `Aus` and shutdown all bump the generation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use humivent_domain::error::{HardwareError, InvalidModeError};
use humivent_domain::mode::RelayMode;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::ports::RelayDriver;

/// Desired relay output of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayAction {
    On,
    Off,
}

impl std::fmt::Display for RelayAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Why a command was not accepted.
///
/// Refusals leave the relay line untouched. The one exception is a failed
/// emergency stop: the latch is set and pending actions are cancelled even
/// though the line write reported [`Refusal::HardwareFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// Manual command outside `Hand` mode.
    ManualLockout,
    /// Activation after an emergency stop.
    EmergencyActive,
    AlreadyOn,
    AlreadyOff,
    /// The controller has been shut down.
    Closed,
    /// The relay line write failed.
    HardwareFault,
    /// Called outside a tokio runtime, so no timer can be scheduled.
    NoRuntime,
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ManualLockout => "Manual control is only allowed in Hand mode!",
            Self::EmergencyActive => "Emergency active! Relay remains off!",
            Self::AlreadyOn => "Relay is already on!",
            Self::AlreadyOff => "Relay is already off!",
            Self::Closed => "Relay controller is shut down!",
            Self::HardwareFault => "Relay output failed!",
            Self::NoRuntime => "No scheduler available for relay actions!",
        })
    }
}

/// Result of a public actuator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorResponse {
    /// The action will be applied after `delay`, unless superseded.
    Scheduled { action: RelayAction, delay: Duration },
    /// The relay was forced off and the emergency latch is set.
    EmergencyStopped,
    ModeChanged { mode: RelayMode },
    Refused(Refusal),
}

impl ActuatorResponse {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Refused(_))
    }

    #[must_use]
    pub fn refusal(&self) -> Option<Refusal> {
        match self {
            Self::Refused(refusal) => Some(*refusal),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActuatorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled { action, delay } => write!(
                f,
                "Relay scheduled to turn {action} in {} seconds.",
                delay.as_secs_f64()
            ),
            Self::EmergencyStopped => f.write_str("Emergency: Relay turned off immediately!"),
            Self::ModeChanged { mode } => write!(f, "Mode set to {mode}."),
            Self::Refused(refusal) => refusal.fmt(f),
        }
    }
}

/// A scheduled action as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAction {
    pub action: RelayAction,
    pub due_in: Duration,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub relay_on: bool,
    pub mode: RelayMode,
    pub emergency_latched: bool,
    pub closed: bool,
    pub pending: Option<PendingAction>,
}

/// The subset of the controller the regulation loop depends on.
pub trait Actuator: Send + Sync {
    fn turn_on(&self, delay: Duration, auto: bool) -> ActuatorResponse;
    fn turn_off(&self, delay: Duration, auto: bool) -> ActuatorResponse;
    fn mode(&self) -> RelayMode;
    /// Counter bumped on every switch into `Auto` from another mode.
    fn auto_epoch(&self) -> u64;
    fn is_relay_on(&self) -> bool;
}

impl<T: Actuator + ?Sized> Actuator for Arc<T> {
    fn turn_on(&self, delay: Duration, auto: bool) -> ActuatorResponse {
        (**self).turn_on(delay, auto)
    }

    fn turn_off(&self, delay: Duration, auto: bool) -> ActuatorResponse {
        (**self).turn_off(delay, auto)
    }

    fn mode(&self) -> RelayMode {
        (**self).mode()
    }

    fn auto_epoch(&self) -> u64 {
        (**self).auto_epoch()
    }

    fn is_relay_on(&self) -> bool {
        (**self).is_relay_on()
    }
}

/// Owns the relay and indicator outputs.
///
/// Cloning yields another handle to the same controller.
pub struct ActuatorController<D> {
    inner: Arc<Inner<D>>,
}

impl<D> Clone for ActuatorController<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<D> {
    driver: D,
    core: Mutex<Core>,
}

struct Core {
    relay_on: bool,
    mode: RelayMode,
    emergency_latched: bool,
    closed: bool,
    generation: u64,
    auto_epoch: u64,
    pending: Option<Scheduled>,
}

struct Scheduled {
    action: RelayAction,
    due: Instant,
    task: JoinHandle<()>,
}

impl Core {
    /// Invalidate whatever is scheduled.
    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(scheduled) = self.pending.take() {
            scheduled.task.abort();
            tracing::debug!(action = %scheduled.action, "pending relay action cancelled");
        }
    }

    fn check_command(&self, auto: bool) -> Result<(), Refusal> {
        if self.closed {
            return Err(Refusal::Closed);
        }
        if !auto && self.mode != RelayMode::Hand {
            return Err(Refusal::ManualLockout);
        }
        Ok(())
    }
}

impl<D: RelayDriver> ActuatorController<D> {
    /// Create a controller in `mode` with both outputs driven off.
    pub fn new(driver: D, mode: RelayMode) -> Self {
        if let Err(err) = driver.set_relay(false) {
            tracing::warn!(error = %err, "failed to reset relay output");
        }
        let indicator = mode == RelayMode::Hand;
        if let Err(err) = driver.set_indicator(indicator) {
            tracing::warn!(error = %err, "failed to reset indicator output");
        }
        Self {
            inner: Arc::new(Inner {
                driver,
                core: Mutex::new(Core {
                    relay_on: false,
                    mode,
                    emergency_latched: false,
                    closed: false,
                    generation: 0,
                    auto_epoch: 0,
                    pending: None,
                }),
            }),
        }
    }

    /// Schedule activation after `delay`.
    ///
    /// `auto` marks commands from the regulation loop; manual commands are
    /// only accepted in `Hand` mode.
    pub fn turn_on(&self, delay: Duration, auto: bool) -> ActuatorResponse {
        let mut core = self.inner.lock();
        if let Err(refusal) = core.check_command(auto) {
            return ActuatorResponse::Refused(refusal);
        }
        if core.emergency_latched {
            return ActuatorResponse::Refused(Refusal::EmergencyActive);
        }
        if core.relay_on {
            return ActuatorResponse::Refused(Refusal::AlreadyOn);
        }
        Inner::schedule(&self.inner, &mut core, RelayAction::On, delay)
    }

    /// Schedule deactivation after `delay`.
    pub fn turn_off(&self, delay: Duration, auto: bool) -> ActuatorResponse {
        let mut core = self.inner.lock();
        if let Err(refusal) = core.check_command(auto) {
            return ActuatorResponse::Refused(refusal);
        }
        if !core.relay_on {
            return ActuatorResponse::Refused(Refusal::AlreadyOff);
        }
        Inner::schedule(&self.inner, &mut core, RelayAction::Off, delay)
    }

    /// Immediately drive the relay off and latch the emergency flag.
    ///
    /// The latch is never cleared; activation stays refused until restart.
    pub fn force_off(&self) -> ActuatorResponse {
        let mut core = self.inner.lock();
        if core.closed {
            return ActuatorResponse::Refused(Refusal::Closed);
        }
        core.emergency_latched = true;
        core.cancel_pending();
        tracing::warn!("emergency stop, relay latched off");
        match self.inner.drive(&mut core, false) {
            Ok(()) => ActuatorResponse::EmergencyStopped,
            Err(_) => ActuatorResponse::Refused(Refusal::HardwareFault),
        }
    }

    /// Parse a mode name and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidModeError`] for unknown names; nothing changes.
    pub fn set_mode(&self, name: &str) -> Result<ActuatorResponse, InvalidModeError> {
        let mode = name.parse::<RelayMode>()?;
        Ok(self.apply_mode(mode))
    }

    /// Switch the mode overlay.
    ///
    /// `Aus` cancels any pending action and drives the relay off; a failed
    /// line write is logged and the mode still changes. `Hand` switches the
    /// indicator on and leaves the relay untouched.
    pub fn apply_mode(&self, mode: RelayMode) -> ActuatorResponse {
        let mut core = self.inner.lock();
        if core.closed {
            return ActuatorResponse::Refused(Refusal::Closed);
        }
        let previous = core.mode;
        core.mode = mode;
        if mode == RelayMode::Auto && previous != RelayMode::Auto {
            core.auto_epoch = core.auto_epoch.wrapping_add(1);
        }
        match mode {
            RelayMode::Aus => {
                core.cancel_pending();
                if self.inner.drive(&mut core, false).is_err() {
                    tracing::warn!("relay may still be energized after switching to Aus");
                }
            }
            RelayMode::Hand => {
                if let Err(err) = self.inner.driver.set_indicator(true) {
                    tracing::warn!(error = %err, "failed to switch indicator on");
                }
            }
            RelayMode::Auto => {}
        }
        tracing::info!(%previous, %mode, "relay mode changed");
        ActuatorResponse::ModeChanged { mode }
    }

    #[must_use]
    pub fn state(&self) -> ActuatorState {
        let core = self.inner.lock();
        let now = Instant::now();
        ActuatorState {
            relay_on: core.relay_on,
            mode: core.mode,
            emergency_latched: core.emergency_latched,
            closed: core.closed,
            pending: core.pending.as_ref().map(|scheduled| PendingAction {
                action: scheduled.action,
                due_in: scheduled.due.saturating_duration_since(now),
            }),
        }
    }

    /// Close the controller, drive the outputs off and release the driver.
    ///
    /// Idempotent. Every later command is refused with [`Refusal::Closed`].
    pub fn shutdown(&self) {
        {
            let mut core = self.inner.lock();
            if core.closed {
                return;
            }
            core.closed = true;
            core.cancel_pending();
            if let Err(err) = self.inner.driver.set_relay(false) {
                tracing::warn!(error = %err, "failed to drive relay off on shutdown");
            }
            core.relay_on = false;
            if let Err(err) = self.inner.driver.set_indicator(false) {
                tracing::warn!(error = %err, "failed to drive indicator off on shutdown");
            }
        }
        self.inner.driver.release();
        tracing::info!("actuator shut down");
    }
}

impl<D: RelayDriver> Actuator for ActuatorController<D> {
    fn turn_on(&self, delay: Duration, auto: bool) -> ActuatorResponse {
        ActuatorController::turn_on(self, delay, auto)
    }

    fn turn_off(&self, delay: Duration, auto: bool) -> ActuatorResponse {
        ActuatorController::turn_off(self, delay, auto)
    }

    fn mode(&self) -> RelayMode {
        self.inner.lock().mode
    }

    fn auto_epoch(&self) -> u64 {
        self.inner.lock().auto_epoch
    }

    fn is_relay_on(&self) -> bool {
        self.inner.lock().relay_on
    }
}

impl<D: RelayDriver> Inner<D> {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule(
        this: &Arc<Self>,
        core: &mut Core,
        action: RelayAction,
        delay: Duration,
    ) -> ActuatorResponse {
        let Ok(runtime) = Handle::try_current() else {
            tracing::error!(%action, "relay action requested outside the runtime");
            return ActuatorResponse::Refused(Refusal::NoRuntime);
        };
        core.cancel_pending();
        let generation = core.generation;
        let inner = Arc::clone(this);
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire(generation, action);
        });
        core.pending = Some(Scheduled {
            action,
            due: Instant::now() + delay,
            task,
        });
        tracing::debug!(
            %action,
            delay_secs = delay.as_secs_f64(),
            generation,
            "relay action scheduled"
        );
        ActuatorResponse::Scheduled { action, delay }
    }

    /// Apply a deferred action if it is still current.
    fn fire(&self, generation: u64, action: RelayAction) {
        let mut core = self.lock();
        if core.closed || core.generation != generation {
            tracing::debug!(%action, generation, "stale relay action skipped");
            return;
        }
        core.pending = None;
        match action {
            RelayAction::On if core.emergency_latched => {
                tracing::warn!("emergency latched, deferred activation suppressed");
            }
            RelayAction::On if core.relay_on => {}
            RelayAction::Off if !core.relay_on => {}
            RelayAction::On | RelayAction::Off => {
                if self.drive(&mut core, action == RelayAction::On).is_err() {
                    tracing::warn!(%action, generation, "deferred relay action not applied");
                }
            }
        }
    }

    /// Write the relay line and, on success, mirror it to state and indicator.
    fn drive(&self, core: &mut Core, on: bool) -> Result<(), HardwareError> {
        if let Err(err) = self.driver.set_relay(on) {
            tracing::error!(error = %err, relay_on = on, "relay output write failed");
            return Err(err);
        }
        core.relay_on = on;
        if let Err(err) = self.driver.set_indicator(on) {
            tracing::warn!(error = %err, "indicator output write failed");
        }
        tracing::info!(relay_on = on, "relay output switched");
        Ok(())
    }
}
