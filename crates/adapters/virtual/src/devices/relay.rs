//! Virtual relay: records the relay and indicator lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use humivent_app::ports::RelayDriver;
use humivent_domain::error::HardwareError;

/// Simulated output lines.
#[derive(Default)]
pub struct VirtualRelay {
    relay: AtomicBool,
    indicator: AtomicBool,
    released: AtomicBool,
    failing: AtomicBool,
    writes: Mutex<Vec<bool>>,
}

impl VirtualRelay {
    #[must_use]
    pub fn is_relay_on(&self) -> bool {
        self.relay.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_indicator_on(&self) -> bool {
        self.indicator.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Every successful relay write, oldest first.
    #[must_use]
    pub fn relay_writes(&self) -> Vec<bool> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make relay writes fail (`true`) or succeed again (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl RelayDriver for VirtualRelay {
    fn set_relay(&self, on: bool) -> Result<(), HardwareError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HardwareError("virtual relay line fault".to_string()));
        }
        if self.is_released() {
            return Err(HardwareError("virtual relay line released".to_string()));
        }
        self.relay.store(on, Ordering::SeqCst);
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(on);
        tracing::debug!(relay_on = on, "virtual relay written");
        Ok(())
    }

    fn set_indicator(&self, on: bool) -> Result<(), HardwareError> {
        if self.is_released() {
            return Err(HardwareError("virtual indicator line released".to_string()));
        }
        self.indicator.store(on, Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        tracing::debug!("virtual relay lines released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_record_relay_writes() {
        let relay = VirtualRelay::default();

        relay.set_relay(true).unwrap();
        relay.set_relay(false).unwrap();

        assert_eq!(relay.relay_writes(), vec![true, false]);
        assert!(!relay.is_relay_on());
    }

    #[test]
    fn should_fail_writes_when_faulted() {
        let relay = VirtualRelay::default();
        relay.set_failing(true);

        assert!(relay.set_relay(true).is_err());
        assert!(relay.relay_writes().is_empty());
    }

    #[test]
    fn should_reject_writes_after_release() {
        let relay = VirtualRelay::default();
        relay.release();

        assert!(relay.is_released());
        assert!(relay.set_relay(true).is_err());
        assert!(relay.set_indicator(true).is_err());
    }
}
