//! Relay driver port: the two physical output lines.

use humivent_domain::error::HardwareError;

/// Drives the ventilation relay and its indicator LED.
///
/// Writes are called while the actuator holds its state lock, so they must be
/// quick, non-blocking line writes.
pub trait RelayDriver: Send + Sync + 'static {
    /// Energize (`true`) or release (`false`) the relay.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the line write fails.
    fn set_relay(&self, on: bool) -> Result<(), HardwareError>;

    /// Switch the indicator LED.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError`] when the line write fails.
    fn set_indicator(&self, on: bool) -> Result<(), HardwareError>;

    /// Release the underlying lines. Called once, after the controller closed.
    fn release(&self);
}

impl<T: RelayDriver> RelayDriver for std::sync::Arc<T> {
    fn set_relay(&self, on: bool) -> Result<(), HardwareError> {
        (**self).set_relay(on)
    }

    fn set_indicator(&self, on: bool) -> Result<(), HardwareError> {
        (**self).set_indicator(on)
    }

    fn release(&self) {
        (**self).release();
    }
}
