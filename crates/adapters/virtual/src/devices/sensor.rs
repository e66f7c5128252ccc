//! Virtual sensor: a settable indoor temperature/humidity sample.

use std::sync::{Mutex, MutexGuard, PoisonError};

use humivent_app::ports::SensorReader;
use humivent_domain::error::SensorError;
use humivent_domain::reading::SensorReading;

/// Simulated indoor sensor.
///
/// Every read returns the current sample, or the injected failure.
pub struct VirtualSensor {
    state: Mutex<Result<SensorReading, SensorError>>,
}

impl VirtualSensor {
    /// Create a sensor reporting the given values.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::OutOfRange`] for implausible values.
    pub fn new(temperature_c: f64, relative_humidity_pct: f64) -> Result<Self, SensorError> {
        let reading = SensorReading::new(temperature_c, relative_humidity_pct)?;
        Ok(Self {
            state: Mutex::new(Ok(reading)),
        })
    }

    /// Replace the reported sample.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::OutOfRange`] for implausible values; the
    /// previous sample stays in place.
    pub fn set_reading(
        &self,
        temperature_c: f64,
        relative_humidity_pct: f64,
    ) -> Result<(), SensorError> {
        let reading = SensorReading::new(temperature_c, relative_humidity_pct)?;
        *self.lock_state() = Ok(reading);
        Ok(())
    }

    /// Make every following read fail with a transport error.
    pub fn fail_with(&self, message: &str) {
        *self.lock_state() = Err(SensorError::Transport(message.to_string()));
    }

    fn lock_state(&self) -> MutexGuard<'_, Result<SensorReading, SensorError>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SensorReader for VirtualSensor {
    async fn read_sensor(&self) -> Result<SensorReading, SensorError> {
        self.lock_state().clone()
    }
}
