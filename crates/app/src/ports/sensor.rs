//! Sensor port: the indoor temperature/humidity sensor.

use std::future::Future;

use humivent_domain::error::SensorError;
use humivent_domain::reading::SensorReading;

/// Reads one atomic sample from the local sensor.
pub trait SensorReader {
    fn read_sensor(&self) -> impl Future<Output = Result<SensorReading, SensorError>> + Send;
}

impl<T: SensorReader + Send + Sync> SensorReader for std::sync::Arc<T> {
    fn read_sensor(&self) -> impl Future<Output = Result<SensorReading, SensorError>> + Send {
        (**self).read_sensor()
    }
}
