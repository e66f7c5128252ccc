//! Simulated devices.

mod relay;
mod sensor;
mod stations;

pub use relay::VirtualRelay;
pub use sensor::VirtualSensor;
pub use stations::VirtualStations;
