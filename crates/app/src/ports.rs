//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod config;
pub mod relay_driver;
pub mod sensor;
pub mod station;
pub mod status_sink;

pub use config::{ConfigProvider, SettingsRepository};
pub use relay_driver::RelayDriver;
pub use sensor::SensorReader;
pub use station::StationReader;
pub use status_sink::StatusSink;
