//! # humivent-adapter-virtual
//!
//! Simulated hardware and in-memory infrastructure for tests, demos and
//! hosts without the physical sensor or relay.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualSensor`] | `SensorReader` | Returns a settable reading or a settable failure |
//! | [`VirtualStations`] | `StationReader` | Returns a settable station list or reports offline |
//! | [`VirtualRelay`] | `RelayDriver` | Records line states and every relay write |
//! | [`InMemorySettingsRepository`] | `SettingsRepository` | Keeps the stored snapshot in memory |
//! | [`MemoryEventLog`] | `StatusSink` | Keeps every logged event in memory |
//!
//! ## Dependency rule
//!
//! Depends on `humivent-app` (port traits) and `humivent-domain` only.

mod devices;
mod memory;

pub use devices::{VirtualRelay, VirtualSensor, VirtualStations};
pub use memory::{InMemorySettingsRepository, MemoryEventLog};
