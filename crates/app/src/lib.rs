//! # humivent-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ConfigProvider` / `SettingsRepository`: current settings and their storage
//!   - `SensorReader`: indoor temperature/humidity
//!   - `StationReader`: reference weather stations
//!   - `StatusSink`: append-only event log
//!   - `RelayDriver`: relay and indicator output lines
//! - Define **driving/inbound** use-cases:
//!   - `ActuatorController`: delayed, mode-arbitrated, emergency-latching relay control
//!   - `RegulationService`: the polling regulation loop
//!   - `SettingsService`: validated, persisted settings updates
//!   - `ModeService`: operator mode changes, applied and persisted
//! - Provide **in-process infrastructure** that doesn't need IO
//!   (`StatusBoard`, `CachingStationReader`)
//!
//! ## Dependency rule
//! Depends on `humivent-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod actuator;
pub mod ports;
pub mod regulation;
pub mod services;
pub mod station_cache;
pub mod status_board;
