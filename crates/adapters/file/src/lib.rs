//! # humivent-adapter-file
//!
//! File-backed adapters for the humivent ports.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Format |
//! |---------|------|--------|
//! | [`TomlSettingsRepository`] | `SettingsRepository` | TOML, replaced atomically on save |
//! | [`JsonlEventLog`] | `StatusSink` | one JSON event per line, appended by a background writer |
//! | [`EventLogReader`] | n/a | filtered, newest-first scan of the same file |
//! | [`GeoJsonStationReader`] | `StationReader` | humidity + temperature `FeatureCollection` snapshots |
//!
//! ## Dependency rule
//!
//! Depends on `humivent-app` (port traits) and `humivent-domain` only.

pub mod error;
mod event_log;
mod geojson;
mod log_reader;
mod settings_repo;

pub use error::FileAdapterError;
pub use event_log::JsonlEventLog;
pub use geojson::{GeoJsonStationReader, parse_measurements};
pub use log_reader::{DEFAULT_LIMIT, EventLogReader, LogQuery};
pub use settings_repo::TomlSettingsRepository;
