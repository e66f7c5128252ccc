//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `humiventd.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.
//!
//! This covers the daemon's wiring only. Regulation settings live in their
//! own file (`paths.settings`) and can change at runtime.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File locations.
    pub paths: PathsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Event log writer settings.
    pub event_log: EventLogConfig,
    /// Values served by the simulated devices.
    pub simulation: SimulationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Regulation settings (TOML), created with defaults when missing.
    pub settings: PathBuf,
    /// Append-only event log (JSON lines).
    pub event_log: PathBuf,
    /// Station humidity snapshot (GeoJSON). Requires `temperature_geojson`.
    pub humidity_geojson: Option<PathBuf>,
    /// Station temperature snapshot (GeoJSON). Requires `humidity_geojson`.
    pub temperature_geojson: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Events buffered before new ones are dropped.
    pub capacity: usize,
}

/// Simulated indoor sensor, plus the outdoor station used when no GeoJSON
/// snapshots are configured.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub indoor_temperature: f64,
    pub indoor_humidity: f64,
    pub outdoor_temperature: f64,
    pub outdoor_humidity: f64,
}

impl Config {
    /// Load configuration from `humiventd.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("humiventd.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HUMIVENT_SETTINGS") {
            self.paths.settings = val.into();
        }
        if let Ok(val) = std::env::var("HUMIVENT_EVENT_LOG") {
            self.paths.event_log = val.into();
        }
        if let Ok(val) = std::env::var("HUMIVENT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.event_log.capacity == 0 {
            return Err(ConfigError::Validation(
                "event log capacity must be non-zero".to_string(),
            ));
        }
        if self.paths.humidity_geojson.is_some() != self.paths.temperature_geojson.is_some() {
            return Err(ConfigError::Validation(
                "humidity and temperature snapshots must be configured together".to_string(),
            ));
        }
        Ok(())
    }

    /// Both station snapshot paths, when configured.
    #[must_use]
    pub fn station_snapshots(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.paths
            .humidity_geojson
            .as_ref()
            .zip(self.paths.temperature_geojson.as_ref())
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            settings: PathBuf::from("humivent-settings.toml"),
            event_log: PathBuf::from("humivent-events.jsonl"),
            humidity_geojson: None,
            temperature_geojson: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "humiventd=info,humivent=info".to_string(),
        }
    }
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            indoor_temperature: 21.0,
            indoor_humidity: 60.0,
            outdoor_temperature: 8.0,
            outdoor_humidity: 70.0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.paths.settings, PathBuf::from("humivent-settings.toml"));
        assert_eq!(config.paths.event_log, PathBuf::from("humivent-events.jsonl"));
        assert_eq!(config.event_log.capacity, 1024);
        assert_eq!(config.logging.filter, "humiventd=info,humivent=info");
        assert!(config.station_snapshots().is_none());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.event_log.capacity, 1024);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [paths]
            settings = '/etc/humivent/settings.toml'
            event_log = '/var/log/humivent/events.jsonl'
            humidity_geojson = '/var/lib/humivent/humidity.geojson'
            temperature_geojson = '/var/lib/humivent/temperature.geojson'

            [logging]
            filter = 'debug'

            [event_log]
            capacity = 64

            [simulation]
            indoor_temperature = 19.5
            indoor_humidity = 72.0
            outdoor_temperature = -3.0
            outdoor_humidity = 85.0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.paths.settings,
            PathBuf::from("/etc/humivent/settings.toml")
        );
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.event_log.capacity, 64);
        assert!((config.simulation.outdoor_temperature + 3.0).abs() < f64::EPSILON);
        assert!(config.station_snapshots().is_some());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.event_log.capacity, 1024);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [simulation]
            indoor_humidity = 80.0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!((config.simulation.indoor_humidity - 80.0).abs() < f64::EPSILON);
        assert!((config.simulation.indoor_temperature - 21.0).abs() < f64::EPSILON);
        assert_eq!(config.paths.event_log, PathBuf::from("humivent-events.jsonl"));
    }

    #[test]
    fn should_reject_zero_capacity() {
        let mut config = Config::default();
        config.event_log.capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_single_station_snapshot() {
        let mut config = Config::default();
        config.paths.humidity_geojson = Some(PathBuf::from("humidity.geojson"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
