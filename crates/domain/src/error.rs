//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HumiventError`] via `#[from]`. Actuator refusals are not errors; they
//! are values returned by the actuator controller in the `app` crate.

/// Top-level error for every fallible port and use-case.
#[derive(Debug, thiserror::Error)]
pub enum HumiventError {
    /// A value failed a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A settings snapshot or update was rejected; the previous settings stay active.
    #[error("invalid configuration")]
    ConfigInvalid(#[source] ValidationError),

    /// The local sensor could not produce a usable reading.
    #[error("local sensor read failed")]
    SensorRead(#[from] SensorError),

    /// No reference station data could be obtained.
    #[error("station data unavailable: {0}")]
    StationUnavailable(String),

    /// An unknown relay mode name was supplied.
    #[error("invalid relay mode")]
    InvalidMode(#[from] InvalidModeError),

    /// Persistence or transport failure in an adapter.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The Magnus formula is undefined at or below -243.5 °C.
    #[error("temperature {0} °C is outside the humidity formula's domain")]
    TemperatureOutOfDomain(f64),

    /// NaN or infinite input.
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative")]
    Negative { field: &'static str },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    /// Hysteresis requires `off_threshold < on_threshold`.
    #[error("off_threshold ({off}) must be lower than on_threshold ({on})")]
    InvertedThresholds { on: f64, off: f64 },

    #[error("station id must not be empty")]
    EmptyStationId,
}

/// Failures of the local temperature/humidity sensor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    /// The bus transaction failed or timed out.
    #[error("sensor transport failed: {0}")]
    Transport(String),

    /// The sensor returned a value outside its physical range.
    #[error("{quantity} reading {value} is outside the plausible range")]
    OutOfRange { quantity: &'static str, value: f64 },

    /// The reading could not be converted to absolute humidity.
    #[error("sensor reading is unusable")]
    Unusable(#[source] ValidationError),
}

/// Unknown relay mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid relay mode `{0}`, expected one of Auto, Hand, Aus")]
pub struct InvalidModeError(pub String);

/// A relay or indicator line write failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hardware output failed: {0}")]
pub struct HardwareError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_humivent_error() {
        let err: HumiventError = ValidationError::EmptyStationId.into();
        assert!(matches!(
            err,
            HumiventError::Validation(ValidationError::EmptyStationId)
        ));
    }

    #[test]
    fn should_convert_sensor_error_into_humivent_error() {
        let err: HumiventError = SensorError::Transport("i2c nack".to_string()).into();
        assert!(matches!(err, HumiventError::SensorRead(_)));
    }

    #[test]
    fn should_display_inverted_thresholds() {
        let err = ValidationError::InvertedThresholds { on: 2.0, off: 2.5 };
        assert_eq!(
            err.to_string(),
            "off_threshold (2.5) must be lower than on_threshold (2)"
        );
    }

    #[test]
    fn should_display_invalid_mode_with_offending_name() {
        let err = InvalidModeError("Turbo".to_string());
        assert_eq!(
            err.to_string(),
            "invalid relay mode `Turbo`, expected one of Auto, Hand, Aus"
        );
    }

    #[test]
    fn should_expose_validation_source_of_config_invalid() {
        use std::error::Error;

        let err = HumiventError::ConfigInvalid(ValidationError::EmptyStationId);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("station id must not be empty"));
    }
}
