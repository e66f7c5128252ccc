//! Events: records appended to the regulation event log.

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, now};

/// Kind of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StatusUpdate,
    LocalSensorError,
    StationUnavailable,
    PendingOnStarted,
    PendingOnCancelled,
    RelayTurnedOn,
    MaxOnTimeExceeded,
    PendingOffStarted,
    PendingOffCancelled,
    RelayTurnedOff,
    /// FSM reset on re-entering `Auto`.
    RegulationReset,
    /// The actuator refused a command issued by the regulator.
    ActuatorRefused,
    ConfigUpdated,
}

impl EventKind {
    pub const ALL: [Self; 13] = [
        Self::StatusUpdate,
        Self::LocalSensorError,
        Self::StationUnavailable,
        Self::PendingOnStarted,
        Self::PendingOnCancelled,
        Self::RelayTurnedOn,
        Self::MaxOnTimeExceeded,
        Self::PendingOffStarted,
        Self::PendingOffCancelled,
        Self::RelayTurnedOff,
        Self::RegulationReset,
        Self::ActuatorRefused,
        Self::ConfigUpdated,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusUpdate => "status_update",
            Self::LocalSensorError => "local_sensor_error",
            Self::StationUnavailable => "station_unavailable",
            Self::PendingOnStarted => "pending_on_started",
            Self::PendingOnCancelled => "pending_on_cancelled",
            Self::RelayTurnedOn => "relay_turned_on",
            Self::MaxOnTimeExceeded => "max_on_time_exceeded",
            Self::PendingOffStarted => "pending_off_started",
            Self::PendingOffCancelled => "pending_off_cancelled",
            Self::RelayTurnedOff => "relay_turned_off",
            Self::RegulationReset => "regulation_reset",
            Self::ActuatorRefused => "actuator_refused",
            Self::ConfigUpdated => "config_updated",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// Unrecognised event name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind `{0}`")]
pub struct UnknownEventKind(pub String);

/// One log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event: EventKind,
    pub timestamp: Timestamp,
    /// Free-form payload (message, snapshot, error text).
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// Event stamped with the current time.
    #[must_use]
    pub fn new(event: EventKind, data: serde_json::Value) -> Self {
        Self {
            event,
            timestamp: now(),
            data,
        }
    }

    /// Event whose payload is a single `message` field.
    #[must_use]
    pub fn message(event: EventKind, message: impl Into<String>) -> Self {
        Self::new(event, serde_json::json!({ "message": message.into() }))
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}
