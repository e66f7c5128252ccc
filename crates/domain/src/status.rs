//! Status snapshot: the per-cycle view published to readers.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::mode::RelayMode;
use crate::reading::{SensorReading, Station};
use crate::regulation::RegulationState;
use crate::time::{Timestamp, now};

/// Regulation state as shown to readers.
///
/// In `Auto` this is the FSM state; otherwise it mirrors the mode name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RegulationStatus {
    Automatic(RegulationState),
    Overridden(RelayMode),
}

impl RegulationStatus {
    #[must_use]
    pub fn new(mode: RelayMode, state: RegulationState) -> Self {
        match mode {
            RelayMode::Auto => Self::Automatic(state),
            other => Self::Overridden(other),
        }
    }
}

impl std::fmt::Display for RegulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic(state) => state.fmt(f),
            Self::Overridden(mode) => mode.fmt(f),
        }
    }
}

impl From<RegulationStatus> for String {
    fn from(status: RegulationStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for RegulationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "idle" => Ok(Self::Automatic(RegulationState::Idle)),
            "pending_on" => Ok(Self::Automatic(RegulationState::PendingOn)),
            "relay_on" => Ok(Self::Automatic(RegulationState::RelayOn)),
            "Hand" => Ok(Self::Overridden(RelayMode::Hand)),
            "Aus" => Ok(Self::Overridden(RelayMode::Aus)),
            _ => Err(format!("unknown regulation status `{value}`")),
        }
    }
}

/// Inputs of one regulation cycle, with derived absolute humidities.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurements {
    pub reading: SensorReading,
    pub inside_ah: f64,
    pub station: Option<Station>,
    /// `None` when the station is missing or incomplete.
    pub outside_ah: Option<f64>,
}

impl Measurements {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the local reading cannot be
    /// converted; an unusable station only clears `outside_ah`.
    pub fn new(
        reading: SensorReading,
        station: Option<Station>,
    ) -> Result<Self, ValidationError> {
        let inside_ah = reading.absolute_humidity()?;
        let outside_ah = station.as_ref().and_then(Station::absolute_humidity);
        Ok(Self {
            reading,
            inside_ah,
            station,
            outside_ah,
        })
    }

    /// Inside minus outside absolute humidity.
    #[must_use]
    pub fn diff(&self) -> Option<f64> {
        self.outside_ah.map(|outside| self.inside_ah - outside)
    }
}

/// Complete status of one cycle; numeric values rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub local_temperature: f64,
    pub local_humidity: f64,
    pub inside_absolute_humidity: f64,
    pub api_station: Option<String>,
    pub api_temperature: Option<f64>,
    pub api_humidity: Option<f64>,
    pub outside_absolute_humidity: Option<f64>,
    pub difference: Option<f64>,
    pub regulation_state: RegulationStatus,
    pub relay_on: bool,
    pub recorded_at: Timestamp,
}

impl StatusSnapshot {
    #[must_use]
    pub fn new(
        measurements: &Measurements,
        regulation_state: RegulationStatus,
        relay_on: bool,
    ) -> Self {
        let station = measurements.station.as_ref();
        Self {
            local_temperature: round2(measurements.reading.temperature_c),
            local_humidity: round2(measurements.reading.relative_humidity_pct),
            inside_absolute_humidity: round2(measurements.inside_ah),
            api_station: station.map(|s| s.station_id.clone()),
            api_temperature: station.and_then(|s| s.temperature).map(round2),
            api_humidity: station.and_then(|s| s.humidity).map(round2),
            outside_absolute_humidity: measurements.outside_ah.map(round2),
            difference: measurements.diff().map(round2),
            regulation_state,
            relay_on,
            recorded_at: now(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
