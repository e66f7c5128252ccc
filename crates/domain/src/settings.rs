//! Settings: the runtime-tunable parameters of the regulator.
//!
//! A [`Settings`] value is an immutable snapshot. Updates arrive as a
//! [`SettingsPatch`] that is deep-merged into a copy of the current snapshot
//! and validated before it replaces anything.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::mode::RelayMode;
use crate::regulation::RegulationParams;

/// Complete settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Identifier of the reference weather station (e.g. `ARO`).
    pub api_station_id: String,
    /// Mode applied to the actuator at startup. Changed only through the
    /// mode command, never through a [`SettingsPatch`].
    pub relay_mode: RelayMode,
    /// Thresholds, delays and intervals.
    pub regulation: RegulationSettings,
}

/// Regulation thresholds (g/m³) and timings (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulationSettings {
    /// Difference above which ventilation is requested.
    pub on_threshold: f64,
    /// Difference below which ventilation may stop.
    pub off_threshold: f64,
    pub on_delay: f64,
    pub off_delay: f64,
    /// Hard cap on a single relay-on period.
    pub max_on_time: f64,
    /// Cadence of the regulation loop; fractional seconds allowed.
    pub local_sensor_poll_interval: f64,
    /// Freshness window of cached station data.
    pub api_poll_interval: f64,
    /// Forces the effective `on_delay` to zero.
    pub test_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_station_id: "ARO".to_string(),
            relay_mode: RelayMode::Auto,
            regulation: RegulationSettings::default(),
        }
    }
}

impl Default for RegulationSettings {
    fn default() -> Self {
        Self {
            on_threshold: 2.0,
            off_threshold: 1.7,
            on_delay: 60.0,
            off_delay: 300.0,
            max_on_time: 300.0,
            local_sensor_poll_interval: 1.0,
            api_poll_interval: 600.0,
            test_mode: false,
        }
    }
}

impl Settings {
    /// Check every invariant of the snapshot.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyStationId`] when the station id is blank
    /// - [`ValidationError::NotFinite`] for NaN/infinite or unrepresentable values
    /// - [`ValidationError::InvertedThresholds`] unless `off_threshold < on_threshold`
    /// - [`ValidationError::Negative`] for negative delays or cache window
    /// - [`ValidationError::NotPositive`] for a zero `max_on_time` or poll interval
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_station_id.trim().is_empty() {
            return Err(ValidationError::EmptyStationId);
        }
        self.regulation.validate()
    }

    /// Deep-merge `patch` into a copy of `self` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns the first invariant the merged snapshot violates; `self` is
    /// never modified.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        if let Some(ref station) = patch.api_station_id {
            next.api_station_id.clone_from(station);
        }
        if let Some(ref regulation) = patch.regulation {
            next.regulation.apply(regulation);
        }
        next.validate()?;
        Ok(next)
    }

    /// Typed view consumed by the regulation state machine.
    #[must_use]
    pub fn regulation_params(&self) -> RegulationParams {
        let reg = &self.regulation;
        RegulationParams {
            on_threshold: reg.on_threshold,
            off_threshold: reg.off_threshold,
            on_delay: if reg.test_mode {
                Duration::ZERO
            } else {
                secs(reg.on_delay)
            },
            off_delay: secs(reg.off_delay),
            max_on_time: secs(reg.max_on_time),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        secs(self.regulation.local_sensor_poll_interval)
    }

    #[must_use]
    pub fn station_cache_ttl(&self) -> Duration {
        secs(self.regulation.api_poll_interval)
    }
}

impl RegulationSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        finite("on_threshold", self.on_threshold)?;
        finite("off_threshold", self.off_threshold)?;
        if self.off_threshold >= self.on_threshold {
            return Err(ValidationError::InvertedThresholds {
                on: self.on_threshold,
                off: self.off_threshold,
            });
        }
        duration("on_delay", self.on_delay, true)?;
        duration("off_delay", self.off_delay, true)?;
        duration("max_on_time", self.max_on_time, false)?;
        duration(
            "local_sensor_poll_interval",
            self.local_sensor_poll_interval,
            false,
        )?;
        duration("api_poll_interval", self.api_poll_interval, true)?;
        Ok(())
    }

    fn apply(&mut self, patch: &RegulationPatch) {
        let RegulationPatch {
            on_threshold,
            off_threshold,
            on_delay,
            off_delay,
            max_on_time,
            local_sensor_poll_interval,
            api_poll_interval,
            test_mode,
        } = *patch;
        self.on_threshold = on_threshold.unwrap_or(self.on_threshold);
        self.off_threshold = off_threshold.unwrap_or(self.off_threshold);
        self.on_delay = on_delay.unwrap_or(self.on_delay);
        self.off_delay = off_delay.unwrap_or(self.off_delay);
        self.max_on_time = max_on_time.unwrap_or(self.max_on_time);
        self.local_sensor_poll_interval =
            local_sensor_poll_interval.unwrap_or(self.local_sensor_poll_interval);
        self.api_poll_interval = api_poll_interval.unwrap_or(self.api_poll_interval);
        self.test_mode = test_mode.unwrap_or(self.test_mode);
    }
}

/// Partial update; absent fields keep their current value at every depth.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsPatch {
    pub api_station_id: Option<String>,
    pub regulation: Option<RegulationPatch>,
}

/// Partial update of [`RegulationSettings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegulationPatch {
    pub on_threshold: Option<f64>,
    pub off_threshold: Option<f64>,
    pub on_delay: Option<f64>,
    pub off_delay: Option<f64>,
    pub max_on_time: Option<f64>,
    pub local_sensor_poll_interval: Option<f64>,
    pub api_poll_interval: Option<f64>,
    pub test_mode: Option<bool>,
}

fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

fn duration(field: &'static str, value: f64, allow_zero: bool) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Negative { field });
    }
    if !allow_zero && value == 0.0 {
        return Err(ValidationError::NotPositive { field });
    }
    if Duration::try_from_secs_f64(value).is_err() {
        return Err(ValidationError::NotFinite { field });
    }
    Ok(())
}

// Only called on validated snapshots.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
