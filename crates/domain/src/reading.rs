//! Readings: the local sensor sample and reference weather stations.

use serde::{Deserialize, Serialize};

use crate::error::{SensorError, ValidationError};
use crate::humidity::absolute_humidity;

/// Plausible operating range of the indoor sensor, in °C.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = -40.0..=125.0;
/// Plausible relative humidity range, in %.
pub const HUMIDITY_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// One atomic temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature_c: f64,
    pub relative_humidity_pct: f64,
}

impl SensorReading {
    /// Build a reading after a plausibility check.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::OutOfRange`] when either value is NaN or outside
    /// [`TEMPERATURE_RANGE`] / [`HUMIDITY_RANGE`].
    pub fn new(temperature_c: f64, relative_humidity_pct: f64) -> Result<Self, SensorError> {
        if !TEMPERATURE_RANGE.contains(&temperature_c) {
            return Err(SensorError::OutOfRange {
                quantity: "temperature",
                value: temperature_c,
            });
        }
        if !HUMIDITY_RANGE.contains(&relative_humidity_pct) {
            return Err(SensorError::OutOfRange {
                quantity: "humidity",
                value: relative_humidity_pct,
            });
        }
        Ok(Self {
            temperature_c,
            relative_humidity_pct,
        })
    }

    /// Absolute humidity of this sample in g/m³.
    ///
    /// # Errors
    ///
    /// Propagates [`absolute_humidity`] validation failures.
    pub fn absolute_humidity(&self) -> Result<f64, ValidationError> {
        absolute_humidity(self.relative_humidity_pct, self.temperature_c)
    }
}

/// A reference weather station as reported by the station source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub station_id: String,
    pub name: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    /// `[longitude, latitude]` when known.
    pub coordinates: Option<[f64; 2]>,
}

impl Station {
    /// Whether both temperature and humidity are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some()
    }

    /// Absolute humidity at the station, or `None` when incomplete or invalid.
    #[must_use]
    pub fn absolute_humidity(&self) -> Option<f64> {
        let (temperature, humidity) = (self.temperature?, self.humidity?);
        absolute_humidity(humidity, temperature).ok()
    }
}

/// A single-quantity measurement from a station feed.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMeasurement {
    pub station_id: String,
    pub name: String,
    pub value: Option<f64>,
    pub coordinates: Option<[f64; 2]>,
}

/// Join separate humidity and temperature feeds into [`Station`]s.
///
/// Stations are keyed by id and reported in humidity-feed order. A humidity
/// entry with no temperature counterpart is dropped.
#[must_use]
pub fn combine_measurements(
    humidity: &[StationMeasurement],
    temperature: &[StationMeasurement],
) -> Vec<Station> {
    let temperatures: std::collections::HashMap<&str, Option<f64>> = temperature
        .iter()
        .map(|m| (m.station_id.as_str(), m.value))
        .collect();

    humidity
        .iter()
        .filter_map(|m| {
            let temperature = *temperatures.get(m.station_id.as_str())?;
            Some(Station {
                station_id: m.station_id.clone(),
                name: m.name.clone(),
                temperature,
                humidity: m.value,
                coordinates: m.coordinates,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(id: &str, value: Option<f64>) -> StationMeasurement {
        StationMeasurement {
            station_id: id.to_string(),
            name: format!("Station {id}"),
            value,
            coordinates: Some([7.5, 46.8]),
        }
    }

    #[test]
    fn should_accept_plausible_reading() {
        let reading = SensorReading::new(21.5, 48.0).unwrap();
        assert!((reading.temperature_c - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reject_implausible_temperature() {
        let err = SensorReading::new(130.0, 40.0).unwrap_err();
        assert_eq!(
            err,
            SensorError::OutOfRange {
                quantity: "temperature",
                value: 130.0
            }
        );
    }

    #[test]
    fn should_reject_nan_humidity() {
        assert!(SensorReading::new(20.0, f64::NAN).is_err());
    }

    #[test]
    fn should_report_station_incomplete_without_humidity() {
        let station = Station {
            station_id: "ARO".to_string(),
            name: "Arosa".to_string(),
            temperature: Some(3.0),
            humidity: None,
            coordinates: None,
        };
        assert!(!station.is_complete());
        assert_eq!(station.absolute_humidity(), None);
    }

    #[test]
    fn should_compute_station_absolute_humidity() {
        let station = Station {
            station_id: "ARO".to_string(),
            name: "Arosa".to_string(),
            temperature: Some(20.0),
            humidity: Some(50.0),
            coordinates: None,
        };
        let ah = station.absolute_humidity().unwrap();
        assert!((ah - 8.64).abs() < 0.01);
    }

    #[test]
    fn should_combine_feeds_by_station_id() {
        let humidity = vec![
            measurement("ARO", Some(80.0)),
            measurement("BAS", Some(60.0)),
        ];
        let temperature = vec![
            measurement("BAS", Some(12.0)),
            measurement("ARO", Some(-2.0)),
        ];

        let stations = combine_measurements(&humidity, &temperature);

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].station_id, "ARO");
        assert_eq!(stations[0].temperature, Some(-2.0));
        assert_eq!(stations[0].humidity, Some(80.0));
        assert_eq!(stations[1].temperature, Some(12.0));
    }

    #[test]
    fn should_drop_stations_missing_from_temperature_feed() {
        let humidity = vec![measurement("ARO", Some(80.0)), measurement("XYZ", None)];
        let temperature = vec![measurement("ARO", None)];

        let stations = combine_measurements(&humidity, &temperature);

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "ARO");
        assert!(!stations[0].is_complete());
    }
}
