//! GeoJSON station snapshots.
//!
//! Humidity and temperature arrive as two separate `FeatureCollection`s, one
//! feature per station, keyed by the feature `id`.

use std::path::{Path, PathBuf};

use humivent_app::ports::StationReader;
use humivent_domain::error::HumiventError;
use humivent_domain::reading::{Station, StationMeasurement, combine_measurements};
use serde::Deserialize;

use crate::error::FileAdapterError;

const UNKNOWN_STATION: &str = "Unknown";

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    id: Option<String>,
    #[serde(default)]
    properties: Properties,
    geometry: Option<Geometry>,
}

#[derive(Default, Deserialize)]
struct Properties {
    station_name: Option<String>,
    value: Option<f64>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl Feature {
    fn into_measurement(self) -> Option<StationMeasurement> {
        let station_id = self.id?;
        let coordinates = self
            .geometry
            .and_then(|g| match g.coordinates.as_slice() {
                [x, y, ..] => Some([*x, *y]),
                _ => None,
            });
        Some(StationMeasurement {
            station_id,
            name: self
                .properties
                .station_name
                .unwrap_or_else(|| UNKNOWN_STATION.to_string()),
            value: self.properties.value,
            coordinates,
        })
    }
}

/// Parse one single-quantity `FeatureCollection`.
///
/// Features without an `id` are ignored.
///
/// # Errors
///
/// Returns [`FileAdapterError::Json`] when the document is not a feature collection.
pub fn parse_measurements(json: &str) -> Result<Vec<StationMeasurement>, FileAdapterError> {
    let collection: FeatureCollection =
        serde_json::from_str(json).map_err(FileAdapterError::Json)?;
    Ok(collection
        .features
        .into_iter()
        .filter_map(Feature::into_measurement)
        .collect())
}

/// [`StationReader`] over a pair of GeoJSON files refreshed by an external job.
pub struct GeoJsonStationReader {
    humidity_path: PathBuf,
    temperature_path: PathBuf,
}

impl GeoJsonStationReader {
    pub fn new(humidity_path: impl Into<PathBuf>, temperature_path: impl Into<PathBuf>) -> Self {
        Self {
            humidity_path: humidity_path.into(),
            temperature_path: temperature_path.into(),
        }
    }

    async fn read(path: &Path) -> Result<Vec<StationMeasurement>, FileAdapterError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(FileAdapterError::io(path))?;
        parse_measurements(&content)
    }

    async fn load(&self) -> Result<Vec<Station>, FileAdapterError> {
        let humidity = Self::read(&self.humidity_path).await?;
        let temperature = Self::read(&self.temperature_path).await?;
        let stations = combine_measurements(&humidity, &temperature);
        tracing::debug!(
            humidity = humidity.len(),
            temperature = temperature.len(),
            combined = stations.len(),
            "station snapshots combined"
        );
        Ok(stations)
    }
}

impl StationReader for GeoJsonStationReader {
    async fn fetch_stations(&self) -> Result<Vec<Station>, HumiventError> {
        self.load()
            .await
            .map_err(|err| HumiventError::StationUnavailable(err.to_string()))
    }
}
