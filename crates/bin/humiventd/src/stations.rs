//! Station source selection.

use humivent_adapter_file::GeoJsonStationReader;
use humivent_adapter_virtual::VirtualStations;
use humivent_app::ports::StationReader;
use humivent_domain::error::HumiventError;
use humivent_domain::reading::Station;

use crate::config::Config;

/// Either snapshot files or a single simulated station.
pub enum StationSource {
    Snapshots(GeoJsonStationReader),
    Simulated(VirtualStations),
}

impl StationSource {
    /// Snapshots when both GeoJSON paths are configured, otherwise a
    /// simulated station named `station_id`.
    pub fn from_config(config: &Config, station_id: &str) -> Self {
        match config.station_snapshots() {
            Some((humidity, temperature)) => {
                tracing::info!(
                    humidity = %humidity.display(),
                    temperature = %temperature.display(),
                    "reading stations from snapshots"
                );
                Self::Snapshots(GeoJsonStationReader::new(humidity, temperature))
            }
            None => {
                tracing::info!(station = station_id, "using simulated outdoor station");
                Self::Simulated(VirtualStations::single(
                    station_id,
                    config.simulation.outdoor_temperature,
                    config.simulation.outdoor_humidity,
                ))
            }
        }
    }
}

impl StationReader for StationSource {
    async fn fetch_stations(&self) -> Result<Vec<Station>, HumiventError> {
        match self {
            Self::Snapshots(reader) => reader.fetch_stations().await,
            Self::Simulated(reader) => reader.fetch_stations().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn should_simulate_configured_station_by_default() {
        let source = StationSource::from_config(&Config::default(), "BAS");

        let stations = source.fetch_stations().await.unwrap();

        assert!(matches!(source, StationSource::Simulated(_)));
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "BAS");
        assert_eq!(stations[0].temperature, Some(8.0));
    }

    #[test]
    fn should_read_snapshots_when_configured() {
        let mut config = Config::default();
        config.paths.humidity_geojson = Some(PathBuf::from("humidity.geojson"));
        config.paths.temperature_geojson = Some(PathBuf::from("temperature.geojson"));

        let source = StationSource::from_config(&config, "ARO");

        assert!(matches!(source, StationSource::Snapshots(_)));
    }
}
