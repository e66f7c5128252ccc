//! Virtual stations: a settable list of reference weather stations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use humivent_app::ports::StationReader;
use humivent_domain::error::HumiventError;
use humivent_domain::reading::Station;

/// Simulated station source; `None` means offline.
pub struct VirtualStations {
    stations: Mutex<Option<Vec<Station>>>,
}

impl Default for VirtualStations {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl VirtualStations {
    #[must_use]
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            stations: Mutex::new(Some(stations)),
        }
    }

    /// A source with one complete station.
    #[must_use]
    pub fn single(station_id: &str, temperature: f64, humidity: f64) -> Self {
        Self::new(vec![Station {
            station_id: station_id.to_string(),
            name: format!("Virtual {station_id}"),
            temperature: Some(temperature),
            humidity: Some(humidity),
            coordinates: None,
        }])
    }

    pub fn set_stations(&self, stations: Vec<Station>) {
        *self.lock_stations() = Some(stations);
    }

    /// Make every following fetch fail.
    pub fn set_offline(&self) {
        *self.lock_stations() = None;
    }

    fn lock_stations(&self) -> MutexGuard<'_, Option<Vec<Station>>> {
        self.stations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StationReader for VirtualStations {
    async fn fetch_stations(&self) -> Result<Vec<Station>, HumiventError> {
        self.lock_stations().clone().ok_or_else(|| {
            HumiventError::StationUnavailable("virtual station source offline".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_return_configured_station() {
        let source = VirtualStations::single("ARO", 4.0, 81.0);

        let stations = source.fetch_stations().await.unwrap();

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "ARO");
        assert!(stations[0].is_complete());
    }

    #[tokio::test]
    async fn should_report_unavailable_when_offline() {
        let source = VirtualStations::default();
        source.set_offline();

        let err = source.fetch_stations().await.unwrap_err();

        assert!(matches!(err, HumiventError::StationUnavailable(_)));
    }
}
