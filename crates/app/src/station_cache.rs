//! Station cache: TTL cache with stale fallback in front of a [`StationReader`].

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use humivent_domain::error::HumiventError;
use humivent_domain::reading::Station;
use tokio::time::Instant;

use crate::ports::StationReader;

struct CachedStations {
    fetched_at: Instant,
    stations: Vec<Station>,
}

/// Serves cached stations while younger than `ttl`.
///
/// When the upstream fails, the last successful result is served regardless
/// of age; an error surfaces only when nothing was ever fetched.
pub struct CachingStationReader<R> {
    upstream: R,
    ttl: Duration,
    cache: Mutex<Option<CachedStations>>,
}

impl<R: StationReader> CachingStationReader<R> {
    pub fn new(upstream: R, ttl: Duration) -> Self {
        Self {
            upstream,
            ttl,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self, max_age: Option<Duration>) -> Option<Vec<Station>> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache
            .as_ref()
            .filter(|entry| max_age.is_none_or(|age| entry.fetched_at.elapsed() < age))
            .map(|entry| entry.stations.clone())
    }

    fn store(&self, stations: Vec<Station>) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *cache = Some(CachedStations {
            fetched_at: Instant::now(),
            stations,
        });
    }
}

impl<R: StationReader + Send + Sync> StationReader for CachingStationReader<R> {
    async fn fetch_stations(&self) -> Result<Vec<Station>, HumiventError> {
        if let Some(fresh) = self.cached(Some(self.ttl)) {
            return Ok(fresh);
        }
        match self.upstream.fetch_stations().await {
            Ok(stations) => {
                tracing::debug!(count = stations.len(), "station data refreshed");
                self.store(stations.clone());
                Ok(stations)
            }
            Err(err) => match self.cached(None) {
                Some(stale) => {
                    tracing::warn!(error = %err, "station fetch failed, serving stale data");
                    Ok(stale)
                }
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeUpstream {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl StationReader for FakeUpstream {
        async fn fetch_stations(&self) -> Result<Vec<Station>, HumiventError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(HumiventError::StationUnavailable("offline".to_string()));
            }
            Ok(vec![Station {
                station_id: "ARO".to_string(),
                name: format!("fetch {call}"),
                temperature: Some(5.0),
                humidity: Some(70.0),
                coordinates: None,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_serve_from_cache_within_ttl() {
        let reader = CachingStationReader::new(FakeUpstream::default(), Duration::from_secs(600));

        reader.fetch_stations().await.unwrap();
        tokio::time::sleep(Duration::from_secs(599)).await;
        let stations = reader.fetch_stations().await.unwrap();

        assert_eq!(reader.upstream.calls.load(Ordering::SeqCst), 1);
        assert_eq!(stations[0].name, "fetch 0");
    }

    #[tokio::test(start_paused = true)]
    async fn should_refresh_after_ttl() {
        let reader = CachingStationReader::new(FakeUpstream::default(), Duration::from_secs(600));

        reader.fetch_stations().await.unwrap();
        tokio::time::sleep(Duration::from_secs(601)).await;
        let stations = reader.fetch_stations().await.unwrap();

        assert_eq!(reader.upstream.calls.load(Ordering::SeqCst), 2);
        assert_eq!(stations[0].name, "fetch 1");
    }

    #[tokio::test(start_paused = true)]
    async fn should_serve_stale_data_when_upstream_fails() {
        let reader = CachingStationReader::new(FakeUpstream::default(), Duration::from_secs(10));
        reader.fetch_stations().await.unwrap();

        reader.upstream.failing.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        let stations = reader.fetch_stations().await.unwrap();

        assert_eq!(stations[0].name, "fetch 0");
    }

    #[tokio::test]
    async fn should_fail_when_nothing_cached() {
        let upstream = FakeUpstream::default();
        upstream.failing.store(true, Ordering::SeqCst);
        let reader = CachingStationReader::new(upstream, Duration::from_secs(10));

        let err = reader.fetch_stations().await.unwrap_err();

        assert!(matches!(err, HumiventError::StationUnavailable(_)));
    }
}
