//! Station port: reference weather stations.

use std::future::Future;

use humivent_domain::error::HumiventError;
use humivent_domain::reading::Station;

/// Provides the current list of reference stations.
pub trait StationReader {
    /// Fetch every known station.
    ///
    /// Implementations may serve cached data; an error means no data at all
    /// could be produced.
    fn fetch_stations(&self) -> impl Future<Output = Result<Vec<Station>, HumiventError>> + Send;
}

impl<T: StationReader + Send + Sync> StationReader for std::sync::Arc<T> {
    fn fetch_stations(&self) -> impl Future<Output = Result<Vec<Station>, HumiventError>> + Send {
        (**self).fetch_stations()
    }
}
