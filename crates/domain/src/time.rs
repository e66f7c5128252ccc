//! Wall-clock timestamps.
//!
//! Regulation timers run on a monotonic clock supplied by the caller; this
//! module only covers the UTC timestamps written into snapshots and events.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `recorded_at` and event times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
