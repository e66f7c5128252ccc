//! Status board: latest-value publication of the regulation status.
//!
//! Backed by a tokio [`watch`] channel: the regulation loop replaces the
//! snapshot wholesale each cycle, readers always observe one complete snapshot.

use std::sync::Arc;

use humivent_domain::status::StatusSnapshot;
use tokio::sync::watch;

/// Shared holder of the most recent [`StatusSnapshot`].
pub struct StatusBoard {
    sender: watch::Sender<Option<Arc<StatusSnapshot>>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    /// Create an empty board; [`latest`](Self::latest) is `None` until the
    /// first cycle completes.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        // send_replace succeeds without receivers
        self.sender.send_replace(Some(Arc::new(snapshot)));
    }

    #[must_use]
    pub fn latest(&self) -> Option<Arc<StatusSnapshot>> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every publication.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<StatusSnapshot>>> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use humivent_domain::reading::SensorReading;
    use humivent_domain::regulation::RegulationState;
    use humivent_domain::status::{Measurements, RegulationStatus};

    fn snapshot(temperature: f64) -> StatusSnapshot {
        let reading = SensorReading::new(temperature, 50.0).unwrap();
        let measurements = Measurements::new(reading, None).unwrap();
        StatusSnapshot::new(
            &measurements,
            RegulationStatus::Automatic(RegulationState::Idle),
            false,
        )
    }

    #[test]
    fn should_start_empty() {
        let board = StatusBoard::new();
        assert!(board.latest().is_none());
    }

    #[test]
    fn should_replace_snapshot_wholesale() {
        let board = StatusBoard::new();
        board.publish(snapshot(20.0));
        board.publish(snapshot(22.5));

        let latest = board.latest().unwrap();
        assert!((latest.local_temperature - 22.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_notify_subscribers() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();

        board.publish(snapshot(19.0));

        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone().unwrap();
        assert!((seen.local_temperature - 19.0).abs() < f64::EPSILON);
    }
}
