//! In-memory settings storage and event log.

use std::sync::{Mutex, MutexGuard, PoisonError};

use humivent_app::ports::{SettingsRepository, StatusSink};
use humivent_domain::error::HumiventError;
use humivent_domain::event::{Event, EventKind};
use humivent_domain::settings::Settings;

/// [`SettingsRepository`] that keeps the snapshot in memory.
#[derive(Default)]
pub struct InMemorySettingsRepository {
    stored: Mutex<Option<Settings>>,
}

impl InMemorySettingsRepository {
    /// Repository pre-populated with `settings`.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
        }
    }

    #[must_use]
    pub fn stored(&self) -> Option<Settings> {
        self.lock_stored().clone()
    }

    fn lock_stored(&self) -> MutexGuard<'_, Option<Settings>> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsRepository for InMemorySettingsRepository {
    async fn load(&self) -> Result<Option<Settings>, HumiventError> {
        Ok(self.stored())
    }

    async fn save(&self, settings: &Settings) -> Result<(), HumiventError> {
        *self.lock_stored() = Some(settings.clone());
        Ok(())
    }
}

/// [`StatusSink`] that keeps every event in memory.
#[derive(Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventLog {
    /// All events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.lock_events().clone()
    }

    /// Events of one kind, oldest first.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.lock_events()
            .iter()
            .filter(|event| event.event == kind)
            .cloned()
            .collect()
    }

    fn lock_events(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatusSink for MemoryEventLog {
    fn log(&self, event: Event) {
        self.lock_events().push(event);
    }
}
