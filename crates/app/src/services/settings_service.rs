//! Settings service: the in-process [`ConfigProvider`] over a repository.

use std::sync::{Arc, PoisonError, RwLock};

use humivent_domain::error::HumiventError;
use humivent_domain::event::{Event, EventKind};
use humivent_domain::mode::RelayMode;
use humivent_domain::settings::{Settings, SettingsPatch};

use crate::ports::{ConfigProvider, SettingsRepository, StatusSink};

/// Holds the active settings snapshot and persists every accepted update.
pub struct SettingsService<R> {
    repo: R,
    current: RwLock<Settings>,
    // serializes read-merge-save-swap
    update_lock: tokio::sync::Mutex<()>,
    sink: Option<Arc<dyn StatusSink>>,
}

impl<R: SettingsRepository> SettingsService<R> {
    /// Load settings from `repo`, writing defaults when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`HumiventError::ConfigInvalid`] when the stored settings
    /// violate an invariant, or a storage error from the repository.
    pub async fn load(repo: R) -> Result<Self, HumiventError> {
        let settings = if let Some(stored) = repo.load().await? {
            stored.validate().map_err(HumiventError::ConfigInvalid)?;
            tracing::info!(station = %stored.api_station_id, "settings loaded");
            stored
        } else {
            let defaults = Settings::default();
            repo.save(&defaults).await?;
            tracing::info!("no stored settings, defaults written");
            defaults
        };
        Ok(Self::with_settings(repo, settings))
    }

    /// Wrap an already validated snapshot without touching the repository.
    pub fn with_settings(repo: R, settings: Settings) -> Self {
        Self {
            repo,
            current: RwLock::new(settings),
            update_lock: tokio::sync::Mutex::new(()),
            sink: None,
        }
    }

    /// Log a `config_updated` event with the new snapshot after every
    /// accepted update.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    fn snapshot(&self) -> Settings {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<R: SettingsRepository + Send + Sync> SettingsService<R> {
    // Callers hold `update_lock`.
    async fn commit(&self, next: Settings) -> Result<Settings, HumiventError> {
        self.repo.save(&next).await?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next.clone();
        tracing::info!(
            mode = %next.relay_mode,
            on_threshold = next.regulation.on_threshold,
            off_threshold = next.regulation.off_threshold,
            "settings updated"
        );
        if let Some(sink) = &self.sink {
            let payload = serde_json::to_value(&next).unwrap_or_default();
            sink.log(Event::new(EventKind::ConfigUpdated, payload));
        }
        Ok(next)
    }
}

impl<R: SettingsRepository + Send + Sync> ConfigProvider for SettingsService<R> {
    async fn get_config(&self) -> Settings {
        self.snapshot()
    }

    async fn update_config(&self, patch: SettingsPatch) -> Result<Settings, HumiventError> {
        let _guard = self.update_lock.lock().await;
        let next = self
            .snapshot()
            .merged(&patch)
            .map_err(HumiventError::ConfigInvalid)?;
        self.commit(next).await
    }

    async fn set_relay_mode(&self, mode: RelayMode) -> Result<Settings, HumiventError> {
        let _guard = self.update_lock.lock().await;
        let mut next = self.snapshot();
        if next.relay_mode == mode {
            return Ok(next);
        }
        next.relay_mode = mode;
        self.commit(next).await
    }
}
