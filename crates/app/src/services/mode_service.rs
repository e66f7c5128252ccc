//! Mode service: switch the actuator mode and keep the stored settings in step.

use humivent_domain::error::HumiventError;
use humivent_domain::mode::RelayMode;

use crate::actuator::{ActuatorController, ActuatorResponse};
use crate::ports::{ConfigProvider, RelayDriver};

/// Entry point for operator mode changes.
///
/// The actuator is authoritative at runtime; the settings copy only decides
/// the mode after a restart.
pub struct ModeService<C, D> {
    config: C,
    actuator: ActuatorController<D>,
}

impl<C, D> ModeService<C, D>
where
    C: ConfigProvider + Send + Sync,
    D: RelayDriver,
{
    pub fn new(config: C, actuator: ActuatorController<D>) -> Self {
        Self { config, actuator }
    }

    /// Parse `name`, apply it to the actuator and persist it.
    ///
    /// # Errors
    ///
    /// - [`HumiventError::InvalidMode`] for unknown names; nothing changes.
    /// - A storage error when persisting fails. The actuator already runs in
    ///   the new mode; only the restart mode is stale.
    pub async fn set_mode(&self, name: &str) -> Result<ActuatorResponse, HumiventError> {
        let mode = name.parse::<RelayMode>()?;
        self.apply(mode).await
    }

    /// Apply an already parsed mode.
    ///
    /// # Errors
    ///
    /// See [`set_mode`](Self::set_mode).
    pub async fn apply(&self, mode: RelayMode) -> Result<ActuatorResponse, HumiventError> {
        let response = self.actuator.apply_mode(mode);
        if response.is_accepted() {
            self.config.set_relay_mode(mode).await?;
        } else {
            tracing::warn!(%mode, ?response, "mode change refused, settings left as is");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::Refusal;
    use crate::ports::SettingsRepository;
    use crate::services::settings_service::SettingsService;
    use humivent_domain::error::HardwareError;
    use humivent_domain::settings::Settings;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryRepo {
        stored: Mutex<Option<Settings>>,
        fail_save: AtomicBool,
    }

    impl SettingsRepository for MemoryRepo {
        async fn load(&self) -> Result<Option<Settings>, HumiventError> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, settings: &Settings) -> Result<(), HumiventError> {
            if self.fail_save.load(Ordering::SeqCst) {
                return Err(HumiventError::Storage("read-only".into()));
            }
            *self.stored.lock().unwrap() = Some(settings.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullDriver;

    impl RelayDriver for NullDriver {
        fn set_relay(&self, _on: bool) -> Result<(), HardwareError> {
            Ok(())
        }

        fn set_indicator(&self, _on: bool) -> Result<(), HardwareError> {
            Ok(())
        }

        fn release(&self) {}
    }

    type SharedSettings = Arc<SettingsService<Arc<MemoryRepo>>>;

    async fn service() -> (
        ModeService<SharedSettings, NullDriver>,
        SharedSettings,
        Arc<MemoryRepo>,
    ) {
        let repo = Arc::new(MemoryRepo::default());
        let settings = Arc::new(SettingsService::load(Arc::clone(&repo)).await.unwrap());
        let actuator = ActuatorController::new(NullDriver, RelayMode::Auto);
        (
            ModeService::new(Arc::clone(&settings), actuator),
            settings,
            repo,
        )
    }

    #[tokio::test]
    async fn should_apply_and_persist_mode() {
        let (modes, settings, repo) = service().await;

        let response = modes.set_mode("Hand").await.unwrap();

        assert_eq!(
            response,
            ActuatorResponse::ModeChanged {
                mode: RelayMode::Hand
            }
        );
        assert_eq!(modes.actuator.state().mode, RelayMode::Hand);
        assert_eq!(settings.get_config().await.relay_mode, RelayMode::Hand);
        let stored = repo.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.relay_mode, RelayMode::Hand);
    }

    #[tokio::test]
    async fn should_reject_unknown_mode_without_changes() {
        let (modes, settings, _repo) = service().await;

        let err = modes.set_mode("Turbo").await.unwrap_err();

        assert!(matches!(err, HumiventError::InvalidMode(_)));
        assert_eq!(modes.actuator.state().mode, RelayMode::Auto);
        assert_eq!(settings.get_config().await.relay_mode, RelayMode::Auto);
    }

    #[tokio::test]
    async fn should_not_persist_refused_mode_change() {
        let (modes, settings, _repo) = service().await;
        modes.actuator.shutdown();

        let response = modes.apply(RelayMode::Aus).await.unwrap();

        assert_eq!(response, ActuatorResponse::Refused(Refusal::Closed));
        assert_eq!(settings.get_config().await.relay_mode, RelayMode::Auto);
    }

    #[tokio::test]
    async fn should_report_storage_failure_after_switching_actuator() {
        let (modes, settings, repo) = service().await;
        repo.fail_save.store(true, Ordering::SeqCst);

        let err = modes.set_mode("Aus").await.unwrap_err();

        assert!(matches!(err, HumiventError::Storage(_)));
        assert_eq!(modes.actuator.state().mode, RelayMode::Aus);
        assert_eq!(settings.get_config().await.relay_mode, RelayMode::Auto);
    }
}
