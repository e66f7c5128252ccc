//! Configuration ports: current settings and their persistence.

use std::future::Future;

use humivent_domain::error::HumiventError;
use humivent_domain::mode::RelayMode;
use humivent_domain::settings::{Settings, SettingsPatch};

/// Source of the current settings snapshot.
///
/// The regulation loop calls [`get_config`](Self::get_config) once per cycle
/// and never caches the result.
pub trait ConfigProvider {
    /// Return the current snapshot.
    fn get_config(&self) -> impl Future<Output = Settings> + Send;

    /// Deep-merge `patch` into the current settings, validate, persist, and
    /// return the new snapshot.
    ///
    /// On error the previous snapshot stays active.
    fn update_config(
        &self,
        patch: SettingsPatch,
    ) -> impl Future<Output = Result<Settings, HumiventError>> + Send;

    /// Record the actuator mode so it survives a restart.
    fn set_relay_mode(
        &self,
        mode: RelayMode,
    ) -> impl Future<Output = Result<Settings, HumiventError>> + Send;
}

impl<T: ConfigProvider + Send + Sync> ConfigProvider for std::sync::Arc<T> {
    fn get_config(&self) -> impl Future<Output = Settings> + Send {
        (**self).get_config()
    }

    fn update_config(
        &self,
        patch: SettingsPatch,
    ) -> impl Future<Output = Result<Settings, HumiventError>> + Send {
        (**self).update_config(patch)
    }

    fn set_relay_mode(
        &self,
        mode: RelayMode,
    ) -> impl Future<Output = Result<Settings, HumiventError>> + Send {
        (**self).set_relay_mode(mode)
    }
}

/// Durable storage for settings.
pub trait SettingsRepository {
    /// Load the stored snapshot, `None` when nothing has been stored yet.
    fn load(&self) -> impl Future<Output = Result<Option<Settings>, HumiventError>> + Send;

    /// Replace the stored snapshot.
    fn save(&self, settings: &Settings) -> impl Future<Output = Result<(), HumiventError>> + Send;
}

impl<T: SettingsRepository + Send + Sync> SettingsRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<Settings>, HumiventError>> + Send {
        (**self).load()
    }

    fn save(&self, settings: &Settings) -> impl Future<Output = Result<(), HumiventError>> + Send {
        (**self).save(settings)
    }
}
