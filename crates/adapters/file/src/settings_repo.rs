//! TOML settings repository.

use std::path::{Path, PathBuf};

use humivent_app::ports::SettingsRepository;
use humivent_domain::error::HumiventError;
use humivent_domain::settings::Settings;

use crate::error::FileAdapterError;

/// Stores [`Settings`] as a TOML document.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// crash never leaves a half-written settings file behind.
pub struct TomlSettingsRepository {
    path: PathBuf,
}

impl TomlSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<Settings>, FileAdapterError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(FileAdapterError::io(&self.path)(err)),
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| FileAdapterError::TomlDecode {
                path: self.path.clone(),
                source,
            })
    }

    async fn write(&self, settings: &Settings) -> Result<(), FileAdapterError> {
        let content = toml::to_string_pretty(settings).map_err(FileAdapterError::TomlEncode)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(FileAdapterError::io(parent))?;
        }
        let staging = self.path.with_extension("toml.tmp");
        tokio::fs::write(&staging, content)
            .await
            .map_err(FileAdapterError::io(&staging))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(FileAdapterError::io(&self.path))?;
        tracing::debug!(path = %self.path.display(), "settings written");
        Ok(())
    }
}

impl SettingsRepository for TomlSettingsRepository {
    async fn load(&self) -> Result<Option<Settings>, HumiventError> {
        Ok(self.read().await?)
    }

    async fn save(&self, settings: &Settings) -> Result<(), HumiventError> {
        Ok(self.write(settings).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use humivent_domain::mode::RelayMode;

    #[tokio::test]
    async fn should_report_nothing_stored_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TomlSettingsRepository::new(dir.path().join("missing.toml"));
        assert_eq!(repo.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_save_and_reload_settings() {
        let dir = tempfile::tempdir().unwrap();
        let repo = TomlSettingsRepository::new(dir.path().join("conf").join("settings.toml"));
        let mut settings = Settings::default();
        settings.relay_mode = RelayMode::Hand;
        settings.regulation.local_sensor_poll_interval = 0.25;

        repo.save(&settings).await.unwrap();
        let loaded = repo.load().await.unwrap();

        assert_eq!(loaded, Some(settings));
        assert!(!repo.path().with_extension("toml.tmp").exists());
    }

    #[tokio::test]
    async fn should_fill_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        tokio::fs::write(&path, "[regulation]\non_threshold = 3.5\n")
            .await
            .unwrap();
        let repo = TomlSettingsRepository::new(&path);

        let loaded = repo.load().await.unwrap().unwrap();

        assert!((loaded.regulation.on_threshold - 3.5).abs() < f64::EPSILON);
        assert_eq!(loaded.api_station_id, "ARO");
    }

    #[tokio::test]
    async fn should_fail_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "regulation = [").await.unwrap();
        let repo = TomlSettingsRepository::new(&path);

        let err = repo.read().await.unwrap_err();

        assert!(matches!(err, FileAdapterError::TomlDecode { .. }));
    }
}
